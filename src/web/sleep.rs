use crate::db::{self, NewSleepAnswer, SleepAnswerRow, SleepQuestion};
use crate::domain::answer::{AnswerPatch, AnswerShape, AnswerValue};
use crate::error::{self, ApiError};
use crate::state::SharedState;
use crate::web::session::UserSession;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const ALREADY_ANSWERED: &str = "answer already submitted today";

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/questions", get(questions))
        .route("/answers", get(list).post(create))
        .route("/answers/:id", get(detail).patch(update))
        .with_state(state)
}

#[derive(Deserialize)]
struct CreateSleepAnswerPayload {
    sleep_question: Option<i32>,
    answer_type: Option<String>,
    answer_choice: Option<String>,
    answer_int: Option<i64>,
    answer_bool: Option<bool>,
}

#[derive(Deserialize, Default)]
struct UpdateSleepAnswerPayload {
    answer_type: Option<String>,
    answer_choice: Option<String>,
    answer_int: Option<i64>,
    answer_bool: Option<bool>,
}

#[derive(Serialize)]
struct SleepAnswerResponse {
    id: i64,
    sleep_question: Option<i32>,
    answer_type: AnswerShape,
    answer_choice: Option<String>,
    answer_int: Option<i64>,
    answer_bool: Option<bool>,
    created_at: DateTime<Utc>,
}

impl From<SleepAnswerRow> for SleepAnswerResponse {
    fn from(row: SleepAnswerRow) -> Self {
        SleepAnswerResponse {
            id: row.id,
            sleep_question: row.sleep_question_id,
            answer_type: row.answer_type,
            answer_choice: row.answer_choice,
            answer_int: row.answer_int,
            answer_bool: row.answer_bool,
            created_at: row.created_at,
        }
    }
}

async fn questions(
    UserSession(_): UserSession,
    State(state): State<SharedState>,
) -> Result<Json<Vec<SleepQuestion>>, ApiError> {
    let questions = db::list_sleep_questions(&state.pool).await?;
    Ok(Json(questions))
}

async fn list(
    UserSession(user_id): UserSession,
    State(state): State<SharedState>,
) -> Result<Json<Vec<SleepAnswerResponse>>, ApiError> {
    let rows = db::list_sleep_answers(&state.pool, user_id).await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

async fn create(
    UserSession(user_id): UserSession,
    State(state): State<SharedState>,
    Json(payload): Json<CreateSleepAnswerPayload>,
) -> Result<(StatusCode, Json<SleepAnswerResponse>), ApiError> {
    let question_id = payload
        .sleep_question
        .ok_or_else(|| ApiError::validation("sleep_question is required"))?;

    let shape = parse_shape(payload.answer_type.as_deref())?;
    let value = AnswerValue::from_parts(
        shape,
        payload.answer_choice,
        payload.answer_int,
        payload.answer_bool,
    )
    .map_err(|e| ApiError::validation(e.to_string()))?;

    db::find_sleep_question(&state.pool, question_id)
        .await?
        .ok_or(ApiError::NotFound("sleep question not found"))?;

    let answer = NewSleepAnswer {
        sleep_question_id: question_id,
        value,
    };
    let row = db::insert_sleep_answer(&state.pool, user_id, answer)
        .await
        .map_err(|e| {
            if error::is_unique_violation(&e) {
                ApiError::Duplicate(ALREADY_ANSWERED)
            } else if error::is_foreign_key_violation(&e) {
                ApiError::NotFound("sleep question not found")
            } else {
                e.into()
            }
        })?;

    Ok((StatusCode::CREATED, Json(row.into())))
}

async fn detail(
    UserSession(user_id): UserSession,
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<SleepAnswerResponse>, ApiError> {
    let row = db::find_sleep_answer(&state.pool, user_id, id)
        .await?
        .ok_or(ApiError::NotFound("answer not found"))?;
    Ok(Json(row.into()))
}

async fn update(
    UserSession(user_id): UserSession,
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateSleepAnswerPayload>,
) -> Result<Json<SleepAnswerResponse>, ApiError> {
    let row = db::find_sleep_answer(&state.pool, user_id, id)
        .await?
        .ok_or(ApiError::NotFound("answer not found"))?;

    let current = AnswerValue::from_parts(
        row.answer_type,
        row.answer_choice.clone(),
        row.answer_int,
        row.answer_bool,
    )
    .map_err(|e| ApiError::Internal(anyhow::anyhow!("stored answer is inconsistent: {e}")))?;

    let patch = AnswerPatch {
        answer_type: match payload.answer_type.as_deref() {
            Some(raw) => Some(parse_shape(Some(raw))?),
            None => None,
        },
        answer_choice: payload.answer_choice,
        answer_int: payload.answer_int,
        answer_bool: payload.answer_bool,
    };
    let merged = current
        .merge_patch(&patch)
        .map_err(|e| ApiError::validation(e.to_string()))?;

    let updated = db::update_sleep_answer(&state.pool, user_id, id, merged)
        .await?
        .ok_or(ApiError::NotFound("answer not found"))?;

    Ok(Json(updated.into()))
}

fn parse_shape(raw: Option<&str>) -> Result<AnswerShape, ApiError> {
    raw.and_then(|value| AnswerShape::try_from(value).ok())
        .ok_or_else(|| ApiError::validation("answer_type must be one of choice, boolean or integer"))
}

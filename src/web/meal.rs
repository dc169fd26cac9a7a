use crate::db::{self, MealAnswerRow, MealQuestion, NewMealAnswer};
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
        .route("/answers/:id", get(detail).patch(update).delete(remove))
        .with_state(state)
}

#[derive(Deserialize)]
struct CreateMealAnswerPayload {
    meal_question: Option<i32>,
    vegetable: Option<i32>,
    is_allergy: Option<bool>,
    answer_type: Option<String>,
    answer_choice: Option<String>,
    answer_int: Option<i64>,
    answer_bool: Option<bool>,
}

#[derive(Deserialize, Default)]
struct UpdateMealAnswerPayload {
    vegetable: Option<i32>,
    is_allergy: Option<bool>,
    answer_type: Option<String>,
    answer_choice: Option<String>,
    answer_int: Option<i64>,
    answer_bool: Option<bool>,
}

#[derive(Serialize)]
struct MealAnswerResponse {
    id: i64,
    meal_question: Option<i32>,
    vegetable: Option<i32>,
    is_allergy: bool,
    answer_type: AnswerShape,
    answer_choice: Option<String>,
    answer_int: Option<i64>,
    answer_bool: Option<bool>,
    created_at: DateTime<Utc>,
}

impl From<MealAnswerRow> for MealAnswerResponse {
    fn from(row: MealAnswerRow) -> Self {
        MealAnswerResponse {
            id: row.id,
            meal_question: row.meal_question_id,
            vegetable: row.vegetable_id,
            is_allergy: row.is_allergy,
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
) -> Result<Json<Vec<MealQuestion>>, ApiError> {
    let questions = db::list_meal_questions(&state.pool).await?;
    Ok(Json(questions))
}

async fn list(
    UserSession(user_id): UserSession,
    State(state): State<SharedState>,
) -> Result<Json<Vec<MealAnswerResponse>>, ApiError> {
    let rows = db::list_meal_answers(&state.pool, user_id).await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

async fn create(
    UserSession(user_id): UserSession,
    State(state): State<SharedState>,
    Json(payload): Json<CreateMealAnswerPayload>,
) -> Result<(StatusCode, Json<MealAnswerResponse>), ApiError> {
    let question_id = payload
        .meal_question
        .ok_or_else(|| ApiError::validation("meal_question is required"))?;

    let shape = parse_shape(payload.answer_type.as_deref())?;
    let value = AnswerValue::from_parts(
        shape,
        payload.answer_choice,
        payload.answer_int,
        payload.answer_bool,
    )
    .map_err(|e| ApiError::validation(e.to_string()))?;

    db::find_meal_question(&state.pool, question_id)
        .await?
        .ok_or(ApiError::NotFound("meal question not found"))?;
    if let Some(vegetable_id) = payload.vegetable {
        db::find_vegetable(&state.pool, vegetable_id)
            .await?
            .ok_or(ApiError::NotFound("vegetable not found"))?;
    }

    let answer = NewMealAnswer {
        meal_question_id: question_id,
        vegetable_id: payload.vegetable,
        is_allergy: payload.is_allergy.unwrap_or(false),
        value,
    };
    let row = db::insert_meal_answer(&state.pool, user_id, answer)
        .await
        .map_err(|e| {
            if error::is_unique_violation(&e) {
                ApiError::Duplicate(ALREADY_ANSWERED)
            } else if error::is_foreign_key_violation(&e) {
                ApiError::NotFound("meal question not found")
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
) -> Result<Json<MealAnswerResponse>, ApiError> {
    let row = db::find_meal_answer(&state.pool, user_id, id)
        .await?
        .ok_or(ApiError::NotFound("answer not found"))?;
    Ok(Json(row.into()))
}

async fn update(
    UserSession(user_id): UserSession,
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateMealAnswerPayload>,
) -> Result<Json<MealAnswerResponse>, ApiError> {
    let row = db::find_meal_answer(&state.pool, user_id, id)
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

    let vegetable_id = match payload.vegetable {
        Some(vegetable_id) => {
            db::find_vegetable(&state.pool, vegetable_id)
                .await?
                .ok_or(ApiError::NotFound("vegetable not found"))?;
            Some(vegetable_id)
        }
        None => row.vegetable_id,
    };
    let is_allergy = payload.is_allergy.unwrap_or(row.is_allergy);

    let updated =
        db::update_meal_answer(&state.pool, user_id, id, vegetable_id, is_allergy, merged)
            .await?
            .ok_or(ApiError::NotFound("answer not found"))?;

    Ok(Json(updated.into()))
}

async fn remove(
    UserSession(user_id): UserSession,
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let deleted = db::delete_meal_answer(&state.pool, user_id, id).await?;
    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("answer not found"))
    }
}

fn parse_shape(raw: Option<&str>) -> Result<AnswerShape, ApiError> {
    raw.and_then(|value| AnswerShape::try_from(value).ok())
        .ok_or_else(|| ApiError::validation("answer_type must be one of choice, boolean or integer"))
}

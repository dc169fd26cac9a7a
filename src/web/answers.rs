use crate::db::{self, AnswerRow, NewAnswer, QuestionCategory};
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

/// Category the trailing-week view is pinned to.
const WEEK_VIEW_CATEGORY: QuestionCategory = QuestionCategory::Exercise;

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(list).post(create))
        .route("/yesterday", get(yesterday))
        .route("/week", get(week))
        .route("/:id", get(detail).patch(update))
        .with_state(state)
}

#[derive(Deserialize)]
struct CreateAnswerPayload {
    question: Option<i32>,
    vegetable: Option<i32>,
    is_allergy: Option<bool>,
    is_unnecessary: Option<bool>,
    answer_type: Option<String>,
    answer_choice: Option<String>,
    answer_int: Option<i64>,
    answer_bool: Option<bool>,
}

// Fields a PATCH may change. A client-supplied `user` or `question` is
// deliberately absent here: unknown fields deserialize to nothing, so
// attempts to reassign an answer are accepted but ignored.
#[derive(Deserialize, Default)]
struct UpdateAnswerPayload {
    vegetable: Option<i32>,
    is_allergy: Option<bool>,
    is_unnecessary: Option<bool>,
    answer_type: Option<String>,
    answer_choice: Option<String>,
    answer_int: Option<i64>,
    answer_bool: Option<bool>,
}

#[derive(Serialize)]
struct AnswerResponse {
    id: i64,
    question: Option<i32>,
    vegetable: Option<i32>,
    is_allergy: bool,
    is_unnecessary: bool,
    answer_type: AnswerShape,
    answer_choice: Option<String>,
    answer_int: Option<i64>,
    answer_bool: Option<bool>,
    created_at: DateTime<Utc>,
}

impl From<AnswerRow> for AnswerResponse {
    fn from(row: AnswerRow) -> Self {
        AnswerResponse {
            id: row.id,
            question: row.question_id,
            vegetable: row.vegetable_id,
            is_allergy: row.is_allergy,
            is_unnecessary: row.is_unnecessary,
            answer_type: row.answer_type,
            answer_choice: row.answer_choice,
            answer_int: row.answer_int,
            answer_bool: row.answer_bool,
            created_at: row.created_at,
        }
    }
}

fn parse_create(payload: CreateAnswerPayload) -> Result<NewAnswer, ApiError> {
    let question_id = payload
        .question
        .ok_or_else(|| ApiError::validation("question is required"))?;

    let shape = parse_shape(payload.answer_type.as_deref())?;
    let value = AnswerValue::from_parts(
        shape,
        payload.answer_choice,
        payload.answer_int,
        payload.answer_bool,
    )
    .map_err(|e| ApiError::validation(e.to_string()))?;

    Ok(NewAnswer {
        question_id,
        vegetable_id: payload.vegetable,
        is_allergy: payload.is_allergy.unwrap_or(false),
        is_unnecessary: payload.is_unnecessary.unwrap_or(false),
        value,
    })
}

fn parse_shape(raw: Option<&str>) -> Result<AnswerShape, ApiError> {
    raw.and_then(|value| AnswerShape::try_from(value).ok())
        .ok_or_else(|| ApiError::validation("answer_type must be one of choice, boolean or integer"))
}

async fn list(
    UserSession(user_id): UserSession,
    State(state): State<SharedState>,
) -> Result<Json<Vec<AnswerResponse>>, ApiError> {
    let rows = db::list_answers(&state.pool, user_id).await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

async fn create(
    UserSession(user_id): UserSession,
    State(state): State<SharedState>,
    Json(payload): Json<CreateAnswerPayload>,
) -> Result<(StatusCode, Json<AnswerResponse>), ApiError> {
    let answer = parse_create(payload)?;

    db::find_question(&state.pool, answer.question_id)
        .await?
        .ok_or(ApiError::NotFound("question not found"))?;
    if let Some(vegetable_id) = answer.vegetable_id {
        db::find_vegetable(&state.pool, vegetable_id)
            .await?
            .ok_or(ApiError::NotFound("vegetable not found"))?;
    }

    let row = db::insert_answer(&state.pool, user_id, answer)
        .await
        .map_err(map_insert_error)?;

    Ok((StatusCode::CREATED, Json(row.into())))
}

async fn detail(
    UserSession(user_id): UserSession,
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<AnswerResponse>, ApiError> {
    let row = db::find_answer(&state.pool, user_id, id)
        .await?
        .ok_or(ApiError::NotFound("answer not found"))?;
    Ok(Json(row.into()))
}

async fn update(
    UserSession(user_id): UserSession,
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateAnswerPayload>,
) -> Result<Json<AnswerResponse>, ApiError> {
    let row = db::find_answer(&state.pool, user_id, id)
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
    let is_unnecessary = payload.is_unnecessary.unwrap_or(row.is_unnecessary);

    let updated = db::update_answer(
        &state.pool,
        user_id,
        id,
        vegetable_id,
        is_allergy,
        is_unnecessary,
        merged,
    )
    .await?
    .ok_or(ApiError::NotFound("answer not found"))?;

    Ok(Json(updated.into()))
}

async fn yesterday(
    UserSession(user_id): UserSession,
    State(state): State<SharedState>,
) -> Result<Json<Vec<AnswerResponse>>, ApiError> {
    let rows = db::list_answers_yesterday(&state.pool, user_id).await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

async fn week(
    UserSession(user_id): UserSession,
    State(state): State<SharedState>,
) -> Result<Json<Vec<AnswerResponse>>, ApiError> {
    let rows = db::list_answers_week(&state.pool, user_id, WEEK_VIEW_CATEGORY).await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

fn map_insert_error(e: sqlx::Error) -> ApiError {
    if error::is_unique_violation(&e) {
        ApiError::Duplicate(ALREADY_ANSWERED)
    } else if error::is_foreign_key_violation(&e) {
        ApiError::NotFound("question not found")
    } else {
        e.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> CreateAnswerPayload {
        CreateAnswerPayload {
            question: Some(1),
            vegetable: None,
            is_allergy: None,
            is_unnecessary: None,
            answer_type: Some("boolean".to_string()),
            answer_choice: None,
            answer_int: None,
            answer_bool: Some(true),
        }
    }

    #[test]
    fn create_requires_question() {
        let request = CreateAnswerPayload {
            question: None,
            ..payload()
        };
        assert!(matches!(
            parse_create(request).unwrap_err(),
            ApiError::Validation(msg) if msg.contains("question")
        ));
    }

    #[test]
    fn create_requires_known_answer_type() {
        let request = CreateAnswerPayload {
            answer_type: Some("shout".to_string()),
            ..payload()
        };
        assert!(matches!(
            parse_create(request).unwrap_err(),
            ApiError::Validation(msg) if msg.contains("answer_type")
        ));

        let request = CreateAnswerPayload {
            answer_type: None,
            ..payload()
        };
        assert!(parse_create(request).is_err());
    }

    #[test]
    fn create_rejects_mismatched_payload() {
        let request = CreateAnswerPayload {
            answer_int: Some(4),
            ..payload()
        };
        assert!(parse_create(request).is_err());
    }

    #[test]
    fn create_accepts_matching_payload() {
        let answer = parse_create(payload()).unwrap();
        assert_eq!(answer.question_id, 1);
        assert_eq!(answer.value, AnswerValue::Boolean(true));
        assert!(!answer.is_allergy);
    }
}

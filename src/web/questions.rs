use crate::db::{self, Question};
use crate::error::ApiError;
use crate::state::SharedState;
use crate::web::session::UserSession;
use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(list))
        .route("/:id", get(detail))
        .with_state(state)
}

async fn list(
    UserSession(_): UserSession,
    State(state): State<SharedState>,
) -> Result<Json<Vec<Question>>, ApiError> {
    let questions = db::list_questions(&state.pool).await?;
    Ok(Json(questions))
}

async fn detail(
    UserSession(_): UserSession,
    State(state): State<SharedState>,
    Path(id): Path<i32>,
) -> Result<Json<Question>, ApiError> {
    let question = db::find_question(&state.pool, id)
        .await?
        .ok_or(ApiError::NotFound("question not found"))?;
    Ok(Json(question))
}

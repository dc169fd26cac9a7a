use crate::db::{self, Vegetable};
use crate::error::ApiError;
use crate::state::SharedState;
use crate::web::session::UserSession;
use axum::{extract::State, routing::get, Json, Router};

pub fn router(state: SharedState) -> Router {
    Router::new().route("/", get(list)).with_state(state)
}

async fn list(
    UserSession(_): UserSession,
    State(state): State<SharedState>,
) -> Result<Json<Vec<Vegetable>>, ApiError> {
    let vegetables = db::list_vegetables(&state.pool).await?;
    Ok(Json(vegetables))
}

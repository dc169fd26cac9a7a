pub mod answers;
pub mod meal;
pub mod questions;
pub mod session;
pub mod sleep;
pub mod user;
pub mod vegetables;

use crate::state::SharedState;
use axum::{routing::get, Router};

async fn health() -> &'static str {
    "OK"
}

pub fn routes(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/user", user::router(state.clone()))
        .nest("/questions", questions::router(state.clone()))
        .nest("/vegetables", vegetables::router(state.clone()))
        .nest("/answers", answers::router(state.clone()))
        .nest("/meal", meal::router(state.clone()))
        .nest("/sleep", sleep::router(state))
}

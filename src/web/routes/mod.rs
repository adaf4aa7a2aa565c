//! Contains all the routes that this application can handle.

mod home;
mod subscribe;

use crate::AppState;
use home::home;
use subscribe::subscribe;

use axum::{
    http::StatusCode,
    routing::{get, post},
    Router,
};

async fn health_check() -> StatusCode {
    StatusCode::OK
}

/// All the routes of the server
pub fn routes(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/subscribe", post(subscribe))
        .with_state(app_state)
        .route("/health-check", get(health_check))
}

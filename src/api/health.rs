use crate::api::AppState;
use crate::api::schemas::HealthResponse;
use axum::{Json, extract::State, response::IntoResponse};

/// Liveness: answers as long as the server is running.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        message: "Smartcar API is running",
        status: "online",
        env: state.config.server.environment.as_str(),
    })
}

use crate::api::AppState;
use crate::api::middleware::ClientSession;
use crate::api::schemas::{DebugResponse, StatusResponse};
use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Redirect, Response},
};

pub async fn status(client: ClientSession) -> impl IntoResponse {
    Json(StatusResponse::from(client.session.status()))
}

/// Masked view of the session; secrets appear only as prefixes.
pub async fn debug(client: ClientSession) -> impl IntoResponse {
    Json(DebugResponse::from(client.session.status()))
}

/// Forgets the session. Form posts from the dashboard are sent back to the
/// landing page; API clients get `204 No Content`.
pub async fn disconnect(State(state): State<AppState>, mut client: ClientSession, headers: HeaderMap) -> Response {
    let cookies = client.clear(state.sessions.as_ref());
    tracing::info!("Session cleared");

    let from_form = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/x-www-form-urlencoded"));

    if from_form {
        (cookies, Redirect::to("/")).into_response()
    } else {
        (cookies, StatusCode::NO_CONTENT).into_response()
    }
}

use crate::api::AppState;
use crate::api::middleware::ClientSession;
use crate::api::schemas::{CallbackQuery, IndexQuery};
use crate::frontend;
use axum::{
    extract::{Query, State, rejection::QueryRejection},
    response::{Html, IntoResponse, Redirect, Response},
};
use std::time::Duration;

/// Dashboard. Without a session the connect card is shown; otherwise the
/// vehicle is aggregated, with one retry, and rendered.
pub async fn index(
    State(state): State<AppState>,
    client: ClientSession,
    query: Result<Query<IndexQuery>, QueryRejection>,
) -> Html<String> {
    let query = query.map(|Query(query)| query).unwrap_or_default();
    let authorize_url = frontend::authorize_url(&state.config.smartcar);
    if client.session.access_token.is_none() {
        return Html(frontend::connect_page(authorize_url.as_deref(), query.error.as_deref()));
    }

    let delay = Duration::from_millis(state.config.frontend.retry_delay_ms);
    match state.vehicle_service.snapshot_with_retry(&client.session, delay).await {
        Ok(snapshot) => Html(frontend::vehicle_page(&snapshot)),
        Err(e) => Html(frontend::connect_page(authorize_url.as_deref(), Some(&e.user_message()))),
    }
}

/// Redirect target of the authorization dialog.
pub async fn callback(
    State(state): State<AppState>,
    mut client: ClientSession,
    query: Result<Query<CallbackQuery>, QueryRejection>,
) -> Response {
    let query = match query {
        Ok(Query(query)) => query,
        Err(rejection) => {
            tracing::warn!(error = %rejection, "Malformed callback parameters");
            return error_redirect(&format!("Authorization failed: {}", rejection.body_text())).into_response();
        }
    };
    if let Some(error) = query.error {
        let message = query.error_description.filter(|d| !d.is_empty()).unwrap_or(error);
        tracing::warn!(%message, "Authorization was not granted");
        return error_redirect(&format!("Authorization failed: {message}")).into_response();
    }

    let code = query.code.unwrap_or_default();
    let result = state.exchange_service.exchange(&mut client.session, &code).await;
    let cookies = client.commit(state.sessions.as_ref());

    match result {
        Ok(outcome) if outcome.has_vehicles() => (cookies, Redirect::to("/")).into_response(),
        Ok(_) => (cookies, error_redirect("No vehicles found in the user account")).into_response(),
        Err(e) => (cookies, error_redirect(&e.user_message())).into_response(),
    }
}

fn error_redirect(message: &str) -> Redirect {
    let encoded: String = url::form_urlencoded::byte_serialize(message.as_bytes()).collect();
    Redirect::to(&format!("/?error={encoded}"))
}

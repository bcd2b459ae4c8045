use crate::api::AppState;
use crate::api::middleware::ClientSession;
use crate::api::schemas::{ExchangeQuery, ExchangeResponse};
use crate::error::AppError;
use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
    response::{IntoResponse, Response},
};

/// Trades the authorization code for tokens. Whatever part of the session
/// was established is persisted, even when a later step fails.
pub async fn exchange(
    State(state): State<AppState>,
    mut client: ClientSession,
    query: Result<Query<ExchangeQuery>, QueryRejection>,
) -> Response {
    let query = match query {
        Ok(Query(query)) => query,
        Err(rejection) => return AppError::from(rejection).into_response(),
    };
    let code = query.code.unwrap_or_default();
    let result = state.exchange_service.exchange(&mut client.session, &code).await;
    let cookies = client.commit(state.sessions.as_ref());

    match result {
        Ok(outcome) => (cookies, Json(ExchangeResponse::from(outcome))).into_response(),
        Err(e) => (cookies, e).into_response(),
    }
}

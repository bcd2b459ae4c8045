use crate::domain::token::MissingCredentials;
use crate::services::provider::ProviderError;
use axum::{
    Json,
    extract::rejection::QueryRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid query string")]
    InvalidQuery(String),
    #[error("Authorization code is required")]
    MissingCode,
    #[error("No access token available. Please connect your vehicle first.")]
    MissingAccessToken,
    #[error("No vehicle ID available. Please connect your vehicle first.")]
    MissingVehicleId,
    #[error("Server configuration error: Missing environment variables")]
    MissingCredentials(MissingCredentials),
    #[error("Failed to exchange authorization code for token")]
    TokenExchange(#[source] ProviderError),
    #[error("No access token obtained from token exchange")]
    EmptyAccessToken,
    #[error("Failed to get vehicles")]
    VehicleList(#[source] ProviderError),
    #[error("Failed to get vehicle information")]
    VehicleFetch(#[source] ProviderError),
}

pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    /// Missing-precondition errors are final; retrying them cannot succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::VehicleFetch(_) | Self::VehicleList(_) | Self::TokenExchange(_))
    }

    /// Message suitable for showing to the end user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::TokenExchange(e) | Self::VehicleList(e) | Self::VehicleFetch(e) => format!("{self}: {e}"),
            _ => self.to_string(),
        }
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::InvalidQuery(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let error = self.to_string();
        let (status, body) = match self {
            Self::InvalidQuery(details) => {
                tracing::debug!(%details, "Rejected query string");
                (StatusCode::BAD_REQUEST, json!({ "error": error, "details": details }))
            }
            Self::MissingCode => {
                tracing::debug!("Exchange requested without a code");
                (StatusCode::BAD_REQUEST, json!({ "error": error }))
            }
            Self::MissingAccessToken => {
                tracing::debug!("No access token in session");
                (StatusCode::BAD_REQUEST, json!({ "error": error, "hasToken": false }))
            }
            Self::MissingVehicleId => {
                tracing::debug!("No vehicle id in session");
                (StatusCode::BAD_REQUEST, json!({ "error": error, "hasVehicleId": false }))
            }
            Self::MissingCredentials(missing) => {
                tracing::error!(?missing, "Smartcar credentials are not configured");
                (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": error, "missingVars": missing }))
            }
            Self::TokenExchange(e) => {
                tracing::error!(error = %e, details = ?e.body(), "Token exchange failed");
                let details = e.body().cloned().unwrap_or_else(|| {
                    Value::String(
                        if e.received_response() { "Unknown error" } else { "No response from token server" }
                            .to_string(),
                    )
                });
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "success": false, "error": error, "message": e.to_string(), "details": details }),
                )
            }
            Self::EmptyAccessToken => {
                tracing::error!("Token grant carried no access token");
                (StatusCode::INTERNAL_SERVER_ERROR, json!({ "success": false, "error": error }))
            }
            Self::VehicleList(e) => {
                tracing::error!(error = %e, details = ?e.body(), "Fetching vehicles failed");
                let details = e.body().cloned().unwrap_or_else(|| Value::String("No response data".to_string()));
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "success": false, "error": error, "message": e.to_string(), "details": details }),
                )
            }
            Self::VehicleFetch(e) => {
                tracing::error!(error = %e, details = ?e.body(), timeout = e.is_timeout(), "Fetching vehicle failed");
                let mut body = json!({ "error": error, "message": e.to_string(), "timeout": e.is_timeout() });
                if let Some(details) = e.body() {
                    body["details"] = details.clone();
                }
                (StatusCode::INTERNAL_SERVER_ERROR, body)
            }
        };

        (status, Json(body)).into_response()
    }
}

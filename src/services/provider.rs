use crate::domain::token::{ClientCredentials, TokenGrant};
use crate::domain::vehicle::EnrichmentKind;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Request failed with status code {status}")]
    Status { status: u16, body: Value },
    #[error("Request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
    #[error("No response received: {0}")]
    Transport(String),
    #[error("Invalid response: {0}")]
    Decode(String),
}

impl ProviderError {
    /// The error document returned by Smartcar, when a response was received.
    #[must_use]
    pub const fn body(&self) -> Option<&Value> {
        match self {
            Self::Status { body, .. } => Some(body),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    #[must_use]
    pub const fn received_response(&self) -> bool {
        matches!(self, Self::Status { .. } | Self::Decode(_))
    }
}

/// Vehicle-telematics vendor as seen by the services.
#[async_trait]
pub trait VehicleProvider: Send + Sync + std::fmt::Debug {
    /// Trades an authorization code for a token pair.
    ///
    /// # Errors
    /// Returns a `ProviderError` if the token endpoint rejects the code or cannot be reached.
    async fn exchange_code(&self, credentials: &ClientCredentials, code: &str) -> Result<TokenGrant, ProviderError>;

    /// Lists the ids of the vehicles the token grants access to.
    ///
    /// # Errors
    /// Returns a `ProviderError` if the request fails.
    async fn list_vehicles(&self, access_token: &str) -> Result<Vec<String>, ProviderError>;

    /// Fetches the vehicle profile (`make`, `model`, `year`, ...).
    ///
    /// # Errors
    /// Returns a `ProviderError` if the request fails or the response is not an object.
    async fn vehicle(&self, access_token: &str, vehicle_id: &str) -> Result<Map<String, Value>, ProviderError>;

    /// Fetches one optional resource of a vehicle.
    ///
    /// # Errors
    /// Returns a `ProviderError` if the request fails.
    async fn vehicle_resource(
        &self,
        access_token: &str,
        vehicle_id: &str,
        kind: EnrichmentKind,
    ) -> Result<Value, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_classification() {
        let status = ProviderError::Status { status: 409, body: json!({"type": "COMPATIBILITY"}) };
        assert_eq!(status.body(), Some(&json!({"type": "COMPATIBILITY"})));
        assert!(status.received_response());
        assert!(!status.is_timeout());

        let timeout = ProviderError::Timeout(Duration::from_millis(10_000));
        assert!(timeout.is_timeout());
        assert!(!timeout.received_response());
        assert_eq!(timeout.to_string(), "Request timed out after 10000ms");
    }
}

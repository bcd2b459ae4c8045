use crate::config::SmartcarConfig;
use crate::domain::session::fragment;
use crate::domain::token::{ClientCredentials, TokenGrant};
use crate::domain::vehicle::EnrichmentKind;
use crate::services::provider::{ProviderError, VehicleProvider};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, header};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct VehicleList {
    #[serde(default)]
    vehicles: Vec<String>,
}

/// Smartcar REST client.
/// Clone is cheap - `reqwest::Client` shares its connection pool.
#[derive(Clone, Debug)]
pub struct SmartcarClient {
    http: Client,
    token_url: String,
    api_url: String,
    timeout: Duration,
}

impl SmartcarClient {
    /// Creates a client for the endpoints in `config`.
    ///
    /// # Errors
    /// Returns an error if the TLS backend cannot be initialized.
    pub fn new(config: &SmartcarConfig) -> reqwest::Result<Self> {
        let http = Client::builder().user_agent(concat!("smartcar-dashboard/", env!("CARGO_PKG_VERSION"))).build()?;

        Ok(Self {
            http,
            token_url: config.auth_url.clone(),
            api_url: config.api_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_millis(config.request_timeout_ms),
        })
    }

    fn vehicle_url(&self, vehicle_id: &str, resource: Option<&str>) -> String {
        match resource {
            Some(resource) => format!("{}/vehicles/{vehicle_id}/{resource}", self.api_url),
            None => format!("{}/vehicles/{vehicle_id}", self.api_url),
        }
    }

    /// Sends the request and decodes a JSON body.
    ///
    /// The whole exchange runs under `tokio::time::timeout`; on expiry the
    /// request future is dropped, which aborts the connection.
    async fn send_json(&self, request: RequestBuilder) -> Result<Value, ProviderError> {
        let call = async {
            let response = request.header(header::ACCEPT, "application/json").send().await.map_err(map_transport)?;
            let status = response.status();
            let bytes = response.bytes().await.map_err(map_transport)?;

            if !status.is_success() {
                let body = serde_json::from_slice(&bytes)
                    .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
                return Err(ProviderError::Status { status: status.as_u16(), body });
            }

            serde_json::from_slice(&bytes).map_err(|e| ProviderError::Decode(e.to_string()))
        };

        tokio::time::timeout(self.timeout, call).await.map_err(|_| ProviderError::Timeout(self.timeout))?
    }
}

fn map_transport(e: reqwest::Error) -> ProviderError {
    ProviderError::Transport(e.to_string())
}

#[async_trait]
impl VehicleProvider for SmartcarClient {
    #[tracing::instrument(skip_all, err(level = "warn"))]
    async fn exchange_code(&self, credentials: &ClientCredentials, code: &str) -> Result<TokenGrant, ProviderError> {
        tracing::debug!(code = %fragment(code), "Exchanging authorization code");

        let params = [("grant_type", "authorization_code"), ("code", code), ("redirect_uri", credentials.redirect_uri.as_str())];
        let request = self
            .http
            .post(&self.token_url)
            .basic_auth(&credentials.client_id, Some(&credentials.client_secret))
            .form(&params);

        let value = self.send_json(request).await?;
        let grant: TokenGrant = serde_json::from_value(value).map_err(|e| ProviderError::Decode(e.to_string()))?;

        tracing::info!(
            access = %fragment(&grant.access_token),
            expires_in = ?grant.expires_in,
            has_refresh_token = !grant.refresh_token.is_empty(),
            "Token received"
        );
        Ok(grant)
    }

    #[tracing::instrument(skip_all, err(level = "warn"))]
    async fn list_vehicles(&self, access_token: &str) -> Result<Vec<String>, ProviderError> {
        let request = self.http.get(format!("{}/vehicles", self.api_url)).bearer_auth(access_token);
        let value = self.send_json(request).await?;
        let list: VehicleList = serde_json::from_value(value).map_err(|e| ProviderError::Decode(e.to_string()))?;
        Ok(list.vehicles)
    }

    #[tracing::instrument(skip_all, fields(vehicle = %fragment(vehicle_id)), err(level = "warn"))]
    async fn vehicle(&self, access_token: &str, vehicle_id: &str) -> Result<Map<String, Value>, ProviderError> {
        let request = self.http.get(self.vehicle_url(vehicle_id, None)).bearer_auth(access_token);
        match self.send_json(request).await? {
            Value::Object(profile) => Ok(profile),
            other => Err(ProviderError::Decode(format!("expected an object, got {other}"))),
        }
    }

    #[tracing::instrument(skip_all, fields(vehicle = %fragment(vehicle_id), resource = kind.field()))]
    async fn vehicle_resource(
        &self,
        access_token: &str,
        vehicle_id: &str,
        kind: EnrichmentKind,
    ) -> Result<Value, ProviderError> {
        let request = self.http.get(self.vehicle_url(vehicle_id, Some(kind.field()))).bearer_auth(access_token);
        self.send_json(request).await
    }
}

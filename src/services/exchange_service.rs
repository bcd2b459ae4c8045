use crate::config::SmartcarConfig;
use crate::domain::session::{Session, fragment};
use crate::domain::token::ClientCredentials;
use crate::error::{AppError, Result};
use crate::services::provider::VehicleProvider;
use opentelemetry::{KeyValue, global, metrics::Counter};
use std::sync::Arc;

#[derive(Clone, Debug)]
struct Metrics {
    exchange_total: Counter<u64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("smartcar-dashboard");
        Self {
            exchange_total: meter
                .u64_counter("smartcar_exchange_total")
                .with_description("Authorization code exchanges by outcome")
                .build(),
        }
    }

    fn record(&self, outcome: &'static str) {
        self.exchange_total.add(1, &[KeyValue::new("outcome", outcome)]);
    }
}

/// Result of a successful exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExchangeOutcome {
    pub vehicle_count: usize,
}

impl ExchangeOutcome {
    #[must_use]
    pub const fn has_vehicles(&self) -> bool {
        self.vehicle_count > 0
    }
}

#[derive(Clone, Debug)]
pub struct ExchangeService {
    provider: Arc<dyn VehicleProvider>,
    config: SmartcarConfig,
    metrics: Metrics,
}

impl ExchangeService {
    #[must_use]
    pub fn new(provider: Arc<dyn VehicleProvider>, config: SmartcarConfig) -> Self {
        Self { provider, config, metrics: Metrics::new() }
    }

    /// Trades `code` for tokens and selects the first vehicle of the account.
    ///
    /// The session is updated as far as the flow got: when the vehicle list
    /// cannot be fetched the new tokens are still stored.
    ///
    /// # Errors
    /// Returns `AppError::MissingCode` for an empty code,
    /// `AppError::MissingCredentials` when the client is not configured,
    /// `AppError::EmptyAccessToken` when the grant carries no access token,
    /// and `AppError::TokenExchange` / `AppError::VehicleList` when Smartcar fails.
    #[tracing::instrument(skip_all, fields(code = tracing::field::Empty), err(level = "warn"))]
    pub async fn exchange(&self, session: &mut Session, code: &str) -> Result<ExchangeOutcome> {
        let code = code.trim();
        if code.is_empty() {
            return Err(AppError::MissingCode);
        }
        tracing::Span::current().record("code", tracing::field::display(fragment(code)));

        let credentials = ClientCredentials::from_config(&self.config).map_err(|missing| {
            self.metrics.record("misconfigured");
            AppError::MissingCredentials(missing)
        })?;
        tracing::debug!(?credentials, "Using client credentials");

        let grant = self.provider.exchange_code(&credentials, code).await.map_err(|e| {
            self.metrics.record("exchange_failed");
            AppError::TokenExchange(e)
        })?;

        session.set_tokens(&grant);
        let access_token = session.access_token.clone().ok_or_else(|| {
            self.metrics.record("exchange_failed");
            AppError::EmptyAccessToken
        })?;

        let vehicles = self.provider.list_vehicles(&access_token).await.map_err(|e| {
            self.metrics.record("vehicles_failed");
            AppError::VehicleList(e)
        })?;

        session.set_vehicle_id(vehicles.first().cloned());
        match session.vehicle_id.as_deref() {
            Some(id) => tracing::info!(vehicle = %fragment(id), count = vehicles.len(), "Selected vehicle"),
            None => tracing::info!("No vehicles found in the user account"),
        }

        self.metrics.record("success");
        Ok(ExchangeOutcome { vehicle_count: vehicles.len() })
    }
}

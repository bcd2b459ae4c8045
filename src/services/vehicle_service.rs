use crate::domain::session::{Session, fragment};
use crate::domain::vehicle::{Enrichment, EnrichmentKind, VehicleSnapshot};
use crate::error::{AppError, Result};
use crate::services::provider::VehicleProvider;
use backon::{ConstantBuilder, Retryable};
use opentelemetry::{KeyValue, global, metrics::Counter};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

const DEADLINE_EXCEEDED: &str = "deadline exceeded";

#[derive(Clone, Debug)]
struct Metrics {
    enrichment_total: Counter<u64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("smartcar-dashboard");
        Self {
            enrichment_total: meter
                .u64_counter("smartcar_enrichment_total")
                .with_description("Optional vehicle resource fetches by resource and outcome")
                .build(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct VehicleService {
    provider: Arc<dyn VehicleProvider>,
    deadline: Duration,
    metrics: Metrics,
}

impl VehicleService {
    /// `deadline` bounds one aggregation, counted from its start.
    #[must_use]
    pub fn new(provider: Arc<dyn VehicleProvider>, deadline: Duration) -> Self {
        Self { provider, deadline, metrics: Metrics::new() }
    }

    /// Builds a snapshot of the session's vehicle.
    ///
    /// The profile is mandatory. The optional resources are fetched one after
    /// another; each failure is recorded as `Enrichment::Unavailable` and
    /// never fails the snapshot. Resources still outstanding when the
    /// aggregation deadline passes are recorded as unavailable without
    /// waiting for Smartcar.
    ///
    /// # Errors
    /// Returns `AppError::MissingAccessToken` or `AppError::MissingVehicleId`
    /// when the session is incomplete, and `AppError::VehicleFetch` when the
    /// profile cannot be fetched.
    #[tracing::instrument(skip_all, fields(vehicle = tracing::field::Empty), err(level = "warn"))]
    pub async fn snapshot(&self, session: &Session) -> Result<VehicleSnapshot> {
        let deadline = Instant::now() + self.deadline;
        let access_token = session.access_token.as_deref().ok_or(AppError::MissingAccessToken)?;
        let vehicle_id = session.vehicle_id.as_deref().ok_or(AppError::MissingVehicleId)?;
        tracing::Span::current().record("vehicle", tracing::field::display(fragment(vehicle_id)));

        let profile = self.provider.vehicle(access_token, vehicle_id).await.map_err(AppError::VehicleFetch)?;
        tracing::debug!("Vehicle profile received");

        let mut snapshot = VehicleSnapshot::new(vehicle_id.to_string(), profile);
        for kind in EnrichmentKind::ALL {
            let fetch = self.provider.vehicle_resource(access_token, vehicle_id, kind);
            let result = if Instant::now() >= deadline {
                None
            } else {
                tokio::time::timeout_at(deadline, fetch).await.ok()
            };

            let enrichment = match result {
                Some(Ok(value)) => {
                    tracing::debug!(resource = kind.field(), "Vehicle resource received");
                    Enrichment::Present(value)
                }
                Some(Err(e)) => {
                    tracing::info!(resource = kind.field(), error = %e, "Vehicle resource unavailable");
                    Enrichment::Unavailable(e.to_string())
                }
                None => {
                    tracing::info!(resource = kind.field(), "Aggregation deadline passed, skipping resource");
                    Enrichment::Unavailable(DEADLINE_EXCEEDED.to_string())
                }
            };

            let outcome = if matches!(enrichment, Enrichment::Present(_)) { "present" } else { "unavailable" };
            self.metrics
                .enrichment_total
                .add(1, &[KeyValue::new("resource", kind.field()), KeyValue::new("outcome", outcome)]);
            snapshot.record(kind, enrichment);
        }

        Ok(snapshot)
    }

    /// Like [`Self::snapshot`], but retries once after `delay` when Smartcar
    /// fails. An incomplete session is not retried.
    ///
    /// # Errors
    /// Returns the error of the last attempt.
    pub async fn snapshot_with_retry(&self, session: &Session, delay: Duration) -> Result<VehicleSnapshot> {
        (|| self.snapshot(session))
            .retry(ConstantBuilder::default().with_delay(delay).with_max_times(1))
            .when(AppError::is_retryable)
            .notify(|e, after| {
                tracing::warn!(error = %e, retry_in_ms = after.as_millis(), "Vehicle fetch failed, retrying");
            })
            .await
    }
}

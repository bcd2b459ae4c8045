#![forbid(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::todo)]
#![warn(clippy::panic)]
#![warn(clippy::dbg_macro)]
#![warn(clippy::print_stdout)]
#![warn(clippy::print_stderr)]
#![warn(clippy::clone_on_ref_ptr)]
#![warn(unreachable_pub)]
#![warn(missing_debug_implementations)]
#![warn(unused_qualifications)]
#![deny(unused_must_use)]

pub mod adapters;
pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod frontend;
pub mod services;
pub mod telemetry;
pub mod workers;

use crate::adapters::session::build_store;
use crate::adapters::smartcar::SmartcarClient;
use crate::api::AppState;
use crate::config::{Config, SessionBackend};
use crate::services::exchange_service::ExchangeService;
use crate::services::provider::VehicleProvider;
use crate::services::vehicle_service::VehicleService;
use crate::workers::SessionCleanupWorker;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// A wired application: the HTTP router plus its background workers.
#[derive(Debug)]
pub struct App {
    pub router: axum::Router,
    pub workers: Workers,
}

#[derive(Debug, Default)]
pub struct Workers {
    session_cleanup: Option<SessionCleanupWorker>,
}

impl Workers {
    #[must_use]
    pub fn spawn_all(self, shutdown_rx: watch::Receiver<bool>) -> Vec<JoinHandle<()>> {
        let mut tasks = Vec::new();
        if let Some(worker) = self.session_cleanup {
            tasks.push(tokio::spawn(worker.run(shutdown_rx)));
        }
        tasks
    }
}

#[derive(Debug)]
pub struct AppBuilder {
    config: Config,
    provider: Option<Arc<dyn VehicleProvider>>,
}

impl AppBuilder {
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config, provider: None }
    }

    /// Overrides the Smartcar client.
    #[must_use]
    pub fn with_provider(mut self, provider: Arc<dyn VehicleProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Wires the services, the session store and the router.
    ///
    /// # Errors
    /// Returns an error if the configuration is inconsistent, or if the HTTP
    /// client or the router cannot be constructed.
    pub fn build(self) -> anyhow::Result<App> {
        let config = self.config;
        config.validate()?;
        let provider = match self.provider {
            Some(provider) => provider,
            None => Arc::new(SmartcarClient::new(&config.smartcar)?),
        };

        let (sessions, memory_store) = build_store(&config.session, config.server.environment);
        let session_cleanup = memory_store.map(|store| SessionCleanupWorker::new(store, config.session.cleanup_interval_secs));
        if config.session.backend == SessionBackend::Memory {
            tracing::info!("Sessions are kept in memory and will not survive a restart");
        }

        let state = AppState {
            exchange_service: ExchangeService::new(Arc::clone(&provider), config.smartcar.clone()),
            vehicle_service: VehicleService::new(provider, config.smartcar.aggregation_deadline()),
            sessions,
            config,
        };

        Ok(App { router: api::app_router(state)?, workers: Workers { session_cleanup } })
    }
}

/// Flips `shutdown_tx` on SIGINT or SIGTERM.
pub fn spawn_signal_handler(shutdown_tx: watch::Sender<bool>) {
    tokio::spawn(async move {
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut signal) => {
                    signal.recv().await;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to install SIGTERM handler");
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            () = ctrl_c => tracing::info!("Received Ctrl+C, shutting down"),
            () = terminate => tracing::info!("Received terminate signal, shutting down"),
        }

        let _ = shutdown_tx.send(true);
    });
}

/// Routes panics through tracing so they reach the configured log output.
pub fn setup_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        let location = info.location().map(ToString::to_string).unwrap_or_default();
        tracing::error!(panic = %info, %location, "Panic occurred");
    }));
}

use crate::adapters::session::SessionStore;
use crate::api::rate_limit::IpKeyExtractor;
use crate::config::Config;
use crate::services::exchange_service::ExchangeService;
use crate::services::vehicle_service::VehicleService;
use axum::body::Body;
use axum::http::{HeaderName, HeaderValue, Request, header};
use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use std::time::Duration;
use tower_governor::GovernorLayer;
use tower_governor::governor::GovernorConfigBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub mod cors;
pub mod exchange;
pub mod frontend;
pub mod health;
pub mod middleware;
pub mod rate_limit;
pub mod schemas;
pub mod session;
pub mod vehicle;

#[derive(Clone, Debug)]
pub struct AppState {
    pub config: Config,
    pub sessions: Arc<dyn SessionStore>,
    pub exchange_service: ExchangeService,
    pub vehicle_service: VehicleService,
}

/// Configures and returns the application router.
///
/// # Errors
/// Returns an error if the rate limiter configuration cannot be constructed.
pub fn app_router(state: AppState) -> anyhow::Result<Router> {
    let limits = &state.config.rate_limit;
    let interval_ns = 1_000_000_000 / limits.exchange_per_second.max(1);
    let exchange_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_nanosecond(u64::from(interval_ns))
            .burst_size(limits.exchange_burst.max(1))
            .key_extractor(IpKeyExtractor::new(state.config.server.trusted_proxies.clone()))
            .finish()
            .ok_or_else(|| anyhow::anyhow!("invalid exchange rate limit configuration"))?,
    );

    // Both routes hit the Smartcar token endpoint.
    let exchange_routes = Router::new()
        .route("/exchange", get(exchange::exchange))
        .route("/callback", get(frontend::callback))
        .layer(GovernorLayer::new(exchange_conf));

    let routes = Router::new()
        .route("/", get(frontend::index))
        .route("/status", get(session::status))
        .route("/debug", get(session::debug))
        .route("/disconnect", post(session::disconnect))
        .route("/vehicle", get(vehicle::vehicle))
        .route("/health", get(health::health));

    let request_timeout = Duration::from_secs(state.config.server.request_timeout_secs);
    let cors = cors::setup_cors(&state.config.server);

    Ok(Router::new()
        .merge(exchange_routes)
        .merge(routes)
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store, max-age=0"),
        ))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(cors)
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static("x-request-id")))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let request_id = request
                        .extensions()
                        .get::<tower_http::request_id::RequestId>()
                        .and_then(|id| id.header_value().to_str().ok())
                        .unwrap_or_default()
                        .to_string();

                    tracing::info_span!(
                        "request",
                        "request_id" = %request_id,
                        "http.request.method" = %request.method(),
                        "url.path" = %request.uri().path(),
                        "http.response.status_code" = tracing::field::Empty,
                        "otel.kind" = "server",
                    )
                })
                .on_response(|response: &axum::http::Response<_>, latency: Duration, span: &tracing::Span| {
                    let status = response.status();
                    span.record("http.response.status_code", status.as_u16());

                    tracing::info!(latency_ms = %latency.as_millis(), status = %status.as_u16(), "request completed");
                })
                .on_failure(|error, _latency, _span: &tracing::Span| {
                    tracing::error!(error = %error, "request failed");
                }),
        )
        .layer(SetRequestIdLayer::new(HeaderName::from_static("x-request-id"), MakeRequestUuid))
        .with_state(state))
}

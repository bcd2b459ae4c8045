#![allow(dead_code)]
use axum::{
    Form, Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use clap::Parser;
use serde::Deserialize;
use serde_json::{Value, json};
use smartcar_dashboard::AppBuilder;
use smartcar_dashboard::config::{Config, Environment, SessionBackend};
use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;
use tokio::net::TcpListener;

static INIT: Once = Once::new();

pub const VEHICLE_ID: &str = "36ab27d0-fd9d-4455-823a-ce30af709ffc";

pub fn setup_tracing() {
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "warn".into())
            .add_directive("smartcar_dashboard=debug".parse().unwrap())
            .add_directive("tower=warn".parse().unwrap())
            .add_directive("hyper=warn".parse().unwrap())
            .add_directive("reqwest=warn".parse().unwrap())
            .add_directive("rustls=warn".parse().unwrap());

        tracing_subscriber::fmt().with_env_filter(filter).init();
    });
}

pub fn get_test_config() -> Config {
    let mut config = Config::try_parse_from(["smartcar-dashboard"]).unwrap();
    config.server.host = "127.0.0.1".to_string();
    config.server.port = 0;
    config.server.environment = Environment::Development;
    config.server.request_timeout_secs = 30;
    config.server.trusted_proxies = vec!["127.0.0.1/32".parse().unwrap(), "::1/128".parse().unwrap()];
    config.smartcar.client_id = Some("test-client".to_string());
    config.smartcar.client_secret = Some("test-secret".to_string());
    config.smartcar.redirect_uri = Some("http://localhost:3001/callback".to_string());
    config.smartcar.request_timeout_ms = 2_000;
    config.smartcar.aggregation_deadline_ms = 5_000;
    config.smartcar.scopes = ["required:read_vehicle_info", "read_odometer", "read_location", "read_battery", "read_fuel"]
        .iter()
        .map(ToString::to_string)
        .collect();
    config.session.backend = SessionBackend::Cookie;
    config.session.cleanup_interval_secs = 0;
    config.frontend.retry_delay_ms = 10;
    config.rate_limit.exchange_per_second = 10_000;
    config.rate_limit.exchange_burst = 10_000;
    config.telemetry.otlp_endpoint = None;
    config
}

/// Behaviour of the fake Smartcar API.
#[derive(Debug, Default)]
pub struct MockSmartcar {
    pub vehicles: Mutex<Vec<String>>,
    pub failing_resources: Mutex<HashSet<&'static str>>,
    pub profile_failures: AtomicUsize,
    pub profile_delay: Mutex<Option<Duration>>,
    pub resource_delay: Mutex<Option<Duration>>,
    pub token_calls: AtomicUsize,
    pub profile_calls: AtomicUsize,
}

impl MockSmartcar {
    pub fn with_vehicles(ids: &[&str]) -> Arc<Self> {
        let mock = Self::default();
        *mock.vehicles.lock().unwrap() = ids.iter().map(ToString::to_string).collect();
        Arc::new(mock)
    }

    pub fn fail_resources(&self, resources: &[&'static str]) {
        self.failing_resources.lock().unwrap().extend(resources);
    }

    pub fn token_calls(&self) -> usize {
        self.token_calls.load(Ordering::SeqCst)
    }

    pub fn profile_calls(&self) -> usize {
        self.profile_calls.load(Ordering::SeqCst)
    }
}

#[derive(Deserialize)]
struct TokenForm {
    grant_type: String,
    code: String,
    redirect_uri: String,
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers.get(header::AUTHORIZATION)?.to_str().ok()?.strip_prefix("Bearer ")
}

fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({"type": "AUTHENTICATION", "description": "Invalid access token"})))
        .into_response()
}

async fn token(State(mock): State<Arc<MockSmartcar>>, headers: HeaderMap, Form(form): Form<TokenForm>) -> Response {
    mock.token_calls.fetch_add(1, Ordering::SeqCst);
    let authorized = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("Basic "));

    if !authorized || form.grant_type != "authorization_code" || form.redirect_uri.is_empty() {
        return (StatusCode::BAD_REQUEST, Json(json!({"error": "invalid_request"}))).into_response();
    }
    if form.code == "expired-code" {
        return (StatusCode::BAD_REQUEST, Json(json!({"error": "invalid_grant", "error_description": "Code expired"})))
            .into_response();
    }

    Json(json!({
        "access_token": format!("access-token-for-{}", form.code),
        "refresh_token": format!("refresh-token-for-{}", form.code),
        "expires_in": 7200,
        "token_type": "Bearer",
    }))
    .into_response()
}

async fn vehicles(State(mock): State<Arc<MockSmartcar>>, headers: HeaderMap) -> Response {
    if bearer(&headers).is_none() {
        return unauthorized();
    }
    let vehicles = mock.vehicles.lock().unwrap().clone();
    Json(json!({"vehicles": vehicles, "paging": {"count": vehicles.len(), "offset": 0}})).into_response()
}

async fn vehicle(State(mock): State<Arc<MockSmartcar>>, Path(id): Path<String>, headers: HeaderMap) -> Response {
    if bearer(&headers).is_none() {
        return unauthorized();
    }
    mock.profile_calls.fetch_add(1, Ordering::SeqCst);

    let delay = *mock.profile_delay.lock().unwrap();
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    let failures = mock.profile_failures.load(Ordering::SeqCst);
    if failures > 0 {
        mock.profile_failures.store(failures - 1, Ordering::SeqCst);
        return (StatusCode::BAD_GATEWAY, Json(json!({"type": "UPSTREAM", "code": "UNKNOWN_ISSUE"}))).into_response();
    }
    if !mock.vehicles.lock().unwrap().contains(&id) {
        return (StatusCode::NOT_FOUND, Json(json!({"type": "RESOURCE_NOT_FOUND"}))).into_response();
    }

    Json(json!({"id": id, "make": "TESLA", "model": "Model 3", "year": 2021})).into_response()
}

async fn resource(
    State(mock): State<Arc<MockSmartcar>>,
    Path((_id, resource)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    if bearer(&headers).is_none() {
        return unauthorized();
    }
    let delay = *mock.resource_delay.lock().unwrap();
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    if mock.failing_resources.lock().unwrap().contains(resource.as_str()) {
        return (StatusCode::CONFLICT, Json(json!({"type": "COMPATIBILITY", "code": "SMARTCAR_NOT_CAPABLE"})))
            .into_response();
    }

    let body: Value = match resource.as_str() {
        "info" => json!({"vin": "5YJ3E1EA7KF317000"}),
        "location" => json!({"latitude": 37.4292, "longitude": 122.1381}),
        "odometer" => json!({"distance": 10_432.61}),
        "battery" => json!({"percentRemaining": 0.3, "range": 40.5}),
        "fuel" => json!({"percentRemaining": 0.5, "range": 120.0, "amountRemaining": 20.0}),
        _ => return (StatusCode::NOT_FOUND, Json(json!({"type": "RESOURCE_NOT_FOUND"}))).into_response(),
    };
    Json(body).into_response()
}

/// Serves `mock` on an ephemeral port and returns its base URL.
pub async fn spawn_mock_smartcar(mock: Arc<MockSmartcar>) -> String {
    let router = Router::new()
        .route("/oauth/token", post(token))
        .route("/v2.0/vehicles", get(vehicles))
        .route("/v2.0/vehicles/{id}", get(vehicle))
        .route("/v2.0/vehicles/{id}/{resource}", get(resource))
        .with_state(mock);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

pub struct TestApp {
    pub server_url: String,
    pub client: reqwest::Client,
    pub config: Config,
    pub mock: Arc<MockSmartcar>,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(get_test_config(), MockSmartcar::with_vehicles(&[VEHICLE_ID])).await
    }

    pub async fn spawn_with(mut config: Config, mock: Arc<MockSmartcar>) -> Self {
        let mock_url = spawn_mock_smartcar(Arc::clone(&mock)).await;
        config.smartcar.auth_url = format!("{mock_url}/oauth/token");
        config.smartcar.api_url = format!("{mock_url}/v2.0");
        Self::start(config, mock).await
    }

    /// Starts the dashboard against whatever Smartcar URLs `config` names.
    pub async fn start(config: Config, mock: Arc<MockSmartcar>) -> Self {
        setup_tracing();
        let app = AppBuilder::new(config.clone()).build().unwrap();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app.router.into_make_service_with_connect_info::<SocketAddr>()).await.unwrap();
        });

        Self { server_url: format!("http://{addr}"), client: Self::new_client(), config, mock }
    }

    /// A fresh browser: its own cookie jar, redirects not followed.
    pub fn new_client() -> reqwest::Client {
        reqwest::Client::builder().cookie_store(true).redirect(reqwest::redirect::Policy::none()).build().unwrap()
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.server_url)
    }

    pub async fn get_json(&self, client: &reqwest::Client, path: &str) -> (StatusCode, Value) {
        let resp = client.get(self.url(path)).send().await.unwrap();
        let status = StatusCode::from_u16(resp.status().as_u16()).unwrap();
        (status, resp.json().await.unwrap())
    }

    /// Runs the code exchange for `client`, so its cookie jar holds a session.
    pub async fn connect(&self, client: &reqwest::Client) -> Value {
        let (status, body) = self.get_json(client, "/exchange?code=valid-code").await;
        assert_eq!(status, StatusCode::OK, "exchange failed: {body}");
        body
    }
}

#![allow(clippy::unwrap_used, clippy::panic, clippy::todo, clippy::missing_panics_doc, clippy::must_use_candidate, missing_debug_implementations, clippy::clone_on_ref_ptr, unreachable_pub)]
use axum::http::StatusCode;
use common::{MockSmartcar, TestApp, VEHICLE_ID};
use smartcar_dashboard::config::{Environment, SessionBackend};
mod common;

#[tokio::test]
async fn test_status_without_session() {
    let app = TestApp::spawn().await;

    let (status, body) = app.get_json(&app.client, "/status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "running");
    assert_eq!(body["hasToken"], false);
    assert_eq!(body["hasVehicleId"], false);
    assert!(body["accessTokenFragment"].is_null());
    assert!(body["vehicleIdFragment"].is_null());
}

#[tokio::test]
async fn test_status_is_masked_and_idempotent() {
    let app = TestApp::spawn().await;
    app.connect(&app.client).await;

    let (_, first) = app.get_json(&app.client, "/status").await;
    let (_, second) = app.get_json(&app.client, "/status").await;
    assert_eq!(first, second);

    assert_eq!(first["hasToken"], true);
    assert_eq!(first["accessTokenFragment"], "access-tok...");
    assert_eq!(first["vehicleIdFragment"], "36ab27d0-f...");

    let raw = first.to_string();
    assert!(!raw.contains("access-token-for-valid-code"));
    assert!(!raw.contains(VEHICLE_ID));
}

#[tokio::test]
async fn test_debug_never_reveals_full_vehicle_id() {
    let app = TestApp::spawn().await;
    app.connect(&app.client).await;

    let (status, body) = app.get_json(&app.client, "/debug").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["hasAccessToken"], true);
    assert_eq!(body["hasRefreshToken"], true);
    assert_eq!(body["hasVehicleId"], true);
    assert!(!body.to_string().contains(VEHICLE_ID));
    assert!(!body.to_string().contains("refresh-token-for"));
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::spawn().await;

    let resp = app.client.get(app.url("/health")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().contains_key("x-request-id"));

    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Smartcar API is running");
    assert_eq!(body["status"], "online");
    assert_eq!(body["env"], "development");
}

#[tokio::test]
async fn test_request_id_is_propagated() {
    let app = TestApp::spawn().await;

    let resp = app.client.get(app.url("/health")).header("x-request-id", "abc-123").send().await.unwrap();
    assert_eq!(resp.headers()["x-request-id"], "abc-123");
}

#[tokio::test]
async fn test_disconnect_clears_session() {
    let app = TestApp::spawn().await;
    app.connect(&app.client).await;

    let resp = app.client.post(app.url("/disconnect")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let (_, body) = app.get_json(&app.client, "/status").await;
    assert_eq!(body["hasToken"], false);
    assert_eq!(body["hasVehicleId"], false);

    let (status, _) = app.get_json(&app.client, "/vehicle").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_disconnect_form_redirects_home() {
    let app = TestApp::spawn().await;
    app.connect(&app.client).await;

    let resp = app.client.post(app.url("/disconnect")).form(&[("confirm", "1")]).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(resp.headers()["location"], "/");
}

#[tokio::test]
async fn test_production_cookies_are_secure() {
    let mut config = common::get_test_config();
    config.server.environment = Environment::Production;
    let app = TestApp::spawn_with(config, MockSmartcar::with_vehicles(&[VEHICLE_ID])).await;

    let resp = app.client.get(app.url("/exchange?code=valid-code")).send().await.unwrap();
    let cookies: Vec<&str> = resp.headers().get_all("set-cookie").iter().map(|v| v.to_str().unwrap()).collect();
    assert!(!cookies.is_empty());
    assert!(cookies.iter().all(|c| c.ends_with("; Secure")));
}

#[tokio::test]
async fn test_memory_backend_keeps_tokens_server_side() {
    let mut config = common::get_test_config();
    config.session.backend = SessionBackend::Memory;
    let app = TestApp::spawn_with(config, MockSmartcar::with_vehicles(&[VEHICLE_ID])).await;

    let resp = app.client.get(app.url("/exchange?code=valid-code")).send().await.unwrap();
    let cookies: Vec<&str> = resp.headers().get_all("set-cookie").iter().map(|v| v.to_str().unwrap()).collect();
    assert_eq!(cookies.len(), 1);
    assert!(cookies[0].starts_with("smartcar_session="));
    assert!(!cookies[0].contains("access-token-for"));

    let (status, body) = app.get_json(&app.client, "/vehicle").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], VEHICLE_ID);
}

#[tokio::test]
async fn test_memory_backend_isolates_clients() {
    let mut config = common::get_test_config();
    config.session.backend = SessionBackend::Memory;
    let app = TestApp::spawn_with(config, MockSmartcar::with_vehicles(&[VEHICLE_ID])).await;

    let alice = TestApp::new_client();
    let bob = TestApp::new_client();
    app.connect(&alice).await;

    let (_, alice_status) = app.get_json(&alice, "/status").await;
    let (_, bob_status) = app.get_json(&bob, "/status").await;
    assert_eq!(alice_status["hasToken"], true);
    assert_eq!(bob_status["hasToken"], false);

    app.connect(&bob).await;
    bob.post(app.url("/disconnect")).send().await.unwrap();

    let (_, alice_status) = app.get_json(&alice, "/status").await;
    let (_, bob_status) = app.get_json(&bob, "/status").await;
    assert_eq!(alice_status["hasToken"], true);
    assert_eq!(bob_status["hasToken"], false);
}

#[tokio::test]
async fn test_cookie_backend_isolates_clients() {
    let app = TestApp::spawn().await;

    let other = TestApp::new_client();
    app.connect(&app.client).await;

    let (_, body) = app.get_json(&other, "/status").await;
    assert_eq!(body["hasToken"], false);
}

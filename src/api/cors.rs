use crate::config::ServerConfig;
use axum::http::{HeaderValue, Method, header};
use tower_http::cors::{AllowOrigin, CorsLayer};

/// CORS for the JSON endpoints. `*` (or an empty value) allows any origin;
/// otherwise the value is a comma-separated origin list.
#[must_use]
pub fn setup_cors(config: &ServerConfig) -> CorsLayer {
    let origins = config.cors_allowed_origins.trim();
    let allow_origin = if origins.is_empty() || origins == "*" {
        AllowOrigin::any()
    } else {
        let list: Vec<HeaderValue> = origins
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .filter_map(|s| HeaderValue::from_str(s).ok())
            .collect();
        if list.is_empty() {
            tracing::warn!(origins, "No valid CORS origin configured, allowing any");
            AllowOrigin::any()
        } else {
            AllowOrigin::list(list)
        }
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
}

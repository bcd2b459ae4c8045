//! Server-rendered dashboard pages.

use crate::config::SmartcarConfig;
use crate::domain::vehicle::{EnrichmentKind, VehicleSnapshot};
use html_escape::{encode_double_quoted_attribute, encode_text};
use serde_json::Value;
use std::fmt::Write;
use url::Url;

const NOT_AVAILABLE: &str = "N/A";
const KM_PER_MILE: f64 = 1.6;

/// Link to the Smartcar authorization dialog, or `None` when the client id
/// or redirect URI is not configured.
#[must_use]
pub fn authorize_url(config: &SmartcarConfig) -> Option<String> {
    let client_id = config.client_id.as_deref().map(str::trim).filter(|v| !v.is_empty())?;
    let redirect_uri = config.redirect_uri.as_deref().map(str::trim).filter(|v| !v.is_empty())?;

    let scope = config.scopes.join(" ");
    let url = Url::parse_with_params(
        &config.connect_url,
        &[
            ("response_type", "code"),
            ("client_id", client_id),
            ("redirect_uri", redirect_uri),
            ("scope", scope.as_str()),
            ("mode", config.mode.as_str()),
            ("approval_prompt", "force"),
        ],
    );

    match url {
        Ok(url) => Some(url.into()),
        Err(e) => {
            tracing::error!(error = %e, connect_url = %config.connect_url, "Invalid Smartcar connect URL");
            None
        }
    }
}

/// Rounds to an integer and groups thousands with commas.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn format_number(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    let rounded = value.round() as i64;
    let digits = rounded.unsigned_abs().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if rounded < 0 {
        grouped.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

/// Landing page offering the connect button, with an optional error banner.
#[must_use]
pub fn connect_page(authorize_url: Option<&str>, error: Option<&str>) -> String {
    let mut body = String::new();

    if let Some(error) = error.filter(|e| !e.trim().is_empty()) {
        let _ = write!(body, r#"<div class="banner error" role="alert">{}</div>"#, encode_text(error));
    }

    body.push_str(
        r#"<section class="card connect">
<h2>Connect Your Vehicle</h2>
<p>Connect your vehicle to see its location, odometer reading and more.</p>
<ul class="features">
<li>Secure connection using OAuth</li>
<li>Works with major vehicle brands</li>
<li>Credentials are kept in HttpOnly cookies</li>
</ul>
"#,
    );
    match authorize_url {
        Some(url) => {
            let _ = write!(
                body,
                r#"<a class="button primary" href="{}">Connect Vehicle</a>"#,
                encode_double_quoted_attribute(url)
            );
        }
        None => body.push_str(
            r#"<p class="banner error">Smartcar is not configured: set SMARTCAR_CLIENT_ID and SMARTCAR_REDIRECT_URI.</p>"#,
        ),
    }
    body.push_str("\n</section>");

    layout("Connect your vehicle", &body)
}

/// Dashboard showing everything known about the connected vehicle.
#[must_use]
pub fn vehicle_page(snapshot: &VehicleSnapshot) -> String {
    let doc = snapshot.to_json(false);
    let text = |v: Option<&Value>, fallback: &str| v.and_then(display_value).unwrap_or_else(|| fallback.to_string());

    let make = text(snapshot.attribute("make"), "Unknown");
    let model = text(snapshot.attribute("model"), "Vehicle");
    let year = text(snapshot.attribute("year"), NOT_AVAILABLE);
    let vin = text(snapshot.get(EnrichmentKind::Info).and_then(|info| info.get("vin")), NOT_AVAILABLE);

    let mut body = String::new();
    let _ = write!(
        body,
        r#"<section class="card vehicle">
<header>
<h2>{make} {model} ({year})</h2>
<span class="badge">Connected</span>
<p>VIN: {vin}</p>
<p>ID: <code>{id}</code></p>
</header>
<div class="grid">
"#,
        make = encode_text(&make),
        model = encode_text(&model),
        year = encode_text(&year),
        vin = encode_text(&vin),
        id = encode_text(&snapshot.id),
    );

    body.push_str(&odometer_section(snapshot.get(EnrichmentKind::Odometer)));
    body.push_str(&location_section(snapshot.get(EnrichmentKind::Location)));
    body.push_str(&battery_section(snapshot.get(EnrichmentKind::Battery)));
    body.push_str(&fuel_section(snapshot.get(EnrichmentKind::Fuel)));

    let properties: Vec<&str> = doc.as_object().map(|m| m.keys().map(String::as_str).collect()).unwrap_or_default();
    let raw = serde_json::to_string_pretty(&doc).unwrap_or_default();
    let _ = write!(
        body,
        r#"</div>
<div class="debug">
<h4>Debug Information</h4>
<p>Data properties: {properties}</p>
<details><summary>View Raw Data</summary><pre>{raw}</pre></details>
</div>
<form method="post" action="/disconnect"><button class="button" type="submit">Disconnect</button></form>
</section>"#,
        properties = encode_text(&properties.join(", ")),
        raw = encode_text(&raw),
    );

    layout("Your vehicle", &body)
}

fn odometer_section(odometer: Option<&Value>) -> String {
    let content = odometer.map_or_else(
        || "<p>Odometer information not available</p>".to_string(),
        |o| {
            let distance = o.get("distance").and_then(Value::as_f64).unwrap_or_default();
            let unit = o.get("unit").and_then(Value::as_str).unwrap_or("miles");
            format!("<p>{} {}</p>", format_number(distance), encode_text(unit))
        },
    );
    section("Odometer", &content)
}

fn location_section(location: Option<&Value>) -> String {
    let content = location.map_or_else(
        || "<p>Location information not available</p>".to_string(),
        |l| {
            let coordinate = |name: &str| l.get(name).and_then(display_value).unwrap_or_else(|| "0".to_string());
            format!(
                "<p>Latitude: {}</p>\n<p>Longitude: {}</p>",
                encode_text(&coordinate("latitude")),
                encode_text(&coordinate("longitude"))
            )
        },
    );
    section("Current Location", &content)
}

fn battery_section(battery: Option<&Value>) -> String {
    let content = battery.map_or_else(
        || "<p>Battery information not available</p>".to_string(),
        |b| {
            let mut content = level_paragraph(b);
            // Smartcar reports range in kilometers.
            if let Some(range) = b.get("range").and_then(Value::as_f64) {
                let _ = write!(content, "\n<p>Estimated range: {} miles</p>", format_number(range / KM_PER_MILE));
            }
            content
        },
    );
    section("Battery", &content)
}

fn fuel_section(fuel: Option<&Value>) -> String {
    let content = fuel.map_or_else(|| "<p>Fuel information not available</p>".to_string(), level_paragraph);
    section("Fuel", &content)
}

/// `percentRemaining` is reported as a fraction between 0 and 1.
fn level_paragraph(resource: &Value) -> String {
    resource.get("percentRemaining").and_then(Value::as_f64).map_or_else(
        || "<p>Level: N/A</p>".to_string(),
        |fraction| format!("<p>Level: {}%</p>", format_number(fraction * 100.0)),
    )
}

fn section(title: &str, content: &str) -> String {
    format!("<div class=\"data-item\">\n<h4>{title}</h4>\n{content}\n</div>\n")
}

fn display_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title} | Smartcar Dashboard</title>
<style>
body {{ font-family: system-ui, sans-serif; margin: 0; background: #f5f6f8; color: #1f2933; }}
main {{ max-width: 56rem; margin: 2rem auto; padding: 0 1rem; }}
.card {{ background: #fff; border-radius: 0.75rem; padding: 1.5rem; box-shadow: 0 1px 3px rgba(0,0,0,.1); }}
.grid {{ display: grid; grid-template-columns: repeat(auto-fit, minmax(14rem, 1fr)); gap: 1rem; }}
.banner.error {{ background: #fde8e8; color: #9b1c1c; padding: 0.75rem 1rem; border-radius: 0.5rem; margin-bottom: 1rem; }}
.badge {{ background: #def7ec; color: #03543f; padding: 0.25rem 0.75rem; border-radius: 999px; font-size: 0.875rem; }}
.button {{ display: inline-block; padding: 0.6rem 1.2rem; border-radius: 0.5rem; border: 1px solid #cbd2d9; background: #fff; cursor: pointer; text-decoration: none; color: inherit; }}
.button.primary {{ background: #1a56db; border-color: #1a56db; color: #fff; }}
pre {{ overflow-x: auto; background: #f0f2f5; padding: 1rem; border-radius: 0.5rem; }}
</style>
</head>
<body>
<main>
<h1>Smartcar Dashboard</h1>
{body}
</main>
</body>
</html>
"#,
        title = encode_text(title),
    )
}

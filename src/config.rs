use clap::{Args, Parser, ValueEnum};
use ipnetwork::IpNetwork;
use std::time::Duration;

#[derive(Clone, Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Config {
    #[command(flatten)]
    pub server: ServerConfig,

    #[command(flatten)]
    pub smartcar: SmartcarConfig,

    #[command(flatten)]
    pub session: SessionConfig,

    #[command(flatten)]
    pub frontend: FrontendConfig,

    #[command(flatten)]
    pub rate_limit: RateLimitConfig,

    #[command(flatten)]
    pub telemetry: TelemetryConfig,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
        }
    }

    #[must_use]
    pub const fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Clone, Debug, Args)]
pub struct ServerConfig {
    /// Host to listen on
    #[arg(long, env = "DASHBOARD_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 3001)]
    pub port: u16,

    /// Runtime environment; production marks cookies as Secure
    #[arg(long = "env", env = "DASHBOARD_ENV", value_enum, default_value_t = Environment::Development)]
    pub environment: Environment,

    /// Seconds to wait for background workers during shutdown
    #[arg(long, env = "DASHBOARD_SHUTDOWN_TIMEOUT_SECS", default_value_t = 5)]
    pub shutdown_timeout_secs: u64,

    /// Upper bound on the time spent serving a single request
    #[arg(long, env = "DASHBOARD_REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    pub request_timeout_secs: u64,

    /// Comma-separated list of CIDRs to trust for X-Forwarded-For IP extraction
    #[arg(
        long,
        env = "DASHBOARD_TRUSTED_PROXIES",
        default_value = "10.0.0.0/8,172.16.0.0/12,192.168.0.0/16,127.0.0.1/32",
        value_delimiter = ','
    )]
    pub trusted_proxies: Vec<IpNetwork>,

    /// Comma-separated list of allowed CORS origins, or `*`
    #[arg(long, env = "DASHBOARD_CORS_ALLOWED_ORIGINS", default_value = "*")]
    pub cors_allowed_origins: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum SmartcarMode {
    #[default]
    Live,
    Test,
    Simulated,
}

impl SmartcarMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Test => "test",
            Self::Simulated => "simulated",
        }
    }
}

#[derive(Clone, Debug, Args)]
pub struct SmartcarConfig {
    /// OAuth client id issued by Smartcar
    #[arg(long, env = "SMARTCAR_CLIENT_ID")]
    pub client_id: Option<String>,

    /// OAuth client secret issued by Smartcar
    #[arg(long, env = "SMARTCAR_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: Option<String>,

    /// Redirect URI registered with Smartcar
    #[arg(long, env = "SMARTCAR_REDIRECT_URI")]
    pub redirect_uri: Option<String>,

    /// Connect mode requested from the authorization dialog
    #[arg(long, env = "SMARTCAR_MODE", value_enum, default_value_t = SmartcarMode::Live)]
    pub mode: SmartcarMode,

    /// Permissions requested from the vehicle owner
    #[arg(
        long,
        env = "SMARTCAR_SCOPES",
        default_value = "required:read_vehicle_info,read_odometer,read_location,read_battery,read_fuel",
        value_delimiter = ','
    )]
    pub scopes: Vec<String>,

    /// Token endpoint
    #[arg(long, env = "SMARTCAR_AUTH_URL", default_value = "https://auth.smartcar.com/oauth/token")]
    pub auth_url: String,

    /// Base URL of the vehicle REST API
    #[arg(long, env = "SMARTCAR_API_URL", default_value = "https://api.smartcar.com/v2.0")]
    pub api_url: String,

    /// Hosted authorization dialog
    #[arg(long, env = "SMARTCAR_CONNECT_URL", default_value = "https://connect.smartcar.com/oauth/authorize")]
    pub connect_url: String,

    /// Timeout applied to every call made to Smartcar
    #[arg(long, env = "SMARTCAR_REQUEST_TIMEOUT_MS", default_value_t = 10_000)]
    pub request_timeout_ms: u64,

    /// Time budget for one vehicle aggregation; optional resources still
    /// pending when it runs out are reported as unavailable
    #[arg(long, env = "SMARTCAR_AGGREGATION_DEADLINE_MS", default_value_t = 12_000)]
    pub aggregation_deadline_ms: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum SessionBackend {
    /// Tokens live in HttpOnly cookies on the client
    #[default]
    Cookie,
    /// Tokens live in process memory, keyed by a session cookie
    Memory,
}

#[derive(Clone, Debug, Args)]
pub struct SessionConfig {
    /// Where session credentials are kept
    #[arg(long, env = "DASHBOARD_SESSION_BACKEND", value_enum, default_value_t = SessionBackend::Cookie)]
    pub backend: SessionBackend,

    /// Lifetime of the access token and vehicle id
    #[arg(long, env = "DASHBOARD_ACCESS_COOKIE_MAX_AGE_SECS", default_value_t = 7200)]
    pub access_max_age_secs: u64,

    /// Lifetime of the refresh token
    #[arg(long, env = "DASHBOARD_REFRESH_COOKIE_MAX_AGE_SECS", default_value_t = 2_592_000)]
    pub refresh_max_age_secs: u64,

    /// How often expired in-memory sessions are purged (0 disables the worker)
    #[arg(long, env = "DASHBOARD_SESSION_CLEANUP_INTERVAL_SECS", default_value_t = 300)]
    pub cleanup_interval_secs: u64,
}

#[derive(Clone, Debug, Args)]
pub struct FrontendConfig {
    /// Delay before the dashboard retries a failed vehicle fetch
    #[arg(long, env = "DASHBOARD_RETRY_DELAY_MS", default_value_t = 2000)]
    pub retry_delay_ms: u64,
}

#[derive(Clone, Debug, Args)]
pub struct RateLimitConfig {
    /// Requests per second allowed for the code exchange endpoints
    #[arg(long, env = "DASHBOARD_EXCHANGE_RATE_LIMIT_PER_SECOND", default_value_t = 1)]
    pub exchange_per_second: u32,

    /// Burst allowance for the code exchange endpoints
    #[arg(long, env = "DASHBOARD_EXCHANGE_RATE_LIMIT_BURST", default_value_t = 5)]
    pub exchange_burst: u32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Clone, Debug, Args)]
pub struct TelemetryConfig {
    /// Log output format
    #[arg(long, env = "DASHBOARD_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// OTLP collector endpoint; traces and metrics are exported when set
    #[arg(long, env = "DASHBOARD_OTLP_ENDPOINT")]
    pub otlp_endpoint: Option<String>,
}

impl SmartcarConfig {
    #[must_use]
    pub const fn aggregation_deadline(&self) -> Duration {
        Duration::from_millis(self.aggregation_deadline_ms)
    }
}

impl Config {
    #[must_use]
    pub fn load() -> Self {
        Self::parse()
    }

    /// Longest time the dashboard can spend on one page: an aggregation, the
    /// retry delay and a second aggregation. An aggregation ends at its
    /// deadline unless the mandatory profile call is still running.
    #[must_use]
    pub fn dashboard_budget(&self) -> Duration {
        let attempt = self.smartcar.request_timeout_ms.max(self.smartcar.aggregation_deadline_ms);
        Duration::from_millis(attempt.saturating_mul(2).saturating_add(self.frontend.retry_delay_ms))
    }

    /// Checks settings that only make sense together.
    ///
    /// # Errors
    /// Returns an error when the request timeout would cut off a dashboard
    /// render before the vehicle aggregation has had its full budget.
    pub fn validate(&self) -> anyhow::Result<()> {
        let request_timeout = Duration::from_secs(self.server.request_timeout_secs);
        let budget = self.dashboard_budget();
        if request_timeout <= budget {
            anyhow::bail!(
                "DASHBOARD_REQUEST_TIMEOUT_SECS ({}s) must exceed the dashboard budget of {}ms \
                 (2 x max(SMARTCAR_REQUEST_TIMEOUT_MS, SMARTCAR_AGGREGATION_DEADLINE_MS) + DASHBOARD_RETRY_DELAY_MS)",
                self.server.request_timeout_secs,
                budget.as_millis()
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    // Read from the command definition so values set in the environment
    // cannot leak into the assertions.
    fn default_of(id: &str) -> String {
        let command = Config::command();
        let arg = command.get_arguments().find(|a| a.get_id() == id).unwrap();
        arg.get_default_values().iter().map(|v| v.to_string_lossy().into_owned()).collect::<Vec<_>>().join(",")
    }

    fn config_with_defaults() -> Config {
        let args = [
            "smartcar-dashboard",
            "--request-timeout-secs",
            "30",
            "--request-timeout-ms",
            "10000",
            "--aggregation-deadline-ms",
            "12000",
            "--retry-delay-ms",
            "2000",
        ];
        Config::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_defaults() {
        assert_eq!(default_of("environment"), "development");
        assert_eq!(default_of("port"), "3001");
        assert_eq!(default_of("backend"), "cookie");
        assert_eq!(default_of("access_max_age_secs"), "7200");
        assert_eq!(default_of("refresh_max_age_secs"), (60 * 60 * 24 * 30).to_string());
        assert_eq!(default_of("request_timeout_ms"), "10000");
        assert_eq!(default_of("aggregation_deadline_ms"), "12000");
        assert_eq!(default_of("request_timeout_secs"), "30");
        assert_eq!(default_of("retry_delay_ms"), "2000");
    }

    #[test]
    fn test_default_scopes_cover_every_resource() {
        let scopes = default_of("scopes");
        for scope in ["read_vehicle_info", "read_odometer", "read_location", "read_battery", "read_fuel"] {
            assert!(scopes.contains(scope), "missing {scope}");
        }
    }

    #[test]
    fn test_default_timeouts_fit_request_cap() {
        let config = config_with_defaults();
        assert_eq!(config.dashboard_budget(), Duration::from_millis(26_000));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_request_cap_below_budget_is_rejected() {
        let mut config = config_with_defaults();
        config.server.request_timeout_secs = 20;
        assert!(config.validate().is_err());

        config.server.request_timeout_secs = 30;
        config.smartcar.request_timeout_ms = 20_000;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("42000ms"));
    }

    #[test]
    fn test_flags_override_defaults() {
        let config = Config::try_parse_from([
            "smartcar-dashboard",
            "--env",
            "production",
            "--backend",
            "memory",
            "--client-id",
            "abc",
            "--mode",
            "simulated",
            "--trusted-proxies",
            "127.0.0.1/32,::1/128",
        ])
        .unwrap();

        assert!(config.server.environment.is_production());
        assert_eq!(config.session.backend, SessionBackend::Memory);
        assert_eq!(config.smartcar.client_id.as_deref(), Some("abc"));
        assert_eq!(config.smartcar.mode.as_str(), "simulated");
        assert_eq!(config.server.trusted_proxies.len(), 2);
    }
}

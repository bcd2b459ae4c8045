use crate::config::SmartcarConfig;
use serde::{Deserialize, Serialize};

/// Token pair returned by the Smartcar token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
    pub expires_in: Option<u64>,
    pub token_type: Option<String>,
}

/// Application credentials used for the code exchange.
#[derive(Clone)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

impl std::fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &crate::domain::session::fragment(&self.client_id))
            .field("client_secret", &"<redacted>")
            .field("redirect_uri", &self.redirect_uri)
            .finish()
    }
}

/// Which credentials are absent from the configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingCredentials {
    pub client_id: bool,
    pub client_secret: bool,
    pub redirect_uri: bool,
}

impl ClientCredentials {
    /// Collects the credentials from configuration. Empty values count as missing.
    ///
    /// # Errors
    /// Returns which values are missing when any of the three is absent.
    pub fn from_config(config: &SmartcarConfig) -> Result<Self, MissingCredentials> {
        let present = |v: &Option<String>| v.as_deref().filter(|s| !s.trim().is_empty()).map(str::to_string);

        match (present(&config.client_id), present(&config.client_secret), present(&config.redirect_uri)) {
            (Some(client_id), Some(client_secret), Some(redirect_uri)) => {
                Ok(Self { client_id, client_secret, redirect_uri })
            }
            (id, secret, redirect) => Err(MissingCredentials {
                client_id: id.is_none(),
                client_secret: secret.is_none(),
                redirect_uri: redirect.is_none(),
            }),
        }
    }
}

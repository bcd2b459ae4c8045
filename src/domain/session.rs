use crate::domain::token::TokenGrant;

/// Number of leading characters of a secret that may be shown to a client.
pub const FRAGMENT_LEN: usize = 10;

/// Credentials held for one browser client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub vehicle_id: Option<String>,
}

impl Session {
    /// Replaces both tokens with the ones from a fresh grant.
    pub fn set_tokens(&mut self, grant: &TokenGrant) {
        tracing::debug!(
            access = %fragment(&grant.access_token),
            refresh = %fragment(&grant.refresh_token),
            "Storing tokens"
        );
        self.access_token = Some(grant.access_token.clone()).filter(|t| !t.is_empty());
        self.refresh_token = Some(grant.refresh_token.clone()).filter(|t| !t.is_empty());
    }

    pub fn set_vehicle_id(&mut self, vehicle_id: Option<String>) {
        self.vehicle_id = vehicle_id.filter(|id| !id.is_empty());
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none() && self.vehicle_id.is_none()
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            has_access_token: self.access_token.is_some(),
            has_refresh_token: self.refresh_token.is_some(),
            has_vehicle_id: self.vehicle_id.is_some(),
            access_token_fragment: self.access_token.as_deref().map(fragment),
            vehicle_id_fragment: self.vehicle_id.as_deref().map(fragment),
        }
    }
}

/// Presence flags and display-safe prefixes of a [`Session`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStatus {
    pub has_access_token: bool,
    pub has_refresh_token: bool,
    pub has_vehicle_id: bool,
    pub access_token_fragment: Option<String>,
    pub vehicle_id_fragment: Option<String>,
}

/// Truncates a secret to its first [`FRAGMENT_LEN`] characters followed by `...`.
#[must_use]
pub fn fragment(value: &str) -> String {
    let prefix: String = value.chars().take(FRAGMENT_LEN).collect();
    format!("{prefix}...")
}

use super::{CookieJar, SessionStore, SetCookie};
use crate::config::SessionConfig;
use crate::domain::session::Session;

pub const ACCESS_TOKEN_COOKIE: &str = "smartcar_access_token";
pub const REFRESH_TOKEN_COOKIE: &str = "smartcar_refresh_token";
pub const VEHICLE_ID_COOKIE: &str = "smartcar_vehicle_id";

/// Keeps the whole session in HttpOnly cookies on the client.
#[derive(Debug, Clone)]
pub struct CookieSessionStore {
    access_max_age_secs: u64,
    refresh_max_age_secs: u64,
    secure: bool,
}

impl CookieSessionStore {
    #[must_use]
    pub const fn new(config: &SessionConfig, secure: bool) -> Self {
        Self {
            access_max_age_secs: config.access_max_age_secs,
            refresh_max_age_secs: config.refresh_max_age_secs,
            secure,
        }
    }

    fn cookie(&self, name: &'static str, value: Option<&str>, max_age_secs: u64) -> SetCookie {
        value
            .map_or_else(|| SetCookie::removal(name), |v| SetCookie::new(name, v, max_age_secs))
            .secure(self.secure)
    }
}

impl SessionStore for CookieSessionStore {
    fn load(&self, jar: &CookieJar) -> Session {
        Session {
            access_token: jar.get(ACCESS_TOKEN_COOKIE).map(str::to_string),
            refresh_token: jar.get(REFRESH_TOKEN_COOKIE).map(str::to_string),
            vehicle_id: jar.get(VEHICLE_ID_COOKIE).map(str::to_string),
        }
    }

    fn save(&self, _jar: &CookieJar, session: &Session) -> Vec<SetCookie> {
        vec![
            self.cookie(ACCESS_TOKEN_COOKIE, session.access_token.as_deref(), self.access_max_age_secs),
            self.cookie(REFRESH_TOKEN_COOKIE, session.refresh_token.as_deref(), self.refresh_max_age_secs),
            self.cookie(VEHICLE_ID_COOKIE, session.vehicle_id.as_deref(), self.access_max_age_secs),
        ]
    }

    fn clear(&self, jar: &CookieJar) -> Vec<SetCookie> {
        self.save(jar, &Session::default())
    }
}

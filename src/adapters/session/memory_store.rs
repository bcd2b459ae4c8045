use super::{CookieJar, SessionStore, SetCookie};
use crate::config::SessionConfig;
use crate::domain::session::Session;
use base64::Engine;
use dashmap::DashMap;
use rand::{RngCore, rngs::OsRng};
use time::{Duration, OffsetDateTime};

pub const SESSION_ID_COOKIE: &str = "smartcar_session";

#[derive(Debug, Clone)]
struct Entry {
    session: Session,
    expires_at: OffsetDateTime,
}

/// Keeps sessions in process memory, one entry per client, keyed by an
/// opaque id held in a cookie. Entries expire after the access-token lifetime.
#[derive(Debug)]
pub struct MemorySessionStore {
    sessions: DashMap<String, Entry>,
    ttl_secs: u64,
    secure: bool,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new(config: &SessionConfig, secure: bool) -> Self {
        Self { sessions: DashMap::new(), ttl_secs: config.access_max_age_secs, secure }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Drops expired entries and returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = OffsetDateTime::now_utc();
        let before = self.sessions.len();
        self.sessions.retain(|_, entry| entry.expires_at > now);
        before.saturating_sub(self.sessions.len())
    }

    fn expiry(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc().saturating_add(Duration::seconds(i64::try_from(self.ttl_secs).unwrap_or(i64::MAX)))
    }

    /// Id of a live entry the client already holds. Unknown ids are never
    /// adopted, so a client cannot choose its own session id.
    fn known_id(&self, jar: &CookieJar) -> Option<String> {
        jar.get(SESSION_ID_COOKIE).filter(|id| self.sessions.contains_key(*id)).map(str::to_string)
    }

    fn generate_id() -> String {
        let mut bytes = [0u8; 32];
        OsRng.fill_bytes(&mut bytes);
        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self, jar: &CookieJar) -> Session {
        let Some(id) = jar.get(SESSION_ID_COOKIE) else {
            return Session::default();
        };

        let entry = self.sessions.get(id).map(|e| e.value().clone());
        match entry {
            Some(entry) if entry.expires_at > OffsetDateTime::now_utc() => entry.session,
            Some(_) => {
                self.sessions.remove(id);
                Session::default()
            }
            None => Session::default(),
        }
    }

    fn save(&self, jar: &CookieJar, session: &Session) -> Vec<SetCookie> {
        if session.is_empty() {
            return self.clear(jar);
        }

        let id = self.known_id(jar).unwrap_or_else(Self::generate_id);
        self.sessions.insert(id.clone(), Entry { session: session.clone(), expires_at: self.expiry() });

        vec![SetCookie::new(SESSION_ID_COOKIE, id, self.ttl_secs).secure(self.secure)]
    }

    fn clear(&self, jar: &CookieJar) -> Vec<SetCookie> {
        if let Some(id) = jar.get(SESSION_ID_COOKIE) {
            self.sessions.remove(id);
        }
        vec![SetCookie::removal(SESSION_ID_COOKIE).secure(self.secure)]
    }
}

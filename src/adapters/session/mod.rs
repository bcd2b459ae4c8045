use crate::config::{Environment, SessionBackend, SessionConfig};
use crate::domain::session::Session;
use std::sync::Arc;

pub mod cookie_store;
pub mod cookies;
pub mod memory_store;

pub use cookie_store::CookieSessionStore;
pub use cookies::{CookieJar, SetCookie};
pub use memory_store::MemorySessionStore;

/// Per-client session persistence.
///
/// A store loads the session belonging to the client that sent `jar` and
/// describes, as cookies, what the client must keep for the next request.
pub trait SessionStore: Send + Sync + std::fmt::Debug {
    fn load(&self, jar: &CookieJar) -> Session;

    /// Persists `session` in full, replacing whatever the client had.
    fn save(&self, jar: &CookieJar, session: &Session) -> Vec<SetCookie>;

    fn clear(&self, jar: &CookieJar) -> Vec<SetCookie>;
}

/// The store selected by configuration. The memory store is also returned
/// on its own so the cleanup worker can purge it.
#[must_use]
pub fn build_store(
    config: &SessionConfig,
    environment: Environment,
) -> (Arc<dyn SessionStore>, Option<Arc<MemorySessionStore>>) {
    let secure = environment.is_production();
    match config.backend {
        SessionBackend::Cookie => (Arc::new(CookieSessionStore::new(config, secure)), None),
        SessionBackend::Memory => {
            let store = Arc::new(MemorySessionStore::new(config, secure));
            (Arc::clone(&store) as Arc<dyn SessionStore>, Some(store))
        }
    }
}

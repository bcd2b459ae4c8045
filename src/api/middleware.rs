use crate::adapters::session::{CookieJar, SessionStore, SetCookie};
use crate::api::AppState;
use crate::domain::session::Session;
use axum::{
    extract::FromRequestParts,
    http::{HeaderName, header, request::Parts},
    response::AppendHeaders,
};
use std::convert::Infallible;

pub type CookieHeaders = AppendHeaders<Vec<(HeaderName, String)>>;

/// The session of the client that sent the request.
///
/// Handlers mutate `session` and hand the extractor back through
/// [`ClientSession::commit`] to obtain the `Set-Cookie` headers.
#[derive(Debug)]
pub struct ClientSession {
    pub session: Session,
    jar: CookieJar,
    loaded: Session,
}

impl FromRequestParts<AppState> for ClientSession {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let session = state.sessions.load(&jar);
        Ok(Self { loaded: session.clone(), session, jar })
    }
}

impl ClientSession {
    /// Persists the session when it changed during the request.
    pub fn commit(&self, store: &dyn SessionStore) -> CookieHeaders {
        if self.session == self.loaded {
            return cookie_headers(Vec::new());
        }
        cookie_headers(store.save(&self.jar, &self.session))
    }

    /// Forgets the session on the server and expires the client's cookies.
    pub fn clear(&mut self, store: &dyn SessionStore) -> CookieHeaders {
        self.session.clear();
        cookie_headers(store.clear(&self.jar))
    }
}

fn cookie_headers(cookies: Vec<SetCookie>) -> CookieHeaders {
    AppendHeaders(cookies.iter().map(|c| (header::SET_COOKIE, c.build())).collect())
}

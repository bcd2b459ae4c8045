use axum::http::{HeaderMap, header};
use std::collections::HashMap;

/// Cookies sent by the client, parsed from every `Cookie` header.
#[derive(Debug, Clone, Default)]
pub struct CookieJar {
    values: HashMap<String, String>,
}

impl CookieJar {
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let mut values = HashMap::new();
        for header in headers.get_all(header::COOKIE) {
            let Ok(raw) = header.to_str() else { continue };
            for pair in raw.split(';') {
                if let Some((name, value)) = pair.trim().split_once('=') {
                    values.entry(name.trim().to_string()).or_insert_with(|| value.trim().to_string());
                }
            }
        }
        Self { values }
    }

    /// Value of a non-empty cookie.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str).filter(|v| !v.is_empty())
    }
}

/// A `Set-Cookie` directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetCookie {
    pub name: &'static str,
    pub value: String,
    pub max_age_secs: u64,
    pub secure: bool,
}

impl SetCookie {
    #[must_use]
    pub fn new(name: &'static str, value: impl Into<String>, max_age_secs: u64) -> Self {
        Self { name, value: value.into(), max_age_secs, secure: false }
    }

    /// Expires the cookie on the client.
    #[must_use]
    pub fn removal(name: &'static str) -> Self {
        Self::new(name, "", 0)
    }

    #[must_use]
    pub const fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Renders the header value. Cookies are always `HttpOnly` with `SameSite=Lax`
    /// so the vendor redirect still carries them.
    #[must_use]
    pub fn build(&self) -> String {
        let mut cookie =
            format!("{}={}; Max-Age={}; Path=/; HttpOnly; SameSite=Lax", self.name, self.value, self.max_age_secs);
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_multiple_headers() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, "a=1; b=two".parse().unwrap());
        headers.append(header::COOKIE, "c=3; a=ignored".parse().unwrap());

        let jar = CookieJar::from_headers(&headers);
        assert_eq!(jar.get("a"), Some("1"));
        assert_eq!(jar.get("b"), Some("two"));
        assert_eq!(jar.get("c"), Some("3"));
        assert_eq!(jar.get("missing"), None);
    }

    #[test]
    fn test_empty_value_is_absent() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, "token=; other".parse().unwrap());

        let jar = CookieJar::from_headers(&headers);
        assert_eq!(jar.get("token"), None);
        assert_eq!(jar.get("other"), None);
    }

    #[test]
    fn test_build_cookie() {
        let cookie = SetCookie::new("smartcar_access_token", "abc", 7200).build();
        assert_eq!(cookie, "smartcar_access_token=abc; Max-Age=7200; Path=/; HttpOnly; SameSite=Lax");

        let secure = SetCookie::removal("smartcar_vehicle_id").secure(true).build();
        assert!(secure.starts_with("smartcar_vehicle_id=; Max-Age=0"));
        assert!(secure.ends_with("; Secure"));
    }
}

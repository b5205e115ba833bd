//! Cookie store that can be emptied between logins

use parking_lot::RwLock;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::HeaderValue;
use reqwest::Url;
use std::sync::Arc;

/// Cookies of one user session.
///
/// The client keeps a single `reqwest::Client`; [`SessionCookies::reset`]
/// swaps the jar behind it, so every login starts from an empty jar.
#[derive(Debug, Default)]
pub struct SessionCookies {
    jar: RwLock<Arc<Jar>>,
}

impl SessionCookies {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every cookie and start over with `seed` set for `url`
    pub fn reset(&self, seed: &[&str], url: &Url) {
        let jar = Jar::default();
        for cookie in seed {
            jar.add_cookie_str(cookie, url);
        }
        *self.jar.write() = Arc::new(jar);
    }

    fn current(&self) -> Arc<Jar> {
        Arc::clone(&self.jar.read())
    }
}

impl CookieStore for SessionCookies {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
        self.current().set_cookies(cookie_headers, url);
    }

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        self.current().cookies(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cookie_header(cookies: &SessionCookies, url: &Url) -> String {
        cookies
            .cookies(url)
            .map(|value| value.to_str().unwrap().to_string())
            .unwrap_or_default()
    }

    #[test]
    fn test_reset_forgets_server_cookies() {
        let url = Url::parse("http://10.0.0.5:8080/api/v1/users/login").unwrap();
        let cookies = SessionCookies::new();

        cookies.reset(&["JSESSIONID=first"], &url);
        let set_cookie = HeaderValue::from_static("SERVERID=node-2; Path=/");
        cookies.set_cookies(&mut std::iter::once(&set_cookie), &url);
        let header = cookie_header(&cookies, &url);
        assert!(header.contains("JSESSIONID=first"));
        assert!(header.contains("SERVERID=node-2"));

        cookies.reset(&["JSESSIONID=second"], &url);
        let header = cookie_header(&cookies, &url);
        assert_eq!(header, "JSESSIONID=second");
    }

    #[test]
    fn test_empty_store_sends_no_cookie_header() {
        let url = Url::parse("http://10.0.0.5:8080/").unwrap();
        assert!(SessionCookies::new().cookies(&url).is_none());
    }
}

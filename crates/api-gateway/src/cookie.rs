//! Session cookie handling
//!
//! The session token travels in an `HttpOnly` cookie scoped to the API
//! path. Production hardens it with `Secure` and `SameSite=Strict`;
//! development relaxes to `SameSite=Lax` so local cross-port frontends can
//! log in. Clients that prefer headers may send the token as a bearer token
//! instead.

use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::HeaderMap;

/// Name of the session cookie
pub const TOKEN_COOKIE: &str = "token";

/// Builds the `Set-Cookie` value carrying a fresh session token
pub fn session_cookie(token: &str, api_path: &str, max_age_secs: i64, production: bool) -> String {
    let same_site = if production { "Strict" } else { "Lax" };
    let mut cookie = format!(
        "{}={}; Max-Age={}; Path={}; HttpOnly; SameSite={}",
        TOKEN_COOKIE, token, max_age_secs, api_path, same_site
    );
    if production {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Builds the `Set-Cookie` value that removes the session cookie
pub fn clearing_cookie(api_path: &str, production: bool) -> String {
    let same_site = if production { "Strict" } else { "Lax" };
    let mut cookie = format!(
        "{}=; Max-Age=0; Path={}; HttpOnly; SameSite={}",
        TOKEN_COOKIE, api_path, same_site
    );
    if production {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Extracts the session token from the request headers
///
/// The cookie wins over the `Authorization` header when both are present.
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    if let Some(cookie_header) = headers.get(COOKIE).and_then(|v| v.to_str().ok()) {
        for pair in cookie_header.split(';') {
            let mut parts = pair.trim().splitn(2, '=');
            if parts.next() == Some(TOKEN_COOKIE) {
                if let Some(value) = parts.next() {
                    if !value.is_empty() {
                        return Some(value.to_string());
                    }
                }
            }
        }
    }

    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn production_cookie_is_hardened() {
        let cookie = session_cookie("abc.def.ghi", "/api", 36000, true);
        assert!(cookie.starts_with("token=abc.def.ghi;"));
        assert!(cookie.contains("Max-Age=36000"));
        assert!(cookie.contains("Path=/api"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Strict"));
        assert!(cookie.contains("Secure"));
    }

    #[test]
    fn development_cookie_is_relaxed() {
        let cookie = session_cookie("abc.def.ghi", "/api", 36000, false);
        assert!(cookie.contains("SameSite=Lax"));
        assert!(!cookie.contains("Secure"));
        assert!(cookie.contains("HttpOnly"));
    }

    #[test]
    fn clearing_cookie_expires_immediately() {
        let cookie = clearing_cookie("/api", true);
        assert!(cookie.starts_with("token=;"));
        assert!(cookie.contains("Max-Age=0"));
        assert!(cookie.contains("Path=/api"));
    }

    #[test]
    fn token_is_read_from_the_cookie_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; token=abc.def.ghi; lang=de"),
        );
        assert_eq!(token_from_headers(&headers).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn token_is_read_from_the_bearer_header() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(token_from_headers(&headers).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn cookie_wins_over_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("token=from-cookie"));
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer from-header"));
        assert_eq!(token_from_headers(&headers).as_deref(), Some("from-cookie"));
    }

    #[test]
    fn absent_or_empty_tokens_yield_none() {
        assert_eq!(token_from_headers(&HeaderMap::new()), None);

        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("token="));
        assert_eq!(token_from_headers(&headers), None);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcg=="));
        assert_eq!(token_from_headers(&headers), None);
    }
}

use std::time::Duration;

use poem::http::header;
use poem::web::cookie::{Cookie, SameSite};
use poem::Request;

/// The one place a session token is read from a request
///
/// `Authorization: Bearer <token>` wins; otherwise the cookie named
/// `cookie_name` is used. No other header or cookie name is consulted.
pub fn extract_session_token(req: &Request, cookie_name: &str) -> Option<String> {
    bearer_token(req).or_else(|| cookie_token(req, cookie_name))
}

fn bearer_token(req: &Request) -> Option<String> {
    let value = req.header(header::AUTHORIZATION)?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let token = token.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

fn cookie_token(req: &Request, cookie_name: &str) -> Option<String> {
    req.headers()
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == cookie_name && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// `Set-Cookie` value carrying a fresh session token
pub fn session_cookie(cookie_name: &str, token: &str, ttl_seconds: i64) -> String {
    let max_age = Duration::from_secs(u64::try_from(ttl_seconds).unwrap_or(0));
    build_cookie(cookie_name, token, max_age).to_string()
}

/// `Set-Cookie` value that makes the browser drop the session cookie
pub fn clear_session_cookie(cookie_name: &str) -> String {
    build_cookie(cookie_name, "", Duration::ZERO).to_string()
}

fn build_cookie(cookie_name: &str, value: &str, max_age: Duration) -> Cookie {
    let mut cookie = Cookie::new_with_str(cookie_name, value);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_secure(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_max_age(max_age);
    cookie
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_header_is_used() {
        let req = Request::builder()
            .header("Authorization", "Bearer abc123")
            .finish();

        assert_eq!(extract_session_token(&req, "session"), Some("abc123".to_string()));
    }

    #[test]
    fn test_bearer_scheme_is_case_insensitive() {
        let req = Request::builder()
            .header("Authorization", "bearer abc123")
            .finish();

        assert_eq!(extract_session_token(&req, "session"), Some("abc123".to_string()));
    }

    #[test]
    fn test_bearer_wins_over_cookie() {
        let req = Request::builder()
            .header("Authorization", "Bearer from-header")
            .header("Cookie", "session=from-cookie")
            .finish();

        assert_eq!(extract_session_token(&req, "session"), Some("from-header".to_string()));
    }

    #[test]
    fn test_cookie_fallback() {
        let req = Request::builder()
            .header("Cookie", "theme=dark; session=from-cookie; lang=en")
            .finish();

        assert_eq!(extract_session_token(&req, "session"), Some("from-cookie".to_string()));
    }

    #[test]
    fn test_other_cookie_names_are_ignored() {
        let req = Request::builder()
            .header("Cookie", "username=alice; auth=xyz; session_id=nope")
            .finish();

        assert_eq!(extract_session_token(&req, "session"), None);
    }

    #[test]
    fn test_non_bearer_authorization_falls_back_to_cookie() {
        let req = Request::builder()
            .header("Authorization", "Basic YWxpY2U6cHc=")
            .header("Cookie", "session=from-cookie")
            .finish();

        assert_eq!(extract_session_token(&req, "session"), Some("from-cookie".to_string()));
    }

    #[test]
    fn test_no_credentials() {
        let req = Request::builder().finish();
        assert_eq!(extract_session_token(&req, "session"), None);
    }

    fn attributes(set_cookie: &str) -> Vec<String> {
        set_cookie.split(';').map(|part| part.trim().to_string()).collect()
    }

    #[test]
    fn test_session_cookie_attributes() {
        let value = session_cookie("session", "tok", 604800);
        let parts = attributes(&value);

        assert_eq!(parts[0], "session=tok");
        for expected in ["Path=/", "HttpOnly", "Secure", "SameSite=Lax", "Max-Age=604800"] {
            assert!(parts.iter().any(|p| p == expected), "missing {} in {}", expected, value);
        }
    }

    #[test]
    fn test_clear_cookie_attributes() {
        let value = clear_session_cookie("session");
        let parts = attributes(&value);

        assert_eq!(parts[0], "session=");
        for expected in ["Path=/", "HttpOnly", "Secure", "SameSite=Lax", "Max-Age=0"] {
            assert!(parts.iter().any(|p| p == expected), "missing {} in {}", expected, value);
        }
    }

    #[test]
    fn test_negative_ttl_expires_cookie() {
        assert!(attributes(&session_cookie("session", "tok", -5)).contains(&"Max-Age=0".to_string()));
    }
}

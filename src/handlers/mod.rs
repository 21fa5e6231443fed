pub mod admin;
pub mod auth;
pub mod chat;
pub mod speech;
pub mod status;
pub mod ui;

use axum::http::HeaderMap;
use uuid::Uuid;

/// Header carrying the browser-session identifier kept in `sessionStorage`.
pub const SESSION_HEADER: &str = "x-session-id";

/// The identifier the client presented, if any. Malformed values are ignored
/// so the caller simply gets a new session.
pub fn presented_session(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| Uuid::parse_str(v.trim()).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_presented_session_ignores_garbage() {
        let mut headers = HeaderMap::new();
        assert_eq!(presented_session(&headers), None);

        headers.insert(SESSION_HEADER, HeaderValue::from_static("not-a-uuid"));
        assert_eq!(presented_session(&headers), None);

        let id = Uuid::new_v4();
        headers.insert(SESSION_HEADER, HeaderValue::from_str(&id.to_string()).unwrap());
        assert_eq!(presented_session(&headers), Some(id));
    }
}

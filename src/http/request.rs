//! Request assembly for the three request shapes the scenario sends
//!
//! Requests are built as complete wire bytes, `Connection: close` always
//! set, so the transport never has to know what it is carrying. Bodies are
//! JSON objects with exactly one string field.

use super::CRLF;

/// Name of the session cookie issued by the server.
pub const SESSION_COOKIE: &str = "session_id";

/// Escape `"` and `\` for embedding in a JSON string literal.
///
/// Single pass; nothing else in the scenario's payloads needs escaping.
pub fn escape_json(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// `POST /api/login` with a `{"username":...}` body.
pub fn login(host: &str, username: &str) -> Vec<u8> {
    let body = format!("{{\"username\":\"{username}\"}}");
    let mut req = format!("POST /api/login HTTP/1.1{CRLF}Host: {host}{CRLF}");
    req.push_str(&format!(
        "Content-Type: application/json{CRLF}Content-Length: {}{CRLF}",
        body.len()
    ));
    req.push_str(&format!("Connection: close{CRLF}{CRLF}"));
    req.push_str(&body);
    req.into_bytes()
}

/// `GET /api/messages`, with the session cookie when one is given.
pub fn fetch_messages(host: &str, session: Option<&str>) -> Vec<u8> {
    let mut req = format!("GET /api/messages HTTP/1.1{CRLF}Host: {host}{CRLF}");
    if let Some(token) = session {
        req.push_str(&format!("Cookie: {SESSION_COOKIE}={token}{CRLF}"));
    }
    req.push_str(&format!("Connection: close{CRLF}{CRLF}"));
    req.into_bytes()
}

/// `POST /api/messages` with a `{"message":...}` body, escaped.
///
/// `Content-Length` is computed from the escaped and wrapped body, not from
/// the caller's raw text.
pub fn post_message(host: &str, session: Option<&str>, message: &str) -> Vec<u8> {
    let body = format!("{{\"message\":\"{}\"}}", escape_json(message));
    let mut req = format!("POST /api/messages HTTP/1.1{CRLF}Host: {host}{CRLF}");
    req.push_str(&format!(
        "Content-Type: application/json{CRLF}Content-Length: {}{CRLF}",
        body.len()
    ));
    if let Some(token) = session {
        req.push_str(&format!("Cookie: {SESSION_COOKIE}={token}{CRLF}"));
    }
    req.push_str(&format!("Connection: close{CRLF}{CRLF}"));
    req.push_str(&body);
    req.into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn as_str(req: Vec<u8>) -> String {
        String::from_utf8(req).unwrap()
    }

    #[test]
    fn escape_quotes_and_backslashes() {
        assert_eq!(escape_json("plain"), "plain");
        assert_eq!(escape_json("say \"hi\""), "say \\\"hi\\\"");
        assert_eq!(escape_json("back\\slash"), "back\\\\slash");
        assert_eq!(escape_json(""), "");
    }

    #[test]
    fn login_request_shape() {
        let req = as_str(login("example.com", "alice"));
        assert!(req.starts_with("POST /api/login HTTP/1.1\r\n"));
        assert!(req.contains("Host: example.com\r\n"));
        assert!(req.contains("Content-Length: 20\r\n"));
        assert!(req.contains("Connection: close\r\n"));
        assert!(req.ends_with("\r\n\r\n{\"username\":\"alice\"}"));
    }

    #[test]
    fn fetch_with_and_without_session() {
        let authed = as_str(fetch_messages("example.com", Some("XYZ")));
        assert!(authed.starts_with("GET /api/messages HTTP/1.1\r\n"));
        assert!(authed.contains("Cookie: session_id=XYZ\r\n"));
        assert!(authed.ends_with("Connection: close\r\n\r\n"));

        let anon = as_str(fetch_messages("example.com", None));
        assert!(!anon.contains("Cookie:"));
    }

    #[test]
    fn post_content_length_covers_escaped_body() {
        let req = as_str(post_message("example.com", Some("XYZ"), "say \"hi\""));
        let body = "{\"message\":\"say \\\"hi\\\"\"}";
        assert!(req.ends_with(body));
        assert!(req.contains(&format!("Content-Length: {}\r\n", body.len())));
        assert!(req.contains("Cookie: session_id=XYZ\r\n"));
    }

    #[test]
    fn post_without_session_has_no_cookie() {
        let req = as_str(post_message("example.com", None, "hi"));
        assert!(!req.contains("Cookie:"));
        assert!(req.ends_with("{\"message\":\"hi\"}"));
    }
}

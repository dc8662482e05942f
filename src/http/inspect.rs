//! Pure checks over a completed raw message
//!
//! No parsing: the scenario's postconditions are deliberately coarse
//! literal-substring tests over the whole message, headers and body alike,
//! so they observe exactly what came over the wire.

use super::framer::find;

const COOKIE_HEADER: &[u8] = b"Set-Cookie:";

/// Pull a cookie value out of the response's `Set-Cookie` header line.
///
/// Finds the header line, then the `<name>=` token within it, and returns
/// everything up to the next `;` (or the end of the line when none follows).
/// `None` means the header line or the token is absent; an empty cookie
/// value comes back as `Some("")`.
pub fn extract_cookie(raw: &[u8], name: &str) -> Option<String> {
    let start = find(raw, COOKIE_HEADER)?;
    let line = &raw[start..];
    let line = &line[..find(line, b"\r\n").unwrap_or(line.len())];

    let token = format!("{}=", name);
    let value_start = find(line, token.as_bytes())? + token.len();
    let value = &line[value_start..];
    let value = &value[..find(value, b";").unwrap_or(value.len())];

    Some(String::from_utf8_lossy(value).into_owned())
}

/// Case-sensitive status check, e.g. `"200 OK"` or `"401 Unauthorized"`.
///
/// Intentionally a plain containment test over the full message rather than
/// a status-line parse.
pub fn contains_status(raw: &[u8], fragment: &str) -> bool {
    contains_literal(raw, fragment)
}

/// Case-sensitive literal substring test over the full message.
pub fn contains_literal(raw: &[u8], needle: &str) -> bool {
    find(raw, needle.as_bytes()).is_some()
}

//! Downloaded content validation.

use crate::config::MAX_ASSET_BODY_SIZE;
use crate::error_handling::FetchError;

/// Rejects bodies that are HTML documents or exceed the size cap.
///
/// Servers commonly answer unknown chunk paths with the application's
/// index page and a 200 status; such a body starts (after whitespace) with a
/// doctype or `<html` tag.
pub fn validate_script_body(body: &[u8]) -> Result<(), FetchError> {
    if body.len() > MAX_ASSET_BODY_SIZE {
        return Err(FetchError::BodyTooLarge(body.len()));
    }
    if looks_like_html(body) {
        return Err(FetchError::HtmlPayload);
    }
    Ok(())
}

fn looks_like_html(body: &[u8]) -> bool {
    let start = body
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(body.len());
    // Skip a UTF-8 byte order mark
    let rest = body[start..].strip_prefix(b"\xEF\xBB\xBF").unwrap_or(&body[start..]);
    let head = &rest[..rest.len().min(16)];
    let head = head.to_ascii_lowercase();
    head.starts_with(b"<!doctype html") || head.starts_with(b"<html")
}

//! `X-Forwarded-For` extraction.
//!
//! The header is read as-is. Nothing here checks that the client did not
//! forge it.

use axum::http::{header::HeaderName, HeaderMap};

pub const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");

/// Raw bytes of the first `X-Forwarded-For` value, if present and non-empty.
pub fn forwarded_for(headers: &HeaderMap) -> Option<&[u8]> {
    headers
        .get(&X_FORWARDED_FOR)
        .map(|v| v.as_bytes())
        .filter(|v| !v.is_empty())
}

/// Split a header value into candidate addresses, client first.
///
/// Entries are not deduplicated or validated. Surrounding whitespace is
/// kept unless `trim` is set. An entry that is not UTF-8 yields `None`; it
/// can never match a ban key.
pub fn candidates(value: &[u8], trim: bool) -> impl Iterator<Item = Option<&str>> {
    value.split(|b| *b == b',').map(move |entry| {
        std::str::from_utf8(entry)
            .ok()
            .map(|s| if trim { s.trim() } else { s })
    })
}

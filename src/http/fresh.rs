//! Conditional-request freshness.
//!
//! Compares the request's `If-None-Match` / `If-Modified-Since` against the
//! response's `ETag` / `Last-Modified`. A `Cache-Control: no-cache` request
//! is never fresh.

use axum::http::{header, HeaderMap};
use chrono::{DateTime, Utc};

/// Parse an HTTP-date (IMF-fixdate, which RFC 2822 parsing accepts).
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Format a timestamp as an IMF-fixdate.
pub fn format_http_date(date: DateTime<Utc>) -> String {
    date.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

fn header_str<'a>(headers: &'a HeaderMap, name: header::HeaderName) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn has_no_cache(cache_control: &str) -> bool {
    cache_control
        .split(',')
        .any(|directive| directive.trim().eq_ignore_ascii_case("no-cache"))
}

fn strip_weak(tag: &str) -> &str {
    tag.strip_prefix("W/").unwrap_or(tag)
}

/// True when the client's cached representation is still valid.
pub fn is_fresh(request: &HeaderMap, response: &HeaderMap) -> bool {
    let modified_since = header_str(request, header::IF_MODIFIED_SINCE);
    let none_match = header_str(request, header::IF_NONE_MATCH);

    if modified_since.is_none() && none_match.is_none() {
        return false;
    }

    if header_str(request, header::CACHE_CONTROL).is_some_and(has_no_cache) {
        return false;
    }

    if let Some(none_match) = none_match.filter(|v| *v != "*") {
        let Some(etag) = header_str(response, header::ETAG) else {
            return false;
        };
        let etag = strip_weak(etag);
        let matched = none_match
            .split(',')
            .map(|tag| strip_weak(tag.trim()))
            .any(|tag| tag == etag);
        if !matched {
            return false;
        }
    }

    if let Some(modified_since) = modified_since {
        let last_modified = header_str(response, header::LAST_MODIFIED).and_then(parse_http_date);
        let since = parse_http_date(modified_since);
        match (last_modified, since) {
            (Some(last), Some(since)) if last <= since => {}
            _ => return false,
        }
    }

    true
}

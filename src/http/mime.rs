//! Content-type shorthands and media-type matching.
//!
//! Only a small table of common types is carried; anything containing a
//! `/` is taken as a full media type.

use std::borrow::Cow;

const SHORTHANDS: &[(&str, &str)] = &[
    ("bin", "application/octet-stream"),
    ("css", "text/css"),
    ("csv", "text/csv"),
    ("form", "application/x-www-form-urlencoded"),
    ("gif", "image/gif"),
    ("gz", "application/gzip"),
    ("htm", "text/html"),
    ("html", "text/html"),
    ("ico", "image/x-icon"),
    ("jpeg", "image/jpeg"),
    ("jpg", "image/jpeg"),
    ("js", "text/javascript"),
    ("json", "application/json"),
    ("md", "text/markdown"),
    ("mjs", "text/javascript"),
    ("mp3", "audio/mpeg"),
    ("mp4", "video/mp4"),
    ("multipart", "multipart/form-data"),
    ("pdf", "application/pdf"),
    ("png", "image/png"),
    ("svg", "image/svg+xml"),
    ("text", "text/plain"),
    ("txt", "text/plain"),
    ("urlencoded", "application/x-www-form-urlencoded"),
    ("wasm", "application/wasm"),
    ("webp", "image/webp"),
    ("woff", "font/woff"),
    ("woff2", "font/woff2"),
    ("xml", "application/xml"),
    ("zip", "application/zip"),
];

/// Media type for a shorthand or file extension, without parameters.
pub fn expand(shorthand: &str) -> Option<&'static str> {
    let key = shorthand.trim_start_matches('.').to_ascii_lowercase();
    SHORTHANDS
        .binary_search_by_key(&key.as_str(), |&(k, _)| k)
        .ok()
        .map(|i| SHORTHANDS[i].1)
}

/// Full `Content-Type` value for a shorthand, extension or media type.
///
/// Textual types get `charset=utf-8` unless a charset is already present.
pub fn content_type(value: &str) -> Option<Cow<'static, str>> {
    let value = value.trim();
    if value.contains('/') {
        if has_charset(value) || !is_textual(essence(value)) {
            return Some(Cow::Owned(value.to_string()));
        }
        return Some(Cow::Owned(format!("{value}; charset=utf-8")));
    }
    let mime = expand(value)?;
    if is_textual(mime) {
        Some(Cow::Owned(format!("{mime}; charset=utf-8")))
    } else {
        Some(Cow::Borrowed(mime))
    }
}

/// Content type for a file name, from its extension.
pub fn from_filename(filename: &str) -> Option<Cow<'static, str>> {
    let (_, ext) = filename.rsplit_once('.')?;
    content_type(ext)
}

/// Media type without parameters.
pub fn essence(value: &str) -> &str {
    value.split(';').next().unwrap_or("").trim()
}

/// `charset` parameter of a content type, if any.
pub fn charset(value: &str) -> Option<String> {
    value.split(';').skip(1).find_map(|param| {
        let (name, val) = param.split_once('=')?;
        if name.trim().eq_ignore_ascii_case("charset") {
            Some(val.trim().trim_matches('"').to_ascii_lowercase())
        } else {
            None
        }
    })
}

fn has_charset(value: &str) -> bool {
    charset(value).is_some()
}

fn is_textual(mime: &str) -> bool {
    let mime = mime.to_ascii_lowercase();
    mime.starts_with("text/")
        || mime == "application/json"
        || mime == "application/javascript"
        || mime.ends_with("+json")
}

/// Normalize a pattern for matching: shorthands expand, `+json` becomes `*/*+json`.
fn normalize(pattern: &str) -> Option<String> {
    if let Some(suffix) = pattern.strip_prefix('+') {
        return Some(format!("*/*+{suffix}"));
    }
    if pattern.contains('/') {
        return Some(pattern.to_ascii_lowercase());
    }
    expand(pattern).map(str::to_string)
}

/// Match one normalized pattern against a concrete media type.
pub fn matches(pattern: &str, actual: &str) -> bool {
    let (Some((p_type, p_sub)), Some((a_type, a_sub))) =
        (pattern.split_once('/'), actual.split_once('/'))
    else {
        return false;
    };
    if p_type != "*" && !p_type.eq_ignore_ascii_case(a_type) {
        return false;
    }
    if p_sub == "*" {
        return true;
    }
    if let Some(suffix) = p_sub.strip_prefix("*+") {
        return a_sub
            .rsplit_once('+')
            .is_some_and(|(_, s)| s.eq_ignore_ascii_case(suffix));
    }
    p_sub.eq_ignore_ascii_case(a_sub)
}

/// `type-is` style check of `actual` against `patterns`.
///
/// Returns the matching pattern as written (or the actual type for
/// wildcard patterns). With no patterns, returns the actual type.
pub fn type_is(actual: &str, patterns: &[&str]) -> Option<String> {
    let actual = essence(actual).to_ascii_lowercase();
    if actual.is_empty() || !actual.contains('/') {
        return None;
    }
    if patterns.is_empty() {
        return Some(actual);
    }
    patterns.iter().find_map(|pattern| {
        let normalized = normalize(pattern)?;
        if !matches(&normalized, &actual) {
            return None;
        }
        if normalized.contains('*') {
            Some(actual.clone())
        } else {
            Some((*pattern).to_string())
        }
    })
}

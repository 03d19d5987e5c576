//! Response facade.
//!
//! # Responsibilities
//! - Own the status, the explicit-status flag and the body value
//! - Keep `Content-Type`, `Content-Length` and `Transfer-Encoding`
//!   consistent with the body classification on every assignment
//! - Header helpers (type shorthands, validators, `Vary`, redirects,
//!   attachments) on top of the raw sink
//!
//! # Design Decisions
//! - A status forced by a body assignment does not count as explicit
//! - Entering a no-body status clears the body, whether one was set or not
//! - A manual `Content-Length`, `Transfer-Encoding` or (for structured
//!   bodies) `Content-Type` that contradicts the body is rejected

use std::borrow::Cow;
use std::mem;

use axum::http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode};
use chrono::{DateTime, Utc};

use crate::error::{Error, Result};
use crate::http::body::{looks_like_html, Body, BodyKind};
use crate::http::{fresh, mime, status};
use crate::net::raw::RawResponse;

const TEXT_HTML: &str = "text/html; charset=utf-8";
const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
const OCTET_STREAM: &str = "application/octet-stream";
const APPLICATION_JSON: &str = "application/json; charset=utf-8";

/// Outgoing response facade.
#[derive(Debug, Default)]
pub struct Response {
    raw: RawResponse,
    body: Body,
    explicit_status: bool,
    message: Option<String>,
}

impl Response {
    pub fn new(raw: RawResponse) -> Self {
        Self {
            raw,
            body: Body::Empty,
            explicit_status: false,
            message: None,
        }
    }

    pub fn raw(&self) -> &RawResponse {
        &self.raw
    }

    /// Direct access to the sink for ad-hoc writes that bypass finalization.
    pub fn raw_mut(&mut self) -> &mut RawResponse {
        &mut self.raw
    }

    pub fn into_raw(self) -> RawResponse {
        self.raw
    }

    pub fn status(&self) -> u16 {
        self.raw.status().as_u16()
    }

    /// Whether the caller assigned the status.
    pub fn explicit_status(&self) -> bool {
        self.explicit_status
    }

    /// Assign a known status. Unknown codes fail and leave the status as is.
    pub fn set_status(&mut self, code: u16) -> Result<()> {
        if !status::is_known(code) {
            return Err(Error::InvalidStatus(code));
        }
        let code_value = StatusCode::from_u16(code).map_err(|_| Error::InvalidStatus(code))?;
        if self.raw.headers_sent() {
            tracing::debug!(status = code, "status change after headers were sent ignored");
            return Ok(());
        }
        self.explicit_status = true;
        self.message = None;
        self.raw.set_status(code_value);
        if status::is_empty(code) {
            self.clear_body();
        }
        Ok(())
    }

    /// Reason text: the caller-supplied message or the canonical phrase.
    pub fn message(&self) -> &str {
        self.message
            .as_deref()
            .or_else(|| status::reason_phrase(self.status()))
            .unwrap_or("")
    }

    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = Some(message.into());
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    /// Assign the body and bring status and entity headers in line with it.
    pub fn set_body(&mut self, body: impl Into<Body>) {
        let body = body.into();
        let previous = mem::take(&mut self.body);
        let had_body = !previous.is_empty();
        if previous.kind() == BodyKind::Stream {
            tracing::trace!("dropping replaced body stream");
        }
        drop(previous);

        if body.is_empty() {
            if !status::is_empty(self.status()) {
                self.force_status(StatusCode::NO_CONTENT);
            }
            self.strip_entity_headers();
            return;
        }

        if !self.explicit_status {
            self.force_status(StatusCode::OK);
        }

        match &body {
            Body::Text(text) => {
                if !self.has(header::CONTENT_TYPE.as_str()) {
                    let value = if looks_like_html(text) { TEXT_HTML } else { TEXT_PLAIN };
                    self.raw
                        .set_header(header::CONTENT_TYPE, HeaderValue::from_static(value));
                }
                self.raw
                    .set_header(header::CONTENT_LENGTH, HeaderValue::from(text.len() as u64));
            }
            Body::Binary(bytes) => {
                if !self.has(header::CONTENT_TYPE.as_str()) {
                    self.raw
                        .set_header(header::CONTENT_TYPE, HeaderValue::from_static(OCTET_STREAM));
                }
                self.raw
                    .set_header(header::CONTENT_LENGTH, HeaderValue::from(bytes.len() as u64));
            }
            // A length set by hand before the first body is kept as the
            // stream's declared length.
            Body::Stream(_) => {
                if !self.has(header::CONTENT_TYPE.as_str()) {
                    self.raw
                        .set_header(header::CONTENT_TYPE, HeaderValue::from_static(OCTET_STREAM));
                }
                if had_body {
                    self.raw.remove_header(header::CONTENT_LENGTH.as_str());
                }
            }
            Body::Structured(_) => {
                self.raw.remove_header(header::CONTENT_LENGTH.as_str());
                self.raw
                    .set_header(header::CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
            }
            Body::Empty => {}
        }
        if body.byte_len().is_some() {
            self.raw.remove_header(header::TRANSFER_ENCODING.as_str());
        }
        self.body = body;
    }

    /// Take the body out for the terminal write.
    pub(crate) fn take_body(&mut self) -> Body {
        mem::take(&mut self.body)
    }

    fn force_status(&mut self, code: StatusCode) {
        self.message = None;
        self.raw.set_status(code);
    }

    fn clear_body(&mut self) {
        if !self.body.is_empty() {
            tracing::trace!(status = self.status(), "clearing body for no-body status");
        }
        self.body = Body::Empty;
        self.strip_entity_headers();
    }

    fn strip_entity_headers(&mut self) {
        self.raw.remove_header(header::CONTENT_TYPE.as_str());
        self.raw.remove_header(header::CONTENT_LENGTH.as_str());
        self.raw.remove_header(header::TRANSFER_ENCODING.as_str());
    }

    /// `Content-Length` if set, else the length the body would have.
    pub fn length(&self) -> Option<u64> {
        if let Some(value) = self.get(header::CONTENT_LENGTH.as_str()) {
            return value.trim().parse().ok();
        }
        self.body.byte_len()
    }

    fn is_sized(&self) -> bool {
        matches!(
            self.body.kind(),
            BodyKind::Text | BodyKind::Binary | BodyKind::Structured
        )
    }

    /// Refuse hand-set entity headers that contradict the current body.
    /// `None` stands for removing the header.
    fn check_entity_header(&self, name: &HeaderName, value: Option<&str>) -> Result<()> {
        if *name == header::TRANSFER_ENCODING && value.is_some() && self.is_sized() {
            return Err(Error::HeaderConflict {
                name: name.to_string(),
                reason: format!("{:?} body has a fixed length", self.body.kind()),
            });
        }
        if *name == header::CONTENT_TYPE && self.body.kind() == BodyKind::Structured {
            let json = value.is_some_and(|v| mime::essence(v).eq_ignore_ascii_case("application/json"));
            if !json {
                return Err(Error::HeaderConflict {
                    name: name.to_string(),
                    reason: "structured body is sent as application/json".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Set `Content-Length`, refusing values that contradict a sized body.
    pub fn set_length(&mut self, length: u64) -> Result<()> {
        if self.is_sized() {
            if let Some(actual) = self.body.byte_len().filter(|actual| *actual != length) {
                return Err(Error::HeaderConflict {
                    name: header::CONTENT_LENGTH.to_string(),
                    reason: format!("body is {actual} bytes, not {length}"),
                });
            }
        }
        self.raw
            .set_header(header::CONTENT_LENGTH, HeaderValue::from(length));
        Ok(())
    }

    pub fn headers(&self) -> &HeaderMap {
        self.raw.headers()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.raw.header(name)
    }

    pub fn has(&self, name: &str) -> bool {
        self.raw.has_header(name)
    }

    /// Replace a header. `Content-Length` goes through [`Response::set_length`];
    /// `Content-Type` and `Transfer-Encoding` must agree with the body.
    pub fn set(&mut self, name: &str, value: &str) -> Result<()> {
        let name = parse_name(name)?;
        if name == header::CONTENT_LENGTH {
            return self.set_length(parse_length(value)?);
        }
        self.check_entity_header(&name, Some(value))?;
        let value = parse_value(&name, value)?;
        self.raw.set_header(name, value);
        Ok(())
    }

    /// Add a header value, keeping existing ones.
    pub fn append(&mut self, name: &str, value: &str) -> Result<()> {
        let name = parse_name(name)?;
        if name == header::CONTENT_LENGTH {
            return self.set_length(parse_length(value)?);
        }
        self.check_entity_header(&name, Some(value))?;
        let value = parse_value(&name, value)?;
        self.raw.append_header(name, value);
        Ok(())
    }

    pub fn remove(&mut self, name: &str) {
        self.raw.remove_header(name);
    }

    /// Media type of the response without parameters, or empty.
    pub fn content_type(&self) -> &str {
        self.get(header::CONTENT_TYPE.as_str())
            .map(mime::essence)
            .unwrap_or("")
    }

    /// Set `Content-Type` from a shorthand, extension or media type.
    /// Unknown shorthands remove the header. A structured body only
    /// accepts `application/json`.
    pub fn set_type(&mut self, value: &str) -> Result<()> {
        let resolved = mime::content_type(value);
        self.check_entity_header(&header::CONTENT_TYPE, resolved.as_deref())?;
        match resolved {
            Some(content_type) => {
                let value = parse_value(&header::CONTENT_TYPE, &content_type)?;
                self.raw.set_header(header::CONTENT_TYPE, value);
            }
            None => self.raw.remove_header(header::CONTENT_TYPE.as_str()),
        }
        Ok(())
    }

    /// Match the response content type against `types`.
    pub fn is(&self, types: &[&str]) -> Option<String> {
        mime::type_is(self.get(header::CONTENT_TYPE.as_str())?, types)
    }

    pub fn last_modified(&self) -> Option<DateTime<Utc>> {
        self.get(header::LAST_MODIFIED.as_str())
            .and_then(fresh::parse_http_date)
    }

    pub fn set_last_modified(&mut self, date: DateTime<Utc>) -> Result<()> {
        let value = parse_value(&header::LAST_MODIFIED, &fresh::format_http_date(date))?;
        self.raw.set_header(header::LAST_MODIFIED, value);
        Ok(())
    }

    pub fn etag(&self) -> Option<&str> {
        self.get(header::ETAG.as_str())
    }

    /// Set `ETag`, quoting the value unless it is already quoted or weak.
    pub fn set_etag(&mut self, tag: &str) -> Result<()> {
        let tag: Cow<'_, str> = if tag.starts_with("W/") || tag.starts_with('"') {
            Cow::Borrowed(tag)
        } else {
            Cow::Owned(format!("\"{tag}\""))
        };
        let value = parse_value(&header::ETAG, &tag)?;
        self.raw.set_header(header::ETAG, value);
        Ok(())
    }

    /// Add `field` to `Vary` unless it is already covered.
    pub fn vary(&mut self, field: &str) -> Result<()> {
        let field = field.trim();
        if field.is_empty() {
            return Ok(());
        }
        let current: Vec<String> = self
            .raw
            .headers()
            .get_all(header::VARY)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(','))
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty())
            .collect();
        if current.iter().any(|f| f == "*") {
            return Ok(());
        }
        let combined = if field == "*" {
            "*".to_string()
        } else if current.iter().any(|f| f.eq_ignore_ascii_case(field)) {
            return Ok(());
        } else {
            current
                .into_iter()
                .chain(std::iter::once(field.to_string()))
                .collect::<Vec<_>>()
                .join(", ")
        };
        let value = parse_value(&header::VARY, &combined)?;
        self.raw.set_header(header::VARY, value);
        Ok(())
    }

    /// Redirect to `location`, defaulting the status to 302.
    ///
    /// The body is a short HTML or text note, depending on `html`.
    pub fn redirect(&mut self, location: &str, html: bool) -> Result<()> {
        let value = parse_value(&header::LOCATION, location)?;
        self.raw.set_header(header::LOCATION, value);
        if !status::is_redirect(self.status()) {
            self.set_status(302)?;
        }
        if html {
            let escaped = escape_html(location);
            self.raw
                .set_header(header::CONTENT_TYPE, HeaderValue::from_static(TEXT_HTML));
            self.set_body(format!("Redirecting to <a href=\"{escaped}\">{escaped}</a>."));
        } else {
            self.raw
                .set_header(header::CONTENT_TYPE, HeaderValue::from_static(TEXT_PLAIN));
            self.set_body(format!("Redirecting to {location}."));
        }
        Ok(())
    }

    /// Mark the response as a download, typing it from the file name.
    /// A structured body keeps its JSON type.
    pub fn attachment(&mut self, filename: Option<&str>) -> Result<()> {
        let disposition = match filename {
            Some(filename) => {
                let name = basename(filename);
                let typed = mime::from_filename(name).filter(|content_type| {
                    self.check_entity_header(&header::CONTENT_TYPE, Some(content_type.as_ref()))
                        .is_ok()
                });
                if let Some(content_type) = typed {
                    let value = parse_value(&header::CONTENT_TYPE, &content_type)?;
                    self.raw.set_header(header::CONTENT_TYPE, value);
                }
                content_disposition(name)
            }
            None => "attachment".to_string(),
        };
        let value = parse_value(&header::CONTENT_DISPOSITION, &disposition)?;
        self.raw.set_header(header::CONTENT_DISPOSITION, value);
        Ok(())
    }

    pub fn headers_sent(&self) -> bool {
        self.raw.headers_sent()
    }

    pub fn writable(&self) -> bool {
        self.raw.writable()
    }

    pub fn summary(&self) -> serde_json::Value {
        let headers: serde_json::Map<String, serde_json::Value> = self
            .raw
            .headers()
            .iter()
            .map(|(name, value)| {
                let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
                (name.as_str().to_string(), serde_json::Value::String(value))
            })
            .collect();
        serde_json::json!({
            "status": self.status(),
            "message": self.message(),
            "header": headers,
        })
    }
}

fn parse_name(name: &str) -> Result<HeaderName> {
    HeaderName::from_bytes(name.as_bytes()).map_err(|e| Error::InvalidHeader {
        name: name.to_string(),
        reason: e.to_string(),
    })
}

fn parse_value(name: &HeaderName, value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value).map_err(|e| Error::InvalidHeader {
        name: name.to_string(),
        reason: e.to_string(),
    })
}

fn parse_length(value: &str) -> Result<u64> {
    value.trim().parse().map_err(|_| Error::InvalidHeader {
        name: header::CONTENT_LENGTH.to_string(),
        reason: format!("not a byte count: {value:?}"),
    })
}

fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn basename(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// `attachment` disposition; non-ASCII names get an RFC 5987 `filename*`.
fn content_disposition(filename: &str) -> String {
    let plain = filename
        .chars()
        .all(|c| c.is_ascii() && !c.is_ascii_control() && c != '"' && c != '\\');
    if plain {
        return format!("attachment; filename=\"{filename}\"");
    }
    let fallback: String = filename
        .chars()
        .map(|c| if c.is_ascii() && !c.is_ascii_control() && c != '"' && c != '\\' { c } else { '?' })
        .collect();
    let mut encoded = String::new();
    for byte in filename.bytes() {
        if byte.is_ascii_alphanumeric() || b"!#$&+-.^_`|~".contains(&byte) {
            encoded.push(byte as char);
        } else {
            encoded.push_str(&format!("%{byte:02X}"));
        }
    }
    format!("attachment; filename=\"{fallback}\"; filename*=UTF-8''{encoded}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;
    use serde_json::json;

    fn response() -> Response {
        Response::new(RawResponse::new())
    }

    #[test]
    fn defaults_to_not_found() {
        let res = response();
        assert_eq!(res.status(), 404);
        assert_eq!(res.message(), "Not Found");
        assert!(res.body().is_empty());
        assert!(!res.explicit_status());
    }

    #[test]
    fn text_body_sets_type_and_length() {
        let mut res = response();
        res.set_body("héllo");
        assert_eq!(res.status(), 200);
        assert_eq!(res.get("content-type"), Some(TEXT_PLAIN));
        assert_eq!(res.get("content-length"), Some("6"));

        let mut res = response();
        res.set_body("  <p>hi</p>");
        assert_eq!(res.content_type(), "text/html");
    }

    #[test]
    fn text_body_keeps_existing_type() {
        let mut res = response();
        res.set_type("xml").unwrap();
        res.set_body("<doc/>");
        assert_eq!(res.content_type(), "application/xml");
    }

    #[test]
    fn binary_and_structured_bodies() {
        let mut res = response();
        res.set_body(Bytes::from_static(b"\x00\x01\x02"));
        assert_eq!(res.content_type(), OCTET_STREAM);
        assert_eq!(res.length(), Some(3));

        res.set_body(json!({"a": 1}));
        assert_eq!(res.get("content-type"), Some(APPLICATION_JSON));
        assert_eq!(res.get("content-length"), None);
        assert_eq!(res.length(), Some(7));
    }

    #[test]
    fn stream_body_drops_stale_length() {
        let mut res = response();
        res.set_body("abc");
        res.remove("content-type");
        let stream = futures_util::stream::iter(vec![Ok::<_, std::io::Error>(Bytes::from("x"))]);
        res.set_body(Body::stream(stream));
        assert_eq!(res.get("content-length"), None);
        assert_eq!(res.content_type(), OCTET_STREAM);
        assert_eq!(res.length(), None);
    }

    #[test]
    fn empty_body_forces_no_content() {
        let mut res = response();
        res.set_body(());
        assert_eq!(res.status(), 204);

        let mut res = response();
        res.set_status(404).unwrap();
        res.set_body("gone");
        res.set_body(json!(null));
        assert_eq!(res.status(), 204);
        assert_eq!(res.get("content-type"), None);
        assert_eq!(res.get("content-length"), None);

        let mut res = response();
        res.set_status(304).unwrap();
        res.set_body(());
        assert_eq!(res.status(), 304);
    }

    #[test]
    fn explicit_status_survives_body() {
        let mut res = response();
        res.set_status(201).unwrap();
        res.set_body("created");
        assert_eq!(res.status(), 201);
    }

    #[test]
    fn forced_status_is_not_explicit() {
        let mut res = response();
        res.set_body(());
        res.set_body("again");
        assert_eq!(res.status(), 200);
        assert!(!res.explicit_status());
    }

    #[test]
    fn unknown_status_rejected() {
        let mut res = response();
        res.set_status(201).unwrap();
        assert!(matches!(res.set_status(999), Err(Error::InvalidStatus(999))));
        assert!(matches!(res.set_status(299), Err(Error::InvalidStatus(299))));
        assert_eq!(res.status(), 201);
    }

    #[test]
    fn no_body_status_clears_body() {
        let mut res = response();
        res.set_body("content");
        res.set_status(204).unwrap();
        assert!(res.body().is_empty());
        assert_eq!(res.get("content-length"), None);
        assert_eq!(res.get("content-type"), None);
    }

    #[test]
    fn length_conflicts() {
        let mut res = response();
        res.set_body("abc");
        assert!(matches!(res.set_length(10), Err(Error::HeaderConflict { .. })));
        assert!(matches!(res.set("Content-Length", "2"), Err(Error::HeaderConflict { .. })));
        res.set_length(3).unwrap();

        let mut empty = response();
        empty.set_length(42).unwrap();
        assert_eq!(empty.length(), Some(42));
    }

    #[test]
    fn transfer_encoding_conflicts_with_sized_body() {
        let mut res = response();
        res.set_body("abc");
        assert!(matches!(
            res.set("Transfer-Encoding", "chunked"),
            Err(Error::HeaderConflict { .. })
        ));
        assert!(matches!(
            res.append("transfer-encoding", "chunked"),
            Err(Error::HeaderConflict { .. })
        ));
        assert_eq!(res.get("transfer-encoding"), None);
        assert_eq!(res.get("content-length"), Some("3"));

        let mut streaming = response();
        let chunks = futures_util::stream::iter(vec![Ok::<_, std::io::Error>(Bytes::from("a"))]);
        streaming.set_body(Body::stream(chunks));
        streaming.set("Transfer-Encoding", "chunked").unwrap();

        // a sized body replaces a hand-set encoding
        streaming.set_body("done");
        assert_eq!(streaming.get("transfer-encoding"), None);
    }

    #[test]
    fn preset_length_is_kept_for_stream() {
        let mut res = response();
        res.set_length(5).unwrap();
        let chunks = futures_util::stream::iter(vec![Ok::<_, std::io::Error>(Bytes::from("hello"))]);
        res.set_body(Body::stream(chunks));
        assert_eq!(res.length(), Some(5));

        res.set_body("abc");
        let chunks = futures_util::stream::iter(vec![Ok::<_, std::io::Error>(Bytes::from("x"))]);
        res.set_body(Body::stream(chunks));
        assert_eq!(res.length(), None);
    }

    #[test]
    fn attachment_keeps_structured_type() {
        let mut res = response();
        res.set_body(json!([1, 2]));
        res.attachment(Some("export.csv")).unwrap();
        assert_eq!(res.get("content-type"), Some(APPLICATION_JSON));
        assert!(res.get("content-disposition").unwrap().contains("export.csv"));
    }

    #[test]
    fn structured_body_keeps_json_type() {
        let mut res = response();
        res.set_body(json!({"a": 1}));
        assert!(matches!(res.set_type("html"), Err(Error::HeaderConflict { .. })));
        assert!(matches!(
            res.set("Content-Type", "text/plain"),
            Err(Error::HeaderConflict { .. })
        ));
        assert!(matches!(res.set_type("not-a-type"), Err(Error::HeaderConflict { .. })));
        assert_eq!(res.get("content-type"), Some(APPLICATION_JSON));

        res.set_type("json").unwrap();
        res.set("content-type", "application/json; charset=utf-8").unwrap();
        assert_eq!(res.body().kind(), BodyKind::Structured);

        let mut text = response();
        text.set_body("<p>hi</p>");
        text.set_type("text").unwrap();
        assert_eq!(text.content_type(), "text/plain");
    }

    #[test]
    fn header_helpers() {
        let mut res = response();
        res.set("X-Custom", "1").unwrap();
        res.append("x-custom", "2").unwrap();
        assert_eq!(res.headers().get_all("x-custom").iter().count(), 2);
        res.remove("X-Custom");
        assert!(!res.has("x-custom"));
        assert!(matches!(res.set("bad header", "x"), Err(Error::InvalidHeader { .. })));
        assert!(matches!(res.set("x-ok", "line\nbreak"), Err(Error::InvalidHeader { .. })));
    }

    #[test]
    fn set_type_shorthands() {
        let mut res = response();
        res.set_type("json").unwrap();
        assert_eq!(res.get("content-type"), Some(APPLICATION_JSON));
        assert_eq!(res.is(&["json"]), Some("json".into()));
        res.set_type("not-a-type").unwrap();
        assert_eq!(res.get("content-type"), None);
    }

    #[test]
    fn etag_quoting() {
        let mut res = response();
        res.set_etag("abc").unwrap();
        assert_eq!(res.etag(), Some("\"abc\""));
        res.set_etag("W/\"weak\"").unwrap();
        assert_eq!(res.etag(), Some("W/\"weak\""));
    }

    #[test]
    fn last_modified_round_trip() {
        let mut res = response();
        let date = fresh::parse_http_date("Sun, 06 Nov 1994 08:49:37 GMT").unwrap();
        res.set_last_modified(date).unwrap();
        assert_eq!(res.get("last-modified"), Some("Sun, 06 Nov 1994 08:49:37 GMT"));
        assert_eq!(res.last_modified(), Some(date));
    }

    #[test]
    fn vary_accumulates() {
        let mut res = response();
        res.vary("Accept").unwrap();
        res.vary("Origin").unwrap();
        res.vary("accept").unwrap();
        assert_eq!(res.get("vary"), Some("Accept, Origin"));
        res.vary("*").unwrap();
        assert_eq!(res.get("vary"), Some("*"));
    }

    #[test]
    fn redirect_bodies() {
        let mut res = response();
        res.redirect("/login?next=<x>", true).unwrap();
        assert_eq!(res.status(), 302);
        assert_eq!(res.get("location"), Some("/login?next=<x>"));
        assert_eq!(
            res.body().as_text(),
            Some("Redirecting to <a href=\"/login?next=&lt;x&gt;\">/login?next=&lt;x&gt;</a>.")
        );

        let mut res = response();
        res.set_status(301).unwrap();
        res.redirect("/moved", false).unwrap();
        assert_eq!(res.status(), 301);
        assert_eq!(res.body().as_text(), Some("Redirecting to /moved."));
        assert_eq!(res.content_type(), "text/plain");
    }

    #[test]
    fn attachment_disposition() {
        let mut res = response();
        res.attachment(Some("path/to/report.pdf")).unwrap();
        assert_eq!(res.content_type(), "application/pdf");
        assert_eq!(res.get("content-disposition"), Some("attachment; filename=\"report.pdf\""));

        res.attachment(Some("plán.txt")).unwrap();
        assert_eq!(
            res.get("content-disposition"),
            Some("attachment; filename=\"pl?n.txt\"; filename*=UTF-8''pl%C3%A1n.txt")
        );

        res.attachment(None).unwrap();
        assert_eq!(res.get("content-disposition"), Some("attachment"));
    }

    #[test]
    fn message_override() {
        let mut res = response();
        res.set_status(200).unwrap();
        res.set_message("Fine");
        assert_eq!(res.message(), "Fine");
        res.set_status(202).unwrap();
        assert_eq!(res.message(), "Accepted");
    }
}

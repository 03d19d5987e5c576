//! Raw transport descriptors.
//!
//! `RawRequest` is what the transport hands over for one request;
//! `RawResponse` is the outgoing sink. The facades in `crate::http` are
//! computed views over these two and never own the transport itself.

use std::net::SocketAddr;

use axum::body::{Body as WireBody, Bytes};
use axum::extract::ConnectInfo;
use axum::http::{self, HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri, Version};

use crate::http::body::BodyStream;

/// Request extension set by a TLS-terminating adapter.
#[derive(Debug, Clone, Copy, Default)]
pub struct Encrypted;

/// Incoming request descriptor.
#[derive(Debug)]
pub struct RawRequest {
    pub method: Method,
    pub uri: Uri,
    pub version: Version,
    pub headers: HeaderMap,
    /// Readable body, taken at most once.
    pub body: Option<WireBody>,
    pub remote_addr: Option<SocketAddr>,
    /// Whether the channel the request arrived on is encrypted.
    pub encrypted: bool,
}

impl RawRequest {
    /// Bodiless request, mostly for tests and synthetic dispatch.
    pub fn new(method: Method, uri: Uri) -> Self {
        Self {
            method,
            uri,
            version: Version::HTTP_11,
            headers: HeaderMap::new(),
            body: None,
            remote_addr: None,
            encrypted: false,
        }
    }

    /// Build a descriptor from an `http::Request` as delivered by axum/hyper.
    pub fn from_http(request: http::Request<WireBody>) -> Self {
        let (parts, body) = request.into_parts();
        let remote_addr = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        let encrypted = parts.extensions.get::<Encrypted>().is_some()
            || parts.uri.scheme_str() == Some("https");
        Self {
            method: parts.method,
            uri: parts.uri,
            version: parts.version,
            headers: parts.headers,
            body: Some(body),
            remote_addr,
            encrypted,
        }
    }
}

/// What the sink was finished with.
pub enum Payload {
    Empty,
    Bytes(Bytes),
    Stream(BodyStream),
}

impl Payload {
    /// Bytes written, if the payload was not streamed.
    pub fn bytes(&self) -> Option<&[u8]> {
        match self {
            Payload::Empty => Some(&b""[..]),
            Payload::Bytes(bytes) => Some(&bytes[..]),
            Payload::Stream(_) => None,
        }
    }

    fn into_wire(self) -> WireBody {
        match self {
            Payload::Empty => WireBody::empty(),
            Payload::Bytes(bytes) => WireBody::from(bytes),
            Payload::Stream(stream) => WireBody::from_stream(stream),
        }
    }
}

impl std::fmt::Debug for Payload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Payload::Empty => f.write_str("Empty"),
            Payload::Bytes(bytes) => f.debug_tuple("Bytes").field(bytes).finish(),
            Payload::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

/// Sink lifecycle: open until ended, or closed by the peer.
#[derive(Debug)]
enum SinkState {
    Open,
    Ended(Payload),
    Closed,
}

/// Outgoing response sink.
#[derive(Debug)]
pub struct RawResponse {
    status: StatusCode,
    headers: HeaderMap,
    state: SinkState,
}

impl Default for RawResponse {
    fn default() -> Self {
        Self::new()
    }
}

impl RawResponse {
    /// Fresh sink. The status starts at 404 until something claims the request.
    pub fn new() -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            headers: HeaderMap::new(),
            state: SinkState::Open,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn set_status(&mut self, status: StatusCode) {
        if self.is_open() {
            self.status = status;
        }
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// First value of `name`, if it is valid visible ASCII.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn has_header(&self, name: &str) -> bool {
        self.headers.contains_key(name)
    }

    pub fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        if self.is_open() {
            self.headers.insert(name, value);
        }
    }

    pub fn append_header(&mut self, name: HeaderName, value: HeaderValue) {
        if self.is_open() {
            self.headers.append(name, value);
        }
    }

    pub fn remove_header(&mut self, name: &str) {
        if self.is_open() {
            self.headers.remove(name);
        }
    }

    pub fn clear_headers(&mut self) {
        if self.is_open() {
            self.headers.clear();
        }
    }

    /// True once status and headers are committed.
    pub fn headers_sent(&self) -> bool {
        matches!(self.state, SinkState::Ended(_))
    }

    /// True while the sink still accepts a terminal write.
    pub fn writable(&self) -> bool {
        self.is_open()
    }

    /// Terminate the response. Later calls are ignored.
    pub fn end(&mut self, payload: Payload) {
        if self.is_open() {
            self.state = SinkState::Ended(payload);
        } else {
            tracing::trace!("ignoring write to a finished response");
        }
    }

    /// Mark the peer as gone; nothing more can be written.
    pub fn close(&mut self) {
        if self.is_open() {
            self.state = SinkState::Closed;
        }
    }

    /// Payload the response was ended with.
    pub fn payload(&self) -> Option<&Payload> {
        match &self.state {
            SinkState::Ended(payload) => Some(payload),
            _ => None,
        }
    }

    /// Convert into a wire response. An unfinished sink yields an empty body.
    pub fn into_http(self) -> http::Response<WireBody> {
        let body = match self.state {
            SinkState::Ended(payload) => payload.into_wire(),
            SinkState::Open | SinkState::Closed => WireBody::empty(),
        };
        let mut response = http::Response::new(body);
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }

    fn is_open(&self) -> bool {
        matches!(self.state, SinkState::Open)
    }
}

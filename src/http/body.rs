//! Response body values and their classification.
//!
//! A body is exactly one of five kinds. The kind drives the header
//! bookkeeping in `Response::set_body` and the terminal write in the
//! responder.

use std::fmt;
use std::pin::Pin;

use axum::body::Bytes;
use futures_util::{Stream, TryStreamExt};

use crate::error::BoxError;

/// Pipeable byte stream used for streamed bodies.
pub type BodyStream = Pin<Box<dyn Stream<Item = Result<Bytes, BoxError>> + Send>>;

/// Classification of a [`Body`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Empty,
    Text,
    Binary,
    Stream,
    Structured,
}

/// Outgoing body value.
#[derive(Default)]
pub enum Body {
    #[default]
    Empty,
    Text(String),
    Binary(Bytes),
    Stream(BodyStream),
    Structured(serde_json::Value),
}

impl Body {
    /// Wrap a fallible byte stream.
    pub fn stream<S, B, E>(stream: S) -> Self
    where
        S: Stream<Item = Result<B, E>> + Send + 'static,
        B: Into<Bytes> + 'static,
        E: Into<BoxError> + 'static,
    {
        Body::Stream(Box::pin(
            stream
                .map_ok(Into::<Bytes>::into)
                .map_err(Into::<BoxError>::into),
        ))
    }

    /// Serialize `value` into a structured body.
    pub fn json<T: serde::Serialize + ?Sized>(value: &T) -> Result<Self, serde_json::Error> {
        serde_json::to_value(value).map(Body::from)
    }

    pub fn kind(&self) -> BodyKind {
        classify(self)
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Body::Empty)
    }

    /// Byte length the body would have on the wire.
    ///
    /// `None` for streams; structured bodies are serialized to measure them.
    pub fn byte_len(&self) -> Option<u64> {
        match self {
            Body::Empty => Some(0),
            Body::Text(text) => Some(text.len() as u64),
            Body::Binary(bytes) => Some(bytes.len() as u64),
            Body::Stream(_) => None,
            Body::Structured(value) => serde_json::to_vec(value).ok().map(|v| v.len() as u64),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Body::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Body::Binary(bytes) => Some(bytes),
            _ => None,
        }
    }

    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Body::Structured(value) => Some(value),
            _ => None,
        }
    }
}

/// Classify a body value.
///
/// A JSON `null` never reaches here as `Structured`: the conversions
/// below turn it into `Empty`.
pub fn classify(body: &Body) -> BodyKind {
    match body {
        Body::Empty => BodyKind::Empty,
        Body::Text(_) => BodyKind::Text,
        Body::Binary(_) => BodyKind::Binary,
        Body::Stream(_) => BodyKind::Stream,
        Body::Structured(_) => BodyKind::Structured,
    }
}

/// True when text should be served as HTML (leading `<` after whitespace).
pub fn looks_like_html(text: &str) -> bool {
    text.trim_start().starts_with('<')
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Body::Empty => f.write_str("Empty"),
            Body::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Body::Binary(bytes) => f.debug_tuple("Binary").field(&bytes.len()).finish(),
            Body::Stream(_) => f.write_str("Stream(..)"),
            Body::Structured(value) => f.debug_tuple("Structured").field(value).finish(),
        }
    }
}

impl From<()> for Body {
    fn from(_: ()) -> Self {
        Body::Empty
    }
}

impl From<&str> for Body {
    fn from(text: &str) -> Self {
        Body::Text(text.to_owned())
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Body::Text(text)
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Body::Binary(Bytes::from(bytes))
    }
}

impl From<&'static [u8]> for Body {
    fn from(bytes: &'static [u8]) -> Self {
        Body::Binary(Bytes::from_static(bytes))
    }
}

impl From<Bytes> for Body {
    fn from(bytes: Bytes) -> Self {
        Body::Binary(bytes)
    }
}

impl From<BodyStream> for Body {
    fn from(stream: BodyStream) -> Self {
        Body::Stream(stream)
    }
}

impl From<serde_json::Value> for Body {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Body::Empty,
            value => Body::Structured(value),
        }
    }
}

impl<T: Into<Body>> From<Option<T>> for Body {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Body::Empty)
    }
}

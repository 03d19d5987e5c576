//! Crate-wide error type.
//!
//! # Taxonomy
//! - Protocol violations (`next` invoked twice) and invalid status
//!   assignments are programmer errors raised at the call site.
//! - Application errors come out of middleware and are routed through
//!   `Context::on_error`, which maps them onto a status and a message.
//! - Panics inside middleware are caught by the dispatcher and normalized
//!   into [`Error::Panic`], so callers see one uniform error channel.

use std::any::Any;

use thiserror::Error;

/// Boxed error used for opaque failures and stream items.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors produced by the pipeline, the facades and middleware.
#[derive(Debug, Error)]
pub enum Error {
    /// A middleware invoked its continuation more than once.
    #[error("next() called multiple times")]
    NextCalledMultipleTimes,

    /// Status code absent from the known-status table.
    #[error("invalid status code: {0}")]
    InvalidStatus(u16),

    /// Application error carrying an HTTP status.
    #[error("{message}")]
    Http {
        status: u16,
        message: String,
        /// Whether `message` may be sent to the client verbatim.
        expose: bool,
    },

    /// Header name or value that cannot be put on the wire.
    #[error("invalid header {name}: {reason}")]
    InvalidHeader { name: String, reason: String },

    /// Manual header write contradicting the current body.
    #[error("header {name} conflicts with the current body: {reason}")]
    HeaderConflict { name: String, reason: String },

    /// URL, path or query rewrite that does not form a valid URI.
    #[error("invalid uri: {0}")]
    InvalidUri(String),

    /// Reading the request body failed or exceeded its limit.
    #[error("failed to read request body: {0}")]
    BodyRead(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// A middleware panicked; holds the panic message.
    #[error("middleware panicked: {0}")]
    Panic(String),

    #[error(transparent)]
    Other(BoxError),
}

impl Error {
    /// Build an application error for `status`.
    ///
    /// Client errors (< 500) are exposable by default, server errors are not.
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Error::Http {
            status,
            message: message.into(),
            expose: status < 500,
        }
    }

    /// Build an application error whose message is the canonical phrase.
    pub fn status(status: u16) -> Self {
        let message = crate::http::status::reason_phrase(status).unwrap_or("Unknown Error");
        Self::http(status, message)
    }

    /// Wrap any error as an opaque failure.
    pub fn other<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        Error::Other(err.into())
    }

    /// Override the expose flag of an [`Error::Http`]. No-op for other kinds.
    pub fn exposed(mut self, value: bool) -> Self {
        if let Error::Http { expose, .. } = &mut self {
            *expose = value;
        }
        self
    }

    /// Status carried by the error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Http { status, .. } => Some(*status),
            Error::BodyRead(_) => Some(400),
            _ => None,
        }
    }

    /// Whether the error message is safe to return to the client.
    pub fn expose(&self) -> bool {
        match self {
            Error::Http { expose, .. } => *expose,
            _ => false,
        }
    }

    /// True for the "resource not found" I/O condition.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Io(e) if e.kind() == std::io::ErrorKind::NotFound)
    }

    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::NextCalledMultipleTimes => "protocol",
            Error::InvalidStatus(_) => "invalid_status",
            Error::Http { .. } => "http",
            Error::InvalidHeader { .. } | Error::HeaderConflict { .. } => "header",
            Error::InvalidUri(_) => "uri",
            Error::BodyRead(_) => "body",
            Error::Io(_) => "io",
            Error::Json(_) => "json",
            Error::Panic(_) => "panic",
            Error::Other(_) => "other",
        }
    }

    /// Normalize a panic payload into an error.
    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic".to_string()
        };
        Error::Panic(message)
    }
}

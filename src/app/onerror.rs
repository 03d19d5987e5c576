//! Error path.
//!
//! # Responsibilities
//! - Report every routed error once, to the registered hook or the
//!   default logger
//! - Replace whatever the pipeline built with a minimal text response,
//!   unless the response is already committed
//!
//! # Design Decisions
//! - Only exposable errors (or `expose_internal_errors`) reach the client
//!   verbatim; everything else gets the canonical reason phrase
//! - Exposure is judged after status resolution, so an error whose code
//!   was replaced by 500 never leaks its message
//! - A no-body error status is written with no payload at all

use axum::body::Bytes;
use axum::http::{header, HeaderValue, StatusCode};

use crate::app::Context;
use crate::error::Error;
use crate::http::status;
use crate::net::raw::Payload;

/// Status the client sees for `err`.
pub fn resolve_status(err: &Error) -> u16 {
    if err.is_not_found() {
        return 404;
    }
    match err.status_code() {
        Some(code) if status::is_known(code) => code,
        _ => 500,
    }
}

/// Whether `err` may be shown to the client. An error whose own status was
/// replaced during resolution is never exposed.
pub fn exposable(err: &Error) -> bool {
    err.expose() && err.status_code() == Some(resolve_status(err))
}

/// Default diagnostic handler used when no hook is registered.
pub fn log_error(err: &Error, ctx: &Context) {
    if ctx.app().silent || exposable(err) || resolve_status(err) == 404 {
        return;
    }
    tracing::error!(
        error = %err,
        kind = err.kind(),
        method = %ctx.method(),
        url = %ctx.url(),
        "unhandled error"
    );
}

impl Context {
    /// Route a failure to the client and the diagnostic channel.
    pub fn on_error(&mut self, err: Error) {
        let committed = self.headers_sent() || !self.writable();

        match &self.shared().error_hook {
            Some(hook) => hook(&err, self),
            None => log_error(&err, self),
        }

        if committed {
            tracing::debug!(error = %err, "response already committed, error not delivered");
            return;
        }

        let code = resolve_status(&err);
        let message = if exposable(&err) || self.app().expose_internal_errors {
            err.to_string()
        } else {
            status::reason_phrase(code).unwrap_or("").to_string()
        };

        drop(self.response_mut().take_body());
        let raw = self.raw_response_mut();
        raw.clear_headers();
        raw.set_status(StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR));

        if status::is_empty(code) {
            raw.end(Payload::Empty);
            return;
        }

        raw.set_header(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        raw.set_header(header::CONTENT_LENGTH, HeaderValue::from(message.len() as u64));
        raw.end(Payload::Bytes(Bytes::from(message)));
    }
}

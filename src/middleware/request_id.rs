//! Request ID assignment.
//!
//! # Responsibilities
//! - Reuse a well-formed incoming `X-Request-Id`, or generate a UUID v4
//! - Store it in the context state bag and echo it on the response
//!
//! # Design Decisions
//! - Added as early as possible so every later log line can carry it
//! - Incoming IDs are bounded and must be visible ASCII

use uuid::Uuid;

use crate::app::Context;
use crate::error::Result;
use crate::pipeline::{BoxFuture, Middleware, Next};

/// Request ID header name.
pub const X_REQUEST_ID: &str = "x-request-id";

const MAX_INCOMING_LEN: usize = 128;

/// The ID assigned to the current request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestId(pub String);

impl RequestId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Access to the request ID from a context.
pub trait RequestIdExt {
    fn request_id(&self) -> Option<&str>;
}

impl RequestIdExt for Context {
    fn request_id(&self) -> Option<&str> {
        self.state().get::<RequestId>().map(RequestId::as_str)
    }
}

fn acceptable(id: &str) -> bool {
    !id.is_empty() && id.len() <= MAX_INCOMING_LEN && id.bytes().all(|b| b.is_ascii_graphic())
}

/// Middleware assigning [`RequestId`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestIdMiddleware;

impl Middleware for RequestIdMiddleware {
    fn call<'a>(&'a self, ctx: &'a mut Context, next: Next<'a>) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let id = match ctx.get(X_REQUEST_ID).filter(|id| acceptable(id)) {
                Some(incoming) => RequestId(incoming.to_string()),
                None => RequestId::generate(),
            };
            ctx.set(X_REQUEST_ID, id.as_str())?;
            ctx.state_mut().insert(id);
            next.run(ctx).await
        })
    }
}

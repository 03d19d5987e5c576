//! One log line per request.

use std::time::Instant;

use crate::app::onerror::resolve_status;
use crate::app::Context;
use crate::error::Result;
use crate::middleware::request_id::RequestIdExt;
use crate::pipeline::{BoxFuture, Middleware, Next};

/// Logs method, path, status and latency once the downstream chain settles.
///
/// Failed requests are logged with the status the error handler will use.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessLog;

impl Middleware for AccessLog {
    fn call<'a>(&'a self, ctx: &'a mut Context, next: Next<'a>) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let start = Instant::now();
            let result = next.run(ctx).await;
            let status = match &result {
                Ok(()) => ctx.status(),
                Err(err) => resolve_status(err),
            };
            tracing::info!(
                request_id = ctx.request_id().unwrap_or("-"),
                method = %ctx.method(),
                path = %ctx.path(),
                status,
                latency_ms = start.elapsed().as_millis() as u64,
                "request completed"
            );
            result
        })
    }
}

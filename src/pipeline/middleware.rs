//! Middleware trait and closure adapter.

use std::future::Future;
use std::pin::Pin;

use crate::app::Context;
use crate::error::Result;
use crate::pipeline::Next;

/// Boxed, sendable future used at the middleware seam.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// One stage of the onion.
///
/// A middleware receives the request context and the continuation for the
/// rest of the chain. Code before `next.run(ctx).await` runs on the way in,
/// code after it on the way out. Not calling `next` short-circuits the
/// downstream middleware.
///
/// ```ignore
/// struct Timing;
///
/// impl Middleware for Timing {
///     fn call<'a>(&'a self, ctx: &'a mut Context, next: Next<'a>) -> BoxFuture<'a, Result<()>> {
///         Box::pin(async move {
///             let start = std::time::Instant::now();
///             next.run(ctx).await?;
///             tracing::debug!(elapsed = ?start.elapsed(), "downstream finished");
///             Ok(())
///         })
///     }
/// }
/// ```
pub trait Middleware<C = Context>: Send + Sync {
    fn call<'a>(&'a self, ctx: &'a mut C, next: Next<'a, C>) -> BoxFuture<'a, Result<()>>;

    /// Name used in logs.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Middleware built from a closure. See [`from_fn`].
pub struct FromFn<F> {
    f: F,
}

/// Turn a closure into a middleware.
///
/// ```ignore
/// let hello = from_fn(|ctx: &mut Context, next| Box::pin(async move {
///     next.run(ctx).await?;
///     ctx.set_body("hello");
///     Ok(())
/// }));
/// ```
pub fn from_fn<C, F>(f: F) -> FromFn<F>
where
    F: for<'a> Fn(&'a mut C, Next<'a, C>) -> BoxFuture<'a, Result<()>> + Send + Sync + 'static,
{
    FromFn { f }
}

impl<C, F> Middleware<C> for FromFn<F>
where
    C: Send + 'static,
    F: for<'a> Fn(&'a mut C, Next<'a, C>) -> BoxFuture<'a, Result<()>> + Send + Sync,
{
    fn call<'a>(&'a self, ctx: &'a mut C, next: Next<'a, C>) -> BoxFuture<'a, Result<()>> {
        (self.f)(ctx, next)
    }

    fn name(&self) -> &'static str {
        std::any::type_name::<F>()
    }
}

//! Middleware composition.
//!
//! # Data Flow
//! ```text
//! Vec<Arc<dyn Middleware>>
//!     → compose() (frozen Pipeline, nothing runs yet)
//!     → Pipeline::dispatch(ctx) (fresh cursor per call)
//!     → middleware[0](ctx, next) → middleware[1](ctx, next) → ...
//!     ← unwinds in reverse order as each `next.run(ctx)` resolves
//! ```

pub mod compose;
pub mod middleware;

pub use compose::{compose, Next, Pipeline};
pub use middleware::{from_fn, BoxFuture, FromFn, Middleware};

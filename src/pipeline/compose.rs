//! Onion composition.
//!
//! # Invariants
//! - Each dispatch owns a fresh cursor starting at -1; nothing is shared
//!   between dispatches except the frozen chain.
//! - A continuation whose index is not past the cursor fails with
//!   [`Error::NextCalledMultipleTimes`] before anything downstream runs.
//! - A panic while building or polling a middleware future surfaces as
//!   [`Error::Panic`] on the same channel as returned errors.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicIsize, Ordering};
use std::sync::Arc;

use futures_util::future::{self, FutureExt};

use crate::app::Context;
use crate::error::{Error, Result};
use crate::pipeline::{BoxFuture, Middleware};

/// Continuation handed to a middleware: the rest of the chain.
pub struct Next<'a, C = Context> {
    chain: &'a [Arc<dyn Middleware<C>>],
    index: usize,
    cursor: &'a AtomicIsize,
    /// Continuation of an enclosing pipeline, run once this chain is exhausted.
    tail: Option<&'a Next<'a, C>>,
}

impl<C> Clone for Next<'_, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C> Copy for Next<'_, C> {}

impl<C> fmt::Debug for Next<'_, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next")
            .field("index", &self.index)
            .field("len", &self.chain.len())
            .field("nested", &self.tail.is_some())
            .finish()
    }
}

impl<'a, C: Send + 'static> Next<'a, C> {
    /// Run the rest of the chain against `ctx`.
    pub fn run<'b>(&self, ctx: &'b mut C) -> BoxFuture<'b, Result<()>>
    where
        'a: 'b,
    {
        let next: Next<'b, C> = *self;
        next.step(ctx)
    }

    fn step(self, ctx: &'a mut C) -> BoxFuture<'a, Result<()>> {
        let index = self.index as isize;
        if index <= self.cursor.load(Ordering::SeqCst) {
            return Box::pin(future::ready(Err(Error::NextCalledMultipleTimes)));
        }
        self.cursor.store(index, Ordering::SeqCst);

        match self.chain.get(self.index) {
            Some(middleware) => {
                let next = Next {
                    index: self.index + 1,
                    ..self
                };
                guarded(move || middleware.call(ctx, next))
            }
            None => match self.tail {
                Some(tail) if self.index == self.chain.len() => tail.run(ctx),
                _ => Box::pin(future::ready(Ok(()))),
            },
        }
    }
}

/// Invoke `start` and poll its future with panics turned into errors.
fn guarded<'a, F>(start: F) -> BoxFuture<'a, Result<()>>
where
    F: FnOnce() -> BoxFuture<'a, Result<()>>,
{
    match panic::catch_unwind(AssertUnwindSafe(start)) {
        Ok(fut) => Box::pin(AssertUnwindSafe(fut).catch_unwind().map(|outcome| {
            outcome.unwrap_or_else(|payload| Err(Error::from_panic(payload)))
        })),
        Err(payload) => Box::pin(future::ready(Err(Error::from_panic(payload)))),
    }
}

/// A frozen, composed middleware chain.
pub struct Pipeline<C = Context> {
    chain: Arc<[Arc<dyn Middleware<C>>]>,
}

/// Compose middleware into a pipeline. Nothing runs until dispatch.
pub fn compose<C>(middleware: Vec<Arc<dyn Middleware<C>>>) -> Pipeline<C> {
    Pipeline {
        chain: middleware.into(),
    }
}

impl<C> Clone for Pipeline<C> {
    fn clone(&self) -> Self {
        Self {
            chain: Arc::clone(&self.chain),
        }
    }
}

impl<C> fmt::Debug for Pipeline<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.chain.iter().map(|m| m.name()))
            .finish()
    }
}

impl<C> Pipeline<C> {
    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }
}

impl<C: Send + 'static> Pipeline<C> {
    /// Run the chain against `ctx` with a fresh cursor.
    pub async fn dispatch(&self, ctx: &mut C) -> Result<()> {
        let cursor = AtomicIsize::new(-1);
        let next = Next {
            chain: &self.chain[..],
            index: 0,
            cursor: &cursor,
            tail: None,
        };
        next.run(ctx).await
    }
}

/// A pipeline is itself a middleware: the enclosing `next` runs after its
/// last stage calls through.
impl<C: Send + 'static> Middleware<C> for Pipeline<C> {
    fn call<'a>(&'a self, ctx: &'a mut C, next: Next<'a, C>) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let cursor = AtomicIsize::new(-1);
            let inner = Next {
                chain: &self.chain[..],
                index: 0,
                cursor: &cursor,
                tail: Some(&next),
            };
            inner.run(ctx).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::from_fn;
    use std::sync::atomic::AtomicUsize;

    type Trace = Vec<String>;

    fn mw<F>(f: F) -> Arc<dyn Middleware<Trace>>
    where
        F: for<'a> Fn(&'a mut Trace, Next<'a, Trace>) -> BoxFuture<'a, Result<()>>
            + Send
            + Sync
            + 'static,
    {
        Arc::new(from_fn(f))
    }

    fn around(name: &'static str) -> Arc<dyn Middleware<Trace>> {
        mw(move |trace, next| {
            Box::pin(async move {
                trace.push(format!("{name}:enter"));
                next.run(trace).await?;
                trace.push(format!("{name}:exit"));
                Ok(())
            })
        })
    }

    #[tokio::test]
    async fn onion_order() {
        let pipeline = compose(vec![around("a"), around("b"), around("c")]);
        let mut trace = Trace::new();
        pipeline.dispatch(&mut trace).await.unwrap();
        assert_eq!(
            trace,
            ["a:enter", "b:enter", "c:enter", "c:exit", "b:exit", "a:exit"]
        );
    }

    #[tokio::test]
    async fn empty_pipeline_resolves() {
        let pipeline = compose::<Trace>(Vec::new());
        let mut trace = Trace::new();
        pipeline.dispatch(&mut trace).await.unwrap();
        assert!(trace.is_empty());
        assert!(pipeline.is_empty());
    }

    #[tokio::test]
    async fn order_holds_for_any_length() {
        for n in 0..6 {
            let names: Vec<&'static str> = ["m0", "m1", "m2", "m3", "m4", "m5"][..n].to_vec();
            let pipeline = compose(names.iter().map(|name| around(*name)).collect());
            let mut trace = Trace::new();
            pipeline.dispatch(&mut trace).await.unwrap();

            let enters: Vec<String> = names.iter().map(|n| format!("{n}:enter")).collect();
            let exits: Vec<String> = names.iter().rev().map(|n| format!("{n}:exit")).collect();
            assert_eq!(trace, [enters, exits].concat());
        }
    }

    #[tokio::test]
    async fn short_circuit_skips_downstream() {
        let stop = mw(|trace, _next| {
            Box::pin(async move {
                trace.push("stop".into());
                Ok(())
            })
        });
        let pipeline = compose(vec![around("a"), stop, around("never")]);
        let mut trace = Trace::new();
        pipeline.dispatch(&mut trace).await.unwrap();
        assert_eq!(trace, ["a:enter", "stop", "a:exit"]);
    }

    #[tokio::test]
    async fn double_next_fails_once() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = {
            let hits = Arc::clone(&hits);
            mw(move |_trace, _next| {
                let hits = Arc::clone(&hits);
                Box::pin(async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                })
            })
        };
        let twice = mw(|trace, next| {
            Box::pin(async move {
                next.run(trace).await?;
                next.run(trace).await
            })
        });
        let pipeline = compose(vec![twice, counter]);
        let mut trace = Trace::new();
        let err = pipeline.dispatch(&mut trace).await.unwrap_err();
        assert!(matches!(err, Error::NextCalledMultipleTimes));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn errors_propagate_through_every_layer() {
        let fail = mw(|_trace, _next| Box::pin(async move { Result::<()>::Err(Error::http(418, "teapot")) }));
        let pipeline = compose(vec![around("a"), around("b"), fail]);
        let mut trace = Trace::new();
        let err = pipeline.dispatch(&mut trace).await.unwrap_err();
        assert_eq!(err.status_code(), Some(418));
        assert_eq!(trace, ["a:enter", "b:enter"]);
    }

    #[tokio::test]
    async fn sync_panic_becomes_error() {
        let boom = mw(|_trace, _next| panic!("boom"));
        let pipeline = compose(vec![around("a"), boom]);
        let mut trace = Trace::new();
        let err = pipeline.dispatch(&mut trace).await.unwrap_err();
        assert!(matches!(err, Error::Panic(ref m) if m == "boom"));
        assert_eq!(trace, ["a:enter"]);
    }

    #[tokio::test]
    async fn async_panic_becomes_error() {
        let late = mw(|trace, _next| {
            Box::pin(async move {
                tokio::task::yield_now().await;
                if trace.len() < 10 {
                    panic!("late");
                }
                Ok(())
            })
        });
        let pipeline = compose(vec![late]);
        let mut trace = Trace::new();
        let err = pipeline.dispatch(&mut trace).await.unwrap_err();
        assert!(matches!(err, Error::Panic(ref m) if m == "late"));
    }

    #[tokio::test]
    async fn nested_pipeline_continues_outer_chain() {
        let inner: Arc<dyn Middleware<Trace>> = Arc::new(compose(vec![around("x"), around("y")]));
        let pipeline = compose(vec![around("a"), inner, around("b")]);
        let mut trace = Trace::new();
        pipeline.dispatch(&mut trace).await.unwrap();
        assert_eq!(
            trace,
            ["a:enter", "x:enter", "y:enter", "b:enter", "b:exit", "y:exit", "x:exit", "a:exit"]
        );
    }

    #[tokio::test]
    async fn dispatches_do_not_share_cursor() {
        let pipeline = compose(vec![around("a")]);
        for _ in 0..3 {
            let mut trace = Trace::new();
            pipeline.dispatch(&mut trace).await.unwrap();
            assert_eq!(trace, ["a:enter", "a:exit"]);
        }
    }

    #[tokio::test]
    async fn concurrent_dispatches() {
        let pipeline = compose(vec![around("a"), around("b")]);
        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let pipeline = pipeline.clone();
                tokio::spawn(async move {
                    let mut trace = Trace::new();
                    pipeline.dispatch(&mut trace).await.map(|_| trace)
                })
            })
            .collect();
        for task in tasks {
            let trace = task.await.unwrap().unwrap();
            assert_eq!(trace, ["a:enter", "b:enter", "b:exit", "a:exit"]);
        }
    }
}

//! Application and request handler.
//!
//! # Responsibilities
//! - Collect middleware and the error hook before serving
//! - Freeze them into a [`RequestHandler`] that runs the full cycle:
//!   create context → dispatch → respond, or route the failure to the
//!   error handler
//!
//! # Design Decisions
//! - `into_handler` consumes the application, so registration after
//!   activation cannot compile
//! - The handler is cheap to clone and shared by every connection

use std::convert::Infallible;
use std::fmt;
use std::sync::Arc;
use std::task::{Context as TaskContext, Poll};
use std::time::Instant;

use axum::body::Body as WireBody;
use axum::http;
use tower::Service;

use crate::app::respond::respond;
use crate::app::Context;
use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::net::raw::{RawRequest, RawResponse};
use crate::observability::metrics;
use crate::pipeline::{compose, from_fn, BoxFuture, Middleware, Next, Pipeline};

/// Callback receiving every error routed through the error handler.
pub type ErrorHook = Arc<dyn Fn(&Error, &Context) + Send + Sync>;

/// Read-only application data every context points back to.
pub(crate) struct Shared {
    pub(crate) config: AppConfig,
    pub(crate) error_hook: Option<ErrorHook>,
    pub(crate) metrics: bool,
}

impl Default for Shared {
    fn default() -> Self {
        Self {
            config: AppConfig::default(),
            error_hook: None,
            metrics: true,
        }
    }
}

/// Middleware registry and configuration, before serving starts.
pub struct Application {
    config: AppConfig,
    middleware: Vec<Arc<dyn Middleware>>,
    error_hook: Option<ErrorHook>,
    metrics: bool,
}

impl Application {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            middleware: Vec::new(),
            error_hook: None,
            metrics: true,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Append a middleware. Order of registration is order of entry.
    pub fn register<M>(&mut self, middleware: M) -> &mut Self
    where
        M: Middleware + 'static,
    {
        tracing::debug!(middleware = middleware.name(), position = self.middleware.len(), "middleware registered");
        self.middleware.push(Arc::new(middleware));
        self
    }

    /// Append a closure middleware.
    pub fn register_fn<F>(&mut self, f: F) -> &mut Self
    where
        F: for<'a> Fn(&'a mut Context, Next<'a>) -> BoxFuture<'a, Result<()>> + Send + Sync + 'static,
    {
        self.register(from_fn(f))
    }

    /// Install the error hook, replacing the default logger.
    pub fn on_error<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(&Error, &Context) + Send + Sync + 'static,
    {
        self.error_hook = Some(Arc::new(hook));
        self
    }

    /// Toggle request/error metrics.
    pub fn metrics(&mut self, enabled: bool) -> &mut Self {
        self.metrics = enabled;
        self
    }

    pub fn middleware_count(&self) -> usize {
        self.middleware.len()
    }

    /// Freeze the middleware list and produce the request handler.
    pub fn into_handler(self) -> RequestHandler {
        let pipeline = compose(self.middleware);
        tracing::debug!(env = %self.config.env, middleware = pipeline.len(), "application frozen");
        RequestHandler {
            shared: Arc::new(Shared {
                config: self.config,
                error_hook: self.error_hook,
                metrics: self.metrics,
            }),
            pipeline,
        }
    }
}

impl Default for Application {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}

impl fmt::Debug for Application {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Application")
            .field("config", &self.config)
            .field("middleware", &self.middleware.len())
            .field("error_hook", &self.error_hook.is_some())
            .finish()
    }
}

/// The frozen application, ready to serve requests.
#[derive(Clone)]
pub struct RequestHandler {
    shared: Arc<Shared>,
    pipeline: Pipeline,
}

impl RequestHandler {
    pub fn config(&self) -> &AppConfig {
        &self.shared.config
    }

    /// Run one request through a fresh sink.
    pub async fn handle(&self, request: RawRequest) -> RawResponse {
        self.handle_with(request, RawResponse::new()).await
    }

    /// Run one request into the given sink.
    pub async fn handle_with(&self, request: RawRequest, response: RawResponse) -> RawResponse {
        let start = Instant::now();
        let method = request.method.clone();
        let mut ctx = Context::new(request, response, Arc::clone(&self.shared));

        let mut outcome = self.pipeline.dispatch(&mut ctx).await;
        if outcome.is_ok() {
            outcome = respond(&mut ctx);
        }
        if let Err(err) = outcome {
            if self.shared.metrics {
                metrics::record_error(err.kind());
            }
            ctx.on_error(err);
        }

        if self.shared.metrics {
            metrics::record_request(method.as_str(), ctx.status(), start);
        }
        ctx.into_raw_response()
    }
}

impl fmt::Debug for RequestHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestHandler")
            .field("config", &self.shared.config)
            .field("pipeline", &self.pipeline)
            .finish()
    }
}

impl Service<http::Request<WireBody>> for RequestHandler {
    type Response = http::Response<WireBody>;
    type Error = Infallible;
    type Future = BoxFuture<'static, std::result::Result<Self::Response, Infallible>>;

    fn poll_ready(&mut self, _cx: &mut TaskContext<'_>) -> Poll<std::result::Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: http::Request<WireBody>) -> Self::Future {
        let handler = self.clone();
        Box::pin(async move {
            let response = handler.handle(RawRequest::from_http(request)).await;
            Ok(response.into_http())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::raw::Payload;
    use axum::http::Method;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn get(path: &str) -> RawRequest {
        RawRequest::new(Method::GET, path.parse().unwrap())
    }

    fn payload_text(res: &RawResponse) -> String {
        let bytes = res.payload().and_then(Payload::bytes).unwrap_or_default();
        String::from_utf8_lossy(bytes).into_owned()
    }

    #[tokio::test]
    async fn empty_application_answers_not_found() {
        let handler = Application::default().into_handler();
        let res = handler.handle(get("/")).await;
        assert_eq!(res.status().as_u16(), 404);
        assert_eq!(payload_text(&res), "Not Found");
        assert_eq!(res.header("content-type"), Some("text/plain; charset=utf-8"));
        assert_eq!(res.header("content-length"), Some("9"));
    }

    #[tokio::test]
    async fn registered_middleware_runs_in_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut app = Application::default();
        for name in ["first", "second"] {
            let seen = Arc::clone(&seen);
            app.register_fn(move |ctx, next| {
                let seen = Arc::clone(&seen);
                Box::pin(async move {
                    seen.lock().unwrap().push(name);
                    next.run(ctx).await
                })
            });
        }
        app.register_fn(|ctx, _next| {
            Box::pin(async move {
                ctx.set_body("done");
                Ok(())
            })
        });
        assert_eq!(app.middleware_count(), 3);

        let res = app.into_handler().handle(get("/")).await;
        assert_eq!(res.status().as_u16(), 200);
        assert_eq!(payload_text(&res), "done");
        assert_eq!(*seen.lock().unwrap(), ["first", "second"]);
    }

    #[tokio::test]
    async fn hook_sees_each_error_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut app = Application::default();
        {
            let calls = Arc::clone(&calls);
            app.on_error(move |err, ctx| {
                assert!(matches!(err, Error::Panic(_)));
                assert_eq!(ctx.path(), "/boom");
                calls.fetch_add(1, Ordering::SeqCst);
            });
        }
        app.register_fn(|_ctx, _next| panic!("kaboom"));

        let res = app.into_handler().handle(get("/boom")).await;
        assert_eq!(res.status().as_u16(), 500);
        assert_eq!(payload_text(&res), "Internal Server Error");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn handler_is_shared_between_requests() {
        let mut app = Application::default();
        app.register_fn(|ctx, next| {
            Box::pin(async move {
                let path = ctx.path().to_string();
                ctx.set_body(path);
                next.run(ctx).await
            })
        });
        let handler = app.into_handler();
        let a = handler.clone();
        let (ra, rb) = tokio::join!(a.handle(get("/a")), handler.handle(get("/b")));
        assert_eq!(payload_text(&ra), "/a");
        assert_eq!(payload_text(&rb), "/b");
    }

    #[tokio::test]
    async fn service_converts_to_wire_response() {
        let mut app = Application::default();
        app.register_fn(|ctx, _next| {
            Box::pin(async move {
                ctx.set_status(201)?;
                ctx.set_body("made");
                Ok(())
            })
        });
        let mut handler = app.into_handler();
        let request = http::Request::builder()
            .uri("/things")
            .body(WireBody::empty())
            .unwrap();
        let response = handler.call(request).await.unwrap();
        assert_eq!(response.status(), http::StatusCode::CREATED);
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"made");
    }
}

//! `X-Response-Time` header.

use std::time::Instant;

use crate::app::Context;
use crate::error::Result;
use crate::pipeline::{BoxFuture, Middleware, Next};

pub const X_RESPONSE_TIME: &str = "x-response-time";

/// Times the downstream chain and reports it in milliseconds.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseTime;

impl Middleware for ResponseTime {
    fn call<'a>(&'a self, ctx: &'a mut Context, next: Next<'a>) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let start = Instant::now();
            next.run(ctx).await?;
            let elapsed = start.elapsed().as_millis();
            ctx.set(X_RESPONSE_TIME, &format!("{elapsed}ms"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::Application;
    use crate::error::Error;
    use crate::net::raw::RawRequest;
    use axum::http::Method;
    use std::time::Duration;

    #[tokio::test]
    async fn reports_elapsed_milliseconds() {
        let mut app = Application::default();
        app.register(ResponseTime);
        app.register_fn(|ctx, _next| {
            Box::pin(async move {
                tokio::time::sleep(Duration::from_millis(5)).await;
                ctx.set_body("slow");
                Ok(())
            })
        });
        let res = app
            .into_handler()
            .handle(RawRequest::new(Method::GET, "/".parse().unwrap()))
            .await;
        let value = res.header(X_RESPONSE_TIME).unwrap();
        let millis: u128 = value.strip_suffix("ms").unwrap().parse().unwrap();
        assert!(millis >= 5);
    }

    #[tokio::test]
    async fn skipped_when_downstream_fails() {
        let mut app = Application::default();
        app.register(ResponseTime);
        app.register_fn(|_ctx, _next| Box::pin(async move { Result::<()>::Err(Error::http(400, "bad")) }));
        let res = app
            .into_handler()
            .handle(RawRequest::new(Method::GET, "/".parse().unwrap()))
            .await;
        assert_eq!(res.status().as_u16(), 400);
        assert_eq!(res.header(X_RESPONSE_TIME), None);
    }
}

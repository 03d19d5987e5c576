//! Terminal write.
//!
//! Runs once the pipeline resolved and turns the context's status, headers
//! and body into exactly one `end` on the raw sink. A sink that was already
//! committed by an ad-hoc write is left alone.

use axum::body::Bytes;
use axum::http::Method;
use futures_util::TryStreamExt;

use crate::app::Context;
use crate::error::Result;
use crate::http::{status, Body};
use crate::net::raw::Payload;

/// Finalize the response for `ctx`.
pub fn respond(ctx: &mut Context) -> Result<()> {
    if ctx.headers_sent() || !ctx.writable() {
        tracing::trace!("response already committed, skipping finalization");
        return Ok(());
    }

    let code = ctx.status();
    if status::is_empty(code) {
        drop(ctx.response_mut().take_body());
        ctx.raw_response_mut().end(Payload::Empty);
        return Ok(());
    }

    if *ctx.method() == Method::HEAD {
        if !ctx.has("content-length") {
            if let Some(length) = ctx.length() {
                ctx.set_length(length)?;
            }
        }
        drop(ctx.response_mut().take_body());
        ctx.raw_response_mut().end(Payload::Empty);
        return Ok(());
    }

    match ctx.response_mut().take_body() {
        Body::Empty => {
            let text = match ctx.message() {
                "" => code.to_string(),
                message => message.to_string(),
            };
            ctx.set_type("text")?;
            ctx.set_length(text.len() as u64)?;
            ctx.raw_response_mut().end(Payload::Bytes(Bytes::from(text)));
        }
        Body::Text(text) => {
            ctx.raw_response_mut().end(Payload::Bytes(Bytes::from(text)));
        }
        Body::Binary(bytes) => {
            ctx.raw_response_mut().end(Payload::Bytes(bytes));
        }
        Body::Stream(stream) => {
            let stream = stream.inspect_err(|err| {
                tracing::warn!(error = %err, "response body stream failed");
            });
            ctx.raw_response_mut().end(Payload::Stream(Box::pin(stream)));
        }
        Body::Structured(value) => {
            let bytes = serde_json::to_vec(&value)?;
            ctx.set_length(bytes.len() as u64)?;
            ctx.raw_response_mut().end(Payload::Bytes(Bytes::from(bytes)));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::context::tests::context;
    use serde_json::json;

    fn written(ctx: &mut Context) -> Vec<u8> {
        ctx.raw_response_mut()
            .payload()
            .and_then(Payload::bytes)
            .map(<[u8]>::to_vec)
            .unwrap_or_default()
    }

    #[test]
    fn empty_body_writes_reason_phrase() {
        let mut ctx = context(Method::GET, "/", &[]);
        respond(&mut ctx).unwrap();
        assert_eq!(written(&mut ctx), b"Not Found");
        assert_eq!(ctx.response().get("content-length"), Some("9"));
        assert_eq!(ctx.response().get("content-type"), Some("text/plain; charset=utf-8"));
    }

    #[test]
    fn custom_message_is_used_for_empty_body() {
        let mut ctx = context(Method::GET, "/", &[]);
        ctx.set_status(403).unwrap();
        ctx.set_message("Go away");
        respond(&mut ctx).unwrap();
        assert_eq!(written(&mut ctx), b"Go away");
    }

    #[test]
    fn no_body_status_writes_nothing() {
        let mut ctx = context(Method::GET, "/", &[]);
        ctx.set_body("ignored");
        ctx.raw_response_mut()
            .set_status(axum::http::StatusCode::NOT_MODIFIED);
        respond(&mut ctx).unwrap();
        assert!(written(&mut ctx).is_empty());
        assert!(ctx.headers_sent());
    }

    #[test]
    fn head_keeps_length_without_bytes() {
        let mut ctx = context(Method::HEAD, "/", &[]);
        ctx.set_body(json!({"name": "tobi"}));
        respond(&mut ctx).unwrap();
        assert_eq!(ctx.response().get("content-length"), Some("15"));
        assert!(written(&mut ctx).is_empty());
    }

    #[test]
    fn structured_body_is_serialized() {
        let mut ctx = context(Method::GET, "/", &[]);
        ctx.set_body(json!({"a": [1, 2]}));
        respond(&mut ctx).unwrap();
        assert_eq!(written(&mut ctx), br#"{"a":[1,2]}"#);
        assert_eq!(ctx.response().get("content-length"), Some("11"));
    }

    #[test]
    fn stream_body_is_piped() {
        let mut ctx = context(Method::GET, "/", &[]);
        let chunks = futures_util::stream::iter(vec![Ok::<_, std::io::Error>(Bytes::from("a"))]);
        ctx.set_body(Body::stream(chunks));
        respond(&mut ctx).unwrap();
        let payload = ctx.raw_response_mut().payload();
        assert!(matches!(payload, Some(Payload::Stream(_))));
    }

    #[test]
    fn committed_sink_is_left_alone() {
        let mut ctx = context(Method::GET, "/", &[]);
        ctx.raw_response_mut()
            .end(Payload::Bytes(Bytes::from_static(b"manual")));
        ctx.set_body("late");
        respond(&mut ctx).unwrap();
        assert_eq!(written(&mut ctx), b"manual");
    }
}

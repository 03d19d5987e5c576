//! Onion-model middleware framework.
//!
//! An [`Application`] collects middleware; [`Application::into_handler`]
//! freezes them into a [`RequestHandler`] that runs each request through
//! the chain, finalizes the response and routes failures to one error path.

pub mod app;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod middleware;
pub mod net;
pub mod observability;
pub mod pipeline;

pub use app::{Application, Context, RequestHandler};
pub use config::{AppConfig, Config};
pub use error::{Error, Result};
pub use http::Body;
pub use lifecycle::Shutdown;
pub use net::HttpServer;
pub use pipeline::{compose, from_fn, BoxFuture, Middleware, Next, Pipeline};

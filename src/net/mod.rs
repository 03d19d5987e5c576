//! Network layer.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → server.rs (axum/hyper, TraceLayer, ConnectInfo)
//!     → raw.rs (http::Request → RawRequest)
//!     → RequestHandler
//!     → raw.rs (RawResponse → http::Response)
//!     → Send to client
//! ```

pub mod raw;
pub mod server;

pub use raw::{Encrypted, Payload, RawRequest, RawResponse};
pub use server::{HttpServer, ServerError};

//! HTTP semantics layer.
//!
//! # Data Flow
//! ```text
//! RawRequest
//!     → request.rs (derived properties, rewrites, negotiation)
//!     → [pipeline runs middleware against the Context]
//!     → response.rs (status/body state machine, header bookkeeping)
//!     → app::respond (terminal write into the RawResponse sink)
//! ```
//!
//! `status`, `body`, `mime`, `accepts` and `fresh` are pure helpers used by
//! both facades.

pub mod accepts;
pub mod body;
pub mod fresh;
pub mod mime;
pub mod request;
pub mod response;
pub mod status;

pub use body::{Body, BodyKind, BodyStream};
pub use request::{Query, Request};
pub use response::Response;

//! Application layer.
//!
//! # Data Flow
//! ```text
//! RawRequest
//!     → application.rs (RequestHandler::handle: build Context)
//!     → pipeline dispatch (registered middleware)
//!     → respond.rs (terminal write)          on success
//!     → onerror.rs (hook + minimal response) on failure
//!     → RawResponse
//! ```

pub mod application;
pub mod context;
pub mod onerror;
pub mod respond;

pub use application::{Application, ErrorHook, RequestHandler};
pub use context::Context;

//! Stock middleware.
//!
//! Register in this order for the usual layering:
//! ```ignore
//! app.register(RequestIdMiddleware)
//!     .register(AccessLog)
//!     .register(ResponseTime);
//! ```

pub mod access_log;
pub mod request_id;
pub mod response_time;

pub use access_log::AccessLog;
pub use request_id::{RequestId, RequestIdExt, RequestIdMiddleware, X_REQUEST_ID};
pub use response_time::{ResponseTime, X_RESPONSE_TIME};

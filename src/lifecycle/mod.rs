//! Lifecycle management.
//!
//! # Data Flow
//! ```text
//! Shutdown (shutdown.rs):
//!     trigger() → broadcast → every HttpServer stops accepting → drains → returns
//! ```
//!
//! The library never installs signal handlers on its own; a binary opts in
//! with `Shutdown::trigger_on_ctrl_c`.

pub mod shutdown;

pub use shutdown::Shutdown;

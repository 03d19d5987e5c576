//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Application / middleware produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters and histograms via the metrics facade)
//!
//! Consumers:
//!     → stdout (fmt layer)
//!     → whatever metrics recorder the embedding process installs
//! ```

pub mod logging;
pub mod metrics;

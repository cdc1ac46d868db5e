//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → whatever subscriber / recorder the embedding process installs
//! ```
//!
//! # Design Decisions
//! - Request ID flows through logs when the request-id filter is installed
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;

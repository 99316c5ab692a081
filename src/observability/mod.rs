//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! engine, providers, http:
//!     → logging.rs (structured tracing events on stderr)
//!     → metrics.rs (attempt counters, verification failures, latencies)
//!
//! Consumers:
//!     → Operator terminal / log collector
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Logs go to stderr; stdout belongs to command output
//! - Metric updates are no-ops until a recorder is installed

pub mod logging;
pub mod metrics;

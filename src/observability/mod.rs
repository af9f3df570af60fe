//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Handler, recorder and sink produce:
//!     → logging.rs (structured log events, one span per request)
//!     → metrics.rs (counters and upstream latency histogram)
//!
//! Consumers:
//!     → stdout (tracing fmt layer)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Every capture failure is logged; none of them reaches the HTTP caller
//! - Metric updates are no-ops until a recorder is installed

pub mod logging;
pub mod metrics;

//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Session, provider and contract subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Addresses and chain ids are log fields, never interpolated text
//! - Metrics are cheap and silently dropped when no recorder is installed

pub mod logging;
pub mod metrics;

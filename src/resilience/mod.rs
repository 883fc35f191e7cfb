//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Wait for external readiness (injected provider, late attach):
//!     → poll.rs (probe now, then every interval, up to max attempts)
//!     → Some(value) or None; exhaustion is an ordinary outcome
//! ```
//!
//! # Design Decisions
//! - The bounded poll is the only internal deadline in the crate
//! - Wallet prompts and mined-waits are never timed out client-side

pub mod poll;

pub use poll::BoundedPoll;

//! Showroom Infrastructure Library
//!
//! Shared infrastructure used by the upload pipeline crates:
//! - Telemetry initialization (tracing subscriber)
//! - Retry with exponential backoff, jitter, per-attempt timeout and cancellation

pub mod retry;
pub mod telemetry;

// Re-export commonly used types
pub use retry::{compute_backoff, with_retry, AttemptError, RetryError, RetryPolicy, Retried};
pub use telemetry::{init_telemetry, shutdown_telemetry};

//! Resilience patterns for ttload
//!
//! Retry policies with backoff, and the stop signal shared by the load-test
//! tasks.

pub mod backoff;
pub mod retry;
pub mod stop;

// Re-export commonly used types
pub use backoff::{spread_delay, Backoff};
pub use retry::{RetryError, RetryExecutor, RetryPolicy, Retryable};
pub use stop::{StopCoordinator, StopListener, StopReason};

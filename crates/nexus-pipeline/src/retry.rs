//! Bounded fixed-interval polling.
//!
//! Used for externals that settle eventually: container address
//! assignment, log flushing, cluster job completion. A fixed attempt
//! budget and a fixed interval, no backoff.

use std::future::Future;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl RetryPolicy {
    pub const fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
        }
    }
}

/// Poll `probe` until it yields a value or the attempt budget runs out.
///
/// Sleeps the interval between attempts, never after the last one.
pub async fn retry<T, F, Fut>(policy: RetryPolicy, mut probe: F) -> Option<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Option<T>>,
{
    for attempt in 0..policy.max_attempts {
        if let Some(value) = probe(attempt).await {
            return Some(value);
        }
        if attempt + 1 < policy.max_attempts {
            tokio::time::sleep(policy.interval).await;
        }
    }
    None
}

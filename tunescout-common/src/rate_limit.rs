//! Minimum-interval request pacing for external APIs
//!
//! Each caller reserves the next free slot under a short lock and then
//! sleeps outside it, so concurrent callers are spaced `min_interval`
//! apart without queueing on the lock itself.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Spaces requests at least `min_interval` apart
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            next_slot: Mutex::new(None),
        }
    }

    /// Pacing from a millisecond setting; zero disables pacing
    pub fn from_millis(min_interval_ms: u64) -> Self {
        Self::new(Duration::from_millis(min_interval_ms))
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Wait until this caller's slot; returns how long it waited
    pub async fn wait(&self) -> Duration {
        if self.min_interval.is_zero() {
            return Duration::ZERO;
        }

        let slot = {
            let mut next_slot = self.next_slot.lock().await;
            let now = Instant::now();
            let slot = next_slot.map_or(now, |reserved| reserved.max(now));
            *next_slot = Some(slot + self.min_interval);
            slot
        };

        let waited = slot.saturating_duration_since(Instant::now());
        if !waited.is_zero() {
            tracing::debug!(wait = ?waited, "Rate limiting outbound request");
            tokio::time::sleep_until(slot).await;
        }
        waited
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_first_request_is_immediate() {
        let limiter = RateLimiter::from_millis(200);

        let start = Instant::now();
        limiter.wait().await;

        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_back_to_back_requests_are_spaced() {
        let limiter = RateLimiter::from_millis(200);

        let start = Instant::now();
        limiter.wait().await;
        limiter.wait().await;

        assert!(start.elapsed() >= Duration::from_millis(180));
    }

    #[tokio::test]
    async fn test_zero_interval_never_waits() {
        let limiter = RateLimiter::from_millis(0);

        for _ in 0..5 {
            assert_eq!(limiter.wait().await, Duration::ZERO);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_callers_get_distinct_slots() {
        let limiter = Arc::new(RateLimiter::from_millis(100));
        let start = Instant::now();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                tokio::spawn(async move { limiter.wait().await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        // Four slots: 0, 100, 200, 300 ms
        assert!(start.elapsed() >= Duration::from_millis(280));
    }

    #[tokio::test]
    async fn test_idle_gap_resets_pacing() {
        let limiter = RateLimiter::from_millis(50);
        limiter.wait().await;

        tokio::time::sleep(Duration::from_millis(80)).await;

        assert_eq!(limiter.wait().await, Duration::ZERO);
    }
}

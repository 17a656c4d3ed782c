//! Randomized inter-request delay emulating human browsing cadence. This is
//! a detection mitigation, not a correctness mechanism; tests run with the
//! zero-length policy.

use rand::Rng;
use std::time::Duration;
use tokio::time::sleep;
use tracing::trace;

#[derive(Debug, Clone, Copy)]
pub struct Pacing {
    base_pause: Duration,
}

impl Pacing {
    pub fn new(base_pause: Duration) -> Self {
        Self { base_pause }
    }

    pub fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }

    /// Zero-length policy. No sleeping, no jitter.
    pub fn none() -> Self {
        Self::new(Duration::ZERO)
    }

    /// Sleep for `base_pause + random(0, 1s)`.
    pub async fn delay(&self) {
        if self.base_pause.is_zero() {
            return;
        }
        let jitter = Duration::from_millis(rand::thread_rng().gen_range(0..1000));
        let pause = self.base_pause + jitter;
        trace!("pacing delay {:?}", pause);
        sleep(pause).await;
    }
}

#[cfg(test)]
mod tests_pacing {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn test_none_returns_immediately() {
        let start = Instant::now();
        Pacing::none().delay().await;
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_delay_waits_at_least_base_pause() {
        let pacing = Pacing::from_millis(20);
        let start = Instant::now();
        pacing.delay().await;
        assert!(start.elapsed() >= Duration::from_millis(20));
    }
}

//! Client-side request pacing for the scoring gateway.
//!
//! Proactively throttles scoring calls to stay within collaborator rate
//! limits instead of relying on 429 backpressure. The pacer is an explicit
//! policy object injected into the gateway at construction; the sampling
//! algorithm knows nothing about pacing.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

/// Pacing policy: a requests-per-minute window plus a minimum spacing
/// between consecutive requests. Either limit may be zero (disabled).
#[derive(Debug, Clone, Copy, Default)]
pub struct PacerConfig {
    /// Requests per minute (0 = unlimited).
    pub requests_per_minute: usize,
    /// Minimum interval between requests (zero = no spacing).
    pub min_interval: Duration,
}

#[derive(Debug, Default)]
struct PacerState {
    /// Timestamps of requests within the sliding window.
    window: VecDeque<Instant>,
    /// Timestamp of the most recent request.
    last_request: Option<Instant>,
}

/// A sliding-window request pacer shared across concurrent scoring calls.
pub struct RequestPacer {
    config: PacerConfig,
    state: Mutex<PacerState>,
    window: Duration,
}

impl RequestPacer {
    pub fn new(config: PacerConfig) -> Self {
        Self {
            config,
            state: Mutex::new(PacerState::default()),
            window: Duration::from_secs(60),
        }
    }

    /// An unlimited pacer.
    pub fn unlimited() -> Self {
        Self::new(PacerConfig::default())
    }

    pub fn has_limits(&self) -> bool {
        self.config.requests_per_minute > 0 || !self.config.min_interval.is_zero()
    }

    /// Wait until a request slot is available, then claim it.
    ///
    /// Safe to call from many tasks at once; each caller claims its own slot
    /// under the lock, so concurrent acquires never double-spend.
    pub async fn acquire(&self) {
        loop {
            let delay = {
                let mut state = self.state.lock().await;
                let now = Instant::now();
                match self.check(&mut state, now) {
                    None => {
                        state.window.push_back(now);
                        state.last_request = Some(now);
                        return;
                    }
                    Some(delay) => delay,
                }
            };
            tokio::time::sleep(delay).await;
        }
    }

    /// Compute how long the caller must wait, or `None` if a slot is free.
    fn check(&self, state: &mut PacerState, now: Instant) -> Option<Duration> {
        self.prune(state, now);

        if !self.config.min_interval.is_zero() {
            if let Some(last) = state.last_request {
                let since = now.duration_since(last);
                if since < self.config.min_interval {
                    return Some(self.config.min_interval - since);
                }
            }
        }

        if self.config.requests_per_minute > 0
            && state.window.len() >= self.config.requests_per_minute
        {
            if let Some(&oldest) = state.window.front() {
                let wait = self.window.saturating_sub(now.duration_since(oldest));
                if !wait.is_zero() {
                    return Some(wait);
                }
            }
        }

        None
    }

    /// Remove window entries older than the sliding window.
    fn prune(&self, state: &mut PacerState, now: Instant) {
        let cutoff = now.checked_sub(self.window);
        if let Some(cutoff) = cutoff {
            while state.window.front().is_some_and(|t| *t < cutoff) {
                state.window.pop_front();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unlimited_pacer_never_waits() {
        let pacer = RequestPacer::unlimited();
        assert!(!pacer.has_limits());
        for _ in 0..10 {
            pacer.acquire().await;
        }
    }

    #[tokio::test]
    async fn test_rpm_window_delays_excess_requests() {
        let pacer = RequestPacer::new(PacerConfig {
            requests_per_minute: 2,
            min_interval: Duration::ZERO,
        });
        let mut state = pacer.state.lock().await;
        let now = Instant::now();
        assert!(pacer.check(&mut state, now).is_none());
        state.window.push_back(now);
        assert!(pacer.check(&mut state, now).is_none());
        state.window.push_back(now);
        let delay = pacer.check(&mut state, now);
        assert!(delay.is_some());
        assert!(delay.unwrap() > Duration::from_secs(50));
    }

    #[tokio::test]
    async fn test_min_interval_enforced() {
        let pacer = RequestPacer::new(PacerConfig {
            requests_per_minute: 0,
            min_interval: Duration::from_millis(100),
        });
        let mut state = pacer.state.lock().await;
        let now = Instant::now();
        assert!(pacer.check(&mut state, now).is_none());
        state.last_request = Some(now);
        let delay = pacer.check(&mut state, now + Duration::from_millis(10));
        assert!(delay.is_some());
        assert!(delay.unwrap() <= Duration::from_millis(90));
    }
}

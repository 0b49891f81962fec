//! Minimum-interval request pacing
//!
//! The limiter owns the last-dispatch timestamp. Each pacing decision runs
//! while holding an async mutex, so two tasks can never both observe "no wait
//! needed" for the same interval. Tasks waiting here do not hold up tasks
//! sleeping in backoff or already in flight.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::metrics;

/// Enforces a minimum spacing between dispatches
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Option<Duration>,
    last_dispatch: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// Create a limiter allowing at most `requests_per_second` dispatches
    ///
    /// Non-positive or non-finite rates produce a disabled limiter.
    pub fn per_second(requests_per_second: f64) -> Self {
        let min_interval = (requests_per_second.is_finite() && requests_per_second > 0.0)
            .then(|| Duration::from_secs_f64(1.0 / requests_per_second));
        Self::with_interval(min_interval)
    }

    /// Create a limiter that never waits
    pub fn disabled() -> Self {
        Self::with_interval(None)
    }

    /// Create a limiter from an explicit minimum interval
    pub fn with_interval(min_interval: Option<Duration>) -> Self {
        Self {
            min_interval,
            last_dispatch: Mutex::new(None),
        }
    }

    /// Whether pacing is active
    pub fn is_enabled(&self) -> bool {
        self.min_interval.is_some()
    }

    /// Minimum spacing between dispatches, if enabled
    pub fn min_interval(&self) -> Option<Duration> {
        self.min_interval
    }

    /// Wait until a dispatch is allowed, then record it
    ///
    /// Returns how long the caller was suspended.
    pub async fn pace(&self) -> Duration {
        let Some(min_interval) = self.min_interval else {
            return Duration::ZERO;
        };

        let mut last = self.last_dispatch.lock().await;
        let mut waited = Duration::ZERO;

        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < min_interval {
                waited = min_interval - elapsed;
                debug!(wait_ms = metrics::millis(waited), "Pacing request");
                sleep(waited).await;
            }
        }

        *last = Some(Instant::now());
        metrics::record_pace_wait(waited);
        waited
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::disabled()
    }
}

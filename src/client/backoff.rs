//! Backoff and throttle wait computation

use reqwest::header::{HeaderMap, RETRY_AFTER};
use std::time::{Duration, SystemTime};
use tracing::{debug, warn};

/// Calculate exponential backoff delay: `base * 2^retry_index`
///
/// `retry_index` is 0 for the first retry. Saturates instead of overflowing.
pub fn calculate_backoff(base: Duration, retry_index: u32) -> Duration {
    if base.is_zero() {
        return Duration::ZERO;
    }
    2u32.checked_pow(retry_index)
        .and_then(|factor| base.checked_mul(factor))
        .unwrap_or(Duration::MAX)
}

/// Parse a `Retry-After` value
///
/// Accepts delta-seconds (fractional allowed) or an HTTP-date. Dates in the
/// past yield zero. Returns `None` for negative, non-finite or unparsable
/// values.
pub fn parse_retry_after(value: &str, now: SystemTime) -> Option<Duration> {
    let value = value.trim();

    if let Ok(secs) = value.parse::<f64>() {
        if secs.is_finite() && secs >= 0.0 {
            return Duration::try_from_secs_f64(secs).ok();
        }
        return None;
    }

    let at = httpdate::parse_http_date(value).ok()?;
    Some(at.duration_since(now).unwrap_or(Duration::ZERO))
}

/// Wait requested by a throttling response, falling back to `default`
pub fn throttle_wait(headers: &HeaderMap, default: Duration) -> Duration {
    let Some(raw) = headers.get(RETRY_AFTER) else {
        debug!("429 without Retry-After, using default {:?}", default);
        return default;
    };

    match raw.to_str().ok().and_then(|v| parse_retry_after(v, SystemTime::now())) {
        Some(wait) => wait,
        None => {
            warn!("Failed to parse Retry-After header {:?}, using default {:?}", raw, default);
            default
        }
    }
}

//! Exponential-backoff retry for opening a link.

use std::time::{Duration, SystemTime};

use crate::LinkError;
use crate::config::RetryConfig;

/// Execute `op`, retrying on retryable errors with exponential backoff.
///
/// Non-retryable errors are returned immediately. When every attempt failed
/// with a retryable error and more than one attempt was configured, the last
/// error is wrapped in [`LinkError::RetriesExhausted`].
pub(crate) fn retry_open<T, F>(config: &RetryConfig, mut op: F) -> Result<T, LinkError>
where
    F: FnMut(u32) -> Result<T, LinkError>,
{
    if config.max_attempts == 0 {
        return Err(LinkError::InvalidConfig(
            "max_attempts must be >= 1".into(),
        ));
    }

    let mut last_error: Option<LinkError> = None;

    for attempt in 0..config.max_attempts {
        match op(attempt) {
            Ok(val) => return Ok(val),
            Err(e) => {
                if !e.is_retryable() {
                    return Err(e);
                }
                tracing::debug!(attempt = attempt + 1, error = %e, "link open failed");
                last_error = Some(e);

                if attempt + 1 < config.max_attempts {
                    std::thread::sleep(compute_delay(config, attempt));
                }
            }
        }
    }

    let last_error = last_error.unwrap_or(LinkError::ConnectionClosed);
    if config.max_attempts == 1 {
        return Err(last_error);
    }
    Err(LinkError::RetriesExhausted {
        attempts: config.max_attempts,
        last_error: Box::new(last_error),
    })
}

/// Compute the backoff delay for the given `attempt` (0-indexed).
///
/// delay = min(initial_delay * 2^attempt, max_delay), optionally with jitter.
fn compute_delay(config: &RetryConfig, attempt: u32) -> Duration {
    let base = config
        .initial_delay
        .saturating_mul(2u32.saturating_pow(attempt));
    let capped = base.min(config.max_delay);

    if !config.jitter {
        return capped;
    }

    // Jitter in [capped/2, capped], seeded from the clock's sub-second nanos.
    let nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos();
    let half = capped / 2;
    let jitter_range_nanos = capped.as_nanos().saturating_sub(half.as_nanos());
    if jitter_range_nanos == 0 {
        return capped;
    }
    let offset_nanos = (nanos as u128) % jitter_range_nanos;
    half + Duration::from_nanos(offset_nanos as u64)
}

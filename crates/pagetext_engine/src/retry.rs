use std::time::Duration;

use engine_logging::{engine_debug, engine_warn, sanitize_for_log};
use tokio_util::sync::CancellationToken;

use crate::fetch::{Fetcher, ProgressSink};
use crate::{EngineEvent, FailureKind, FetchError, FetchOutput, ItemIndex, ItemProgress, Stage};

/// Fixed attempt budget with exponential backoff.
///
/// After failed attempt `i` (0-based) the controller waits
/// `base_delay * 2^i` before trying again. There is no wait after the last
/// attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Always at least 1.
    pub retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 3,
            base_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    pub fn new(retries: u32, base_delay: Duration) -> Self {
        Self {
            retries: retries.max(1),
            base_delay,
        }
    }

    pub fn delay_for(&self, attempt_index: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt_index.min(16)).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }
}

/// Run `fetcher` until it succeeds or the policy's budget is spent.
///
/// Returns `RetriesExhausted` carrying the last failure once every attempt
/// failed, or `Cancelled` when the token fires first.
pub async fn fetch_with_retry(
    fetcher: &dyn Fetcher,
    index: ItemIndex,
    url: &str,
    policy: RetryPolicy,
    timeout: Duration,
    cancel: &CancellationToken,
    sink: &dyn ProgressSink,
) -> Result<FetchOutput, FetchError> {
    let attempts = policy.retries.max(1);
    let mut last: Option<FetchError> = None;

    for attempt in 0..attempts {
        if cancel.is_cancelled() {
            return Err(cancelled());
        }
        if attempt > 0 {
            sink.emit(EngineEvent::Progress(ItemProgress {
                index,
                stage: Stage::Retrying,
                attempt: Some(attempt + 1),
                bytes: None,
            }));
        }

        let result = tokio::select! {
            _ = cancel.cancelled() => return Err(cancelled()),
            result = fetcher.fetch(index, url, timeout, sink) => result,
        };

        match result {
            Ok(output) => {
                engine_debug!(
                    "Item {} fetched on attempt {} of {}",
                    index,
                    attempt + 1,
                    attempts
                );
                return Ok(output);
            }
            Err(err) => {
                engine_warn!(
                    "Error fetching {}: {}, attempt {} of {}",
                    sanitize_for_log(url),
                    err,
                    attempt + 1,
                    attempts
                );
                last = Some(err);
            }
        }

        if attempt + 1 < attempts {
            let delay = policy.delay_for(attempt);
            tokio::select! {
                _ = cancel.cancelled() => return Err(cancelled()),
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    let last = last.unwrap_or_else(|| FetchError::new(FailureKind::Unexpected, "no attempt made"));
    Err(FetchError::new(
        FailureKind::RetriesExhausted {
            attempts,
            last: Box::new(last.kind),
        },
        last.message,
    ))
}

fn cancelled() -> FetchError {
    FetchError::new(FailureKind::Cancelled, "batch cancelled")
}

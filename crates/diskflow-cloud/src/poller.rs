//! Bounded waiting on provider-side state
//!
//! A fixed-delay poll loop with a hard deadline measured from the start of
//! each wait. Cancellation through a `CancellationToken` interrupts both the
//! sleep and an in-flight check.

use crate::error::{CloudError, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Poll timing for one wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Fixed delay between checks
    pub delay: Duration,
    /// Hard deadline for the whole wait
    pub max_duration: Duration,
}

impl PollConfig {
    pub fn new(delay: Duration, max_duration: Duration) -> Result<Self> {
        if delay.is_zero() {
            return Err(CloudError::InvalidConfig(
                "poll delay must be greater than zero".to_string(),
            ));
        }
        if delay >= max_duration {
            return Err(CloudError::InvalidConfig(format!(
                "poll delay {:?} must be shorter than the maximum wait {:?}",
                delay, max_duration
            )));
        }
        Ok(Self {
            delay,
            max_duration,
        })
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(5),
            max_duration: Duration::from_secs(600),
        }
    }
}

/// Wait until `check` reports `true`.
///
/// `check` only observes; `Ok(false)` means "not terminal yet", never
/// "failed". Deciding whether a terminal state is the expected one is left
/// to the caller. An `Err` from `check` aborts the wait and is returned as is.
///
/// # Returns
/// * `Ok(attempts)` - the check succeeded on attempt number `attempts`
/// * `Err(CloudError::Timeout)` - the deadline passed first
/// * `Err(CloudError::Cancelled)` - the token was cancelled
pub async fn wait_until<F, Fut>(
    description: &str,
    config: &PollConfig,
    cancel: &CancellationToken,
    mut check: F,
) -> Result<u32>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    let start = Instant::now();
    let deadline = start + config.max_duration;
    let mut attempts = 0u32;

    debug!(description, ?config, "Waiting");

    loop {
        if cancel.is_cancelled() {
            return Err(cancelled(description));
        }

        attempts += 1;
        let ready = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(cancelled(description)),
            outcome = tokio::time::timeout_at(deadline, check()) => match outcome {
                Ok(checked) => checked?,
                Err(_) => return Err(timed_out(description, start, attempts)),
            },
        };

        if ready {
            debug!(
                description,
                attempts,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Wait finished"
            );
            return Ok(attempts);
        }

        let now = Instant::now();
        if now >= deadline {
            return Err(timed_out(description, start, attempts));
        }

        let pause = config.delay.min(deadline - now);
        debug!(
            description,
            attempt = attempts,
            delay_ms = pause.as_millis() as u64,
            "Not ready, retrying"
        );

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(cancelled(description)),
            _ = tokio::time::sleep(pause) => {}
        }

        if Instant::now() >= deadline {
            return Err(timed_out(description, start, attempts));
        }
    }
}

fn timed_out(description: &str, start: Instant, attempts: u32) -> CloudError {
    CloudError::Timeout {
        description: description.to_string(),
        elapsed: start.elapsed(),
        attempts,
    }
}

fn cancelled(description: &str) -> CloudError {
    CloudError::Cancelled {
        description: description.to_string(),
    }
}

//! Operation waiting with exponential backoff.
//!
//! Provides a generic abstraction for polling a remote operation (or any
//! async condition) until it reaches a terminal state, with configurable
//! exponential backoff and jitter.

use anyhow::Result;
use backon::{BackoffBuilder, ExponentialBuilder};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Default ceiling for a single resource to reach a terminal state
pub const DEFAULT_OPERATION_TIMEOUT_SECS: u64 = 900;

/// Configuration for operation polling with exponential backoff.
#[derive(Debug, Clone)]
pub struct WaitConfig {
    /// Initial delay between checks
    pub initial_delay: Duration,
    /// Maximum delay between checks (cap for exponential growth)
    pub max_delay: Duration,
    /// Maximum total time to wait before timeout
    pub timeout: Duration,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(30),
            timeout: Duration::from_secs(DEFAULT_OPERATION_TIMEOUT_SECS),
        }
    }
}

/// Poll until an operation reports a terminal state.
///
/// Uses `backon::ExponentialBuilder` for delay calculation.
///
/// # Arguments
/// * `config` - Wait configuration
/// * `check` - Async function that returns `Ok(true)` when the operation is
///   done, `Ok(false)` to keep polling, or `Err` when it terminally failed
/// * `operation` - Name for logging
///
/// # Returns
/// * `Ok(())` - Operation reached a successful terminal state
/// * `Err` - Timeout or the check returned an error
pub async fn wait_for_operation<F, Fut>(config: &WaitConfig, check: F, operation: &str) -> Result<()>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    let start = std::time::Instant::now();
    let mut attempts = 0u32;

    let backoff = ExponentialBuilder::default()
        .with_min_delay(config.initial_delay)
        .with_max_delay(config.max_delay)
        .with_factor(2.0)
        .with_jitter()
        .build();

    let mut delays = backoff.into_iter();

    loop {
        attempts += 1;

        if start.elapsed() >= config.timeout {
            anyhow::bail!(
                "Timeout waiting for {} after {:?} ({} attempts)",
                operation,
                config.timeout,
                attempts
            );
        }

        match check().await {
            Ok(true) => {
                debug!(operation = %operation, attempts, "Operation complete");
                return Ok(());
            }
            Ok(false) => {
                let delay = delays.next().unwrap_or(config.max_delay);
                debug!(
                    operation = %operation,
                    attempt = attempts,
                    delay_ms = delay.as_millis(),
                    "Operation still in progress, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                warn!(operation = %operation, error = ?e, "Operation check failed");
                return Err(e);
            }
        }
    }
}

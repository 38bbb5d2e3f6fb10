//! Bounded polling shared by the store adapters
//!
//! Vendors process uploads asynchronously. Adapters re-fetch a status
//! resource at a fixed interval until it reaches a terminal state, giving up
//! after an overall bound. Giving up only stops the client from waiting; the
//! vendor keeps processing whatever was already submitted.

use std::future::Future;
use std::time::Duration;

use tracing::debug;

use crate::error::{Result, StoreError};

/// Default delay between status checks
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Default overall bound on waiting for a terminal state
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// Polling cadence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOptions {
    /// Delay between status checks
    pub interval: Duration,
    /// Maximum wall-clock time spent waiting
    pub timeout: Duration,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            timeout: DEFAULT_POLL_TIMEOUT,
        }
    }
}

impl PollOptions {
    /// Create poll options
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }
}

/// Run `future`, failing with [`StoreError::Timeout`] once `timeout` elapses
pub async fn with_timeout<T, F>(timeout: Duration, what: &str, future: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, future).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout(format!(
            "{} did not finish within {:?}",
            what, timeout
        ))),
    }
}

/// Call `check` until it yields `Some`, sleeping `options.interval` between calls
///
/// `check` returning `Ok(None)` means "still processing". Errors from `check`
/// abort immediately. The whole loop, including in-flight checks, is bounded
/// by `options.timeout`.
pub async fn poll_until<T, F, Fut>(options: &PollOptions, what: &str, mut check: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>>>,
{
    let interval = options.interval;
    with_timeout(options.timeout, what, async move {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            if let Some(done) = check().await? {
                debug!(what, attempt, "reached terminal state");
                return Ok(done);
            }
            debug!(what, attempt, "still processing, waiting");
            tokio::time::sleep(interval).await;
        }
    })
    .await
}

//! Fixed-interval polling with a hard timeout.

use crate::error::{WebDriverError, WebDriverResult};
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, Instant};

/// Command errors that mean "not ready yet" rather than "broken".
const TRANSIENT_ERRORS: &[&str] = &[
    "no such element",
    "stale element reference",
    "element not interactable",
    "element click intercepted",
];

/// Polls a check until it yields a value or the timeout elapses.
#[derive(Debug, Clone, Copy)]
pub struct Wait {
    pub timeout: Duration,
    pub interval: Duration,
}

impl Default for Wait {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(20),
            interval: Duration::from_millis(500),
        }
    }
}

impl Wait {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            ..Self::default()
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Run `check` until it returns `Ok(Some(_))`.
    ///
    /// `Ok(None)` and transient command errors keep polling; any other error
    /// is returned immediately. `what` names the condition in the timeout error.
    pub async fn until<T, F, Fut>(&self, what: &str, mut check: F) -> WebDriverResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = WebDriverResult<Option<T>>>,
    {
        let deadline = Instant::now() + self.timeout;

        loop {
            match check().await {
                Ok(Some(value)) => return Ok(value),
                Ok(None) => {}
                Err(e) if is_transient(&e) => {
                    tracing::trace!(condition = what, error = %e, "still waiting");
                }
                Err(e) => return Err(e),
            }

            if Instant::now() >= deadline {
                return Err(WebDriverError::Timeout(self.timeout, what.to_string()));
            }

            sleep(self.interval).await;
        }
    }
}

fn is_transient(error: &WebDriverError) -> bool {
    matches!(
        error,
        WebDriverError::Command { error, .. } if TRANSIENT_ERRORS.contains(&error.as_str())
    )
}

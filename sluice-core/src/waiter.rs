//! Bounded polling for remote operations that complete asynchronously
//! (deletion, activation, query execution).

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

use crate::provider::{ProviderError, ProviderResult};

/// Result of one poll
#[derive(Debug, Clone, PartialEq)]
pub enum PollStatus<T> {
    /// Still in progress, poll again
    Pending,
    /// Reached the target state
    Ready(T),
    /// Reached a terminal failure (failed, cancelled); never retried
    Failed(String),
}

/// Wall-clock timeout and poll interval for one call site
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitConfig {
    pub timeout: Duration,
    pub interval: Duration,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(600),
            interval: Duration::from_secs(5),
        }
    }
}

impl WaitConfig {
    pub fn new(timeout: Duration, interval: Duration) -> Self {
        Self { timeout, interval }
    }
}

/// Poll until `poll` reports `Ready`, a terminal failure, or the timeout elapses
pub async fn wait_until<T, F, Fut>(config: &WaitConfig, what: &str, mut poll: F) -> ProviderResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ProviderResult<PollStatus<T>>>,
{
    let deadline = Instant::now() + config.timeout;
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        match poll().await? {
            PollStatus::Ready(value) => {
                log::debug!("{} finished after {} poll(s)", what, attempts);
                return Ok(value);
            }
            PollStatus::Failed(message) => {
                return Err(ProviderError::new(format!("{} failed: {}", what, message)));
            }
            PollStatus::Pending => {}
        }

        if Instant::now() + config.interval > deadline {
            return Err(ProviderError::new(format!(
                "Timed out after {:?} waiting for {}",
                config.timeout, what
            )));
        }
        log::debug!("Waiting for {} (attempt {})", what, attempts);
        tokio::time::sleep(config.interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn config() -> WaitConfig {
        WaitConfig::new(Duration::from_secs(60), Duration::from_secs(5))
    }

    #[tokio::test(start_paused = true)]
    async fn returns_when_ready() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result = wait_until(&config(), "pipeline deletion", || {
            let counter = counter.clone();
            async move {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Ok(PollStatus::Pending)
                } else {
                    Ok(PollStatus::Ready("gone"))
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(result, "gone");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn terminal_failure_is_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let err = wait_until::<(), _, _>(&config(), "query execution", || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(PollStatus::Failed("CANCELLED".to_string()))
            }
        })
        .await
        .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(err.message, "query execution failed: CANCELLED");
        assert!(!err.transient);
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_while_pending() {
        let err = wait_until::<(), _, _>(&config(), "pipeline deletion", || async {
            Ok(PollStatus::Pending)
        })
        .await
        .unwrap_err();

        assert!(err.message.starts_with("Timed out after 60s"));
    }

    #[tokio::test(start_paused = true)]
    async fn poll_error_is_returned() {
        let err = wait_until::<(), _, _>(&config(), "pipeline deletion", || async {
            Err(ProviderError::new("access denied"))
        })
        .await
        .unwrap_err();

        assert_eq!(err.message, "access denied");
    }
}

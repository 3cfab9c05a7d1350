//! Retry for remote calls that fail with transient errors

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

use crate::provider::ProviderResult;

/// Backoff policy for `retry_transient`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    pub timeout: Duration,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(120),
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(10),
        }
    }
}

/// Run `op`, retrying only errors marked transient until `config.timeout`
///
/// Non-transient errors are returned on first occurrence. When the timeout
/// is exhausted the last transient error is returned.
pub async fn retry_transient<T, F, Fut>(config: &RetryConfig, what: &str, mut op: F) -> ProviderResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ProviderResult<T>>,
{
    let deadline = Instant::now() + config.timeout;
    let mut backoff = config.initial_backoff;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.transient && Instant::now() + backoff <= deadline => {
                log::warn!("{} failed with a transient error, retrying in {:?}: {}", what, backoff, err);
                tokio::time::sleep(backoff).await;
                backoff = (backoff * 2).min(config.max_backoff);
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ProviderError;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn retries_transient_until_success() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let value = retry_transient(&RetryConfig::default(), "PutPipelineDefinition", || {
            let counter = counter.clone();
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(ProviderError::new("throttled").transient())
                } else {
                    Ok(7)
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(value, 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn semantic_errors_are_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let err = retry_transient::<(), _, _>(&RetryConfig::default(), "CreatePipeline", || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(ProviderError::new("InvalidRequestException"))
            }
        })
        .await
        .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(err.message, "InvalidRequestException");
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_timeout() {
        let config = RetryConfig {
            timeout: Duration::from_secs(5),
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(2),
        };
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let err = retry_transient::<(), _, _>(&config, "DescribePipelines", || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(ProviderError::new("connection reset").transient())
            }
        })
        .await
        .unwrap_err();

        assert!(err.transient);
        // sleeps of 1s, 2s and 2s fit in the 5s budget
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }
}

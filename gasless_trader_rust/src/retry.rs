use backoff::ExponentialBackoffBuilder;
use std::future::Future;
use std::time::Duration;

use crate::error::TraderResult;

/// Bounded exponential backoff for the read-only calls (price, quote,
/// status). Submission is excluded on purpose: retrying an ambiguous submit
/// failure risks double-submission.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub initial_interval: Duration,
    pub max_interval: Duration,
    pub max_elapsed: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_millis(250),
            max_interval: Duration::from_secs(2),
            max_elapsed: Duration::from_secs(10),
        }
    }
}

pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, mut operation: F) -> TraderResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = TraderResult<T>>,
{
    let backoff = ExponentialBackoffBuilder::new()
        .with_initial_interval(policy.initial_interval)
        .with_max_interval(policy.max_interval)
        .with_max_elapsed_time(Some(policy.max_elapsed))
        .build();

    backoff::future::retry(backoff, || {
        let attempt = operation();
        async move {
            attempt.await.map_err(|error| {
                if error.current_context().is_transient() {
                    backoff::Error::transient(error)
                } else {
                    backoff::Error::permanent(error)
                }
            })
        }
    })
    .await
}

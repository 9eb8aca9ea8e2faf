use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};
use color_eyre::eyre::Result;

use crate::ports::destination::{DestinationClient, DestinationTrack, SearchCategory};

/// Wraps a destination and retries failed like mutations with exponential
/// backoff. Searches and the liked listing are passed through untouched.
///
/// `attempts` counts the first call, so 1 means no retries.
pub struct RetryingDestination<D: DestinationClient> {
    inner: D,
    attempts: usize,
    min_delay: Duration,
}

impl<D: DestinationClient> RetryingDestination<D> {
    pub fn new(inner: D, attempts: usize) -> Self {
        Self {
            inner,
            attempts: attempts.max(1),
            min_delay: Duration::from_secs(1),
        }
    }

    pub fn with_min_delay(mut self, min_delay: Duration) -> Self {
        self.min_delay = min_delay;
        self
    }

    fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.min_delay)
            .with_max_delay(self.min_delay * 30)
            .with_max_times(self.attempts - 1)
            .with_jitter()
    }
}

#[async_trait::async_trait]
impl<D: DestinationClient> DestinationClient for RetryingDestination<D> {
    async fn search(&self, query: &str, category: SearchCategory) -> Result<Vec<DestinationTrack>> {
        self.inner.search(query, category).await
    }

    async fn fetch_liked(&self, limit: u32) -> Result<Vec<DestinationTrack>> {
        self.inner.fetch_liked(limit).await
    }

    async fn like(&self, id: &str) -> Result<()> {
        (|| self.inner.like(id))
            .retry(self.backoff())
            .notify(|error, delay| {
                tracing::warn!(
                    "Like for {} failed, retrying in {}: {:#}",
                    id,
                    humantime::format_duration(delay),
                    error
                );
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::destination::MockDestinationClient;
    use mockall::Sequence;
    use mockall::predicate::eq;

    #[tokio::test]
    async fn test_like_is_retried_until_success() {
        let mut inner = MockDestinationClient::new();
        let mut seq = Sequence::new();
        inner
            .expect_like()
            .with(eq("v1"))
            .times(2)
            .in_sequence(&mut seq)
            .returning(|_| Err(color_eyre::eyre::eyre!("503 Service Unavailable")));
        inner
            .expect_like()
            .with(eq("v1"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));

        let destination =
            RetryingDestination::new(inner, 3).with_min_delay(Duration::from_millis(1));

        destination.like("v1").await.unwrap();
    }

    #[tokio::test]
    async fn test_like_gives_up_after_attempts() {
        let mut inner = MockDestinationClient::new();
        inner
            .expect_like()
            .times(2)
            .returning(|_| Err(color_eyre::eyre::eyre!("503 Service Unavailable")));

        let destination =
            RetryingDestination::new(inner, 2).with_min_delay(Duration::from_millis(1));

        assert!(destination.like("v1").await.is_err());
    }

    #[tokio::test]
    async fn test_single_attempt_means_no_retry() {
        let mut inner = MockDestinationClient::new();
        inner
            .expect_like()
            .times(1)
            .returning(|_| Err(color_eyre::eyre::eyre!("boom")));

        let destination = RetryingDestination::new(inner, 1);

        assert!(destination.like("v1").await.is_err());
    }

    #[tokio::test]
    async fn test_search_is_not_retried() {
        let mut inner = MockDestinationClient::new();
        inner
            .expect_search()
            .times(1)
            .returning(|_, _| Err(color_eyre::eyre::eyre!("timeout")));

        let destination = RetryingDestination::new(inner, 5);

        assert!(
            destination
                .search("Song A Artist X", SearchCategory::Songs)
                .await
                .is_err()
        );
    }
}

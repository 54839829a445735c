//! Retry wrapper for entity transports.

use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use super::provider::EntityTransport;
use crate::entity::Entity;
use crate::envelope::{Envelope, PageRequest};
use crate::{Error, Result};

/// Wraps a transport with retry logic for reads.
///
/// `find`, `query` and `search` are retried with exponential backoff when
/// the error is retryable. Writes are passed through exactly once: a save
/// is only ever repeated by the user.
pub struct RetryTransport<E: Entity> {
    inner: Arc<dyn EntityTransport<E>>,
    max_attempts: u32,
    initial_delay: Duration,
    max_delay: Duration,
}

impl<E: Entity> RetryTransport<E> {
    /// Creates a new retry wrapper with default settings.
    ///
    /// Default settings:
    /// - Max attempts: 3
    /// - Initial delay: 200 milliseconds
    /// - Max delay: 5 seconds
    pub fn new(transport: Arc<dyn EntityTransport<E>>) -> Self {
        Self {
            inner: transport,
            max_attempts: 3,
            initial_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
        }
    }

    /// Sets the maximum number of attempts, including the first one.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Sets the initial delay between retries.
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Sets the maximum delay between retries.
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.initial_delay)
            .with_max_delay(self.max_delay)
            .with_max_times(self.max_attempts.saturating_sub(1) as usize)
    }

    fn should_retry(error: &Error) -> bool {
        error.is_retryable()
    }

    fn log_retry(error: &Error, delay: Duration) {
        warn!(
            "retrying {} in {:?} after: {}",
            E::RESOURCE,
            delay,
            error
        );
    }
}

#[async_trait]
impl<E: Entity> EntityTransport<E> for RetryTransport<E> {
    async fn find(&self, id: &E::Id) -> Result<Envelope<E>> {
        (|| self.inner.find(id))
            .retry(self.backoff())
            .when(Self::should_retry)
            .notify(Self::log_retry)
            .await
    }

    async fn create(&self, entity: &E) -> Result<Envelope<E>> {
        self.inner.create(entity).await
    }

    async fn update(&self, entity: &E) -> Result<Envelope<E>> {
        self.inner.update(entity).await
    }

    async fn query(&self, page: &PageRequest) -> Result<Envelope<Vec<E>>> {
        (|| self.inner.query(page))
            .retry(self.backoff())
            .when(Self::should_retry)
            .notify(Self::log_retry)
            .await
    }

    async fn search(&self, query: &str, page: &PageRequest) -> Result<Envelope<Vec<E>>> {
        (|| self.inner.search(query, page))
            .retry(self.backoff())
            .when(Self::should_retry)
            .notify(Self::log_retry)
            .await
    }

    async fn delete(&self, id: &E::Id) -> Result<Envelope<()>> {
        self.inner.delete(id).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entity::{Hospital, HospitalId};
    use crate::transport::{Call, MockTransport};

    fn fast(mock: &MockTransport<Hospital>) -> RetryTransport<Hospital> {
        RetryTransport::new(Arc::new(mock.clone()))
            .with_initial_delay(Duration::from_millis(1))
            .with_max_delay(Duration::from_millis(2))
    }

    #[tokio::test]
    async fn test_retry_find_recovers_from_transient_errors() {
        let mock = MockTransport::new()
            .with_find(Err(Error::transport("connection reset")))
            .with_find(Err(Error::status(503, "unavailable")))
            .with_find(Ok(Envelope::ok(Hospital::with_id("7", "Central"))));
        let retry = fast(&mock);

        let found = retry.find(&HospitalId::new("7")).await.unwrap();

        assert_eq!(found.body.unwrap().name, "Central");
        assert_eq!(mock.count(|c| matches!(c, Call::Find(_))), 3);
    }

    #[tokio::test]
    async fn test_retry_find_gives_up_after_max_attempts() {
        let mock = MockTransport::new()
            .with_find(Err(Error::transport("down")))
            .with_find(Err(Error::transport("down")))
            .with_find(Ok(Envelope::ok(Hospital::with_id("7", "Central"))));
        let retry = fast(&mock).with_max_attempts(2);

        let err = retry.find(&HospitalId::new("7")).await.unwrap_err();

        assert!(matches!(err, Error::Transport { .. }));
        assert_eq!(mock.count(|c| matches!(c, Call::Find(_))), 2);
    }

    #[tokio::test]
    async fn test_retry_skips_non_retryable_errors() {
        let mock = MockTransport::new();
        let retry = fast(&mock);

        let err = retry.find(&HospitalId::new("missing")).await.unwrap_err();

        assert_eq!(err.status_code(), Some(404));
        assert_eq!(mock.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_retry_never_repeats_writes() {
        let mock = MockTransport::new().with_save(Err(Error::transport("reset")));
        let retry = fast(&mock);

        let err = retry.create(&Hospital::named("Once")).await.unwrap_err();

        assert!(err.is_retryable());
        assert_eq!(mock.calls(), vec![Call::Create]);
    }

    #[test]
    fn test_retry_builder() {
        let mock = MockTransport::<Hospital>::new();
        let retry = RetryTransport::new(Arc::new(mock))
            .with_max_attempts(5)
            .with_initial_delay(Duration::from_millis(500))
            .with_max_delay(Duration::from_secs(30));

        assert_eq!(retry.max_attempts, 5);
        assert_eq!(retry.initial_delay, Duration::from_millis(500));
        assert_eq!(retry.max_delay, Duration::from_secs(30));
    }
}

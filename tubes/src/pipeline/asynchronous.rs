//! Asynchronous pipeline.

use crate::cancellation::CancellationToken;
use crate::core::{short_type_name, Message};
use crate::errors::{Cancelled, TubesError};
use crate::filters::{AsyncFilter, AsyncFnFilter};
use crate::registry::FilterRegistry;
use futures::future::BoxFuture;
use std::sync::Arc;
use tracing::debug;

/// An ordered list of asynchronous filters executed against one message.
///
/// Filters are awaited one after the other; two filters never run
/// concurrently for the same call. Before each filter the pipeline checks,
/// in order:
///
/// 1. the cancellation token: if cancelled, the call fails with [`Cancelled`];
/// 2. the message's stop flag: if set, the call ends successfully.
///
/// Both checks happen only at filter boundaries. A running filter is never
/// interrupted by the pipeline.
pub struct AsyncPipeline<M, E = anyhow::Error> {
    filters: Vec<Arc<dyn AsyncFilter<M, E>>>,
    registry: Option<Arc<FilterRegistry>>,
}

impl<M, E> AsyncPipeline<M, E>
where
    M: Message + Send + 'static,
    E: Send + 'static,
{
    /// Creates an empty pipeline without a registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            filters: Vec::new(),
            registry: None,
        }
    }

    /// Creates an empty pipeline able to resolve filters from `registry`.
    #[must_use]
    pub fn with_registry(registry: Arc<FilterRegistry>) -> Self {
        Self {
            filters: Vec::new(),
            registry: Some(registry),
        }
    }

    /// Appends a filter.
    pub fn register<F>(&mut self, filter: F) -> &mut Self
    where
        F: AsyncFilter<M, E> + 'static,
    {
        self.filters.push(Arc::new(filter));
        self
    }

    /// Appends a filter shared with other owners.
    pub fn register_shared(&mut self, filter: Arc<dyn AsyncFilter<M, E>>) -> &mut Self {
        self.filters.push(filter);
        self
    }

    /// Appends a raw callable returning a boxed future.
    pub fn register_fn<F>(&mut self, filter: F) -> &mut Self
    where
        F: for<'a> Fn(&'a mut M, &'a CancellationToken) -> BoxFuture<'a, Result<(), E>>
            + Send
            + Sync
            + 'static,
    {
        self.register(AsyncFnFilter::new(filter))
    }

    /// Resolves a filter of type `F` from the registry and appends it.
    ///
    /// # Errors
    ///
    /// Returns [`TubesError::ServiceProviderMissing`] if the pipeline was built
    /// without a registry, or [`TubesError::FilterNotRegistered`] if the
    /// registry has no factory for `F`.
    pub fn register_resolved<F>(&mut self) -> Result<&mut Self, TubesError>
    where
        F: AsyncFilter<M, E> + 'static,
    {
        let registry = self
            .registry
            .as_ref()
            .ok_or(TubesError::ServiceProviderMissing)?;
        let filter = registry.resolve::<F>().ok_or_else(|| {
            TubesError::filter_not_registered(short_type_name(std::any::type_name::<F>()))
        })?;
        self.filters.push(filter);
        Ok(self)
    }

    /// Awaits every filter in registration order.
    ///
    /// # Errors
    ///
    /// Returns [`Cancelled`] (converted into `E`) when the token is found
    /// cancelled at a filter boundary. The first filter failure is returned
    /// unchanged; later filters do not run.
    pub async fn execute_async(&self, message: &mut M, cancel: &CancellationToken) -> Result<(), E>
    where
        E: From<Cancelled>,
    {
        for (index, filter) in self.filters.iter().enumerate() {
            if cancel.is_cancelled() {
                debug!(
                    message_type = message.type_name(),
                    completed = index,
                    reason = ?cancel.reason(),
                    "Pipeline cancelled at filter boundary"
                );
                return Err(cancel.to_error().into());
            }
            if message.is_stopped() {
                debug!(
                    message_type = message.type_name(),
                    skipped = self.filters.len() - index,
                    "Pipeline stopped by message flag"
                );
                break;
            }
            filter.execute_async(message, cancel).await?;
        }
        Ok(())
    }

    /// Returns the number of registered filters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Returns true if no filter is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

impl<M, E> Default for AsyncPipeline<M, E>
where
    M: Message + Send + 'static,
    E: Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<M, E> std::fmt::Debug for AsyncPipeline<M, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncPipeline")
            .field("filters", &self.filters.len())
            .field("registry", &self.registry.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{assert_cancelled, RecordingFilter, TestMessage};
    use async_trait::async_trait;
    use mockall::mock;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    mock! {
        pub MessageFilter {}

        #[async_trait]
        impl AsyncFilter<TestMessage> for MessageFilter {
            async fn execute_async(
                &self,
                message: &mut TestMessage,
                cancel: &CancellationToken,
            ) -> anyhow::Result<()>;
        }
    }

    fn recording_pipeline(names: &[&str]) -> (AsyncPipeline<TestMessage>, crate::testing::VisitLog) {
        let log = RecordingFilter::log();
        let mut pipeline = AsyncPipeline::new();
        for name in names {
            pipeline.register(RecordingFilter::new(*name, log.clone()));
        }
        (pipeline, log)
    }

    #[tokio::test]
    async fn test_executes_filters_in_registration_order() {
        let (pipeline, log) = recording_pipeline(&["f1", "f2", "f3"]);

        let mut message = TestMessage::new();
        pipeline
            .execute_async(&mut message, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(*log.lock(), vec!["f1", "f2", "f3"]);
        assert_eq!(message.visited, vec!["f1", "f2", "f3"]);
    }

    #[tokio::test]
    async fn test_shared_filter_runs_at_each_registration() {
        let log = RecordingFilter::log();
        let shared: Arc<dyn AsyncFilter<TestMessage>> = Arc::new(RecordingFilter::new("shared", log.clone()));
        let mut pipeline = AsyncPipeline::new();
        pipeline
            .register_shared(Arc::clone(&shared))
            .register(RecordingFilter::new("own", log.clone()))
            .register_shared(shared);

        let mut message = TestMessage::new();
        pipeline
            .execute_async(&mut message, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(pipeline.len(), 3);
        assert_eq!(*log.lock(), vec!["shared", "own", "shared"]);
    }

    #[tokio::test]
    async fn test_mock_filters_each_run_once() {
        let mut first = MockMessageFilter::new();
        first.expect_execute_async().times(1).returning(|_, _| Ok(()));
        let mut second = MockMessageFilter::new();
        second.expect_execute_async().times(1).returning(|_, _| Ok(()));

        let mut pipeline = AsyncPipeline::new();
        pipeline.register(first).register(second);

        tokio_test::assert_ok!(
            pipeline
                .execute_async(&mut TestMessage::new(), &CancellationToken::new())
                .await
        );
    }

    #[tokio::test]
    async fn test_stop_flag_skips_remaining_filters() {
        let mut first = MockMessageFilter::new();
        first.expect_execute_async().times(1).returning(|_, _| Ok(()));
        let mut second = MockMessageFilter::new();
        second.expect_execute_async().times(1).returning(|message, _| {
            message.stop = true;
            Ok(())
        });
        let mut third = MockMessageFilter::new();
        third.expect_execute_async().never();

        let mut pipeline = AsyncPipeline::new();
        pipeline.register(first).register(second).register(third);

        let mut message = TestMessage::new();
        pipeline
            .execute_async(&mut message, &CancellationToken::new())
            .await
            .unwrap();

        assert!(message.stop);
    }

    #[tokio::test]
    async fn test_cancelled_before_start_runs_nothing() {
        let (pipeline, log) = recording_pipeline(&["f1", "f2"]);
        let token = CancellationToken::new();
        token.cancel("shutdown");

        let err = pipeline
            .execute_async(&mut TestMessage::new(), &token)
            .await
            .unwrap_err();

        assert_cancelled(&err);
        assert!(log.lock().is_empty());
    }

    #[tokio::test]
    async fn test_cancellation_wins_over_stop_flag() {
        let (pipeline, _log) = recording_pipeline(&["f1"]);
        let token = CancellationToken::new();
        token.cancel("shutdown");
        let mut message = TestMessage::stopped();

        let err = pipeline.execute_async(&mut message, &token).await.unwrap_err();

        assert_cancelled(&err);
    }

    #[tokio::test]
    async fn test_cancellation_between_filters() {
        let token = Arc::new(CancellationToken::new());
        let log = RecordingFilter::log();
        let mut pipeline: AsyncPipeline<TestMessage> = AsyncPipeline::new();

        let canceller = token.clone();
        let first_log = log.clone();
        pipeline
            .register_fn(move |message, _cancel| {
                let canceller = canceller.clone();
                let first_log = first_log.clone();
                Box::pin(async move {
                    message.visit("f1");
                    first_log.lock().push("f1".to_string());
                    canceller.cancel("after f1");
                    Ok::<(), anyhow::Error>(())
                })
            })
            .register(RecordingFilter::new("f2", log.clone()))
            .register(RecordingFilter::new("f3", log.clone()));

        let err = pipeline
            .execute_async(&mut TestMessage::new(), &token)
            .await
            .unwrap_err();

        assert_eq!(
            err.downcast_ref::<Cancelled>(),
            Some(&Cancelled::new(Some("after f1".to_string())))
        );
        assert_eq!(*log.lock(), vec!["f1"]);
    }

    #[tokio::test]
    async fn test_suspended_filter_surfaces_its_own_cancellation() {
        let token = Arc::new(CancellationToken::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let mut pipeline: AsyncPipeline<TestMessage> = AsyncPipeline::new();

        let first_calls = calls.clone();
        pipeline.register_fn(move |_message, cancel| {
            let calls = first_calls.clone();
            Box::pin(async move {
                calls.fetch_add(1, Ordering::SeqCst);
                cancel
                    .run_until_cancelled(tokio::time::sleep(Duration::from_secs(5)))
                    .await?;
                Ok::<(), anyhow::Error>(())
            })
        });
        let second_calls = calls.clone();
        pipeline.register_fn(move |_message, _cancel| {
            let calls = second_calls.clone();
            Box::pin(async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<(), anyhow::Error>(())
            })
        });

        let running = {
            let token = token.clone();
            tokio::spawn(async move {
                let mut message = TestMessage::new();
                pipeline.execute_async(&mut message, &token).await
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        token.cancel("caller gave up");

        let result = tokio::time::timeout(Duration::from_secs(1), running)
            .await
            .expect("pipeline should finish")
            .expect("pipeline task should not panic");

        assert_cancelled(&result.unwrap_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_custom_error_type_receives_cancellation() {
        #[derive(Debug, PartialEq)]
        enum OrderError {
            Cancelled,
        }

        impl From<Cancelled> for OrderError {
            fn from(_: Cancelled) -> Self {
                Self::Cancelled
            }
        }

        let pipeline: AsyncPipeline<u32, OrderError> = {
            let mut pipeline = AsyncPipeline::new();
            pipeline.register_fn(|message, _cancel| {
                Box::pin(async move {
                    *message += 1;
                    Ok::<(), OrderError>(())
                })
            });
            pipeline
        };
        let token = CancellationToken::new();
        token.cancel("stop");

        let mut message = 0;
        let result = pipeline.execute_async(&mut message, &token).await;

        assert_eq!(result, Err(OrderError::Cancelled));
        assert_eq!(message, 0);
    }

    #[tokio::test]
    async fn test_register_resolved() {
        let registry = Arc::new(FilterRegistry::new());
        let log = RecordingFilter::log();
        let shared = log.clone();
        registry.add_singleton(move || RecordingFilter::new("resolved", shared.clone()));

        let mut pipeline: AsyncPipeline<TestMessage> = AsyncPipeline::with_registry(registry);
        pipeline.register_resolved::<RecordingFilter>().unwrap();
        pipeline
            .execute_async(&mut TestMessage::new(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(*log.lock(), vec!["resolved"]);
    }

    #[test]
    fn test_register_resolved_errors() {
        let mut without: AsyncPipeline<TestMessage> = AsyncPipeline::new();
        assert!(matches!(
            without.register_resolved::<RecordingFilter>(),
            Err(TubesError::ServiceProviderMissing)
        ));

        let mut empty: AsyncPipeline<TestMessage> =
            AsyncPipeline::with_registry(Arc::new(FilterRegistry::new()));
        assert!(matches!(
            empty.register_resolved::<RecordingFilter>(),
            Err(TubesError::FilterNotRegistered { ref name }) if name == "RecordingFilter"
        ));
    }
}

//! Aspect that logs every message it receives.

use crate::cancellation::CancellationToken;
use crate::core::Message;
use crate::filters::{AsyncFilter, Step};
use crate::logging::{LogRecord, LogSink, TracingLogSink, MESSAGE_LOGGING_CATEGORY};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tracing::Level;

/// Logs the runtime type of every message at debug level before delegating.
///
/// The record is written even when the token is already cancelled; `next` is
/// then skipped. Failures from `next` pass through untouched.
pub struct MessageLoggingAspect<N> {
    next: N,
    sink: Arc<dyn LogSink>,
}

impl<N> MessageLoggingAspect<N> {
    /// Wraps `next`, writing records to `sink`.
    pub fn new(next: N, sink: Arc<dyn LogSink>) -> Self {
        Self { next, sink }
    }

    /// Wraps `next`, writing records through `tracing`.
    pub fn with_tracing(next: N) -> Self {
        Self::new(next, Arc::new(TracingLogSink::new()))
    }

    /// Returns the wrapped step.
    pub fn inner(&self) -> &N {
        &self.next
    }

    fn received<M: Message>(&self, message: &M) {
        if self.sink.is_enabled(Level::DEBUG) {
            let text = format!("Message received: {}", message.type_name());
            self.sink.log(LogRecord {
                level: Level::DEBUG,
                category: MESSAGE_LOGGING_CATEGORY,
                error: None,
                message: &text,
            });
        }
    }
}

impl<N: fmt::Debug> fmt::Debug for MessageLoggingAspect<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageLoggingAspect")
            .field("next", &self.next)
            .finish_non_exhaustive()
    }
}

impl<M, E, N> Step<M, E> for MessageLoggingAspect<N>
where
    M: Message,
    N: Step<M, E>,
{
    fn execute(&self, message: &mut M, cancel: &CancellationToken) -> Result<(), E> {
        self.received(message);
        if cancel.is_cancelled() {
            return Ok(());
        }
        self.next.execute(message, cancel)
    }
}

#[async_trait]
impl<M, E, N> AsyncFilter<M, E> for MessageLoggingAspect<N>
where
    M: Message + Send,
    E: Send,
    N: AsyncFilter<M, E>,
{
    async fn execute_async(&self, message: &mut M, cancel: &CancellationToken) -> Result<(), E> {
        self.received(message);
        if cancel.is_cancelled() {
            return Ok(());
        }
        self.next.execute_async(message, cancel).await
    }
}

//! Aspect that logs failures of the wrapped step.

use crate::cancellation::CancellationToken;
use crate::core::{short_type_name, Message};
use crate::filters::{AsyncFilter, Step};
use crate::logging::{LogRecord, LogSink, TracingLogSink, EXCEPTION_LOGGING_CATEGORY};
use async_trait::async_trait;
use std::fmt::{self, Display};
use std::sync::Arc;
use tracing::Level;

/// Logs failures of the wrapped step at error level and returns them unchanged.
pub struct ExceptionLoggingAspect<N> {
    next: N,
    sink: Arc<dyn LogSink>,
}

impl<N> ExceptionLoggingAspect<N> {
    /// Wraps `next`, reporting failures to `sink`.
    pub fn new(next: N, sink: Arc<dyn LogSink>) -> Self {
        Self { next, sink }
    }

    /// Wraps `next`, reporting failures through `tracing`.
    pub fn with_tracing(next: N) -> Self {
        Self::new(next, Arc::new(TracingLogSink::new()))
    }

    /// Returns the wrapped step.
    pub fn inner(&self) -> &N {
        &self.next
    }

    fn report<M, E>(&self, message: &M, error: &E)
    where
        M: Message,
        E: Display,
    {
        if !self.sink.is_enabled(Level::ERROR) {
            return;
        }
        let text = format!(
            "Exception in {}: {}",
            short_type_name(std::any::type_name::<M>()),
            message.type_name()
        );
        self.sink.log(LogRecord {
            level: Level::ERROR,
            category: EXCEPTION_LOGGING_CATEGORY,
            error: Some(error),
            message: &text,
        });
    }
}

impl<N: fmt::Debug> fmt::Debug for ExceptionLoggingAspect<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExceptionLoggingAspect")
            .field("next", &self.next)
            .finish_non_exhaustive()
    }
}

impl<M, E, N> Step<M, E> for ExceptionLoggingAspect<N>
where
    M: Message,
    E: Display,
    N: Step<M, E>,
{
    fn execute(&self, message: &mut M, cancel: &CancellationToken) -> Result<(), E> {
        if cancel.is_cancelled() {
            return Ok(());
        }
        let result = self.next.execute(message, cancel);
        if let Err(error) = &result {
            self.report(message, error);
        }
        result
    }
}

#[async_trait]
impl<M, E, N> AsyncFilter<M, E> for ExceptionLoggingAspect<N>
where
    M: Message + Send,
    E: Display + Send,
    N: AsyncFilter<M, E>,
{
    async fn execute_async(&self, message: &mut M, cancel: &CancellationToken) -> Result<(), E> {
        if cancel.is_cancelled() {
            return Ok(());
        }
        let result = self.next.execute_async(message, cancel).await;
        if let Err(error) = &result {
            self.report(message, error);
        }
        result
    }
}

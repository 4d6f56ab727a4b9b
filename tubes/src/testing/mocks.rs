//! Mock filters, steps and sinks for testing.

use super::fixtures::TestMessage;
use crate::cancellation::CancellationToken;
use crate::filters::{AsyncFilter, Filter, Step};
use crate::logging::{LogRecord, LogSink};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tracing::Level;

/// Shared log of filter names, in execution order.
pub type VisitLog = Arc<Mutex<Vec<String>>>;

/// A filter that records its name in a shared log and on the message.
#[derive(Debug, Clone)]
pub struct RecordingFilter {
    name: String,
    log: VisitLog,
}

impl RecordingFilter {
    /// Creates a recording filter writing to `log`.
    #[must_use]
    pub fn new(name: impl Into<String>, log: VisitLog) -> Self {
        Self {
            name: name.into(),
            log,
        }
    }

    /// Creates an empty shared log.
    #[must_use]
    pub fn log() -> VisitLog {
        Arc::new(Mutex::new(Vec::new()))
    }

    fn record(&self, message: &mut TestMessage) {
        self.log.lock().push(self.name.clone());
        message.visit(self.name.clone());
    }
}

impl Filter<TestMessage> for RecordingFilter {
    fn execute(&self, message: &mut TestMessage) -> anyhow::Result<()> {
        self.record(message);
        Ok(())
    }
}

#[async_trait]
impl AsyncFilter<TestMessage> for RecordingFilter {
    async fn execute_async(
        &self,
        message: &mut TestMessage,
        _cancel: &CancellationToken,
    ) -> anyhow::Result<()> {
        self.record(message);
        Ok(())
    }
}

/// Error raised by a [`ScriptedStep`], tagged with the attempt that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("scripted failure on attempt {attempt}")]
pub struct AttemptFailure {
    /// One-based attempt number.
    pub attempt: u32,
}

/// A step that fails a fixed number of times before succeeding.
#[derive(Debug)]
pub struct ScriptedStep {
    failures: u32,
    calls: AtomicU32,
}

impl ScriptedStep {
    /// Creates a step whose first `failures` invocations fail.
    #[must_use]
    pub fn failing(failures: u32) -> Self {
        Self {
            failures,
            calls: AtomicU32::new(0),
        }
    }

    /// Creates a step that never fails.
    #[must_use]
    pub fn succeeding() -> Self {
        Self::failing(0)
    }

    /// Creates a step that always fails.
    #[must_use]
    pub fn always_failing() -> Self {
        Self::failing(u32::MAX)
    }

    /// Returns how many times the step has run.
    #[must_use]
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    fn attempt(&self) -> anyhow::Result<()> {
        let attempt = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if attempt <= self.failures {
            return Err(AttemptFailure { attempt }.into());
        }
        Ok(())
    }
}

impl<M> Step<M> for ScriptedStep {
    fn execute(&self, _message: &mut M, _cancel: &CancellationToken) -> anyhow::Result<()> {
        self.attempt()
    }
}

#[async_trait]
impl<M: Send> AsyncFilter<M> for ScriptedStep {
    async fn execute_async(&self, _message: &mut M, _cancel: &CancellationToken) -> anyhow::Result<()> {
        self.attempt()
    }
}

/// A log record captured by [`CollectingLogSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectedLog {
    /// Severity.
    pub level: Level,
    /// Logical source.
    pub category: String,
    /// Rendered error, if one was attached.
    pub error: Option<String>,
    /// Rendered message text.
    pub message: String,
}

/// A log sink that keeps every record in memory.
#[derive(Debug)]
pub struct CollectingLogSink {
    min_level: Level,
    records: RwLock<Vec<CollectedLog>>,
}

impl Default for CollectingLogSink {
    fn default() -> Self {
        Self::with_min_level(Level::TRACE)
    }
}

impl CollectingLogSink {
    /// Creates a sink accepting every level.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a sink accepting `min_level` and anything more severe.
    #[must_use]
    pub fn with_min_level(min_level: Level) -> Self {
        Self {
            min_level,
            records: RwLock::new(Vec::new()),
        }
    }

    /// Returns all collected records.
    #[must_use]
    pub fn records(&self) -> Vec<CollectedLog> {
        self.records.read().clone()
    }

    /// Returns the number of collected records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Returns true if nothing has been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Clears all collected records.
    pub fn clear(&self) {
        self.records.write().clear();
    }
}

impl LogSink for CollectingLogSink {
    fn is_enabled(&self, level: Level) -> bool {
        // `tracing` orders more verbose levels as greater.
        level <= self.min_level
    }

    fn log(&self, record: LogRecord<'_>) {
        self.records.write().push(CollectedLog {
            level: record.level,
            category: record.category.to_string(),
            error: record.error.map(ToString::to_string),
            message: record.message.to_string(),
        });
    }
}

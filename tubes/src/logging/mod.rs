//! Logging collaborator used by the logging aspects.
//!
//! Aspects never call `tracing` directly. They go through a [`LogSink`], so
//! hosts can route records elsewhere and tests can collect them.

use crate::errors::TubesError;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use tracing::{debug, error, info, trace, warn, Level};

/// Category used by the exception logging aspect.
pub const EXCEPTION_LOGGING_CATEGORY: &str = "tubes::aspects::exception_logging";

/// Category used by the message logging aspect.
pub const MESSAGE_LOGGING_CATEGORY: &str = "tubes::aspects::message_logging";

/// A single log record handed to a sink.
#[derive(Clone, Copy)]
pub struct LogRecord<'a> {
    /// Severity.
    pub level: Level,
    /// Logical source of the record.
    pub category: &'static str,
    /// The failure being reported, if any.
    pub error: Option<&'a dyn Display>,
    /// Rendered message text.
    pub message: &'a str,
}

impl fmt::Debug for LogRecord<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogRecord")
            .field("level", &self.level)
            .field("category", &self.category)
            .field("error", &self.error.map(ToString::to_string))
            .field("message", &self.message)
            .finish()
    }
}

/// Destination for aspect log records.
pub trait LogSink: Send + Sync {
    /// Returns true if records at `level` would be kept.
    ///
    /// Callers skip formatting entirely when this returns false.
    fn is_enabled(&self, level: Level) -> bool;

    /// Writes a record.
    fn log(&self, record: LogRecord<'_>);
}

/// A sink that forwards records to the `tracing` framework.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogSink;

impl TracingLogSink {
    /// Creates a new tracing sink.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl LogSink for TracingLogSink {
    fn is_enabled(&self, level: Level) -> bool {
        match level {
            Level::ERROR => tracing::enabled!(Level::ERROR),
            Level::WARN => tracing::enabled!(Level::WARN),
            Level::INFO => tracing::enabled!(Level::INFO),
            Level::DEBUG => tracing::enabled!(Level::DEBUG),
            _ => tracing::enabled!(Level::TRACE),
        }
    }

    fn log(&self, record: LogRecord<'_>) {
        let category = record.category;
        let error = record.error.map(ToString::to_string);
        match record.level {
            Level::ERROR => error!(category, error = ?error, "{}", record.message),
            Level::WARN => warn!(category, error = ?error, "{}", record.message),
            Level::INFO => info!(category, error = ?error, "{}", record.message),
            Level::DEBUG => debug!(category, error = ?error, "{}", record.message),
            _ => trace!(category, error = ?error, "{}", record.message),
        }
    }
}

/// Subscriber settings for hosts that let this crate install logging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Fallback filter directive used when `RUST_LOG` is unset.
    pub filter: String,
    /// Emit JSON lines instead of human-readable text.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            json: false,
        }
    }
}

impl LoggingConfig {
    /// Installs a global `tracing` subscriber.
    ///
    /// `RUST_LOG` takes precedence over [`LoggingConfig::filter`].
    ///
    /// # Errors
    ///
    /// Returns [`TubesError::Config`] if the filter directive is invalid or a
    /// global subscriber is already installed.
    pub fn init_tracing(&self) -> Result<(), TubesError> {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .or_else(|_| tracing_subscriber::EnvFilter::try_new(&self.filter))
            .map_err(|e| TubesError::Config(format!("invalid log filter: {e}")))?;

        let builder = tracing_subscriber::fmt().with_env_filter(filter);
        let installed = if self.json {
            builder.json().try_init()
        } else {
            builder.try_init()
        };
        installed.map_err(|e| TubesError::Config(format!("failed to install subscriber: {e}")))
    }
}

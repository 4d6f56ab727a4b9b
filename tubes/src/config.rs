//! Serde-loadable settings for retry policies and logging.
//!
//! Every section is optional in the source document and falls back to its
//! default:
//!
//! ```json
//! {
//!   "retry": { "max_retries": 3, "slide_time_ms": 200 },
//!   "logging": { "filter": "tubes=debug", "json": true }
//! }
//! ```

use crate::aspects::RetryOptions;
use crate::errors::TubesError;
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TubesConfig {
    /// Policy for [`RetryAspect`](crate::aspects::RetryAspect).
    pub retry: RetryOptions,
    /// Subscriber settings.
    pub logging: LoggingConfig,
}

impl TubesConfig {
    /// Parses configuration from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`TubesError::Serialization`] for malformed JSON or invalid
    /// values such as a negative retry count.
    pub fn from_json_str(source: &str) -> Result<Self, TubesError> {
        Ok(serde_json::from_str(source)?)
    }

    /// Reads and parses a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`TubesError::Io`] if the file cannot be read, otherwise the
    /// errors of [`TubesConfig::from_json_str`].
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, TubesError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_json_str(&source)
    }
}

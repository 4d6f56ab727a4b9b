//! Error types for the tubes library.
//!
//! Failures raised by filters and steps are never wrapped by this crate: they
//! travel back to the caller as the filter's own error type. The types here
//! cover the library's own usage defects, configuration problems and the
//! cancellation signal raised by [`AsyncPipeline`](crate::pipeline::AsyncPipeline).

use thiserror::Error;

/// The main error type for tubes operations.
#[derive(Debug, Error)]
pub enum TubesError {
    /// The wrong side of an [`Outcome`](crate::core::Outcome) was accessed.
    #[error("{0}")]
    InvalidState(String),

    /// A type-based registration was attempted on a pipeline built without a registry.
    #[error("Service provider is not available. Did you construct the pipeline with a service provider?")]
    ServiceProviderMissing,

    /// The requested filter type has no registration.
    #[error("Filter '{name}' is not registered with the service provider.")]
    FilterNotRegistered {
        /// Short type name of the requested filter.
        name: String,
    },

    /// An argument was outside of its permitted range.
    #[error("{message} (parameter '{parameter}')")]
    OutOfRange {
        /// Name of the offending parameter.
        parameter: &'static str,
        /// Description of the violated range.
        message: String,
    },

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TubesError {
    /// Creates a filter-not-registered error for `name`.
    #[must_use]
    pub fn filter_not_registered(name: impl Into<String>) -> Self {
        Self::FilterNotRegistered { name: name.into() }
    }

    /// Creates an out-of-range error.
    #[must_use]
    pub fn out_of_range(parameter: &'static str, message: impl Into<String>) -> Self {
        Self::OutOfRange {
            parameter,
            message: message.into(),
        }
    }

    /// Returns true for errors that indicate a usage defect rather than a runtime condition.
    #[must_use]
    pub fn is_programmer_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidState(_) | Self::ServiceProviderMissing | Self::FilterNotRegistered { .. }
        )
    }
}

/// Raised when an asynchronous pipeline observes a cancellation request at a filter boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Pipeline cancelled: {}", reason.as_deref().unwrap_or("cancellation requested"))]
pub struct Cancelled {
    /// The reason passed to [`CancellationToken::cancel`](crate::cancellation::CancellationToken::cancel).
    pub reason: Option<String>,
}

impl Cancelled {
    /// Creates a cancellation error with an optional reason.
    #[must_use]
    pub fn new(reason: Option<String>) -> Self {
        Self { reason }
    }
}

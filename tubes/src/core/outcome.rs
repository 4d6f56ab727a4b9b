//! Success/failure container used to report outcomes without errors-as-control-flow.

use crate::errors::TubesError;

/// The outcome of processing a message.
///
/// Exactly one of value or error is present. An `Outcome` is immutable once
/// created; reading the side that is not populated is a programmer error and
/// is reported as [`TubesError::InvalidState`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Outcome<T, E> {
    inner: Result<T, E>,
}

impl<T, E> Outcome<T, E> {
    /// Creates a successful outcome.
    #[must_use]
    pub fn success(value: T) -> Self {
        Self { inner: Ok(value) }
    }

    /// Creates a failed outcome.
    #[must_use]
    pub fn failure(error: E) -> Self {
        Self { inner: Err(error) }
    }

    /// Returns true if this outcome is successful.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.inner.is_ok()
    }

    /// Returns true if this outcome is a failure.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        self.inner.is_err()
    }

    /// Returns the success value.
    ///
    /// # Errors
    ///
    /// Returns [`TubesError::InvalidState`] when the outcome is a failure.
    pub fn value(&self) -> Result<&T, TubesError> {
        self.inner.as_ref().map_err(|_| not_successful())
    }

    /// Returns the failure value.
    ///
    /// # Errors
    ///
    /// Returns [`TubesError::InvalidState`] when the outcome is successful.
    pub fn error(&self) -> Result<&E, TubesError> {
        match &self.inner {
            Ok(_) => Err(successful()),
            Err(error) => Ok(error),
        }
    }

    /// Consumes the outcome and returns the success value.
    ///
    /// # Errors
    ///
    /// Returns [`TubesError::InvalidState`] when the outcome is a failure.
    pub fn into_value(self) -> Result<T, TubesError> {
        self.inner.map_err(|_| not_successful())
    }

    /// Consumes the outcome and returns the failure value.
    ///
    /// # Errors
    ///
    /// Returns [`TubesError::InvalidState`] when the outcome is successful.
    pub fn into_error(self) -> Result<E, TubesError> {
        match self.inner {
            Ok(_) => Err(successful()),
            Err(error) => Ok(error),
        }
    }

    /// Converts into a standard library `Result`.
    #[must_use]
    pub fn into_result(self) -> Result<T, E> {
        self.inner
    }

    /// Maps the success value, leaving a failure untouched.
    #[must_use]
    pub fn map<U, F>(self, f: F) -> Outcome<U, E>
    where
        F: FnOnce(T) -> U,
    {
        Outcome {
            inner: self.inner.map(f),
        }
    }
}

fn not_successful() -> TubesError {
    TubesError::InvalidState("Result is not successful".to_string())
}

fn successful() -> TubesError {
    TubesError::InvalidState("Result is successful".to_string())
}

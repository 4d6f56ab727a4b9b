//! Test assertions for pipeline and aspect failures.

use super::mocks::AttemptFailure;
use crate::errors::Cancelled;

/// Asserts that the error is a pipeline cancellation.
pub fn assert_cancelled(err: &anyhow::Error) {
    assert!(
        err.downcast_ref::<Cancelled>().is_some(),
        "Expected cancellation, got: {err}"
    );
}

/// Asserts that the error came from the given attempt of a [`ScriptedStep`].
///
/// [`ScriptedStep`]: super::ScriptedStep
pub fn assert_failed_on_attempt(err: &anyhow::Error, attempt: u32) {
    let actual = err.downcast_ref::<AttemptFailure>().map(|f| f.attempt);
    assert_eq!(
        actual,
        Some(attempt),
        "Expected failure from attempt {attempt}, got: {err}"
    );
}

//! Testing utilities for tubes pipelines and aspects.
//!
//! This module provides:
//! - A message fixture carrying a stop flag and a visit log
//! - Recording filters, scripted failing steps and a collecting log sink
//! - Assertions for cancellation and retry outcomes

mod assertions;
mod fixtures;
mod mocks;

pub use assertions::{assert_cancelled, assert_failed_on_attempt};
pub use fixtures::TestMessage;
pub use mocks::{
    AttemptFailure, CollectedLog, CollectingLogSink, RecordingFilter, ScriptedStep, VisitLog,
};

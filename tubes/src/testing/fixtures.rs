//! Test fixtures for pipeline testing.

use crate::core::{Message, StopProcessing};

/// A message that records which filters touched it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestMessage {
    /// Stop flag consulted between filters.
    pub stop: bool,
    /// Names of the filters that ran, in order.
    pub visited: Vec<String>,
}

impl TestMessage {
    /// Creates a message with the stop flag cleared.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a message with the stop flag already set.
    #[must_use]
    pub fn stopped() -> Self {
        Self {
            stop: true,
            visited: Vec::new(),
        }
    }

    /// Records a visit by `name`.
    pub fn visit(&mut self, name: impl Into<String>) {
        self.visited.push(name.into());
    }
}

impl StopProcessing for TestMessage {
    fn stop(&self) -> bool {
        self.stop
    }

    fn set_stop(&mut self, stop: bool) {
        self.stop = stop;
    }
}

impl Message for TestMessage {
    fn stop_processing(&self) -> Option<&dyn StopProcessing> {
        Some(self)
    }
}

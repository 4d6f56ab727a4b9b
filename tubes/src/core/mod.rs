//! Core domain model types for tubes.
//!
//! This module contains the fundamental types used throughout the library:
//! - The `Outcome` success/failure container
//! - The message capabilities consulted by pipelines and aspects

mod message;
mod outcome;

pub use message::{short_type_name, Message, OutcomeMessage, StopProcessing};
pub use outcome::Outcome;

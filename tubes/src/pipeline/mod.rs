//! Pipeline building and execution.
//!
//! This module provides:
//! - `Pipeline`: synchronous filters, stop flag checked between filters
//! - `AsyncPipeline`: asynchronous filters, cancellation and stop flag
//!   checked between filters

mod asynchronous;
mod sequential;

pub use asynchronous::AsyncPipeline;
pub use sequential::Pipeline;

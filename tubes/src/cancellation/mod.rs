//! Cooperative cancellation.
//!
//! A single [`CancellationToken`] is threaded through an entire pipeline or
//! aspect call. Pipelines and aspects only look at it at step boundaries; a
//! filter that suspends on external work can use
//! [`CancellationToken::run_until_cancelled`] to surface its own failure.

mod token;

pub use token::CancellationToken;

//! Decorators that wrap a single step with a cross-cutting concern.
//!
//! Every aspect owns exactly one `next` step and exposes the same shape it
//! wraps: [`Step`](crate::filters::Step) on the blocking surface and
//! [`AsyncFilter`](crate::filters::AsyncFilter) on the asynchronous one. They
//! nest freely, and an async-wrapped chain can be registered directly on an
//! [`AsyncPipeline`](crate::pipeline::AsyncPipeline).
//!
//! Unlike the async pipeline, an aspect that finds its token already cancelled
//! returns `Ok(())` without calling `next`.

mod exception_logging;
mod message_logging;
mod retry;
mod transaction;

pub use exception_logging::ExceptionLoggingAspect;
pub use message_logging::MessageLoggingAspect;
pub use retry::{RetryAspect, RetryOptions};
pub use transaction::TransactionAspect;

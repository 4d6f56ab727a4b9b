//! Filter capabilities and closure adapters.
//!
//! Filters are the processing steps of a pipeline. Three shapes exist:
//!
//! - [`Filter`]: synchronous, consumes the message only.
//! - [`AsyncFilter`]: asynchronous, receives the message and a cancellation
//!   token. This is also the shape aspects wrap on the async surface.
//! - [`Step`]: synchronous with a cancellation token, the shape aspects wrap
//!   on the blocking surface.

use crate::cancellation::CancellationToken;
use async_trait::async_trait;
use futures::future::BoxFuture;
use std::fmt::Debug;

/// A synchronous processing step.
pub trait Filter<M, E = anyhow::Error>: Send + Sync {
    /// Processes the message.
    ///
    /// # Errors
    ///
    /// Any failure is returned to the pipeline's caller unchanged.
    fn execute(&self, message: &mut M) -> Result<(), E>;
}

/// An asynchronous processing step.
#[async_trait]
pub trait AsyncFilter<M: Send, E: Send = anyhow::Error>: Send + Sync {
    /// Processes the message.
    ///
    /// The pipeline never interrupts a running filter. A filter that suspends
    /// on external work is responsible for observing `cancel` itself.
    ///
    /// # Errors
    ///
    /// Any failure is returned to the pipeline's caller unchanged.
    async fn execute_async(&self, message: &mut M, cancel: &CancellationToken) -> Result<(), E>;
}

/// A synchronous step that observes a cancellation token.
pub trait Step<M, E = anyhow::Error>: Send + Sync {
    /// Processes the message.
    ///
    /// # Errors
    ///
    /// Any failure is returned to the caller unchanged.
    fn execute(&self, message: &mut M, cancel: &CancellationToken) -> Result<(), E>;
}

/// A closure-based synchronous filter.
pub struct FnFilter<F> {
    func: F,
}

impl<F> FnFilter<F> {
    /// Wraps `func` as a filter.
    pub fn new<M, E>(func: F) -> Self
    where
        F: Fn(&mut M) -> Result<(), E> + Send + Sync,
    {
        Self { func }
    }
}

impl<F> Debug for FnFilter<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnFilter").finish_non_exhaustive()
    }
}

impl<M, E, F> Filter<M, E> for FnFilter<F>
where
    F: Fn(&mut M) -> Result<(), E> + Send + Sync,
{
    fn execute(&self, message: &mut M) -> Result<(), E> {
        (self.func)(message)
    }
}

/// A closure-based asynchronous filter.
///
/// The closure returns a boxed future borrowing the message and token:
///
/// ```rust,ignore
/// let filter = AsyncFnFilter::new(|message: &mut Order, _cancel: &CancellationToken| {
///     Box::pin(async move {
///         message.total += 1;
///         Ok(())
///     })
/// });
/// ```
pub struct AsyncFnFilter<F> {
    func: F,
}

impl<F> AsyncFnFilter<F> {
    /// Wraps `func` as an asynchronous filter.
    pub fn new<M, E>(func: F) -> Self
    where
        F: for<'a> Fn(&'a mut M, &'a CancellationToken) -> BoxFuture<'a, Result<(), E>>
            + Send
            + Sync,
    {
        Self { func }
    }
}

impl<F> Debug for AsyncFnFilter<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncFnFilter").finish_non_exhaustive()
    }
}

#[async_trait]
impl<M, E, F> AsyncFilter<M, E> for AsyncFnFilter<F>
where
    M: Send,
    E: Send,
    F: for<'a> Fn(&'a mut M, &'a CancellationToken) -> BoxFuture<'a, Result<(), E>> + Send + Sync,
{
    async fn execute_async(&self, message: &mut M, cancel: &CancellationToken) -> Result<(), E> {
        (self.func)(message, cancel).await
    }
}

/// A closure-based synchronous step.
pub struct FnStep<F> {
    func: F,
}

impl<F> FnStep<F> {
    /// Wraps `func` as a step.
    pub fn new<M, E>(func: F) -> Self
    where
        F: Fn(&mut M, &CancellationToken) -> Result<(), E> + Send + Sync,
    {
        Self { func }
    }
}

impl<F> Debug for FnStep<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnStep").finish_non_exhaustive()
    }
}

impl<M, E, F> Step<M, E> for FnStep<F>
where
    F: Fn(&mut M, &CancellationToken) -> Result<(), E> + Send + Sync,
{
    fn execute(&self, message: &mut M, cancel: &CancellationToken) -> Result<(), E> {
        (self.func)(message, cancel)
    }
}

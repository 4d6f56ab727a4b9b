//! Synchronous pipeline.

use crate::core::{short_type_name, Message};
use crate::errors::TubesError;
use crate::filters::{FnFilter, Filter};
use crate::registry::FilterRegistry;
use std::sync::Arc;
use tracing::debug;

/// An ordered list of synchronous filters executed against one message.
///
/// Filters run strictly in registration order on the caller's thread. Before
/// each filter the message's [`StopProcessing`](crate::core::StopProcessing)
/// flag is consulted; once set, the remaining filters are skipped silently.
/// This variant has no cancellation token.
///
/// Registration is expected to finish before the pipeline is executed.
pub struct Pipeline<M, E = anyhow::Error> {
    filters: Vec<Arc<dyn Filter<M, E>>>,
    registry: Option<Arc<FilterRegistry>>,
}

impl<M, E> Pipeline<M, E>
where
    M: Message + 'static,
    E: 'static,
{
    /// Creates an empty pipeline without a registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            filters: Vec::new(),
            registry: None,
        }
    }

    /// Creates an empty pipeline able to resolve filters from `registry`.
    #[must_use]
    pub fn with_registry(registry: Arc<FilterRegistry>) -> Self {
        Self {
            filters: Vec::new(),
            registry: Some(registry),
        }
    }

    /// Appends a filter.
    pub fn register<F>(&mut self, filter: F) -> &mut Self
    where
        F: Filter<M, E> + 'static,
    {
        self.filters.push(Arc::new(filter));
        self
    }

    /// Appends a filter shared with other owners.
    pub fn register_shared(&mut self, filter: Arc<dyn Filter<M, E>>) -> &mut Self {
        self.filters.push(filter);
        self
    }

    /// Appends a raw callable.
    pub fn register_fn<F>(&mut self, filter: F) -> &mut Self
    where
        F: Fn(&mut M) -> Result<(), E> + Send + Sync + 'static,
    {
        self.register(FnFilter::new(filter))
    }

    /// Resolves a filter of type `F` from the registry and appends it.
    ///
    /// # Errors
    ///
    /// Returns [`TubesError::ServiceProviderMissing`] if the pipeline was built
    /// without a registry, or [`TubesError::FilterNotRegistered`] if the
    /// registry has no factory for `F`.
    pub fn register_resolved<F>(&mut self) -> Result<&mut Self, TubesError>
    where
        F: Filter<M, E> + 'static,
    {
        let registry = self
            .registry
            .as_ref()
            .ok_or(TubesError::ServiceProviderMissing)?;
        let filter = registry.resolve::<F>().ok_or_else(|| {
            TubesError::filter_not_registered(short_type_name(std::any::type_name::<F>()))
        })?;
        self.filters.push(filter);
        Ok(self)
    }

    /// Runs every filter in registration order.
    ///
    /// # Errors
    ///
    /// The first filter failure is returned unchanged; later filters do not run.
    pub fn execute(&self, message: &mut M) -> Result<(), E> {
        for (index, filter) in self.filters.iter().enumerate() {
            if message.is_stopped() {
                debug!(
                    message_type = message.type_name(),
                    skipped = self.filters.len() - index,
                    "Pipeline stopped by message flag"
                );
                break;
            }
            filter.execute(message)?;
        }
        Ok(())
    }

    /// Returns the number of registered filters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Returns true if no filter is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

impl<M, E> Default for Pipeline<M, E>
where
    M: Message + 'static,
    E: 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<M, E> std::fmt::Debug for Pipeline<M, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("filters", &self.filters.len())
            .field("registry", &self.registry.is_some())
            .finish()
    }
}

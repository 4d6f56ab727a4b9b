//! Explicit filter registry used for type-based pipeline registration.
//!
//! The integrator populates a [`FilterRegistry`] at startup with one factory
//! per filter type. Pipelines constructed with a registry can then call
//! `register_resolved::<F>()` to append an instance of `F`.

use crate::core::short_type_name;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

/// How long a resolved filter instance lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceLifetime {
    /// Built once on first resolution and shared afterwards.
    Singleton,
    /// Built on every resolution.
    #[default]
    Transient,
}

type AnyInstance = Arc<dyn Any + Send + Sync>;

/// Factory function type for creating filters.
type FilterFactory = Arc<dyn Fn() -> AnyInstance + Send + Sync>;

struct Registration {
    name: &'static str,
    lifetime: ServiceLifetime,
    factory: FilterFactory,
    instance: Option<AnyInstance>,
}

/// Registry mapping filter types to factories.
#[derive(Default)]
pub struct FilterRegistry {
    registrations: RwLock<HashMap<TypeId, Registration>>,
}

impl FilterRegistry {
    /// Creates a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a factory for `F` with the given lifetime.
    ///
    /// A later registration for the same type replaces the earlier one.
    pub fn add<F, Factory>(&self, lifetime: ServiceLifetime, factory: Factory) -> &Self
    where
        F: Send + Sync + 'static,
        Factory: Fn() -> F + Send + Sync + 'static,
    {
        let registration = Registration {
            name: short_type_name(std::any::type_name::<F>()),
            lifetime,
            factory: Arc::new(move || Arc::new(factory()) as AnyInstance),
            instance: None,
        };
        self.registrations
            .write()
            .insert(TypeId::of::<F>(), registration);
        self
    }

    /// Registers a filter built once and shared by every pipeline.
    pub fn add_singleton<F, Factory>(&self, factory: Factory) -> &Self
    where
        F: Send + Sync + 'static,
        Factory: Fn() -> F + Send + Sync + 'static,
    {
        self.add(ServiceLifetime::Singleton, factory)
    }

    /// Registers a filter built anew for every resolution.
    pub fn add_transient<F, Factory>(&self, factory: Factory) -> &Self
    where
        F: Send + Sync + 'static,
        Factory: Fn() -> F + Send + Sync + 'static,
    {
        self.add(ServiceLifetime::Transient, factory)
    }

    /// Resolves an instance of `F`, or `None` if `F` has no registration.
    ///
    /// Factories run without the registry lock held, so a factory may resolve
    /// other registrations from the same registry.
    #[must_use]
    pub fn resolve<F>(&self) -> Option<Arc<F>>
    where
        F: Send + Sync + 'static,
    {
        let key = TypeId::of::<F>();
        let (lifetime, factory) = {
            let registrations = self.registrations.read();
            let registration = registrations.get(&key)?;
            if let Some(instance) = &registration.instance {
                return Arc::clone(instance).downcast::<F>().ok();
            }
            (registration.lifetime, Arc::clone(&registration.factory))
        };

        let built = factory();
        let instance = match lifetime {
            ServiceLifetime::Transient => built,
            ServiceLifetime::Singleton => self.memoize_singleton(key, built)?,
        };

        instance.downcast::<F>().ok()
    }

    /// Stores `built` unless another caller memoized an instance first, and
    /// returns whichever instance won.
    fn memoize_singleton(&self, key: TypeId, built: AnyInstance) -> Option<AnyInstance> {
        let mut registrations = self.registrations.write();
        let registration = registrations.get_mut(&key)?;
        Some(Arc::clone(registration.instance.get_or_insert(built)))
    }

    /// Returns true if `F` has a registration.
    #[must_use]
    pub fn contains<F: 'static>(&self) -> bool {
        self.registrations.read().contains_key(&TypeId::of::<F>())
    }

    /// Lists the registered filter names with their lifetimes, sorted by name.
    #[must_use]
    pub fn descriptors(&self) -> Vec<(String, ServiceLifetime)> {
        let mut descriptors: Vec<_> = self
            .registrations
            .read()
            .values()
            .map(|r| (r.name.to_string(), r.lifetime))
            .collect();
        descriptors.sort();
        descriptors
    }

    /// Returns the number of registrations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.registrations.read().len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registrations.read().is_empty()
    }
}

impl std::fmt::Debug for FilterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterRegistry")
            .field("filters", &self.descriptors())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct AuditFilter {
        serial: usize,
    }

    struct NotifyFilter;

    #[test]
    fn test_resolve_missing() {
        let registry = FilterRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.resolve::<AuditFilter>().is_none());
        assert!(!registry.contains::<AuditFilter>());
    }

    #[test]
    fn test_transient_builds_each_time() {
        let built = Arc::new(AtomicUsize::new(0));
        let registry = FilterRegistry::new();
        let counter = built.clone();
        registry.add_transient(move || AuditFilter {
            serial: counter.fetch_add(1, Ordering::SeqCst),
        });

        let first = registry.resolve::<AuditFilter>().unwrap();
        let second = registry.resolve::<AuditFilter>().unwrap();

        assert_eq!(first.serial, 0);
        assert_eq!(second.serial, 1);
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_singleton_is_memoized() {
        let built = Arc::new(AtomicUsize::new(0));
        let registry = FilterRegistry::new();
        let counter = built.clone();
        registry.add_singleton(move || AuditFilter {
            serial: counter.fetch_add(1, Ordering::SeqCst),
        });

        let first = registry.resolve::<AuditFilter>().unwrap();
        let second = registry.resolve::<AuditFilter>().unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(built.load(Ordering::SeqCst), 1);
    }

    struct Clock {
        offset: usize,
    }

    struct ClockedAudit {
        clock: Arc<Clock>,
    }

    #[test]
    fn test_singleton_factory_resolves_another_singleton() {
        let registry = Arc::new(FilterRegistry::new());
        registry.add_singleton(|| Clock { offset: 5 });
        let inner = Arc::downgrade(&registry);
        registry.add_singleton(move || ClockedAudit {
            clock: inner
                .upgrade()
                .and_then(|registry| registry.resolve::<Clock>())
                .unwrap(),
        });

        let audit = registry.resolve::<ClockedAudit>().unwrap();
        let clock = registry.resolve::<Clock>().unwrap();

        assert_eq!(audit.clock.offset, 5);
        assert!(Arc::ptr_eq(&audit.clock, &clock));
        assert!(Arc::ptr_eq(&audit, &registry.resolve::<ClockedAudit>().unwrap()));
    }

    #[test]
    fn test_descriptors() {
        let registry = FilterRegistry::new();
        registry
            .add_singleton(|| NotifyFilter)
            .add_transient(|| AuditFilter { serial: 0 });

        assert_eq!(
            registry.descriptors(),
            vec![
                ("AuditFilter".to_string(), ServiceLifetime::Transient),
                ("NotifyFilter".to_string(), ServiceLifetime::Singleton),
            ]
        );
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_lifetime_serde() {
        let lifetime: ServiceLifetime = serde_json::from_str("\"singleton\"").unwrap();
        assert_eq!(lifetime, ServiceLifetime::Singleton);
        assert_eq!(ServiceLifetime::default(), ServiceLifetime::Transient);
    }
}

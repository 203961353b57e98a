//! Dependency-ordered destruction.
//!
//! Destroying a name first destroys everything that depends on it, then runs its
//! own disposable, then destroys whatever it contains. Disposable failures are
//! logged and reported as [`RegistryEvent::DestroyFailed`]; they never stop the
//! rest of the teardown.

use tracing::{debug, error};

use crate::{BoxError, RegistryEvent, SingletonRegistry};

/// Teardown handle registered for a named singleton.
///
/// Implemented for any `Fn() -> Result<(), BoxError>` closure.
///
/// # Examples
///
/// ```rust
/// use singleton_lifecycle::{BoxError, SingletonRegistry};
///
/// let registry = SingletonRegistry::new();
/// registry.register_disposable("pool", || -> Result<(), BoxError> {
///     println!("closing pool");
///     Ok(())
/// });
/// registry.destroy_singletons();
/// ```
pub trait Disposable: Send + Sync {
    fn destroy(&self) -> Result<(), BoxError>;
}

impl<F> Disposable for F
where
    F: Fn() -> Result<(), BoxError> + Send + Sync,
{
    fn destroy(&self) -> Result<(), BoxError> {
        self()
    }
}

impl SingletonRegistry {
    /// Registers the teardown handle for `name`, replacing any previous one.
    ///
    /// Without dependency information, [`destroy_singletons`](Self::destroy_singletons)
    /// destroys names in reverse registration order.
    pub fn register_disposable(&self, name: &str, disposable: impl Disposable + 'static) {
        self.disposables
            .lock()
            .insert(name.to_owned(), Box::new(disposable));
    }

    /// Names with a registered disposable, in registration order.
    pub fn disposable_names(&self) -> Vec<String> {
        self.disposables.lock().keys().cloned().collect()
    }

    /// Destroys `name` after everything that depends on it.
    ///
    /// The name is removed from all caches first. Its dependents are destroyed
    /// recursively, then its disposable runs, then every name it contains is
    /// destroyed. Finally `name` is dropped from the relationship maps.
    pub fn destroy_singleton(&self, name: &str) {
        self.purge(name);
        let disposable = self.disposables.lock().shift_remove(name);
        self.destroy_object(name, disposable);
    }

    fn destroy_object(&self, name: &str, disposable: Option<Box<dyn Disposable>>) {
        if let Some(dependents) = self.graph.take_dependents(name) {
            debug!(name, ?dependents, "destroying dependent singletons first");
            for dependent in &dependents {
                self.destroy_singleton(dependent);
            }
        }

        if let Some(disposable) = disposable {
            if let Err(err) = disposable.destroy() {
                error!(name, error = %err, "destroy callback failed");
                self.tracer.emit(&RegistryEvent::DestroyFailed {
                    name: name.to_owned(),
                    reason: err.to_string(),
                });
            }
        }

        if let Some(contained) = self.graph.take_contained(name) {
            for inner in &contained {
                self.destroy_singleton(inner);
            }
        }

        self.graph.scrub(name);
        self.tracer.emit(&RegistryEvent::SingletonDestroyed {
            name: name.to_owned(),
        });
    }

    /// Destroys every singleton with a disposable, in reverse registration order,
    /// and resets the registry.
    ///
    /// While this runs, [`get_or_create`](Self::get_or_create) fails with
    /// [`RegistryError::CreationNotAllowed`](crate::RegistryError::CreationNotAllowed).
    /// Afterwards all caches and relationship maps are empty and the registry
    /// accepts new singletons again. Aliases are kept.
    pub fn destroy_singletons(&self) {
        debug!(registry = ?self, "destroying singletons");
        self.tracer.emit(&RegistryEvent::DestroyAll {});
        self.set_in_destruction();

        let names = self.disposable_names();
        for name in names.iter().rev() {
            self.destroy_singleton(name);
        }

        self.graph.clear();
        self.clear_singleton_cache();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RegistryError, SharedObject};
    use parking_lot::Mutex;
    use std::sync::Arc;
    use tracing_test::traced_test;

    type Log = Arc<Mutex<Vec<String>>>;

    fn recording(log: &Log, name: &'static str) -> impl Disposable + 'static {
        let log = log.clone();
        move || -> Result<(), BoxError> {
            log.lock().push(name.to_owned());
            Ok(())
        }
    }

    #[test]
    fn test_reverse_registration_order() {
        let registry = SingletonRegistry::new();
        let log = Log::default();
        for name in ["a", "b", "c"] {
            registry.register_disposable(name, recording(&log, name));
        }

        registry.destroy_singletons();
        assert_eq!(*log.lock(), vec!["c", "b", "a"]);
    }

    #[test]
    fn test_dependents_destroyed_first() {
        let registry = SingletonRegistry::new();
        let log = Log::default();
        registry.register_disposable("repository", recording(&log, "repository"));
        registry.register_disposable("service", recording(&log, "service"));
        registry.register_disposable("dataSource", recording(&log, "dataSource"));
        registry.register_dependency("repository", "dataSource");
        registry.register_dependency("service", "repository");

        registry.destroy_singleton("dataSource");
        assert_eq!(*log.lock(), vec!["service", "repository", "dataSource"]);
        assert!(registry.disposable_names().is_empty());
    }

    #[test]
    fn test_contained_destroyed_after_container() {
        let registry = SingletonRegistry::new();
        let log = Log::default();
        registry.register_disposable("inner", recording(&log, "inner"));
        registry.register_disposable("outer", recording(&log, "outer"));
        registry.register_containment("outer", "inner");

        registry.destroy_singleton("outer");
        assert_eq!(*log.lock(), vec!["outer", "inner"]);
    }

    #[test]
    fn test_destroying_contained_destroys_container_first() {
        let registry = SingletonRegistry::new();
        let log = Log::default();
        registry.register_disposable("inner", recording(&log, "inner"));
        registry.register_disposable("outer", recording(&log, "outer"));
        registry.register_containment("outer", "inner");

        registry.destroy_singleton("inner");
        assert_eq!(*log.lock(), vec!["outer", "inner"]);
    }

    #[test]
    fn test_destroy_scrubs_relationships() {
        let registry = SingletonRegistry::new();
        registry.register_dependency("b", "a");
        registry.register_dependency("b", "c");

        registry.destroy_singleton("b");
        assert!(!registry.has_dependents("a"));
        assert!(!registry.has_dependents("c"));
        assert!(registry.dependencies_of("b").is_empty());
    }

    #[test]
    #[traced_test]
    fn test_failing_disposable_does_not_stop_teardown() {
        let registry = SingletonRegistry::new();
        let log = Log::default();
        registry.register_disposable("first", recording(&log, "first"));
        registry.register_disposable("broken", || -> Result<(), BoxError> {
            Err("socket already closed".into())
        });
        registry.register_disposable("last", recording(&log, "last"));

        let events = Log::default();
        let events_clone = events.clone();
        registry.set_trace_callback(move |e| events_clone.lock().push(e.to_string()));

        registry.destroy_singletons();

        assert_eq!(*log.lock(), vec!["last", "first"]);
        assert!(events
            .lock()
            .contains(&"destroy failed { name: broken, reason: socket already closed }".to_owned()));
        assert!(logs_contain("destroy callback failed"));
    }

    #[test]
    fn test_creation_rejected_during_destruction() {
        let registry = Arc::new(SingletonRegistry::new());
        let outcome: Arc<Mutex<Option<Result<SharedObject, RegistryError>>>> = Arc::default();

        let inner_registry = Arc::downgrade(&registry);
        let inner_outcome = outcome.clone();
        registry.register_disposable("late", move || -> Result<(), BoxError> {
            if let Some(registry) = inner_registry.upgrade() {
                let attempt = registry.get_or_create("new", || Ok(Arc::new(1u8) as SharedObject));
                *inner_outcome.lock() = Some(attempt);
            }
            Ok(())
        });

        registry.destroy_singletons();

        assert!(matches!(
            outcome.lock().take(),
            Some(Err(RegistryError::CreationNotAllowed { .. }))
        ));
        assert!(registry.get_or_create("new", || Ok(Arc::new(2u8) as SharedObject)).is_ok());
    }

    #[test]
    fn test_destroy_all_resets_registry() {
        let registry = SingletonRegistry::new();
        registry
            .register_singleton("a", Arc::new(1u8) as SharedObject)
            .unwrap();
        registry.register_disposable("a", || -> Result<(), BoxError> { Ok(()) });
        registry.register_containment("outer", "a");

        registry.destroy_singletons();

        assert_eq!(registry.singleton_count(), 0);
        assert!(registry.graph.is_empty());
        assert!(registry.disposable_names().is_empty());
        assert!(registry
            .register_singleton("a", Arc::new(2u8) as SharedObject)
            .is_ok());
    }
}

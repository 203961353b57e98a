//! Typed access to a singleton registry.
//!
//! This module provides the `SingletonRegistryApi` trait with default implementations
//! for registering and retrieving named singletons as `Arc<T>`.
//!
//! Lookups resolve aliases first, so an object can be fetched under any of its names.

use std::sync::Arc;

use crate::{RegisterOutcome, RegistryError, SharedObject, SingletonRegistry};

/// Typed convenience layer over a [`SingletonRegistry`].
///
/// Provides default implementations for all operations, requiring only the
/// `registry` accessor to be implemented. `SingletonRegistry` implements it for
/// itself; registries declared with [`define_registry!`](crate::define_registry)
/// expose an `API` value implementing it.
pub trait SingletonRegistryApi {
    /// Access the underlying registry.
    fn registry(&self) -> &SingletonRegistry;

    /// Register a value under `name`.
    ///
    /// Takes ownership of the value and wraps it in an `Arc` automatically.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::AlreadyRegistered`] if another object is bound to `name`
    fn register<T: Send + Sync + 'static>(
        &self,
        name: &str,
        value: T,
    ) -> Result<RegisterOutcome, RegistryError> {
        self.register_arc(name, Arc::new(value))
    }

    /// Register an Arc-wrapped value under `name`.
    ///
    /// Registering a clone of an `Arc` already bound to `name` is reported as
    /// [`RegisterOutcome::AlreadyPresent`].
    fn register_arc<T: Send + Sync + 'static>(
        &self,
        name: &str,
        value: Arc<T>,
    ) -> Result<RegisterOutcome, RegistryError> {
        self.registry().register_singleton(name, value)
    }

    /// Retrieve the value bound to `name` or to the name `name` is an alias of.
    ///
    /// # Errors
    ///
    /// - `name` is not bound
    /// - the bound value is not a `T`
    fn get<T: Send + Sync + 'static>(&self, name: &str) -> Result<Arc<T>, RegistryError> {
        let canonical = self.registry().canonical_name(name);
        let object = self
            .registry()
            .get_singleton(&canonical)?
            .ok_or_else(|| RegistryError::SingletonNotFound {
                name: canonical.clone(),
            })?;

        downcast(&canonical, object)
    }

    /// Retrieve a cloned value from the registry.
    fn get_cloned<T: Send + Sync + Clone + 'static>(&self, name: &str) -> Result<T, RegistryError> {
        let arc = self.get::<T>(name)?;
        Ok((*arc).clone())
    }

    /// Check whether a fully built object is bound to `name` or its canonical name.
    fn contains(&self, name: &str) -> bool {
        let canonical = self.registry().canonical_name(name);
        self.registry().contains_singleton(&canonical)
    }

    /// Retrieve the value bound to `name`, building it with `factory` if absent.
    ///
    /// # Errors
    ///
    /// Whatever [`SingletonRegistry::get_or_create`] returns, or a type mismatch
    /// if `name` already holds a value of another type.
    fn get_or_create_with<T, F>(&self, name: &str, factory: F) -> Result<Arc<T>, RegistryError>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> Result<T, RegistryError>,
    {
        let canonical = self.registry().canonical_name(name);
        let object = self
            .registry()
            .get_or_create(&canonical, || factory().map(|value| Arc::new(value) as SharedObject))?;

        downcast(&canonical, object)
    }
}

impl SingletonRegistryApi for SingletonRegistry {
    fn registry(&self) -> &SingletonRegistry {
        self
    }
}

fn downcast<T: Send + Sync + 'static>(name: &str, object: SharedObject) -> Result<Arc<T>, RegistryError> {
    object
        .downcast::<T>()
        .map_err(|_| RegistryError::TypeMismatch {
            name: name.to_owned(),
            expected: std::any::type_name::<T>(),
        })
}

// -------------------------------------------------------------------------------------------------
// Tests
// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::SingletonRegistryApi;
    use crate::{RegisterOutcome, RegistryError, SingletonRegistry};

    use std::sync::Arc;

    #[test]
    fn test_register_and_get_primitive() -> Result<(), RegistryError> {
        let registry = SingletonRegistry::new();
        registry.register("answer", 42i32)?;

        let num: Arc<i32> = registry.get("answer")?;
        assert_eq!(*num, 42);

        let num_2 = registry.get::<i32>("answer")?;
        assert!(Arc::ptr_eq(&num, &num_2));

        Ok(())
    }

    #[test]
    fn test_get_nonexistent() {
        let registry = SingletonRegistry::new();

        let result: Result<Arc<String>, RegistryError> = registry.get("missing");
        assert!(matches!(
            result,
            Err(RegistryError::SingletonNotFound { ref name }) if name == "missing"
        ));
    }

    #[test]
    fn test_get_type_mismatch() {
        let registry = SingletonRegistry::new();
        registry.register("text", "hello".to_string()).unwrap();

        let result = registry.get::<u64>("text");
        assert!(matches!(
            result,
            Err(RegistryError::TypeMismatch { expected: "u64", .. })
        ));
    }

    #[test]
    fn test_get_through_alias() {
        let registry = SingletonRegistry::new();
        registry.register("dataSource", "postgres://db".to_string()).unwrap();
        registry.aliases().register_alias("dataSource", "ds").unwrap();

        let url: Arc<String> = registry.get("ds").unwrap();
        assert_eq!(url.as_str(), "postgres://db");
        assert!(registry.contains("ds"));
        assert!(!registry.contains("other"));
    }

    #[test]
    fn test_get_cloned() {
        let registry = SingletonRegistry::new();
        registry.register("greeting", "hello".to_string()).unwrap();
        let value: String = registry.get_cloned("greeting").unwrap();
        assert_eq!(value, "hello");
    }

    #[test]
    fn test_register_arc_directly() {
        let registry = SingletonRegistry::new();
        let value = Arc::new(42i32);
        let clone = value.clone();

        assert_eq!(
            registry.register_arc("answer", value).unwrap(),
            RegisterOutcome::Registered
        );
        assert_eq!(
            registry.register_arc("answer", clone.clone()).unwrap(),
            RegisterOutcome::AlreadyPresent
        );

        let retrieved: Arc<i32> = registry.get("answer").unwrap();
        assert_eq!(*retrieved, 42);
        assert_eq!(Arc::strong_count(&clone), 3); // clone + registry + retrieved
    }

    #[test]
    fn test_get_or_create_with() {
        let registry = SingletonRegistry::new();

        let first = registry
            .get_or_create_with("numbers", || Ok(vec![1, 2, 3]))
            .unwrap();
        let second: Arc<Vec<i32>> = registry
            .get_or_create_with("numbers", || Ok(Vec::new()))
            .unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(*second, vec![1, 2, 3]);
    }

    #[test]
    fn test_function_pointer_registration() {
        let registry = SingletonRegistry::new();

        let multiply_by_two: fn(i32) -> i32 = |x| x * 2;
        registry.register("doubler", multiply_by_two).unwrap();

        let doubler: Arc<fn(i32) -> i32> = registry.get("doubler").unwrap();
        assert_eq!(doubler(21), 42);
    }
}

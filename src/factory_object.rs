//! Objects that produce the singleton registered under their name.

use std::sync::Arc;

use crate::{RegistryError, SharedObject, SingletonRegistry};

/// A factory that is itself a managed object.
///
/// Instead of being exposed directly, a factory object stands in for the
/// object it produces: [`SingletonRegistry::get_object_from_factory`] caches
/// the product under the factory's name.
///
/// # Examples
///
/// ```rust
/// use singleton_lifecycle::{FactoryObject, RegistryError, SingletonRegistry};
///
/// struct ConnectionString {
///     host: &'static str,
/// }
///
/// impl FactoryObject for ConnectionString {
///     type Object = String;
///
///     fn get_object(&self) -> Result<String, RegistryError> {
///         Ok(format!("postgres://{}/app", self.host))
///     }
/// }
///
/// let registry = SingletonRegistry::new();
/// let factory = ConnectionString { host: "localhost" };
///
/// let url = registry.get_object_from_factory("url", &factory).unwrap();
/// assert_eq!(url.as_str(), "postgres://localhost/app");
/// ```
pub trait FactoryObject: Send + Sync {
    type Object: Send + Sync + 'static;

    fn get_object(&self) -> Result<Self::Object, RegistryError>;

    /// Type name of the product, for diagnostics.
    fn object_type(&self) -> &'static str {
        std::any::type_name::<Self::Object>()
    }

    /// Whether the product is shared. Only shared products are supported.
    fn is_singleton(&self) -> bool {
        true
    }
}

impl SingletonRegistry {
    /// Returns the product of `factory` cached under `name`, creating it once.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::NotShared`] if the factory does not produce a shared object
    /// - [`RegistryError::TypeMismatch`] if `name` already holds an object of another type
    /// - anything [`get_or_create`](Self::get_or_create) returns
    pub fn get_object_from_factory<F>(
        &self,
        name: &str,
        factory: &F,
    ) -> Result<Arc<F::Object>, RegistryError>
    where
        F: FactoryObject + ?Sized,
    {
        if !factory.is_singleton() {
            return Err(RegistryError::NotShared {
                name: name.to_owned(),
            });
        }

        let object = self.get_or_create(name, || {
            factory
                .get_object()
                .map(|product| Arc::new(product) as SharedObject)
        })?;

        object
            .downcast::<F::Object>()
            .map_err(|_| RegistryError::TypeMismatch {
                name: name.to_owned(),
                expected: factory.object_type(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counter {
        calls: AtomicUsize,
        shared: bool,
    }

    impl Counter {
        fn new(shared: bool) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                shared,
            }
        }
    }

    impl FactoryObject for Counter {
        type Object = usize;

        fn get_object(&self) -> Result<usize, RegistryError> {
            Ok(self.calls.fetch_add(1, Ordering::SeqCst) + 100)
        }

        fn is_singleton(&self) -> bool {
            self.shared
        }
    }

    #[test]
    fn test_product_is_cached() {
        let registry = SingletonRegistry::new();
        let factory = Counter::new(true);

        let first = registry.get_object_from_factory("counter", &factory).unwrap();
        let second = registry.get_object_from_factory("counter", &factory).unwrap();

        assert_eq!(*first, 100);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(factory.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_non_shared_factory_rejected() {
        let registry = SingletonRegistry::new();
        let factory = Counter::new(false);

        let err = registry.get_object_from_factory("counter", &factory).unwrap_err();
        assert!(matches!(err, RegistryError::NotShared { ref name } if name == "counter"));
        assert_eq!(factory.calls.load(Ordering::SeqCst), 0);
        assert_eq!(factory.object_type(), "usize");
    }

    #[test]
    fn test_type_mismatch() {
        let registry = SingletonRegistry::new();
        registry
            .register_singleton("counter", Arc::new("not a number") as SharedObject)
            .unwrap();

        let err = registry
            .get_object_from_factory("counter", &Counter::new(true))
            .unwrap_err();
        assert!(matches!(err, RegistryError::TypeMismatch { expected: "usize", .. }));
    }
}

//! Macros for declaring process-wide singleton registries.

/// Declares a module holding a process-wide [`SingletonRegistry`](crate::SingletonRegistry).
///
/// The macro generates a module containing:
/// - A lazily initialized registry static (hidden)
/// - An `Api` struct that implements [`SingletonRegistryApi`](crate::SingletonRegistryApi)
/// - Free functions delegating to it
///
/// # Examples
///
/// ```rust
/// use singleton_lifecycle::define_registry;
/// use std::sync::Arc;
///
/// define_registry!(global);
///
/// global::register("answer", 42i32).unwrap();
/// global::register_alias("answer", "the_answer").unwrap();
///
/// let num: Arc<i32> = global::get("the_answer").unwrap();
/// assert_eq!(*num, 42);
/// ```
///
/// # Multiple Registries
///
/// Every invocation creates an isolated registry:
///
/// ```rust
/// use singleton_lifecycle::define_registry;
///
/// define_registry!(database);
/// define_registry!(cache);
///
/// database::register("connection", "postgres://db".to_string()).unwrap();
/// cache::register("connection", "redis://cache".to_string()).unwrap();
///
/// assert_eq!(database::get_cloned::<String>("connection").unwrap(), "postgres://db");
/// assert_eq!(cache::get_cloned::<String>("connection").unwrap(), "redis://cache");
/// ```
///
/// # Trait-Based Usage
///
/// ```rust
/// use singleton_lifecycle::{define_registry, SingletonRegistryApi};
/// use std::sync::Arc;
///
/// define_registry!(app);
///
/// app::API.register("limit", 100i32).unwrap();
/// let value: Arc<i32> = app::API.get("limit").unwrap();
/// assert_eq!(*value, 100);
/// ```
#[macro_export]
macro_rules! define_registry {
    ($name:ident) => {
        pub mod $name {
            use std::sync::{Arc, LazyLock};

            static REGISTRY: LazyLock<$crate::SingletonRegistry> =
                LazyLock::new($crate::SingletonRegistry::new);

            /// Zero-sized handle implementing the typed registry API.
            pub struct Api;

            impl $crate::SingletonRegistryApi for Api {
                fn registry(&self) -> &$crate::SingletonRegistry {
                    &REGISTRY
                }
            }

            /// Convenient constant for accessing the registry API.
            pub const API: Api = Api;

            /// The registry behind this module.
            pub fn registry() -> &'static $crate::SingletonRegistry {
                &REGISTRY
            }

            /// Register a value under `name`.
            pub fn register<T: Send + Sync + 'static>(
                name: &str,
                value: T,
            ) -> Result<$crate::RegisterOutcome, $crate::RegistryError> {
                use $crate::SingletonRegistryApi;
                API.register(name, value)
            }

            /// Register an Arc-wrapped value under `name`.
            pub fn register_arc<T: Send + Sync + 'static>(
                name: &str,
                value: Arc<T>,
            ) -> Result<$crate::RegisterOutcome, $crate::RegistryError> {
                use $crate::SingletonRegistryApi;
                API.register_arc(name, value)
            }

            /// Retrieve the value bound to `name`.
            pub fn get<T: Send + Sync + 'static>(name: &str) -> Result<Arc<T>, $crate::RegistryError> {
                use $crate::SingletonRegistryApi;
                API.get(name)
            }

            /// Retrieve a cloned value from the registry.
            pub fn get_cloned<T: Send + Sync + Clone + 'static>(
                name: &str,
            ) -> Result<T, $crate::RegistryError> {
                use $crate::SingletonRegistryApi;
                API.get_cloned(name)
            }

            /// Check if an object is bound to `name`.
            pub fn contains(name: &str) -> bool {
                use $crate::SingletonRegistryApi;
                API.contains(name)
            }

            /// Retrieve the value bound to `name`, building it if absent.
            pub fn get_or_create<T, F>(name: &str, factory: F) -> Result<Arc<T>, $crate::RegistryError>
            where
                T: Send + Sync + 'static,
                F: FnOnce() -> Result<T, $crate::RegistryError>,
            {
                use $crate::SingletonRegistryApi;
                API.get_or_create_with(name, factory)
            }

            /// Register `alias` for `name`.
            pub fn register_alias(name: &str, alias: &str) -> Result<(), $crate::RegistryError> {
                REGISTRY.aliases().register_alias(name, alias)
            }

            /// Record that `dependent` must be destroyed before `dependency`.
            pub fn register_dependency(dependent: &str, dependency: &str) {
                REGISTRY.register_dependency(dependent, dependency)
            }

            /// Register the teardown handle for `name`.
            pub fn register_disposable(name: &str, disposable: impl $crate::Disposable + 'static) {
                REGISTRY.register_disposable(name, disposable)
            }

            /// Destroy every singleton in dependency order and reset the registry.
            pub fn destroy_singletons() {
                REGISTRY.destroy_singletons()
            }

            /// Set a tracing callback for registry operations.
            pub fn set_trace_callback(
                callback: impl Fn(&$crate::RegistryEvent) + Send + Sync + 'static,
            ) {
                REGISTRY.set_trace_callback(callback)
            }

            /// Clear the tracing callback.
            pub fn clear_trace_callback() {
                REGISTRY.clear_trace_callback()
            }
        }
    };
}

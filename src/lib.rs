//! # Singleton Lifecycle
//!
//! A thread-safe registry of named shared instances: the singleton core of a
//! dependency-injection container.
//!
//! The registry creates each named object at most once, resolves alias chains to
//! canonical names, lets mutually dependent objects reach each other through
//! early references while they are being built, and destroys everything in an
//! order that respects the recorded dependency and containment relationships.
//!
//! ## Quick Start
//!
//! ```rust
//! use singleton_lifecycle::{BoxError, SingletonRegistry, SingletonRegistryApi};
//! use std::sync::Arc;
//!
//! let registry = SingletonRegistry::new();
//!
//! let url: Arc<String> = registry
//!     .get_or_create_with("dataSource", || Ok("postgres://localhost/app".to_string()))
//!     .unwrap();
//! registry.aliases().register_alias("dataSource", "ds").unwrap();
//!
//! registry.register_dependency("repository", "ds");
//! registry.register_disposable("dataSource", || -> Result<(), BoxError> { Ok(()) });
//!
//! let same: Arc<String> = registry.get("ds").unwrap();
//! assert!(Arc::ptr_eq(&url, &same));
//!
//! registry.destroy_singletons();
//! assert_eq!(registry.singleton_count(), 0);
//! ```
//!
//! ## Features
//!
//! - **At-most-once creation**: concurrent requests for the same name run its factory once
//! - **Circular references**: early references through [`SingletonRegistry::register_factory`]
//! - **Aliases**: cycle-checked alias chains with bulk [`AliasRegistry::resolve_aliases`]
//! - **Ordered teardown**: dependents before dependencies, containers before contents
//! - **Tracing support**: an optional callback receives a [`RegistryEvent`] per operation,
//!   and everything is logged through `tracing`
//!
//! ## Main Types
//!
//! - [`SingletonRegistry`] - the registry itself
//! - [`AliasRegistry`] - alias bookkeeping, reachable through [`SingletonRegistry::aliases`]
//! - [`SingletonRegistryApi`] - typed `Arc<T>` access
//! - [`define_registry!`] - declare a process-wide registry module
//! - [`Disposable`] and [`FactoryObject`] - collaborator traits

mod alias_registry;
mod config;
mod dependency_graph;
mod factory_object;
mod macros;
mod registry_error;
mod registry_event;
mod registry_trait;
mod singleton_registry;
mod teardown;
mod trace;

pub use alias_registry::AliasRegistry;
pub use config::RegistryConfig;
pub use factory_object::FactoryObject;
pub use registry_error::{BoxError, RegistryError};
pub use registry_event::RegistryEvent;
pub use registry_trait::SingletonRegistryApi;
pub use singleton_registry::{
    EarlyFactory, RegisterOutcome, SharedObject, SingletonMutexGuard, SingletonRegistry,
};
pub use teardown::Disposable;
pub use trace::TraceCallback;

//! Named singleton cache with circular-reference support.
//!
//! Objects are created at most once per name. While an object is being built,
//! a factory registered with [`SingletonRegistry::register_factory`] can hand
//! out an early reference to it, which lets two objects that need each other
//! finish wiring without recursing forever.
//!
//! All lifecycle state sits behind one reentrant mutex. `get_or_create` holds it
//! across the factory call; the factory may request other singletons (or early
//! references) on the same thread, while other threads asking for anything wait
//! until the outermost creation finishes.

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashSet;
use indexmap::{IndexMap, IndexSet};
use parking_lot::{Mutex, ReentrantMutex, ReentrantMutexGuard};
use tracing::{debug, error, trace};

use crate::dependency_graph::DependencyGraph;
use crate::teardown::Disposable;
use crate::trace::Tracer;
use crate::{AliasRegistry, RegistryConfig, RegistryError, RegistryEvent};

/// Type-erased shared instance stored in the registry.
pub type SharedObject = Arc<dyn Any + Send + Sync>;

/// Deferred producer of an early reference, see [`SingletonRegistry::register_factory`].
pub type EarlyFactory = Box<dyn Fn() -> Result<SharedObject, RegistryError> + Send>;

/// Result of [`SingletonRegistry::register_singleton`] when no conflict occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterOutcome {
    /// The object is now bound under the name.
    Registered,
    /// The very same object was already bound under the name.
    AlreadyPresent,
}

#[derive(Default)]
pub(crate) struct SingletonState {
    singleton_objects: HashMap<String, SharedObject>,
    singleton_factories: HashMap<String, EarlyFactory>,
    early_singleton_objects: HashMap<String, SharedObject>,
    registered_singletons: IndexSet<String>,
    /// Present only while the outermost `get_or_create` runs.
    suppressed_errors: Option<Vec<RegistryError>>,
    in_destruction: bool,
}

impl SingletonState {
    fn add_singleton(&mut self, name: &str, object: SharedObject) {
        self.singleton_objects.insert(name.to_owned(), object);
        self.singleton_factories.remove(name);
        self.early_singleton_objects.remove(name);
        self.registered_singletons.insert(name.to_owned());
    }

    fn purge(&mut self, name: &str) -> bool {
        let cached = self.singleton_objects.remove(name).is_some();
        self.singleton_factories.remove(name);
        self.early_singleton_objects.remove(name);
        let registered = self.registered_singletons.shift_remove(name);
        cached || registered
    }
}

/// Holds the registry's singleton mutex.
///
/// Returned by [`SingletonRegistry::singleton_mutex`]. The mutex is reentrant, so
/// the holder can keep calling into the registry from the same thread; every
/// other thread is kept out of creation, registration and cache updates until
/// the guard is dropped.
#[must_use = "the mutex is released as soon as the guard is dropped"]
pub struct SingletonMutexGuard<'a> {
    _guard: ReentrantMutexGuard<'a, RefCell<SingletonState>>,
}

/// Thread-safe registry of named shared instances.
///
/// # Examples
///
/// ```rust
/// use singleton_lifecycle::{SharedObject, SingletonRegistry};
/// use std::sync::Arc;
///
/// let registry = SingletonRegistry::new();
///
/// let first = registry
///     .get_or_create("greeting", || Ok(Arc::new("hello".to_string()) as SharedObject))
///     .unwrap();
/// let second = registry
///     .get_or_create("greeting", || unreachable!("created only once"))
///     .unwrap();
///
/// assert!(Arc::ptr_eq(&first, &second));
/// assert_eq!(first.downcast_ref::<String>().unwrap(), "hello");
/// ```
pub struct SingletonRegistry {
    state: ReentrantMutex<RefCell<SingletonState>>,
    in_creation: DashSet<String>,
    in_creation_exclusions: DashSet<String>,
    pub(crate) disposables: Mutex<IndexMap<String, Box<dyn Disposable>>>,
    pub(crate) graph: DependencyGraph,
    aliases: AliasRegistry,
    pub(crate) tracer: Arc<Tracer>,
}

impl Default for SingletonRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SingletonRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SingletonRegistry")
            .field("singletons", &self.singleton_names())
            .field("in_creation", &self.in_creation.len())
            .field("aliases", &self.aliases.alias_count())
            .finish()
    }
}

impl SingletonRegistry {
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    pub fn with_config(config: RegistryConfig) -> Self {
        let tracer = Arc::new(Tracer::default());
        Self {
            state: ReentrantMutex::new(RefCell::new(SingletonState::default())),
            in_creation: DashSet::new(),
            in_creation_exclusions: DashSet::new(),
            disposables: Mutex::new(IndexMap::new()),
            graph: DependencyGraph::default(),
            aliases: AliasRegistry::with_tracer(config.allow_alias_overriding, tracer.clone()),
            tracer,
        }
    }

    /// The alias registry used to canonicalize dependency names.
    pub fn aliases(&self) -> &AliasRegistry {
        &self.aliases
    }

    /// Follows aliases from `name` to the name they stand for.
    pub fn canonical_name(&self, name: &str) -> String {
        self.aliases.canonical_name(name)
    }

    // ---------------------------------------------------------------------------------------------
    // Tracing
    // ---------------------------------------------------------------------------------------------

    /// Set a tracing callback for registry operations, alias operations included.
    ///
    /// The callback is never invoked while registry state is borrowed, but it
    /// must not mutate this registry: events are emitted from the middle of
    /// creation and destruction sequences.
    pub fn set_trace_callback(&self, callback: impl Fn(&RegistryEvent) + Send + Sync + 'static) {
        self.tracer.set(callback);
    }

    /// Clear the tracing callback.
    pub fn clear_trace_callback(&self) {
        self.tracer.clear();
    }

    // ---------------------------------------------------------------------------------------------
    // Lookup and creation
    // ---------------------------------------------------------------------------------------------

    fn with_state<R>(&self, f: impl FnOnce(&mut SingletonState) -> R) -> R {
        let guard = self.state.lock();
        let mut state = guard.borrow_mut();
        f(&mut state)
    }

    /// Returns the object bound under `name`, allowing early references.
    pub fn get_singleton(&self, name: &str) -> Result<Option<SharedObject>, RegistryError> {
        self.get_if_present(name, true)
    }

    /// Returns the object bound under `name`, if there is one.
    ///
    /// While `name` is being created, an early reference is returned if one was
    /// already exposed. Otherwise, with `allow_early_reference`, the factory
    /// installed through [`register_factory`](Self::register_factory) is invoked
    /// once and its result kept as the early reference.
    ///
    /// # Errors
    ///
    /// Whatever the early factory returns. A failing factory stays installed, so a
    /// later lookup during the same creation can try again.
    pub fn get_if_present(
        &self,
        name: &str,
        allow_early_reference: bool,
    ) -> Result<Option<SharedObject>, RegistryError> {
        let guard = self.state.lock();
        {
            let state = guard.borrow();
            if let Some(object) = state.singleton_objects.get(name) {
                return Ok(Some(object.clone()));
            }
            if !self.is_singleton_currently_in_creation(name) {
                return Ok(None);
            }
            if let Some(early) = state.early_singleton_objects.get(name) {
                return Ok(Some(early.clone()));
            }
        }
        if !allow_early_reference {
            return Ok(None);
        }

        let factory = guard.borrow_mut().singleton_factories.remove(name);
        let Some(factory) = factory else {
            return Ok(None);
        };

        let early = match factory() {
            Ok(early) => early,
            Err(err) => {
                guard
                    .borrow_mut()
                    .singleton_factories
                    .entry(name.to_owned())
                    .or_insert(factory);
                return Err(err);
            }
        };
        guard
            .borrow_mut()
            .early_singleton_objects
            .insert(name.to_owned(), early.clone());
        drop(guard);

        trace!(name, "exposing early reference to singleton");
        self.tracer.emit(&RegistryEvent::EarlyReference {
            name: name.to_owned(),
        });
        Ok(Some(early))
    }

    /// Returns the object bound under `name`, creating it with `factory` if absent.
    ///
    /// The factory runs at most once per name: concurrent callers block until the
    /// first caller finishes and then receive the cached object.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::CreationNotAllowed`] while [`destroy_singletons`](Self::destroy_singletons) runs
    /// - [`RegistryError::CurrentlyInCreation`] if `name` is already being created
    /// - [`RegistryError::IllegalState`] raised by the factory when no object appeared meanwhile
    /// - [`RegistryError::CreationFailed`] wrapping any other factory error, with
    ///   suppressed errors attached
    /// - [`RegistryError::NotInCreation`] if the in-creation bookkeeping is out of balance
    pub fn get_or_create<F>(&self, name: &str, factory: F) -> Result<SharedObject, RegistryError>
    where
        F: FnOnce() -> Result<SharedObject, RegistryError>,
    {
        let _guard = self.state.lock();
        if let Some(existing) = self.with_state(|state| state.singleton_objects.get(name).cloned()) {
            return Ok(existing);
        }
        if self.with_state(|state| state.in_destruction) {
            return Err(RegistryError::CreationNotAllowed {
                name: name.to_owned(),
            });
        }

        debug!(name, "creating shared instance of singleton");
        self.before_singleton_creation(name)?;

        let record_suppressed = self.with_state(|state| {
            if state.suppressed_errors.is_some() {
                return false;
            }
            state.suppressed_errors = Some(Vec::new());
            true
        });

        let outcome = factory();

        let suppressed = if record_suppressed {
            self.with_state(|state| state.suppressed_errors.take())
                .unwrap_or_default()
        } else {
            Vec::new()
        };
        let unmarked = self.after_singleton_creation(name);

        let object = match outcome {
            Ok(object) => {
                unmarked?;
                object
            }
            Err(RegistryError::IllegalState(message)) => {
                unmarked?;
                let existing = self.with_state(|state| state.singleton_objects.get(name).cloned());
                return match existing {
                    Some(existing) => {
                        debug!(name, %message, "singleton appeared while its factory failed, using it");
                        Ok(existing)
                    }
                    None => Err(RegistryError::IllegalState(message)),
                };
            }
            Err(err) => {
                unmarked?;
                return Err(RegistryError::creation_failed(name, err, suppressed));
            }
        };

        self.with_state(|state| state.add_singleton(name, object.clone()));
        self.tracer.emit(&RegistryEvent::SingletonCreated {
            name: name.to_owned(),
        });
        Ok(object)
    }

    /// Records an error that did not abort the current creation.
    ///
    /// The error is attached to the [`RegistryError::CreationFailed`] of the
    /// outermost `get_or_create` if that creation fails, and dropped otherwise.
    /// Outside of any creation this does nothing.
    pub fn on_suppressed_error(&self, err: RegistryError) {
        self.with_state(|state| {
            if let Some(suppressed) = state.suppressed_errors.as_mut() {
                suppressed.push(err);
            }
        });
    }

    // ---------------------------------------------------------------------------------------------
    // Registration
    // ---------------------------------------------------------------------------------------------

    /// Binds an already built object to `name`.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::EmptyName`] if `name` is empty
    /// - [`RegistryError::AlreadyRegistered`] if a different object is bound to `name`
    pub fn register_singleton(
        &self,
        name: &str,
        object: SharedObject,
    ) -> Result<RegisterOutcome, RegistryError> {
        if name.is_empty() {
            return Err(RegistryError::EmptyName { what: "name" });
        }

        let outcome = self.with_state(|state| match state.singleton_objects.get(name) {
            Some(existing) if Arc::ptr_eq(existing, &object) => Ok(RegisterOutcome::AlreadyPresent),
            Some(_) => Err(RegistryError::AlreadyRegistered {
                name: name.to_owned(),
            }),
            None => {
                state.add_singleton(name, object);
                Ok(RegisterOutcome::Registered)
            }
        })?;

        if outcome == RegisterOutcome::Registered {
            debug!(name, "registered singleton");
            self.tracer.emit(&RegistryEvent::SingletonRegistered {
                name: name.to_owned(),
            });
        }
        Ok(outcome)
    }

    /// Installs a factory for an early reference to `name`.
    ///
    /// Does nothing if an object is already bound to `name`. Typically called
    /// right before the object's own construction starts, so that anything it
    /// creates on the way can reach it through [`get_if_present`](Self::get_if_present).
    pub fn register_factory<F>(&self, name: &str, factory: F)
    where
        F: Fn() -> Result<SharedObject, RegistryError> + Send + 'static,
    {
        self.with_state(|state| {
            if state.singleton_objects.contains_key(name) {
                return;
            }
            state
                .singleton_factories
                .insert(name.to_owned(), Box::new(factory));
            state.early_singleton_objects.remove(name);
            state.registered_singletons.insert(name.to_owned());
        });
    }

    /// Purges `name` from the singleton, factory and early-reference caches.
    ///
    /// Used to roll back after a failed creation.
    pub fn remove_singleton(&self, name: &str) {
        if self.purge(name) {
            self.tracer.emit(&RegistryEvent::SingletonRemoved {
                name: name.to_owned(),
            });
        }
    }

    pub(crate) fn purge(&self, name: &str) -> bool {
        self.with_state(|state| state.purge(name))
    }

    pub fn contains_singleton(&self, name: &str) -> bool {
        self.with_state(|state| state.singleton_objects.contains_key(name))
    }

    /// Names with a cached object or an installed early factory, in registration order.
    pub fn singleton_names(&self) -> Vec<String> {
        self.with_state(|state| state.registered_singletons.iter().cloned().collect())
    }

    pub fn singleton_count(&self) -> usize {
        self.with_state(|state| state.registered_singletons.len())
    }

    /// Drops every cached object and leaves the destruction phase.
    pub fn clear_singleton_cache(&self) {
        self.with_state(|state| {
            state.singleton_objects.clear();
            state.singleton_factories.clear();
            state.early_singleton_objects.clear();
            state.registered_singletons.clear();
            state.in_destruction = false;
        });
    }

    pub(crate) fn set_in_destruction(&self) {
        self.with_state(|state| state.in_destruction = true);
    }

    /// Acquires the mutex every lifecycle operation synchronizes on.
    ///
    /// Collaborators that extend a creation phase must hold this guard rather
    /// than a lock of their own, so they can never acquire locks in the opposite
    /// order to the registry.
    pub fn singleton_mutex(&self) -> SingletonMutexGuard<'_> {
        SingletonMutexGuard {
            _guard: self.state.lock(),
        }
    }

    // ---------------------------------------------------------------------------------------------
    // Creation tracking
    // ---------------------------------------------------------------------------------------------

    /// Excludes `name` from (or re-includes it in) in-creation tracking.
    pub fn set_currently_in_creation(&self, name: &str, in_creation: bool) {
        if in_creation {
            self.in_creation_exclusions.remove(name);
        } else {
            self.in_creation_exclusions.insert(name.to_owned());
        }
    }

    /// Whether `name` is being created and not excluded from tracking.
    pub fn is_currently_in_creation(&self, name: &str) -> bool {
        !self.in_creation_exclusions.contains(name) && self.is_singleton_currently_in_creation(name)
    }

    /// Whether `name` is in the in-creation set.
    pub fn is_singleton_currently_in_creation(&self, name: &str) -> bool {
        self.in_creation.contains(name)
    }

    fn before_singleton_creation(&self, name: &str) -> Result<(), RegistryError> {
        if !self.in_creation_exclusions.contains(name) && !self.in_creation.insert(name.to_owned()) {
            return Err(RegistryError::CurrentlyInCreation {
                name: name.to_owned(),
            });
        }
        Ok(())
    }

    fn after_singleton_creation(&self, name: &str) -> Result<(), RegistryError> {
        if !self.in_creation_exclusions.contains(name) && self.in_creation.remove(name).is_none() {
            error!(name, "singleton finished creation without being marked as in creation");
            return Err(RegistryError::NotInCreation {
                name: name.to_owned(),
            });
        }
        Ok(())
    }

    // ---------------------------------------------------------------------------------------------
    // Relationships
    // ---------------------------------------------------------------------------------------------

    /// Records that `outer` contains `inner`.
    ///
    /// This also makes `outer` a dependent of `inner`: destroying `inner` destroys
    /// `outer` first, and destroying `outer` destroys `inner` right after
    /// `outer`'s own disposable.
    pub fn register_containment(&self, outer: &str, inner: &str) {
        if self.graph.add_containment(outer, inner) {
            self.register_dependency(outer, inner);
        }
    }

    /// Records that `dependent` depends on `dependency`.
    ///
    /// `dependency` is canonicalized through the alias registry first.
    pub fn register_dependency(&self, dependent: &str, dependency: &str) {
        let canonical = self.aliases.canonical_name(dependency);
        debug!(dependent, dependency = %canonical, "registered dependency");
        self.graph.add_dependency(dependent, &canonical);
    }

    /// Whether `dependent` depends on `name`, directly or transitively.
    pub fn is_dependent(&self, name: &str, dependent: &str) -> bool {
        self.graph
            .is_dependent(name, dependent, |current| self.aliases.canonical_name(current))
    }

    pub fn has_dependents(&self, name: &str) -> bool {
        self.graph.has_dependents(name)
    }

    /// Names that depend on `name`, in registration order.
    pub fn dependents_of(&self, name: &str) -> Vec<String> {
        self.graph.dependents_of(name)
    }

    /// Names `name` depends on, in registration order.
    pub fn dependencies_of(&self, name: &str) -> Vec<String> {
        self.graph.dependencies_of(name)
    }

    /// Names contained in `name`, in registration order.
    pub fn contained_in(&self, name: &str) -> Vec<String> {
        self.graph.contained_in(name)
    }
}

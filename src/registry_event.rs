/// Events emitted by a registry during operations.
///
/// These events are passed to the tracing callback set via
/// [`SingletonRegistry::set_trace_callback`](crate::SingletonRegistry::set_trace_callback).
/// The `Clone` derive allows callbacks to store or forward events if needed.
///
/// # Examples
///
/// ```rust
/// use singleton_lifecycle::RegistryEvent;
///
/// let event = RegistryEvent::SingletonCreated { name: "dataSource".into() };
/// assert_eq!(event.to_string(), "created { name: dataSource }");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryEvent {
    /// An alias was bound to a name.
    AliasRegistered { alias: String, name: String },

    /// An existing alias was re-targeted.
    AliasOverridden {
        alias: String,
        previous: String,
        name: String,
    },

    /// An alias was removed, explicitly or by a self-alias registration.
    AliasRemoved { alias: String },

    /// A fully built object was handed to the registry directly.
    SingletonRegistered { name: String },

    /// A factory produced a new singleton.
    SingletonCreated { name: String },

    /// A not yet fully initialized object was exposed to break a cycle.
    EarlyReference { name: String },

    /// A name was purged from the singleton caches.
    SingletonRemoved { name: String },

    /// A name went through destruction.
    SingletonDestroyed { name: String },

    /// A disposable failed while being destroyed.
    DestroyFailed { name: String, reason: String },

    /// Registry-wide shutdown started.
    DestroyAll {},
}

impl std::fmt::Display for RegistryEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistryEvent::AliasRegistered { alias, name } => {
                write!(f, "alias {{ alias: {}, name: {} }}", alias, name)
            }
            RegistryEvent::AliasOverridden {
                alias,
                previous,
                name,
            } => write!(
                f,
                "alias overridden {{ alias: {}, previous: {}, name: {} }}",
                alias, previous, name
            ),
            RegistryEvent::AliasRemoved { alias } => {
                write!(f, "alias removed {{ alias: {} }}", alias)
            }
            RegistryEvent::SingletonRegistered { name } => {
                write!(f, "register {{ name: {} }}", name)
            }
            RegistryEvent::SingletonCreated { name } => write!(f, "created {{ name: {} }}", name),
            RegistryEvent::EarlyReference { name } => {
                write!(f, "early reference {{ name: {} }}", name)
            }
            RegistryEvent::SingletonRemoved { name } => write!(f, "removed {{ name: {} }}", name),
            RegistryEvent::SingletonDestroyed { name } => {
                write!(f, "destroyed {{ name: {} }}", name)
            }
            RegistryEvent::DestroyFailed { name, reason } => {
                write!(f, "destroy failed {{ name: {}, reason: {} }}", name, reason)
            }
            RegistryEvent::DestroyAll {} => write!(f, "Destroying the Registry"),
        }
    }
}

use std::error::Error as StdError;

/// Boxed error produced by caller-supplied factories and disposables.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Errors returned by the alias and singleton registries.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// An identifier argument was empty.
    #[error("'{what}' must not be empty")]
    EmptyName { what: &'static str },

    /// `register_singleton` found a different object bound under the name.
    #[error("could not register object under name '{name}': there is already an object bound")]
    AlreadyRegistered { name: String },

    /// The alias is already bound to another name and overriding is disabled.
    #[error(
        "cannot define alias '{alias}' for name '{name}': it is already registered for name '{registered}'"
    )]
    AliasConflict {
        alias: String,
        name: String,
        registered: String,
    },

    /// Binding the alias would close a loop in the alias graph.
    #[error(
        "cannot register alias '{alias}' for name '{name}': circular reference - '{name}' is a direct or indirect alias for '{alias}' already"
    )]
    CircularAlias { alias: String, name: String },

    #[error("no alias '{alias}' registered")]
    AliasNotFound { alias: String },

    /// The name is already being created; a constructor-time cycle.
    #[error("error creating singleton '{name}': requested singleton is currently in creation (unresolvable circular reference?)")]
    CurrentlyInCreation { name: String },

    #[error("singleton creation of '{name}' not allowed while singletons of this registry are in destruction")]
    CreationNotAllowed { name: String },

    /// The factory for `name` failed.
    ///
    /// `related` carries errors reported through
    /// [`SingletonRegistry::on_suppressed_error`](crate::SingletonRegistry::on_suppressed_error)
    /// during the same creation attempt.
    #[error("error creating singleton '{name}': {source}")]
    CreationFailed {
        name: String,
        #[source]
        source: Box<RegistryError>,
        related: Vec<RegistryError>,
    },

    /// In-creation bookkeeping was found out of balance when creation finished.
    #[error("singleton '{name}' isn't currently in creation")]
    NotInCreation { name: String },

    /// Recoverable state error raised by a factory.
    ///
    /// When the object shows up in the cache while its factory is failing with
    /// this error, the cached object wins.
    #[error("illegal state: {0}")]
    IllegalState(String),

    /// Failure from caller code (factory or factory object).
    #[error(transparent)]
    Factory(BoxError),

    #[error("singleton not found in registry: '{name}'")]
    SingletonNotFound { name: String },

    #[error("type mismatch in registry for '{name}': expected {expected}")]
    TypeMismatch {
        name: String,
        expected: &'static str,
    },

    /// A factory object declared that it does not produce a shared instance.
    #[error("factory object '{name}' does not produce a shared instance")]
    NotShared { name: String },
}

impl RegistryError {
    /// Wraps any caller error as [`RegistryError::Factory`].
    pub fn factory<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        RegistryError::Factory(err.into())
    }

    /// Errors attached to a [`RegistryError::CreationFailed`], empty otherwise.
    pub fn related(&self) -> &[RegistryError] {
        match self {
            RegistryError::CreationFailed { related, .. } => related,
            _ => &[],
        }
    }

    /// Walks nested creation failures down to the error that started them.
    pub fn root_cause(&self) -> &RegistryError {
        let mut current = self;
        while let RegistryError::CreationFailed { source, .. } = current {
            current = source.as_ref();
        }
        current
    }

    pub(crate) fn creation_failed(name: &str, err: RegistryError, related: Vec<RegistryError>) -> Self {
        RegistryError::CreationFailed {
            name: name.to_owned(),
            source: Box::new(err),
            related,
        }
    }
}

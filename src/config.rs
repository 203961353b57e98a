/// Construction-time settings for a [`SingletonRegistry`](crate::SingletonRegistry).
///
/// # Examples
///
/// ```rust
/// use singleton_lifecycle::{RegistryConfig, SingletonRegistry};
///
/// let registry = SingletonRegistry::with_config(
///     RegistryConfig::default().with_alias_overriding(false),
/// );
/// assert!(!registry.aliases().allows_overriding());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Whether re-registering an alias for a different name replaces the old target.
    pub allow_alias_overriding: bool,
}

impl RegistryConfig {
    pub fn with_alias_overriding(mut self, allow: bool) -> Self {
        self.allow_alias_overriding = allow;
        self
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            allow_alias_overriding: true,
        }
    }
}

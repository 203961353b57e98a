//! Alias to canonical name resolution.
//!
//! An alias maps to exactly one name; a name may carry any number of aliases,
//! and aliases may themselves be aliased. The map is kept free of cycles at
//! write time, so following it from any key always terminates.

use std::collections::HashSet;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use tracing::{debug, info};

use crate::trace::Tracer;
use crate::{RegistryError, RegistryEvent};

/// Thread-safe alias registry.
///
/// Every mutation holds the write lock for its whole check-and-write, so alias
/// registration, removal and [`resolve_aliases`](Self::resolve_aliases) are serialized.
///
/// # Examples
///
/// ```rust
/// use singleton_lifecycle::AliasRegistry;
///
/// let aliases = AliasRegistry::new();
/// aliases.register_alias("dataSource", "ds").unwrap();
/// aliases.register_alias("ds", "db").unwrap();
///
/// assert_eq!(aliases.canonical_name("db"), "dataSource");
/// assert!(aliases.is_alias("ds"));
/// ```
#[derive(Debug)]
pub struct AliasRegistry {
    alias_map: RwLock<IndexMap<String, String>>,
    allow_overriding: bool,
    tracer: Arc<Tracer>,
}

impl Default for AliasRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl AliasRegistry {
    /// Creates an empty registry that allows alias overriding.
    pub fn new() -> Self {
        Self::with_overriding(true)
    }

    /// Creates an empty registry with the given override policy.
    pub fn with_overriding(allow_overriding: bool) -> Self {
        Self::with_tracer(allow_overriding, Arc::new(Tracer::default()))
    }

    pub(crate) fn with_tracer(allow_overriding: bool, tracer: Arc<Tracer>) -> Self {
        Self {
            alias_map: RwLock::new(IndexMap::new()),
            allow_overriding,
            tracer,
        }
    }

    /// Whether an alias may be re-targeted to a different name.
    pub fn allows_overriding(&self) -> bool {
        self.allow_overriding
    }

    /// Set a tracing callback for alias operations.
    ///
    /// When the registry belongs to a [`SingletonRegistry`](crate::SingletonRegistry),
    /// this is the same callback the singleton registry reports to.
    pub fn set_trace_callback(&self, callback: impl Fn(&RegistryEvent) + Send + Sync + 'static) {
        self.tracer.set(callback);
    }

    /// Clear the tracing callback.
    pub fn clear_trace_callback(&self) {
        self.tracer.clear();
    }

    /// Registers `alias` for `name`.
    ///
    /// Registering a name as its own alias removes any existing mapping for it.
    /// Re-registering the same pair is a no-op.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::EmptyName`] if either argument is empty
    /// - [`RegistryError::AliasConflict`] if `alias` points elsewhere and overriding is disabled
    /// - [`RegistryError::CircularAlias`] if `name` already resolves back to `alias`
    pub fn register_alias(&self, name: &str, alias: &str) -> Result<(), RegistryError> {
        require_text(name, "name")?;
        require_text(alias, "alias")?;

        let event = {
            let mut map = self.alias_map.write();
            if alias == name {
                debug!(alias, "alias definition ignored since it points to same name");
                map.shift_remove(alias).map(|_| RegistryEvent::AliasRemoved {
                    alias: alias.to_owned(),
                })
            } else {
                let previous = match map.get(alias) {
                    Some(registered) if registered == name => return Ok(()),
                    Some(registered) => {
                        if !self.allow_overriding {
                            return Err(RegistryError::AliasConflict {
                                alias: alias.to_owned(),
                                name: name.to_owned(),
                                registered: registered.clone(),
                            });
                        }
                        Some(registered.clone())
                    }
                    None => None,
                };

                check_for_alias_circle(&map, name, alias)?;
                map.insert(alias.to_owned(), name.to_owned());

                match previous {
                    Some(previous) => {
                        info!(alias, %previous, name, "overriding alias definition");
                        Some(RegistryEvent::AliasOverridden {
                            alias: alias.to_owned(),
                            previous,
                            name: name.to_owned(),
                        })
                    }
                    None => {
                        debug!(alias, name, "alias definition registered");
                        Some(RegistryEvent::AliasRegistered {
                            alias: alias.to_owned(),
                            name: name.to_owned(),
                        })
                    }
                }
            }
        };

        if let Some(event) = event {
            self.tracer.emit(&event);
        }
        Ok(())
    }

    /// Whether `alias` is reachable from `name` through one or more alias hops.
    pub fn has_alias(&self, name: &str, alias: &str) -> bool {
        has_alias_in(&self.alias_map.read(), name, alias)
    }

    /// Removes a registered alias.
    ///
    /// # Errors
    ///
    /// [`RegistryError::AliasNotFound`] if `alias` is not registered.
    pub fn remove_alias(&self, alias: &str) -> Result<(), RegistryError> {
        let removed = self.alias_map.write().shift_remove(alias);
        if removed.is_none() {
            return Err(RegistryError::AliasNotFound {
                alias: alias.to_owned(),
            });
        }

        self.tracer.emit(&RegistryEvent::AliasRemoved {
            alias: alias.to_owned(),
        });
        Ok(())
    }

    /// Whether `name` is currently registered as an alias.
    pub fn is_alias(&self, name: &str) -> bool {
        self.alias_map.read().contains_key(name)
    }

    /// Returns every alias that resolves to `name`, including aliases of aliases.
    pub fn get_aliases(&self, name: &str) -> Vec<String> {
        let map = self.alias_map.read();
        let mut result = Vec::new();
        let mut seen = HashSet::new();
        let mut pending = vec![name];

        while let Some(current) = pending.pop() {
            for (alias, registered) in map.iter() {
                if registered == current && seen.insert(alias.as_str()) {
                    result.push(alias.clone());
                    pending.push(alias.as_str());
                }
            }
        }

        result
    }

    /// Applies `resolver` to every alias and target name.
    ///
    /// Entries whose alias or name resolves to nothing (or to an empty string), or
    /// whose alias and name resolve to the same value, are dropped. A re-keyed
    /// alias that lands on an existing alias for the same name is merged into it.
    /// The resolver runs under the registry's write lock and must not call back
    /// into this registry.
    ///
    /// The update is all-or-nothing: on error the map is left as it was.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::AliasConflict`] if a resolved alias is already bound to another name
    /// - [`RegistryError::CircularAlias`] if a resolved pair would close a cycle
    pub fn resolve_aliases<F>(&self, resolver: F) -> Result<(), RegistryError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut map = self.alias_map.write();
        let snapshot = map.clone();
        let mut working = map.clone();

        for (alias, registered_name) in &snapshot {
            let resolved_alias = resolver(alias).filter(|s| !s.is_empty());
            let resolved_name = resolver(registered_name).filter(|s| !s.is_empty());

            let (Some(resolved_alias), Some(resolved_name)) = (resolved_alias, resolved_name)
            else {
                working.shift_remove(alias);
                continue;
            };

            if resolved_alias == resolved_name {
                working.shift_remove(alias);
            } else if resolved_alias != *alias {
                if let Some(existing) = working.get(&resolved_alias) {
                    if *existing == resolved_name {
                        // already covered by the existing alias
                        working.shift_remove(alias);
                        continue;
                    }
                    return Err(RegistryError::AliasConflict {
                        alias: resolved_alias,
                        name: resolved_name,
                        registered: existing.clone(),
                    });
                }
                check_for_alias_circle(&working, &resolved_name, &resolved_alias)?;
                working.shift_remove(alias);
                working.insert(resolved_alias, resolved_name);
            } else if *registered_name != resolved_name {
                check_for_alias_circle(&working, &resolved_name, alias)?;
                working.insert(alias.clone(), resolved_name);
            }
        }

        debug!(before = snapshot.len(), after = working.len(), "resolved aliases");
        *map = working;
        Ok(())
    }

    /// Follows aliases from `name` to the name they ultimately stand for.
    ///
    /// Returns `name` itself when it is not an alias.
    pub fn canonical_name(&self, name: &str) -> String {
        let map = self.alias_map.read();
        let mut canonical = name;
        while let Some(resolved) = map.get(canonical) {
            canonical = resolved.as_str();
        }
        canonical.to_owned()
    }

    /// Number of registered aliases.
    pub fn alias_count(&self) -> usize {
        self.alias_map.read().len()
    }
}

fn require_text(value: &str, what: &'static str) -> Result<(), RegistryError> {
    if value.trim().is_empty() {
        return Err(RegistryError::EmptyName { what });
    }
    Ok(())
}

/// Rejects `alias -> name` when `name` already resolves back to `alias`.
fn check_for_alias_circle(
    map: &IndexMap<String, String>,
    name: &str,
    alias: &str,
) -> Result<(), RegistryError> {
    if has_alias_in(map, alias, name) {
        return Err(RegistryError::CircularAlias {
            alias: alias.to_owned(),
            name: name.to_owned(),
        });
    }
    Ok(())
}

fn has_alias_in(map: &IndexMap<String, String>, name: &str, alias: &str) -> bool {
    let mut seen = HashSet::new();
    let mut pending = vec![name];

    while let Some(current) = pending.pop() {
        if !seen.insert(current) {
            continue;
        }
        for (registered_alias, registered_name) in map.iter() {
            if registered_name == current {
                if registered_alias == alias {
                    return true;
                }
                pending.push(registered_alias.as_str());
            }
        }
    }

    false
}

//! Per-registry trace callback storage.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::RegistryEvent;

/// Type alias for the user-supplied tracing callback.
///
/// The callback receives a reference to a `RegistryEvent` every time the registry is
/// interacted with. It must be thread-safe because registries are shared across threads.
pub type TraceCallback = dyn Fn(&RegistryEvent) + Send + Sync + 'static;

/// Holds an optional user-defined tracing callback.
///
/// Shared between a [`SingletonRegistry`](crate::SingletonRegistry) and its
/// [`AliasRegistry`](crate::AliasRegistry) so both report to the same callback.
#[derive(Default)]
pub(crate) struct Tracer {
    callback: Mutex<Option<Arc<TraceCallback>>>,
}

impl Tracer {
    pub(crate) fn set(&self, callback: impl Fn(&RegistryEvent) + Send + Sync + 'static) {
        *self.callback.lock() = Some(Arc::new(callback));
    }

    pub(crate) fn clear(&self) {
        *self.callback.lock() = None;
    }

    /// Invokes the current callback, if any.
    ///
    /// The callback runs after the tracer lock is released, so a callback may
    /// replace itself or emit into another registry.
    pub(crate) fn emit(&self, event: &RegistryEvent) {
        let callback = self.callback.lock().clone();
        if let Some(callback) = callback {
            callback(event);
        }
    }
}

impl std::fmt::Debug for Tracer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tracer")
            .field("installed", &self.callback.lock().is_some())
            .finish()
    }
}

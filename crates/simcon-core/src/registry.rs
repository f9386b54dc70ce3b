//! ---
//! simcon_section: "01-control-plane"
//! simcon_type: "source"
//! simcon_scope: "code"
//! simcon_description: "Identifier-keyed registry of owned components."
//! simcon_version: "v0.0.0-prealpha"
//! simcon_owner: "tbd"
//! ---
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use uuid::Uuid;

use crate::component::Component;
use crate::error::ComponentError;
use crate::Result;

/// Registry of components owned by one controller.
///
/// Shared between the dispatch context and a gateway's reconciliation
/// task; every operation takes the lock for the duration of the map
/// mutation only and the lock is never held across await points.
#[derive(Default)]
pub struct Registry {
    inner: RwLock<HashMap<Uuid, Arc<dyn Component>>>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a component keyed by its own identifier.
    ///
    /// On a duplicate identifier the registry is left unchanged and the
    /// component is not hooked in.
    pub fn insert(&self, component: Arc<dyn Component>) -> Result<()> {
        let id = component.base().id();
        let mut inner = self.inner.write();
        if inner.contains_key(&id) {
            return Err(ComponentError::DuplicateIdentifier(id));
        }
        inner.insert(id, component);
        Ok(())
    }

    /// Remove and return the component with the given identifier.
    pub fn remove(&self, id: Uuid) -> Result<Arc<dyn Component>> {
        let mut inner = self.inner.write();
        inner.remove(&id).ok_or(ComponentError::NotFound(id))
    }

    /// Look up a component by identifier.
    pub fn get(&self, id: Uuid) -> Option<Arc<dyn Component>> {
        self.inner.read().get(&id).cloned()
    }

    /// Whether an entry with the given identifier exists.
    pub fn contains(&self, id: Uuid) -> bool {
        self.inner.read().contains_key(&id)
    }

    /// Snapshot of all currently registered components.
    pub fn components(&self) -> Vec<Arc<dyn Component>> {
        self.inner.read().values().cloned().collect()
    }

    /// Snapshot of all registered identifiers.
    pub fn ids(&self) -> Vec<Uuid> {
        self.inner.read().keys().copied().collect()
    }

    /// Number of registered components.
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry").field("len", &self.len()).finish()
    }
}

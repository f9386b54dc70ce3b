//! ---
//! simcon_section: "01-control-plane"
//! simcon_type: "source"
//! simcon_scope: "code"
//! simcon_description: "Type-tag to constructor registration for component variants."
//! simcon_version: "v0.0.0-prealpha"
//! simcon_owner: "tbd"
//! ---
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use simcon_common::ComponentSpec;

use crate::component::{Component, GenericComponent, StateSink};
use crate::error::ComponentError;
use crate::Result;

type Constructor = Box<dyn Fn(&ComponentSpec) -> Result<Arc<dyn Component>> + Send + Sync>;

/// Registry mapping a type tag to a constructor function.
///
/// Variants are registered explicitly at startup; there is no runtime
/// reflection. Constructors for backend-fronting variants capture their
/// backend clients at registration time.
#[derive(Default)]
pub struct ComponentFactory {
    constructors: RwLock<HashMap<String, Constructor>>,
}

impl ComponentFactory {
    /// Create an empty factory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Factory pre-populated with the `generic` variant.
    pub fn with_defaults(sink: Arc<dyn StateSink>) -> Self {
        let factory = Self::new();
        factory.register("generic", move |spec| {
            let component: Arc<dyn Component> = GenericComponent::new(spec, sink.clone());
            Ok(component)
        });
        factory
    }

    /// Register a constructor for the given type tag, replacing any
    /// previous registration.
    pub fn register<F>(&self, kind: impl Into<String>, constructor: F)
    where
        F: Fn(&ComponentSpec) -> Result<Arc<dyn Component>> + Send + Sync + 'static,
    {
        self.constructors
            .write()
            .insert(kind.into(), Box::new(constructor));
    }

    /// Construct a component from its descriptor.
    pub fn build(&self, spec: &ComponentSpec) -> Result<Arc<dyn Component>> {
        let constructors = self.constructors.read();
        let constructor = constructors
            .get(&spec.kind)
            .ok_or_else(|| ComponentError::UnknownKind(spec.kind.clone()))?;
        constructor(spec)
    }

    /// Currently registered type tags.
    pub fn kinds(&self) -> Vec<String> {
        self.constructors.read().keys().cloned().collect()
    }
}

impl std::fmt::Debug for ComponentFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentFactory")
            .field("kinds", &self.kinds())
            .finish()
    }
}

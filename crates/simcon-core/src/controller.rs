//! ---
//! simcon_section: "01-control-plane"
//! simcon_type: "source"
//! simcon_scope: "code"
//! simcon_description: "Controller component owning a registry of children."
//! simcon_version: "v0.0.0-prealpha"
//! simcon_owner: "tbd"
//! ---
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use tracing::{error, info};
use uuid::Uuid;

use simcon_common::ComponentSpec;
use simcon_msg::ActionRequest;

use crate::component::{apply_default_lifecycle, Action, Component, ComponentBase, StateSink};
use crate::error::ComponentError;
use crate::factory::ComponentFactory;
use crate::registry::Registry;
use crate::state::ComponentCategory;
use crate::Result;

/// Component owning a registry of child components.
///
/// Handles the `create`/`delete` management actions; every other action is
/// treated as a command aimed at the controller itself. Routing an action
/// to a specific child is the responsibility of the message-addressing
/// layer, not of this type.
pub struct Controller {
    base: ComponentBase,
    registry: Registry,
    factory: Arc<ComponentFactory>,
}

impl Controller {
    /// Build a controller from its descriptor.
    pub fn new(
        spec: &ComponentSpec,
        factory: Arc<ComponentFactory>,
        sink: Arc<dyn StateSink>,
    ) -> Arc<Self> {
        Arc::new(Self {
            base: ComponentBase::from_spec(spec, ComponentCategory::Controller, sink),
            registry: Registry::new(),
            factory,
        })
    }

    /// The registry of owned components.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Construct a component from `create` parameters and register it.
    ///
    /// On [`ComponentError::DuplicateIdentifier`] the component is not
    /// hooked into the registry.
    pub fn create(&self, parameters: &JsonValue) -> Result<Arc<dyn Component>> {
        let spec = ComponentSpec::from_value(parameters)
            .map_err(|err| ComponentError::InvalidParameters(err.to_string()))?;
        let component = self.factory.build(&spec)?;
        self.add_component(component.clone())?;
        Ok(component)
    }

    /// Remove the component with the given identifier.
    pub fn delete(&self, uuid: Uuid) -> Result<()> {
        self.remove_component(uuid).map(|_| ())
    }

    /// Atomically register a component.
    pub fn add_component(&self, component: Arc<dyn Component>) -> Result<()> {
        let id = component.base().id();
        let kind = component.base().kind().to_owned();
        self.registry.insert(component)?;
        info!(
            controller = %self.base.name(),
            component = %id,
            kind = %kind,
            "controller added new component"
        );
        Ok(())
    }

    /// Atomically deregister a component.
    pub fn remove_component(&self, id: Uuid) -> Result<Arc<dyn Component>> {
        let component = self.registry.remove(id)?;
        info!(
            controller = %self.base.name(),
            component = %id,
            "controller removed component"
        );
        Ok(component)
    }
}

/// Shared handler for the `create` management action.
///
/// Failures are expected operational conditions: they are reported here
/// and not raised further.
pub(crate) fn handle_create(owner: &str, request: &ActionRequest, create: impl FnOnce(&JsonValue) -> Result<Arc<dyn Component>>) {
    match create(&request.parameters) {
        Ok(component) => {
            info!(
                controller = owner,
                component = %component.base().id(),
                "created component"
            );
        }
        Err(err) => {
            error!(controller = owner, error = %err, "create failed");
        }
    }
}

/// Shared handler for the `delete` management action.
pub(crate) fn handle_delete(owner: &str, request: &ActionRequest, delete: impl FnOnce(Uuid) -> Result<()>) {
    let Some(uuid) = request.uuid_param() else {
        error!(controller = owner, "delete requires a uuid parameter");
        return;
    };
    if let Err(err) = delete(uuid) {
        error!(controller = owner, error = %err, "delete failed");
    }
}

#[async_trait]
impl Component for Controller {
    fn base(&self) -> &ComponentBase {
        &self.base
    }

    async fn handle_action(&self, action: Action, request: &ActionRequest) -> Result<()> {
        match action {
            Action::Create => {
                handle_create(self.base.name(), request, |parameters| {
                    self.create(parameters)
                });
                Ok(())
            }
            Action::Delete => {
                handle_delete(self.base.name(), request, |uuid| self.delete(uuid));
                Ok(())
            }
            _ => apply_default_lifecycle(&self.base, action),
        }
    }
}

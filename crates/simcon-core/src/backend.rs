//! ---
//! simcon_section: "01-control-plane"
//! simcon_type: "source"
//! simcon_scope: "code"
//! simcon_description: "Collaborator contracts consumed by the lifecycle core."
//! simcon_version: "v0.0.0-prealpha"
//! simcon_owner: "tbd"
//! ---
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::component::Action;
use crate::simulator::SolverConfig;
use crate::state::ComponentState;
use crate::Result;

/// One resource as reported by a relay backend's status query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceRecord {
    /// Stable identifier of the remote resource; resources without one
    /// cannot be tracked and are skipped during reconciliation.
    #[serde(default)]
    pub uuid: Option<Uuid>,
    /// Backend-local resource name used for per-resource lifecycle calls.
    pub name: String,
    /// Remote lifecycle state tag.
    pub state: ComponentState,
    /// Backend-specific detail fields, opaque to the core.
    #[serde(default)]
    pub details: JsonValue,
}

impl ResourceRecord {
    /// Construct a record with the given identity and state.
    pub fn new(uuid: Option<Uuid>, name: impl Into<String>, state: ComponentState) -> Self {
        Self {
            uuid,
            name: name.into(),
            state,
            details: JsonValue::Null,
        }
    }
}

/// Connection to an external manager of relay resources (e.g. a node
/// server managing a set of communication nodes).
///
/// Implementations live outside this crate and are expected to bound every
/// call with their own timeout; the core only interprets outcomes.
#[async_trait]
pub trait RelayBackend: Send + Sync {
    /// Version tag of the backend, used in status payloads.
    async fn version(&self) -> Result<String>;
    /// Whether the backend process is currently running.
    async fn is_running(&self) -> Result<bool>;
    /// Start the backend process.
    async fn start(&self) -> Result<()>;
    /// Stop the backend process.
    async fn stop(&self) -> Result<()>;
    /// Pause the backend process.
    async fn pause(&self) -> Result<()>;
    /// Resume a paused backend process.
    async fn resume(&self) -> Result<()>;
    /// Restart the backend process.
    async fn restart(&self) -> Result<()>;
    /// Query the backend for its currently managed resources.
    async fn list_resources(&self) -> Result<Vec<ResourceRecord>>;
    /// Apply a lifecycle action to one named resource.
    async fn resource_action(&self, name: &str, action: Action) -> Result<()>;
}

/// Factory for simulation sessions on an external simulation engine.
#[async_trait]
pub trait SimulationBackend: Send + Sync {
    /// Build a session from an optional input model and solver settings.
    async fn build_session(
        &self,
        model: Option<&Path>,
        solver: &SolverConfig,
    ) -> Result<Box<dyn SimulationSession>>;
}

/// A single running (or runnable) simulation instance.
#[async_trait]
pub trait SimulationSession: Send + Sync {
    /// Start the simulation.
    async fn start(&self) -> Result<()>;
    /// Stop the simulation.
    async fn stop(&self) -> Result<()>;
    /// Pause the simulation.
    async fn pause(&self) -> Result<()>;
    /// Resume a paused simulation.
    async fn resume(&self) -> Result<()>;
}

/// Source of simulation input models.
#[async_trait]
pub trait ModelSource: Send + Sync {
    /// Retrieve the input model, or `None` when no model is configured.
    async fn fetch(&self) -> Result<Option<PathBuf>>;
}

/// Model source for simulators that run without an input model.
#[derive(Debug, Default, Clone)]
pub struct NullModelSource;

#[async_trait]
impl ModelSource for NullModelSource {
    async fn fetch(&self) -> Result<Option<PathBuf>> {
        Ok(None)
    }
}

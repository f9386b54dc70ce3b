//! ---
//! simcon_section: "01-control-plane"
//! simcon_type: "source"
//! simcon_scope: "code"
//! simcon_description: "Component lifecycle state machines and reconciliation engine."
//! simcon_version: "v0.0.0-prealpha"
//! simcon_owner: "tbd"
//! ---
//! Lifecycle core of the SIMCON control plane.
//!
//! Components are managed units with identity, type and a lifecycle state
//! machine. Controllers own registries of components; gateways reconcile
//! their registry against an external relay backend; simulators drive one
//! external simulation backend. Inbound actions arrive as
//! [`simcon_msg::ActionRequest`] payloads and accepted state transitions
//! are published as [`simcon_msg::StateNotice`] payloads.

pub mod backend;
pub mod component;
pub mod controller;
pub mod error;
pub mod factory;
pub mod gateway;
pub mod registry;
pub mod simulator;
pub mod state;

/// Shared result type for lifecycle operations.
pub type Result<T> = std::result::Result<T, error::ComponentError>;

pub use backend::{
    ModelSource, NullModelSource, RelayBackend, ResourceRecord, SimulationBackend,
    SimulationSession,
};
pub use component::{
    Action, BusSink, Component, ComponentBase, GenericComponent, NullSink, StateSink,
};
pub use controller::Controller;
pub use error::ComponentError;
pub use factory::ComponentFactory;
pub use gateway::{Gateway, NodeProxy, RELAY_NODE_KIND};
pub use registry::Registry;
pub use simulator::{Simulator, SolverConfig, SolverDomain, SolverKind};
pub use state::{ComponentCategory, ComponentState};

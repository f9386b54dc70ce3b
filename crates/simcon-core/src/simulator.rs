//! ---
//! simcon_section: "01-control-plane"
//! simcon_type: "source"
//! simcon_scope: "code"
//! simcon_description: "Simulator lifecycle state machine over a simulation backend."
//! simcon_version: "v0.0.0-prealpha"
//! simcon_owner: "tbd"
//! ---
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use strum::Display;
use tracing::{info, warn};

use simcon_common::ComponentSpec;
use simcon_msg::ActionRequest;

use crate::backend::{ModelSource, SimulationBackend, SimulationSession};
use crate::component::{Action, Component, ComponentBase, StateSink};
use crate::error::ComponentError;
use crate::state::{ComponentCategory, ComponentState};
use crate::Result;

const DEFAULT_TIMESTEP: f64 = 1.0;
const DEFAULT_DURATION: f64 = 10.0;
const DEFAULT_FREQUENCY: f64 = 50.0;

/// Solver domain of the simulation backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, Default)]
pub enum SolverDomain {
    /// Static phasor.
    #[default]
    SP,
    /// Dynamic phasor.
    DP,
    /// Electromagnetic transients.
    EMT,
}

/// Solver algorithm of the simulation backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, Default)]
pub enum SolverKind {
    /// Modified nodal analysis.
    #[default]
    MNA,
    /// Newton-Raphson power flow.
    NRP,
}

/// Solver settings read from a simulator's construction parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Solver domain (`solver-domain`, default `SP`).
    pub domain: SolverDomain,
    /// Solver algorithm (`solver-type`, default `MNA`).
    pub solver: SolverKind,
    /// Simulation step width in seconds (`timestep`, default 1.0).
    pub timestep: f64,
    /// Final simulated time in seconds (`duration`, default 10.0).
    pub duration: f64,
    /// Nominal system frequency in hertz (`system-freq`, default 50.0).
    pub frequency: f64,
}

impl SolverConfig {
    /// Read solver settings from a component descriptor.
    ///
    /// Unrecognized domain strings fall back to `EMT` and unrecognized
    /// solver strings to `NRP`, mirroring the backend's own fallback
    /// order; missing keys use the documented defaults.
    pub fn from_spec(spec: &ComponentSpec) -> Self {
        let domain = match spec.param_str("solver-domain") {
            None | Some("SP") => SolverDomain::SP,
            Some("DP") => SolverDomain::DP,
            Some(_) => SolverDomain::EMT,
        };
        let solver = match spec.param_str("solver-type") {
            None | Some("MNA") => SolverKind::MNA,
            Some(_) => SolverKind::NRP,
        };
        Self {
            domain,
            solver,
            timestep: spec.param_f64("timestep", DEFAULT_TIMESTEP),
            duration: spec.param_f64("duration", DEFAULT_DURATION),
            frequency: spec.param_f64("system-freq", DEFAULT_FREQUENCY),
        }
    }
}

/// Component driving one external simulation backend.
///
/// The backend session is absent until a successful `start`; lifecycle
/// calls are guarded by the current state and report violated
/// preconditions as warnings, never as crashes.
pub struct Simulator {
    base: ComponentBase,
    solver: SolverConfig,
    backend: Arc<dyn SimulationBackend>,
    models: Arc<dyn ModelSource>,
    session: tokio::sync::Mutex<Option<Box<dyn SimulationSession>>>,
}

impl Simulator {
    /// Build a simulator from its descriptor.
    pub fn new(
        spec: &ComponentSpec,
        backend: Arc<dyn SimulationBackend>,
        models: Arc<dyn ModelSource>,
        sink: Arc<dyn StateSink>,
    ) -> Arc<Self> {
        let solver = SolverConfig::from_spec(spec);
        let base = ComponentBase::from_spec(spec, ComponentCategory::Simulator, sink);
        base.set_extra(
            "solver",
            serde_json::to_value(&solver).unwrap_or(serde_json::Value::Null),
        );
        Arc::new(Self {
            base,
            solver,
            backend,
            models,
            session: tokio::sync::Mutex::new(None),
        })
    }

    /// Effective solver settings.
    pub fn solver(&self) -> &SolverConfig {
        &self.solver
    }

    fn guard(&self, expected: ComponentState, action: Action) -> Result<()> {
        let state = self.base.state();
        if state != expected {
            warn!(
                component = %self.base.name(),
                action = %action,
                state = %state,
                "action precondition not met; ignoring"
            );
            return Err(ComponentError::InvalidTransition {
                from: state,
                action,
            });
        }
        Ok(())
    }

    /// Start the simulation.
    ///
    /// Only proceeds from `stopped`. Retrieves the input model, builds a
    /// backend session from the solver settings and starts it; any
    /// failure on that path resolves to `error` with the reason attached.
    pub async fn start(&self) -> Result<()> {
        self.guard(ComponentState::Stopped, Action::Start)?;
        self.base.change_state(ComponentState::Starting, None);

        let model = match self.models.fetch().await {
            Ok(model) => model,
            Err(err) => {
                warn!(
                    component = %self.base.name(),
                    error = %err,
                    "model retrieval failed; starting without input model"
                );
                None
            }
        };

        let session = match self.backend.build_session(model.as_deref(), &self.solver).await {
            Ok(session) => session,
            Err(err) => {
                self.base.change_state(
                    ComponentState::Error,
                    Some(&format!("failed to build simulation session: {err}")),
                );
                return Err(err);
            }
        };

        match session.start().await {
            Ok(()) => {
                *self.session.lock().await = Some(session);
                self.base.change_state(ComponentState::Running, None);
                info!(component = %self.base.name(), "simulation started");
                Ok(())
            }
            Err(err) => {
                self.base.change_state(
                    ComponentState::Error,
                    Some(&format!("failed to start simulation: {err}")),
                );
                Err(err)
            }
        }
    }

    /// Stop the simulation.
    ///
    /// Only proceeds from `running`. A failed backend stop resolves to
    /// `unknown`, not `error`: the session is no longer trusted but has
    /// not observably faulted.
    pub async fn stop(&self) -> Result<()> {
        self.guard(ComponentState::Running, Action::Stop)?;
        self.base.change_state(ComponentState::Stopping, None);

        let mut session = self.session.lock().await;
        match session.take() {
            Some(active) => match active.stop().await {
                Ok(()) => {
                    self.base.change_state(ComponentState::Stopped, None);
                    Ok(())
                }
                Err(err) => {
                    // Keep the untrusted session around; only reset clears it.
                    *session = Some(active);
                    self.base.change_state(
                        ComponentState::Unknown,
                        Some(&format!("failed to stop simulation: {err}")),
                    );
                    Err(err)
                }
            },
            None => {
                let err = ComponentError::BackendUninitialized(
                    "no active simulation session".to_owned(),
                );
                self.base
                    .change_state(ComponentState::Unknown, Some(&err.to_string()));
                Err(err)
            }
        }
    }

    /// Pause the simulation.
    ///
    /// The intermediate `pausing` state is set before the backend call so
    /// concurrent status queries observe the in-flight transition.
    pub async fn pause(&self) -> Result<()> {
        self.guard(ComponentState::Running, Action::Pause)?;
        self.base.change_state(ComponentState::Pausing, None);

        let session = self.session.lock().await;
        match session.as_deref() {
            Some(active) => match active.pause().await {
                Ok(()) => {
                    self.base.change_state(ComponentState::Paused, None);
                    Ok(())
                }
                Err(err) => {
                    self.base.change_state(
                        ComponentState::Unknown,
                        Some(&format!("failed to pause simulation: {err}")),
                    );
                    Err(err)
                }
            },
            None => {
                let err = ComponentError::BackendUninitialized(
                    "no active simulation session".to_owned(),
                );
                self.base
                    .change_state(ComponentState::Unknown, Some(&err.to_string()));
                Err(err)
            }
        }
    }

    /// Resume a paused simulation.
    pub async fn resume(&self) -> Result<()> {
        self.guard(ComponentState::Paused, Action::Resume)?;
        self.base.change_state(ComponentState::Resuming, None);

        let session = self.session.lock().await;
        match session.as_deref() {
            Some(active) => match active.resume().await {
                Ok(()) => {
                    self.base.change_state(ComponentState::Running, None);
                    Ok(())
                }
                Err(err) => {
                    self.base.change_state(
                        ComponentState::Unknown,
                        Some(&format!("failed to resume simulation: {err}")),
                    );
                    Err(err)
                }
            },
            None => {
                let err = ComponentError::BackendUninitialized(
                    "no active simulation session".to_owned(),
                );
                self.base
                    .change_state(ComponentState::Unknown, Some(&err.to_string()));
                Err(err)
            }
        }
    }

    /// Recover to `stopped`, discarding any session.
    pub async fn reset(&self) -> Result<()> {
        *self.session.lock().await = None;
        if self.base.change_state(ComponentState::Stopped, None) {
            Ok(())
        } else {
            Err(ComponentError::InvalidTransition {
                from: self.base.state(),
                action: Action::Reset,
            })
        }
    }
}

#[async_trait]
impl Component for Simulator {
    fn base(&self) -> &ComponentBase {
        &self.base
    }

    async fn handle_action(&self, action: Action, _request: &ActionRequest) -> Result<()> {
        match action {
            Action::Start => self.start().await,
            Action::Stop => self.stop().await,
            Action::Pause => self.pause().await,
            Action::Resume => self.resume().await,
            Action::Reset => self.reset().await,
            Action::Create | Action::Delete => {
                Err(ComponentError::UnsupportedAction(action.to_string()))
            }
        }
    }
}

impl std::fmt::Debug for Simulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulator")
            .field("base", &self.base)
            .field("solver", &self.solver)
            .finish()
    }
}

//! ---
//! simcon_section: "01-control-plane"
//! simcon_type: "source"
//! simcon_scope: "code"
//! simcon_description: "Lifecycle states and per-variant transition graphs."
//! simcon_version: "v0.0.0-prealpha"
//! simcon_owner: "tbd"
//! ---
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Lifecycle state of a managed component.
///
/// Not every variant uses the full set; the reachable subset is defined by
/// the owning [`ComponentCategory`]'s transition graph.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ComponentState {
    Idle,
    Starting,
    Running,
    Pausing,
    Paused,
    Resuming,
    Stopping,
    Stopped,
    Shutdown,
    Error,
    Unknown,
}

impl ComponentState {
    /// States in which a simulator has live backend activity.
    pub fn is_active(self) -> bool {
        matches!(
            self,
            ComponentState::Starting
                | ComponentState::Running
                | ComponentState::Pausing
                | ComponentState::Paused
                | ComponentState::Resuming
                | ComponentState::Stopping
        )
    }
}

/// Variant discriminator selecting the allowed-state graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentCategory {
    Generic,
    Controller,
    Gateway,
    Simulator,
    Node,
}

impl ComponentCategory {
    /// State a freshly constructed component of this category starts in.
    pub fn initial_state(self) -> ComponentState {
        match self {
            ComponentCategory::Simulator => ComponentState::Stopped,
            _ => ComponentState::Idle,
        }
    }

    /// Whether the transition `from -> to` is accepted for this category.
    ///
    /// Self-transitions are filtered out before this check; `from != to`
    /// holds for every call.
    pub fn allows(self, from: ComponentState, to: ComponentState) -> bool {
        use ComponentState::*;
        match self {
            // Generic components and remote-owned proxies track externally
            // reported states; any movement is legal.
            ComponentCategory::Generic | ComponentCategory::Controller | ComponentCategory::Node => {
                true
            }
            ComponentCategory::Gateway => match to {
                Idle | Error | Unknown | Shutdown => true,
                Starting => matches!(from, Idle | Error | Unknown),
                Running => matches!(from, Idle | Starting | Paused | Error | Unknown),
                Paused => matches!(from, Running | Starting),
                _ => false,
            },
            ComponentCategory::Simulator => match to {
                Shutdown => true,
                Error => from.is_active(),
                Unknown => matches!(from, Running | Pausing | Paused | Resuming | Stopping),
                Starting => from == Stopped,
                Running => matches!(from, Starting | Resuming),
                Pausing => from == Running,
                Paused => from == Pausing,
                Resuming => from == Paused,
                Stopping => from == Running,
                Stopped => matches!(from, Stopping | Error | Unknown | Paused | Running),
                Idle => false,
            },
        }
    }
}

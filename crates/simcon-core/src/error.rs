//! ---
//! simcon_section: "01-control-plane"
//! simcon_type: "source"
//! simcon_scope: "code"
//! simcon_description: "Operational error taxonomy for the lifecycle core."
//! simcon_version: "v0.0.0-prealpha"
//! simcon_owner: "tbd"
//! ---
use uuid::Uuid;

use crate::component::Action;
use crate::state::ComponentState;

/// Expected operational failure conditions of the control plane.
///
/// Every variant is handled at the boundary where it occurs: logged and
/// converted into a no-op, a degraded state, or an acknowledged-and-dropped
/// message. None of them abort the dispatch loop or a reconciliation task.
#[derive(Debug, thiserror::Error)]
pub enum ComponentError {
    /// A component with the same identifier already exists in the registry.
    #[error("a component with the uuid {0} already exists")]
    DuplicateIdentifier(Uuid),
    /// No registry entry matches the requested identifier.
    #[error("there is no component with the uuid {0}")]
    NotFound(Uuid),
    /// The action name is not part of the dispatch vocabulary.
    #[error("unsupported action: {0}")]
    UnsupportedAction(String),
    /// A lifecycle action was attempted from a state that forbids it.
    #[error("cannot {action} while {from}")]
    InvalidTransition {
        /// State the component was in when the action arrived.
        from: ComponentState,
        /// Action whose precondition was not met.
        action: Action,
    },
    /// The type discriminator has no registered constructor.
    #[error("unknown component type: {0}")]
    UnknownKind(String),
    /// Action parameters could not be decoded into a descriptor.
    #[error("malformed component parameters: {0}")]
    InvalidParameters(String),
    /// The backend could not be reached at all.
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),
    /// The backend rejected or failed a lifecycle call.
    #[error("backend {operation} failed: {reason}")]
    BackendOperationFailed {
        /// Lifecycle operation that was attempted.
        operation: &'static str,
        /// Failure reason reported by the backend client.
        reason: String,
    },
    /// The backend is missing, not installed, or has no live session.
    #[error("backend not initialized: {0}")]
    BackendUninitialized(String),
}

impl ComponentError {
    /// Convenience constructor for failed backend lifecycle calls.
    pub fn backend_op(operation: &'static str, reason: impl Into<String>) -> Self {
        ComponentError::BackendOperationFailed {
            operation,
            reason: reason.into(),
        }
    }
}

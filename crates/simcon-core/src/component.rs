//! ---
//! simcon_section: "01-control-plane"
//! simcon_type: "source"
//! simcon_scope: "code"
//! simcon_description: "Component base, action dispatch and state notifications."
//! simcon_version: "v0.0.0-prealpha"
//! simcon_owner: "tbd"
//! ---
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value as JsonValue};
use strum::{Display, EnumString};
use tracing::{debug, info, warn};
use uuid::Uuid;

use simcon_common::ComponentSpec;
use simcon_msg::{Message, MessagePayload, StateNotice, Transport};

use crate::error::ComponentError;
use crate::state::{ComponentCategory, ComponentState};
use crate::Result;

/// Actions recognized by the dispatch protocol.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Action {
    Start,
    Stop,
    Pause,
    Resume,
    Reset,
    Create,
    Delete,
}

impl Action {
    /// Lifecycle actions act on the component's own state machine;
    /// management actions mutate a controller's registry instead.
    pub fn is_lifecycle(self) -> bool {
        !matches!(self, Action::Create | Action::Delete)
    }
}

/// Observer for accepted state transitions.
pub trait StateSink: Send + Sync {
    /// Publish one state notification.
    fn publish(&self, notice: &StateNotice);
}

/// Sink that discards every notification.
#[derive(Debug, Default, Clone)]
pub struct NullSink;

impl StateSink for NullSink {
    fn publish(&self, _notice: &StateNotice) {}
}

/// Sink publishing notifications onto a message-bus transport.
pub struct BusSink {
    transport: Arc<dyn Transport>,
}

impl BusSink {
    /// Wrap the given transport as a notification sink.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }
}

impl StateSink for BusSink {
    fn publish(&self, notice: &StateNotice) {
        let message = Message::new(MessagePayload::State(notice.clone()));
        if let Err(err) = self.transport.send(message) {
            warn!(transport = self.transport.name(), error = %err, "failed to publish state notification");
        }
    }
}

#[derive(Debug)]
struct StateCell {
    state: ComponentState,
    changed_at: DateTime<Utc>,
    reason: Option<String>,
}

/// Identity, configuration and state machine shared by every component
/// variant.
///
/// The cell holding the mutable part is interior-mutable so components can
/// be driven through `&self` from both the dispatch context and a
/// gateway's reconciliation task.
pub struct ComponentBase {
    id: Uuid,
    name: String,
    kind: String,
    category: ComponentCategory,
    enabled: bool,
    params: JsonMap<String, JsonValue>,
    cell: Mutex<StateCell>,
    version: Mutex<Option<String>>,
    extras: Mutex<JsonMap<String, JsonValue>>,
    sink: Arc<dyn StateSink>,
}

impl ComponentBase {
    /// Construct a base with explicit identity and initial state.
    pub fn new(
        id: Uuid,
        name: impl Into<String>,
        kind: impl Into<String>,
        category: ComponentCategory,
        enabled: bool,
        params: JsonMap<String, JsonValue>,
        sink: Arc<dyn StateSink>,
        initial: ComponentState,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            kind: kind.into(),
            category,
            enabled,
            params,
            cell: Mutex::new(StateCell {
                state: initial,
                changed_at: Utc::now(),
                reason: None,
            }),
            version: Mutex::new(None),
            extras: Mutex::new(JsonMap::new()),
            sink,
        }
    }

    /// Construct a base from a descriptor, starting in the category's
    /// initial state.
    pub fn from_spec(
        spec: &ComponentSpec,
        category: ComponentCategory,
        sink: Arc<dyn StateSink>,
    ) -> Self {
        Self::new(
            spec.uuid_or_new(),
            spec.display_name(),
            spec.kind.clone(),
            category,
            spec.enabled,
            spec.params.clone(),
            sink,
            category.initial_state(),
        )
    }

    /// Immutable identifier.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Human-readable name for logs and payloads.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared type tag.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Transition-graph category.
    pub fn category(&self) -> ComponentCategory {
        self.category
    }

    /// Disabled components ignore lifecycle and reconciliation activity.
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Opaque construction parameters, read-only after creation.
    pub fn params(&self) -> &JsonMap<String, JsonValue> {
        &self.params
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ComponentState {
        self.cell.lock().state
    }

    /// Reason attached to the most recent transition, if any.
    pub fn last_reason(&self) -> Option<String> {
        self.cell.lock().reason.clone()
    }

    /// Timestamp of the most recent accepted transition.
    pub fn changed_at(&self) -> DateTime<Utc> {
        self.cell.lock().changed_at
    }

    /// Record the fronted backend's version tag for status payloads.
    pub fn set_version(&self, version: Option<String>) {
        *self.version.lock() = version;
    }

    /// Attach a variant-specific status field to every notification.
    pub fn set_extra(&self, key: impl Into<String>, value: JsonValue) {
        self.extras.lock().insert(key.into(), value);
    }

    /// Clone of the notification sink, for constructing child components.
    pub fn sink(&self) -> Arc<dyn StateSink> {
        self.sink.clone()
    }

    /// Drive the state machine to `next`.
    ///
    /// Re-reporting the current state is accepted without emitting a
    /// duplicate notification. Transitions the category graph forbids are
    /// rejected: warned, state unchanged, `false` returned. Accepted
    /// transitions are timestamped and published to the sink.
    pub fn change_state(&self, next: ComponentState, reason: Option<&str>) -> bool {
        let notice = {
            let mut cell = self.cell.lock();
            if cell.state == next {
                return true;
            }
            if !self.category.allows(cell.state, next) {
                warn!(
                    component = %self.name,
                    from = %cell.state,
                    to = %next,
                    "rejected invalid state transition"
                );
                return false;
            }
            cell.state = next;
            cell.changed_at = Utc::now();
            cell.reason = reason.map(str::to_owned);
            self.notice_locked(&cell)
        };
        info!(component = %self.name, state = %next, "component state changed");
        self.sink.publish(&notice);
        true
    }

    /// Serializable snapshot of the component's current status. Pure.
    pub fn status(&self) -> StateNotice {
        let cell = self.cell.lock();
        self.notice_locked(&cell)
    }

    fn notice_locked(&self, cell: &StateCell) -> StateNotice {
        StateNotice {
            id: self.id,
            component: self.kind.clone(),
            state: cell.state.to_string(),
            version: self.version.lock().clone(),
            reason: cell.reason.clone(),
            extra: JsonValue::Object(self.extras.lock().clone()),
        }
    }
}

impl std::fmt::Debug for ComponentBase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentBase")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("state", &self.state())
            .finish()
    }
}

/// A managed unit with identity, type and lifecycle state.
#[async_trait]
pub trait Component: Send + Sync {
    /// Shared identity/state core.
    fn base(&self) -> &ComponentBase;

    /// Variant-specific action handler. Errors are operational conditions
    /// reported by the dispatch wrapper, never crashes.
    async fn handle_action(&self, action: Action, request: &simcon_msg::ActionRequest)
        -> Result<()>;

    /// Hook invoked once the component is registered and ready.
    async fn on_ready(&self) {}

    /// Route one inbound request to the variant handler.
    ///
    /// Unknown actions and handler failures are logged and acknowledged;
    /// nothing escapes to the caller of the dispatch loop.
    async fn dispatch(&self, request: &simcon_msg::ActionRequest) {
        let Ok(action) = request.action.parse::<Action>() else {
            let err = ComponentError::UnsupportedAction(request.action.clone());
            warn!(component = %self.base().name(), error = %err, "dropping unsupported action");
            return;
        };
        if !self.base().enabled() && action.is_lifecycle() {
            debug!(
                component = %self.base().name(),
                action = %action,
                "component disabled; ignoring lifecycle action"
            );
            return;
        }
        if let Err(err) = self.handle_action(action, request).await {
            warn!(
                component = %self.base().name(),
                action = %action,
                error = %err,
                "action failed"
            );
        }
    }
}

impl std::fmt::Debug for dyn Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Component")
            .field("base", self.base())
            .finish()
    }
}

/// Map a lifecycle action onto the base state machine.
///
/// This is the behavior of components without a backend of their own: the
/// action simply drives the local state.
pub(crate) fn apply_default_lifecycle(base: &ComponentBase, action: Action) -> Result<()> {
    let target = match action {
        Action::Start | Action::Resume => ComponentState::Running,
        Action::Stop | Action::Reset => ComponentState::Idle,
        Action::Pause => ComponentState::Paused,
        Action::Create | Action::Delete => {
            return Err(ComponentError::UnsupportedAction(action.to_string()))
        }
    };
    if base.change_state(target, None) {
        Ok(())
    } else {
        Err(ComponentError::InvalidTransition {
            from: base.state(),
            action,
        })
    }
}

/// Component variant with no backend: actions only move the local state.
pub struct GenericComponent {
    base: ComponentBase,
}

impl GenericComponent {
    /// Build a generic component from its descriptor.
    pub fn new(spec: &ComponentSpec, sink: Arc<dyn StateSink>) -> Arc<Self> {
        Arc::new(Self {
            base: ComponentBase::from_spec(spec, ComponentCategory::Generic, sink),
        })
    }
}

#[async_trait]
impl Component for GenericComponent {
    fn base(&self) -> &ComponentBase {
        &self.base
    }

    async fn handle_action(
        &self,
        action: Action,
        _request: &simcon_msg::ActionRequest,
    ) -> Result<()> {
        apply_default_lifecycle(&self.base, action)
    }
}

//! ---
//! simcon_section: "02-messaging-ipc-data-model"
//! simcon_type: "source"
//! simcon_scope: "code"
//! simcon_description: "Message schema helpers and transport seam."
//! simcon_version: "v0.0.0-prealpha"
//! simcon_owner: "tbd"
//! ---
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// Schema version broadcast alongside every message payload.
pub const SCHEMA_VERSION: u16 = 1;

/// Message envelope describing the payload carried on the bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum MessagePayload {
    /// Named action dispatched towards a managed component.
    Action(ActionRequest),
    /// State notification emitted after an accepted transition.
    State(StateNotice),
}

/// Unified message structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Unique identifier for deduplication and tracing.
    pub id: Uuid,
    /// Version of the schema used by the payload.
    pub schema_version: u16,
    /// Timestamp when the message was created.
    pub timestamp: DateTime<Utc>,
    /// Actual payload carried by the message.
    pub payload: MessagePayload,
}

impl Message {
    /// Construct a new message envelope around the provided payload.
    pub fn new(payload: MessagePayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            schema_version: SCHEMA_VERSION,
            timestamp: Utc::now(),
            payload,
        }
    }

    /// Convenience accessor returning the payload kind as a static string.
    pub fn kind(&self) -> &'static str {
        match &self.payload {
            MessagePayload::Action(_) => "action",
            MessagePayload::State(_) => "state",
        }
    }
}

/// Inbound action aimed at a managed component.
///
/// The addressing layer resolves the target component; the request itself
/// only carries the action name and its parameter object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRequest {
    /// Action name (`start`, `stop`, `create`, ...).
    pub action: String,
    /// Arbitrary parameters encoded as JSON.
    #[serde(default)]
    pub parameters: JsonValue,
}

impl ActionRequest {
    /// Construct a new action request.
    pub fn new(action: impl Into<String>, parameters: JsonValue) -> Self {
        Self {
            action: action.into(),
            parameters,
        }
    }

    /// Extract the `uuid` parameter, if present and well-formed.
    pub fn uuid_param(&self) -> Option<Uuid> {
        self.parameters
            .get("uuid")
            .and_then(JsonValue::as_str)
            .and_then(|raw| Uuid::parse_str(raw).ok())
    }

    /// Extract the `type` discriminator parameter, if present.
    pub fn kind_param(&self) -> Option<&str> {
        self.parameters.get("type").and_then(JsonValue::as_str)
    }
}

/// State notification published on every accepted transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateNotice {
    /// Identifier of the component that changed state.
    pub id: Uuid,
    /// Declared type tag of the component.
    #[serde(rename = "type")]
    pub component: String,
    /// New lifecycle state as a wire string.
    pub state: String,
    /// Backend version tag, when the component fronts a versioned backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Failure reason accompanying degraded states.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Variant-specific status fields.
    #[serde(default)]
    pub extra: JsonValue,
}

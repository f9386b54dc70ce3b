//! ---
//! simcon_section: "02-messaging-ipc-data-model"
//! simcon_type: "source"
//! simcon_scope: "code"
//! simcon_description: "Message schema helpers and transport seam."
//! simcon_version: "v0.0.0-prealpha"
//! simcon_owner: "tbd"
//! ---
#![warn(missing_docs)]

pub mod transport;
pub mod types;

/// Shared result type for messaging operations.
pub type Result<T> = std::result::Result<T, MessagingError>;

/// Error enumeration for the messaging subsystem.
#[derive(Debug, thiserror::Error)]
pub enum MessagingError {
    /// Raised when a transport backend is not yet implemented.
    #[error("messaging subsystem not yet implemented: {0}")]
    Unimplemented(&'static str),
    /// Wrapper for IO errors encountered during messaging operations.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Wrapper for JSON serialization or deserialization problems.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub use transport::{InMemoryTransport, Transport};
pub use types::{ActionRequest, Message, MessagePayload, StateNotice, SCHEMA_VERSION};

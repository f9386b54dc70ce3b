//! ---
//! simcon_section: "01-control-plane"
//! simcon_type: "source"
//! simcon_scope: "code"
//! simcon_description: "Shared primitives and utilities for the control plane."
//! simcon_version: "v0.0.0-prealpha"
//! simcon_owner: "tbd"
//! ---

pub mod config;

pub use config::{AppConfig, ComponentSpec, LoadedAppConfig, LogFormat, LoggingConfig};

//! ---
//! simcon_section: "01-control-plane"
//! simcon_type: "source"
//! simcon_scope: "code"
//! simcon_description: "Shared primitives and utilities for the control plane."
//! simcon_version: "v0.0.0-prealpha"
//! simcon_owner: "tbd"
//! ---
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value as JsonValue};
use tracing::debug;
use uuid::Uuid;

fn default_kind() -> String {
    "generic".to_owned()
}

fn default_enabled() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_owned()
}

fn default_log_format() -> LogFormat {
    LogFormat::StructuredJson
}

/// Output format selection for the logging subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable single-line output.
    Plain,
    /// Structured JSON output for log shipping.
    StructuredJson,
}

/// Logging configuration shared by every binary embedding the control plane.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// Descriptor from which a managed component is constructed.
///
/// The same shape is accepted from the configuration file and from the
/// parameters of a `create` action; keys not recognized here are collected
/// into `params` and stay opaque to the control plane.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentSpec {
    /// Type discriminator selecting the concrete component variant.
    #[serde(rename = "type", default = "default_kind")]
    pub kind: String,
    /// Stable identifier; generated when omitted.
    #[serde(default)]
    pub uuid: Option<Uuid>,
    /// Human-readable name for logs and status payloads.
    #[serde(default)]
    pub name: Option<String>,
    /// Disabled components ignore lifecycle and reconciliation activity.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Variant-specific parameters, read-only after construction.
    #[serde(flatten)]
    pub params: JsonMap<String, JsonValue>,
}

impl ComponentSpec {
    /// Build a minimal spec for the given type tag.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            uuid: None,
            name: None,
            enabled: true,
            params: JsonMap::new(),
        }
    }

    /// Deserialize a spec from raw action parameters.
    pub fn from_value(value: &JsonValue) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_value(value.clone())
    }

    /// The identifier this spec resolves to, generating one when absent.
    pub fn uuid_or_new(&self) -> Uuid {
        self.uuid.unwrap_or_else(Uuid::new_v4)
    }

    /// Display name falling back to the type tag.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.kind)
    }

    /// Read a numeric parameter with a default.
    pub fn param_f64(&self, key: &str, default: f64) -> f64 {
        self.params
            .get(key)
            .and_then(JsonValue::as_f64)
            .unwrap_or(default)
    }

    /// Read a string parameter, if present.
    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.params.get(key).and_then(JsonValue::as_str)
    }

    /// Read a boolean parameter with a default.
    pub fn param_bool(&self, key: &str, default: bool) -> bool {
        self.params
            .get(key)
            .and_then(JsonValue::as_bool)
            .unwrap_or(default)
    }
}

/// Primary configuration object for a control-plane instance.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub components: Vec<ComponentSpec>,
}

/// Metadata describing where an [`AppConfig`] was loaded from.
#[derive(Debug, Clone)]
pub struct LoadedAppConfig {
    pub config: AppConfig,
    pub source: PathBuf,
}

impl AppConfig {
    pub const ENV_CONFIG_PATH: &'static str = "SIMCON_CONFIG";

    /// Load configuration from disk, respecting the `SIMCON_CONFIG` override.
    pub fn load<P: AsRef<Path>>(candidates: &[P]) -> Result<Self> {
        Ok(Self::load_with_source(candidates)?.config)
    }

    /// Load configuration from disk together with the effective source path.
    pub fn load_with_source<P: AsRef<Path>>(candidates: &[P]) -> Result<LoadedAppConfig> {
        if let Ok(env_path) = std::env::var(Self::ENV_CONFIG_PATH) {
            if !env_path.trim().is_empty() {
                let path = PathBuf::from(env_path);
                let config = Self::from_path(path.clone())?;
                return Ok(LoadedAppConfig {
                    config,
                    source: path,
                });
            }
        }

        for candidate in candidates {
            if candidate.as_ref().exists() {
                let path = candidate.as_ref().to_path_buf();
                let config = Self::from_path(path.clone())?;
                return Ok(LoadedAppConfig {
                    config,
                    source: path,
                });
            }
        }

        Err(anyhow!(
            "no configuration files found. inspected: {}",
            candidates
                .iter()
                .map(|p| p.as_ref().display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ))
    }

    fn from_path(path: PathBuf) -> Result<Self> {
        debug!(config_path = %path.display(), "loading configuration");
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("unable to read config file {}", path.display()))?;
        let config = toml::from_str::<AppConfig>(&contents)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that could not be registered at startup.
    pub fn validate(&self) -> Result<()> {
        let mut seen = Vec::new();
        for spec in &self.components {
            if let Some(uuid) = spec.uuid {
                if seen.contains(&uuid) {
                    return Err(anyhow!("duplicate component uuid in configuration: {uuid}"));
                }
                seen.push(uuid);
            }
        }
        Ok(())
    }
}

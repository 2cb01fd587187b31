//! Configuration schema definitions.
//!
//! `GatewayConfig` holds the process-wide settings shared by every mode and
//! is deserialized from an optional TOML file. Mode-specific settings (the
//! expression, the routing document, the handler names) come from the
//! command line and environment; see [`ModeSettings`].

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Request size limits.
    pub limits: LimitsConfig,

    /// Logging and metrics settings.
    pub observability: ObservabilityConfig,

    /// Parameter sources for the function proxy.
    pub params: ParamsConfig,

    /// Shared cache injected into handler contexts.
    pub cache: Option<CacheConfig>,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum request body size in bytes.
    pub max_body_size: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Where handler parameters come from.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ParamsConfig {
    /// Environment variables with this prefix become default parameters.
    pub env_prefix: String,

    /// JSON file mapping host names to static parameters.
    pub static_path: Option<PathBuf>,
}

impl Default for ParamsConfig {
    fn default() -> Self {
        Self {
            env_prefix: "P_".to_string(),
            static_path: None,
        }
    }
}

/// Shared cache resource.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    /// `redis://host:port/db` or `memory://`.
    pub url: String,
}

/// Which gateway variant to run, with its required settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModeSettings {
    /// Single-tenant boolean gate.
    Filter { expression: String },

    /// Single-tenant N-way switch; `cases` is the raw JSON array text.
    Switch { expression: String, cases: String },

    /// Many tenants keyed by host, each with a filter expression.
    FilterDispatcher { routes: PathBuf },

    /// Many tenants keyed by host, each with a switch expression and cases.
    SwitchDispatcher { routes: PathBuf },

    /// Forward every event after a fixed delay.
    Waiter { seconds: u64 },

    /// Invoke named handlers.
    Function { handlers: Vec<String>, dispatch: bool },
}

impl ModeSettings {
    pub fn name(&self) -> &'static str {
        match self {
            ModeSettings::Filter { .. } => "filter",
            ModeSettings::Switch { .. } => "switch",
            ModeSettings::FilterDispatcher { .. } => "filter-dispatcher",
            ModeSettings::SwitchDispatcher { .. } => "switch-dispatcher",
            ModeSettings::Waiter { .. } => "waiter",
            ModeSettings::Function { .. } => "function",
        }
    }
}

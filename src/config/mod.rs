//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! gateway.toml (optional)            CLI flags / environment
//!     → loader.rs (parse)               → ModeSettings
//!     → validation.rs (semantic)        → routing document / expressions
//!     → GatewayConfig                   → validation.rs (compile every entry)
//!                 ↘                   ↙
//!                   lifecycle::startup
//!                   (immutable, shared via Arc)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no reload
//! - All fields have defaults to allow minimal configs
//! - Any invalid setting is fatal before the listener is bound

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::ConfigError;
pub use schema::{
    CacheConfig, GatewayConfig, LimitsConfig, ListenerConfig, ModeSettings, ObservabilityConfig,
    ParamsConfig,
};

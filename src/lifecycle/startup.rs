//! Startup orchestration.
//!
//! # Responsibilities
//! - Turn mode settings into a Gateway (routing table or handler set)
//! - Load default and static parameters, connect the cache
//! - Bind the listener, start the metrics endpoint, begin accepting traffic
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - The listener binds last, so a bad configuration never serves traffic

use std::time::Duration;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::loader::read_file;
use crate::config::{ConfigError, GatewayConfig, ModeSettings, ObservabilityConfig};
use crate::dispatch::{FunctionProxy, Gateway, Mode};
use crate::handler::{HandlerCatalog, Handlers};
use crate::http::HttpServer;
use crate::lifecycle::ShutdownListener;
use crate::observability::metrics;
use crate::params::{defaults_from_env, StaticParams};
use crate::resource;
use crate::routing::{EntryKind, RoutingTable};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Build the gateway described by `settings`.
pub fn build_gateway(
    config: &GatewayConfig,
    settings: &ModeSettings,
    catalog: &HandlerCatalog,
) -> Result<Gateway, ConfigError> {
    let mode = match settings {
        ModeSettings::Filter { expression } => Mode::Filter(RoutingTable::filter(expression)?),
        ModeSettings::Switch { expression, cases } => Mode::Switch(RoutingTable::switch(expression, cases)?),
        ModeSettings::FilterDispatcher { routes } => {
            let raw = read_file(routes)?;
            Mode::Filter(RoutingTable::from_dispatcher_json(&raw, EntryKind::Filter)?)
        }
        ModeSettings::SwitchDispatcher { routes } => {
            let raw = read_file(routes)?;
            Mode::Switch(RoutingTable::from_dispatcher_json(&raw, EntryKind::Switch)?)
        }
        ModeSettings::Waiter { seconds } => Mode::Waiter(Duration::from_secs(*seconds)),
        ModeSettings::Function { handlers, dispatch } => {
            Mode::Function(build_function_proxy(config, handlers, *dispatch, catalog)?)
        }
    };

    if let Mode::Filter(table) | Mode::Switch(table) = &mode {
        tracing::info!(mode = settings.name(), routes = table.len(), "Routing table built");
    }

    Ok(Gateway::new(mode))
}

fn build_function_proxy(
    config: &GatewayConfig,
    names: &[String],
    dispatch: bool,
    catalog: &HandlerCatalog,
) -> Result<FunctionProxy, ConfigError> {
    let handlers = Handlers::select(catalog, names, dispatch)?;
    tracing::info!(handlers = ?names, dispatch = handlers.is_dispatch(), "Handlers selected");

    let defaults = defaults_from_env(std::env::vars(), &config.params.env_prefix);
    let mut proxy = FunctionProxy::new(handlers).with_defaults(defaults);

    match &config.params.static_path {
        Some(path) => {
            let static_params = StaticParams::from_json(&read_file(path)?)?;
            tracing::info!(path = %path.display(), hosts = static_params.len(), "Static parameters loaded");
            proxy = proxy.with_static_params(static_params);
        }
        None => tracing::info!("No static parameter file configured"),
    }

    if let Some(cache) = &config.cache {
        proxy = proxy.with_cache(resource::connect(cache)?);
    }

    Ok(proxy)
}

/// Build everything that can fail before a port is bound.
pub fn prepare(
    config: &GatewayConfig,
    settings: &ModeSettings,
    catalog: &HandlerCatalog,
) -> Result<HttpServer, StartupError> {
    let gateway = build_gateway(config, settings, catalog)?;
    Ok(HttpServer::new(config, gateway))
}

/// Build the gateway, bind the configured address and serve until shutdown.
pub async fn launch(
    config: &GatewayConfig,
    settings: &ModeSettings,
    catalog: &HandlerCatalog,
    shutdown: ShutdownListener,
) -> Result<(), StartupError> {
    let server = prepare(config, settings, catalog)?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    if config.observability.metrics_enabled {
        start_metrics(&config.observability);
    }

    server.run(listener, shutdown).await?;
    Ok(())
}

/// A metrics endpoint that fails to start is logged, not fatal.
fn start_metrics(observability: &ObservabilityConfig) {
    match observability.metrics_address.parse() {
        Ok(addr) => {
            if let Err(e) = metrics::init_metrics(addr) {
                tracing::error!(error = %e, "Failed to start metrics endpoint");
            }
        }
        Err(_) => tracing::error!(
            metrics_address = %observability.metrics_address,
            "Failed to parse metrics address"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheConfig;
    use crate::handler::builtin::builtin_catalog;
    use std::path::PathBuf;

    fn function(names: &[&str], dispatch: bool) -> ModeSettings {
        ModeSettings::Function {
            handlers: names.iter().map(|n| n.to_string()).collect(),
            dispatch,
        }
    }

    #[test]
    fn test_builds_each_mode() {
        let config = GatewayConfig::default();
        let catalog = builtin_catalog();

        let filter = ModeSettings::Filter {
            expression: "event.type === 'ping'".to_string(),
        };
        assert_eq!(build_gateway(&config, &filter, &catalog).unwrap().mode().name(), "filter");

        let switch = ModeSettings::Switch {
            expression: "event.kind".to_string(),
            cases: r#"["a", "b"]"#.to_string(),
        };
        assert_eq!(build_gateway(&config, &switch, &catalog).unwrap().mode().name(), "switch");

        let waiter = ModeSettings::Waiter { seconds: 1 };
        assert_eq!(build_gateway(&config, &waiter, &catalog).unwrap().mode().name(), "waiter");

        let gateway = build_gateway(&config, &function(&["echo", "sleep"], false), &catalog).unwrap();
        assert_eq!(gateway.mode().name(), "function");
    }

    #[test]
    fn test_invalid_settings_are_fatal() {
        let config = GatewayConfig::default();
        let catalog = builtin_catalog();

        let filter = ModeSettings::Filter {
            expression: "event.type ===".to_string(),
        };
        assert!(build_gateway(&config, &filter, &catalog).is_err());

        assert!(matches!(
            build_gateway(&config, &function(&["missing"], false), &catalog),
            Err(ConfigError::UnknownHandler(_))
        ));

        let routes = ModeSettings::FilterDispatcher {
            routes: PathBuf::from("/definitely/not/here.json"),
        };
        assert!(matches!(
            build_gateway(&config, &routes, &catalog),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn test_function_resources() {
        let catalog = builtin_catalog();

        let mut config = GatewayConfig::default();
        config.cache = Some(CacheConfig {
            url: "memory://".to_string(),
        });
        assert!(build_gateway(&config, &function(&["dedup"], false), &catalog).is_ok());

        config.cache = Some(CacheConfig {
            url: "ftp://nowhere".to_string(),
        });
        assert!(matches!(
            build_gateway(&config, &function(&["dedup"], false), &catalog),
            Err(ConfigError::Resource(_))
        ));

        let mut config = GatewayConfig::default();
        config.params.static_path = Some(PathBuf::from("/definitely/not/params.json"));
        assert!(build_gateway(&config, &function(&["echo"], false), &catalog).is_err());
    }
}

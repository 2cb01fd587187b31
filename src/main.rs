//! CloudEvents gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!     POST (ce-* headers)
//!         │
//!         ▼
//!   ┌───────────┐   ┌───────────┐   ┌──────────────────────────────┐
//!   │   http    │──▶│   event   │──▶│           dispatch           │
//!   │  server   │   │   codec   │   │ filter │ switch │ waiter │ fn │
//!   └───────────┘   └───────────┘   └───┬────────────────────────┬─┘
//!                                       │                        │
//!                               ┌───────▼───────┐       ┌────────▼────────┐
//!                               │ routing + expr│       │ handler, params │
//!                               └───────────────┘       │ and cache       │
//!                                                       └────────┬────────┘
//!   ┌───────────┐                                                │
//!   │ response  │◀───────────────────────────────────────────────┘
//!   └───────────┘
//!         │
//!         ▼
//!     200 / 400 / 404 / 500
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use cloudevents_gateway::config::loader::load_config;
use cloudevents_gateway::config::{CacheConfig, GatewayConfig, ModeSettings};
use cloudevents_gateway::handler::builtin::builtin_catalog;
use cloudevents_gateway::lifecycle::{launch, signals, Shutdown};
use cloudevents_gateway::observability::logging;

#[derive(Parser)]
#[command(name = "cloudevents-gateway")]
#[command(about = "Filter, switch, delay or handle CloudEvents over HTTP", long_about = None)]
struct Cli {
    /// TOML gateway configuration
    #[arg(short, long, env = "GATEWAY_CONFIG")]
    config: Option<PathBuf>,

    /// Listen address, overriding the configuration
    #[arg(short, long)]
    bind: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Forward events for which an expression is truthy
    Filter {
        #[arg(long, env = "FILTER")]
        expression: String,
    },
    /// Forward events whose expression selects the case in the path
    Switch {
        #[arg(long, env = "EXPRESSION")]
        expression: String,
        /// JSON array of case values
        #[arg(long, env = "CASES")]
        cases: String,
    },
    /// Per-host filters read from a JSON file
    FilterDispatcher {
        #[arg(long, default_value = "/etc/config.json")]
        routes: PathBuf,
    },
    /// Per-host switches read from a JSON file
    SwitchDispatcher {
        #[arg(long, default_value = "./etc/config.json")]
        routes: PathBuf,
    },
    /// Forward every event after a delay
    Waiter {
        #[arg(long, env = "SECONDS")]
        seconds: u64,
    },
    /// Invoke built-in handlers
    Function {
        /// Handler names, comma separated
        #[arg(long, env = "HANDLER", value_delimiter = ',', required = true)]
        handler: Vec<String>,
        /// Select the handler by the first path segment
        #[arg(long)]
        dispatch: bool,
        /// Static per-host parameter file
        #[arg(long, env = "FUNCTION_PARAMS")]
        params: Option<PathBuf>,
        /// Cache URL (`redis://…` or `memory://`)
        #[arg(long, env = "CACHE_URL")]
        cache: Option<String>,
    },
}

impl Commands {
    /// Split into mode settings, applying flag overrides to `config`.
    fn into_settings(self, config: &mut GatewayConfig) -> ModeSettings {
        match self {
            Commands::Filter { expression } => ModeSettings::Filter { expression },
            Commands::Switch { expression, cases } => ModeSettings::Switch { expression, cases },
            Commands::FilterDispatcher { routes } => ModeSettings::FilterDispatcher { routes },
            Commands::SwitchDispatcher { routes } => ModeSettings::SwitchDispatcher { routes },
            Commands::Waiter { seconds } => ModeSettings::Waiter { seconds },
            Commands::Function {
                handler,
                dispatch,
                params,
                cache,
            } => {
                if params.is_some() {
                    config.params.static_path = params;
                }
                if let Some(url) = cache {
                    config.cache = Some(CacheConfig { url });
                }
                ModeSettings::Function {
                    handlers: handler,
                    dispatch,
                }
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init(&config.observability.log_level);
    tracing::info!("cloudevents-gateway v{} starting", env!("CARGO_PKG_VERSION"));

    let settings = cli.command.into_settings(&mut config);
    tracing::info!(
        mode = settings.name(),
        bind_address = %config.listener.bind_address,
        max_body_size = config.limits.max_body_size,
        "Configuration loaded"
    );

    let shutdown = Arc::new(Shutdown::new());
    signals::spawn_signal_handler(shutdown.clone());

    if let Err(e) = launch(&config, &settings, &builtin_catalog(), shutdown.listener()).await {
        tracing::error!(error = %e, "Gateway failed");
        return Err(e.into());
    }

    tracing::info!(reason = ?shutdown.reason(), "Shutdown complete");
    Ok(())
}

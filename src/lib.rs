//! CloudEvents gateways: filter, switch, waiter and function proxy.

// Event model and expression language
pub mod event;
pub mod expr;
pub mod params;

// Request handling
pub mod dispatch;
pub mod handler;
pub mod http;
pub mod resource;
pub mod routing;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;

pub use config::{GatewayConfig, ModeSettings};
pub use dispatch::{Gateway, Mode};
pub use event::Event;
pub use handler::{Context, Handler, HandlerError, Handlers};
pub use http::HttpServer;
pub use lifecycle::{Shutdown, StopReason};

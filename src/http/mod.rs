//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, per-mode routes, body limit)
//!     → request.rs (request ID)
//!     → dispatch::Gateway (decide / invoke)
//!     → response.rs (Outcome → CloudEvents response, header echo)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{GatewayRequestId, X_REQUEST_ID};
pub use server::{AppState, HttpServer};

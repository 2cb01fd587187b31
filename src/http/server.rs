//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router for the configured mode
//! - Wire up middleware (tracing, body limit, request ID)
//! - Read the request body and hand the request to the gateway
//! - Record per-event metrics
//! - Serve until shutdown is triggered, then drain

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, DefaultBodyLimit, Path, State},
    http::{HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use tokio::net::TcpListener;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::GatewayConfig;
use crate::dispatch::{DispatchError, Gateway, Inbound, Mode};
use crate::http::request::GatewayRequestId;
use crate::http::response;
use crate::lifecycle::ShutdownListener;
use crate::observability::metrics;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<Gateway>,
}

/// HTTP server for one gateway.
pub struct HttpServer {
    router: Router,
    mode: &'static str,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: &GatewayConfig, gateway: Gateway) -> Self {
        let mode = gateway.mode().name();
        let state = AppState {
            gateway: Arc::new(gateway),
        };
        let router = Self::build_router(config, state);
        Self { router, mode }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        let routes = match state.gateway.mode() {
            Mode::Switch(_) => Router::new().route("/{case}", post(handle_case).fallback(not_found)),
            Mode::Function(proxy) if proxy.handlers().is_dispatch() => Router::new()
                .route("/", post(handle).fallback(not_found))
                .route("/{*path}", post(handle).fallback(not_found)),
            Mode::Filter(_) | Mode::Waiter(_) | Mode::Function(_) => {
                Router::new().route("/", post(handle).fallback(not_found))
            }
        };

        routes
            .fallback(not_found)
            .with_state(state)
            .layer(DefaultBodyLimit::max(config.limits.max_body_size))
            .layer(TraceLayer::new_for_http())
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(GatewayRequestId))
    }

    /// The router, for driving the server without a listener.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener, shutdown: ShutdownListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, mode = self.mode, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let reason = shutdown.stopped().await;
                tracing::info!(reason = %reason, "Draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn handle(
    State(state): State<AppState>,
    headers: HeaderMap,
    uri: Uri,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    respond(&state, headers, uri, None, body).await
}

async fn handle_case(
    State(state): State<AppState>,
    Path(case): Path<String>,
    headers: HeaderMap,
    uri: Uri,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    respond(&state, headers, uri, Some(case), body).await
}

async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}

/// Dispatch one request and translate the outcome.
async fn respond(
    state: &AppState,
    headers: HeaderMap,
    uri: Uri,
    case: Option<String>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let start_time = Instant::now();
    let mode = state.gateway.mode().name();

    let body = match body {
        Ok(body) => body,
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            tracing::warn!(mode, "Request body too large");
            metrics::record_event(mode, "too_large", start_time);
            return rejection.into_response();
        }
        Err(rejection) => {
            let err = DispatchError::Body(rejection.body_text());
            tracing::error!(mode, error = %err, "Failed to read request body");
            metrics::record_event(mode, err.label(), start_time);
            return err.into_response();
        }
    };

    let inbound = Inbound::new(headers, uri, body);
    match state.gateway.dispatch(&inbound, case.as_deref()).await {
        Ok(outcome) => {
            metrics::record_event(mode, outcome.label(), start_time);
            response::translate(&outcome, &inbound)
        }
        Err(err) => {
            metrics::record_event(mode, err.label(), start_time);
            err.into_response()
        }
    }
}

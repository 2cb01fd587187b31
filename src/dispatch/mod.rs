//! Dispatch core: turns one decoded request into an outcome.
//!
//! # Data Flow
//! ```text
//! Inbound (headers, uri, body)
//!     → Gateway::dispatch
//!         filter / switch: host lookup → decode_lenient → filter::decide
//!         waiter:          decode_lenient → sleep
//!         function:        function::FunctionProxy::invoke
//!     → Outcome | DispatchError
//!     → http::response (wire encoding)
//! ```
//!
//! # Design Decisions
//! - The gateway is immutable after startup and shared through `Arc`
//! - Evaluation failures are outcomes, not errors; they still answer 200
//! - Handler and payload failures are errors with their own status codes

pub mod filter;
pub mod function;

use std::collections::BTreeMap;
use std::time::Duration;

use axum::body::Bytes;
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::event::{self, CodecError, Event};
use crate::expr::Value;
use crate::handler::HandlerError;
use crate::resource::ResourceError;
use crate::routing::{request_host, RoutingTable};

pub use self::filter::{decide, Decision};
pub use self::function::FunctionProxy;

/// The parts of an HTTP request the dispatch core reads.
#[derive(Debug, Clone)]
pub struct Inbound {
    pub headers: HeaderMap,
    pub uri: Uri,
    pub body: Bytes,
}

impl Inbound {
    pub fn new(headers: HeaderMap, uri: Uri, body: impl Into<Bytes>) -> Self {
        Self {
            headers,
            uri,
            body: body.into(),
        }
    }

    /// Routing key: Host header without port, else the URI authority.
    pub fn host(&self) -> Option<String> {
        request_host(&self.headers, &self.uri)
    }
}

/// How a request was resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Echo the request headers and body.
    Forward,

    /// Empty success.
    Suppress,

    /// The expression failed; success status with an `error` member.
    EvaluationFailed(String),

    /// A handler's reply, if any.
    Reply(Option<Event>),
}

impl Outcome {
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Forward => "forwarded",
            Outcome::Suppress => "suppressed",
            Outcome::EvaluationFailed(_) => "evaluation_failed",
            Outcome::Reply(Some(_)) => "replied",
            Outcome::Reply(None) => "empty",
        }
    }
}

/// Per-request failures.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// No routing entry or handler for the request.
    #[error("no route")]
    NoRoute,

    #[error(transparent)]
    InvalidPayload(#[from] CodecError),

    #[error("function raised an error: {0}")]
    Handler(String),

    #[error(transparent)]
    Resource(#[from] ResourceError),

    #[error("error reading request body: {0}")]
    Body(String),
}

impl DispatchError {
    pub fn label(&self) -> &'static str {
        match self {
            DispatchError::NoRoute => "no_route",
            DispatchError::InvalidPayload(_) => "invalid_payload",
            DispatchError::Handler(_) => "handler_error",
            DispatchError::Resource(_) => "resource_error",
            DispatchError::Body(_) => "body_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            DispatchError::NoRoute => StatusCode::NOT_FOUND,
            DispatchError::InvalidPayload(_) | DispatchError::Handler(_) => StatusCode::BAD_REQUEST,
            DispatchError::Resource(_) | DispatchError::Body(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<HandlerError> for DispatchError {
    fn from(err: HandlerError) -> Self {
        match err {
            HandlerError::Failed(message) => DispatchError::Handler(message),
            HandlerError::Resource(err) => DispatchError::Resource(err),
        }
    }
}

impl IntoResponse for DispatchError {
    fn into_response(self) -> Response {
        match self {
            DispatchError::NoRoute => StatusCode::NOT_FOUND.into_response(),
            other => (other.status(), other.to_string()).into_response(),
        }
    }
}

/// What a gateway does with each request.
#[derive(Debug)]
pub enum Mode {
    /// Boolean gate on `/`.
    Filter(RoutingTable),

    /// Case selection on `/{caseNumber}`.
    Switch(RoutingTable),

    /// Forward after a fixed delay.
    Waiter(Duration),

    /// Invoke a handler.
    Function(FunctionProxy),
}

impl Mode {
    pub fn name(&self) -> &'static str {
        match self {
            Mode::Filter(_) => "filter",
            Mode::Switch(_) => "switch",
            Mode::Waiter(_) => "waiter",
            Mode::Function(_) => "function",
        }
    }
}

/// One configured gateway.
#[derive(Debug)]
pub struct Gateway {
    mode: Mode,
    env: Value,
}

impl Gateway {
    /// Create a gateway whose expressions see the current process environment.
    pub fn new(mode: Mode) -> Self {
        Self::with_env(mode, std::env::vars())
    }

    /// Create a gateway with an explicit `env` binding.
    pub fn with_env<I>(mode: Mode, vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let env = vars
            .into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect::<BTreeMap<_, _>>();
        Self {
            mode,
            env: Value::Object(env),
        }
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    /// Resolve one request. `case` is the raw `/{caseNumber}` segment in switch mode.
    pub async fn dispatch(&self, inbound: &Inbound, case: Option<&str>) -> Result<Outcome, DispatchError> {
        match &self.mode {
            Mode::Filter(table) => self.evaluate(table, inbound, None),
            Mode::Switch(table) => self.evaluate(table, inbound, Some(parse_case(case))),
            Mode::Waiter(delay) => {
                let event = event::decode_lenient(&inbound.headers, &inbound.body);
                tracing::info!(id = ?event.id(), delay_secs = delay.as_secs(), "Receiving event");
                tokio::time::sleep(*delay).await;
                Ok(Outcome::Forward)
            }
            Mode::Function(proxy) => proxy.invoke(inbound).await.map(Outcome::Reply),
        }
    }

    fn evaluate(&self, table: &RoutingTable, inbound: &Inbound, case_number: Option<f64>) -> Result<Outcome, DispatchError> {
        let host = inbound.host();
        let entry = table.lookup(host.as_deref()).ok_or_else(|| {
            tracing::warn!(host = ?host, "No route for host");
            DispatchError::NoRoute
        })?;

        let event = event::decode_lenient(&inbound.headers, &inbound.body);
        tracing::info!(host = ?host, id = ?event.id(), kind = ?entry.kind(), "Receiving event");

        Ok(match decide(entry, &event, case_number, &self.env) {
            Decision::Forward => Outcome::Forward,
            Decision::Suppress => Outcome::Suppress,
            Decision::Failed(message) => {
                tracing::warn!(host = ?host, error = %message, "Expression evaluation failed");
                Outcome::EvaluationFailed(message)
            }
        })
    }
}

/// `caseNumber` binding for a path segment; anything but a non-negative integer is NaN.
fn parse_case(segment: Option<&str>) -> f64 {
    segment
        .and_then(|s| s.parse::<u32>().ok())
        .map(f64::from)
        .unwrap_or(f64::NAN)
}

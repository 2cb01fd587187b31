//! Response translation.
//!
//! # Responsibilities
//! - Turn a dispatch Outcome into an HTTP response
//! - Echo the request headers for forwarded and failed filter/switch events
//! - Encode handler replies as CloudEvents
//!
//! # Design Decisions
//! - Hop-by-hop and framing headers are never echoed
//! - Handler replies carry only their own `ce-*` headers

use axum::body::Body;
use axum::http::header::{self, HeaderMap, HeaderName};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::dispatch::{Inbound, Outcome};
use crate::event::{self, Event};

/// False for headers that describe the inbound connection or body framing.
fn is_echoed(name: &HeaderName) -> bool {
    !matches!(
        name.as_str(),
        "host"
            | "content-length"
            | "transfer-encoding"
            | "connection"
            | "keep-alive"
            | "upgrade"
            | "te"
            | "trailer"
            | "proxy-authenticate"
            | "proxy-authorization"
            | "proxy-connection"
    )
}

/// Copy the request headers that may be echoed onto a response.
pub fn echo_headers(request: &HeaderMap, response: &mut HeaderMap) {
    for (name, value) in request {
        if is_echoed(name) {
            response.append(name.clone(), value.clone());
        }
    }
}

/// Success with the request's headers and body.
pub fn forward(inbound: &Inbound) -> Response {
    let mut response = Response::new(Body::from(inbound.body.clone()));
    echo_headers(&inbound.headers, response.headers_mut());
    response
}

/// Success with an empty body.
pub fn suppressed() -> Response {
    StatusCode::OK.into_response()
}

/// Success carrying `{"error": message}` plus the request headers.
pub fn evaluation_failed(inbound: &Inbound, message: &str) -> Response {
    let mut response = Json(json!({ "error": message })).into_response();
    let content_type = response.headers().get(header::CONTENT_TYPE).cloned();
    echo_headers(&inbound.headers, response.headers_mut());
    if let Some(content_type) = content_type {
        response.headers_mut().insert(header::CONTENT_TYPE, content_type);
    }
    response
}

/// Success with a handler reply, or empty when there is none.
pub fn event_response(reply: Option<&Event>) -> Response {
    let Some(reply) = reply else {
        return suppressed();
    };
    let encoded = event::encode(reply);
    let mut response = Response::new(Body::from(encoded.body));
    *response.headers_mut() = encoded.headers;
    response
}

/// Map an outcome to its response.
pub fn translate(outcome: &Outcome, inbound: &Inbound) -> Response {
    match outcome {
        Outcome::Forward => forward(inbound),
        Outcome::Suppress => suppressed(),
        Outcome::EvaluationFailed(message) => evaluation_failed(inbound, message),
        Outcome::Reply(reply) => event_response(reply.as_ref()),
    }
}

//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Method, Request, StatusCode};
use axum::Router;
use tokio::net::TcpListener;
use tower::ServiceExt;

use cloudevents_gateway::config::GatewayConfig;
use cloudevents_gateway::dispatch::{Gateway, Mode};
use cloudevents_gateway::event::Event;
use cloudevents_gateway::handler::{Context, Handler, HandlerError};
use cloudevents_gateway::http::HttpServer;

/// A response, fully read.
pub struct Reply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Reply {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Router for a gateway with default settings and an empty `env`.
pub fn router(mode: Mode) -> Router {
    HttpServer::new(&GatewayConfig::default(), Gateway::with_env(mode, Vec::new())).router()
}

/// Build a request with the given method, URI, headers and body.
pub fn request(method: Method, uri: &str, headers: &[(&str, &str)], body: &str) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// POST `body` to `uri` and read the whole response.
pub async fn post(router: &Router, uri: &str, headers: &[(&str, &str)], body: &str) -> Reply {
    send(router, request(Method::POST, uri, headers, body)).await
}

pub async fn send(router: &Router, request: Request<Body>) -> Reply {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    Reply { status, headers, body }
}

/// A handler that counts its calls and tags the reply with `ce-handledby`.
pub fn counting_handler(name: &'static str, calls: Arc<AtomicUsize>) -> Arc<dyn Handler> {
    Arc::new(move |_ctx: Context, event: Event| {
        let calls = calls.clone();
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, HandlerError>(Some(event.with_attribute("handledby", name)))
        }
    })
}

/// An address on loopback that nothing is listening on.
pub async fn unused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Write `content` to a fresh file in the temp directory.
pub fn temp_file(name: &str, content: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("cloudevents-gateway-{}-{}", std::process::id(), name));
    std::fs::write(&path, content).unwrap();
    path
}

//! User-supplied event handlers for the function proxy.
//!
//! # Data Flow
//! ```text
//! request path
//!     → HandlerRef::from_path (root path, or first path segment)
//!     → Handlers::get (single handler or named table)
//!     → Handler::call(Context, Event)
//!     → Option<Event> reply or HandlerError
//! ```
//!
//! # Design Decisions
//! - Handlers are plain async functions; any `Fn(Context, Event) -> Future` qualifies
//! - The handler set is fixed at startup and shared read-only
//! - Each call gets its own Context; only the cache handle is shared

pub mod builtin;

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use serde_json::Value;
use thiserror::Error;

use crate::config::ConfigError;
use crate::event::Event;
use crate::params::ParamMap;
use crate::resource::{Cache, ResourceError};

/// Failure reported by a handler.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The handler rejected the event.
    #[error("{0}")]
    Failed(String),

    /// A shared resource could not be reached.
    #[error(transparent)]
    Resource(#[from] ResourceError),
}

impl HandlerError {
    pub fn failed(message: impl Into<String>) -> Self {
        HandlerError::Failed(message.into())
    }
}

pub type HandlerResult = Result<Option<Event>, HandlerError>;

/// Per-request execution context.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Resolved parameters (defaults, static host parameters, query string).
    pub params: ParamMap,

    /// Shared cache, when one is configured.
    pub cache: Option<Arc<dyn Cache>>,
}

impl Context {
    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }

    /// The shared cache, or a handler failure when none is configured.
    pub fn cache(&self) -> Result<&dyn Cache, HandlerError> {
        self.cache
            .as_deref()
            .ok_or_else(|| HandlerError::failed("no cache is configured"))
    }
}

/// An async event handler.
pub trait Handler: Send + Sync {
    fn call(&self, ctx: Context, event: Event) -> BoxFuture<'static, HandlerResult>;
}

impl<F, Fut> Handler for F
where
    F: Fn(Context, Event) -> Fut + Send + Sync,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn call(&self, ctx: Context, event: Event) -> BoxFuture<'static, HandlerResult> {
        Box::pin(self(ctx, event))
    }
}

/// Which handler a request addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerRef {
    /// The only handler of a single-handler deployment.
    Default,

    /// A handler selected by name.
    Named(String),
}

impl HandlerRef {
    /// Single-handler deployments accept only `/`; dispatch deployments take
    /// the first path segment and reject `/`.
    pub fn from_path(path: &str, dispatch: bool) -> Option<Self> {
        if !dispatch {
            return (path == "/").then_some(HandlerRef::Default);
        }
        path.trim_start_matches('/')
            .split('/')
            .next()
            .filter(|segment| !segment.is_empty())
            .map(|segment| HandlerRef::Named(segment.to_string()))
    }
}

/// The handler set a function proxy serves.
#[derive(Clone)]
pub enum Handlers {
    Single(Arc<dyn Handler>),
    Dispatch(HashMap<String, Arc<dyn Handler>>),
}

/// Named handlers available to the binary.
pub type HandlerCatalog = HashMap<String, Arc<dyn Handler>>;

impl Handlers {
    pub fn single(handler: impl Handler + 'static) -> Self {
        Handlers::Single(Arc::new(handler))
    }

    pub fn dispatch<I, S>(handlers: I) -> Self
    where
        I: IntoIterator<Item = (S, Arc<dyn Handler>)>,
        S: Into<String>,
    {
        Handlers::Dispatch(handlers.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Pick handlers from a catalog by name.
    ///
    /// One name without `dispatch` gives a single-handler deployment.
    pub fn select(catalog: &HandlerCatalog, names: &[String], dispatch: bool) -> Result<Self, ConfigError> {
        if names.is_empty() {
            return Err(ConfigError::MissingSetting("HANDLER"));
        }

        let mut selected = HashMap::with_capacity(names.len());
        for name in names {
            let handler = catalog
                .get(name)
                .ok_or_else(|| ConfigError::UnknownHandler(name.clone()))?;
            selected.insert(name.clone(), handler.clone());
        }

        if names.len() == 1 && !dispatch {
            let handler = selected
                .remove(&names[0])
                .ok_or_else(|| ConfigError::UnknownHandler(names[0].clone()))?;
            Ok(Handlers::Single(handler))
        } else {
            Ok(Handlers::Dispatch(selected))
        }
    }

    pub fn is_dispatch(&self) -> bool {
        matches!(self, Handlers::Dispatch(_))
    }

    pub fn get(&self, target: &HandlerRef) -> Option<Arc<dyn Handler>> {
        match (self, target) {
            (Handlers::Single(handler), HandlerRef::Default) => Some(handler.clone()),
            (Handlers::Dispatch(handlers), HandlerRef::Named(name)) => handlers.get(name).cloned(),
            _ => None,
        }
    }

    pub fn names(&self) -> Vec<String> {
        match self {
            Handlers::Single(_) => Vec::new(),
            Handlers::Dispatch(handlers) => {
                let mut names: Vec<_> = handlers.keys().cloned().collect();
                names.sort();
                names
            }
        }
    }
}

impl std::fmt::Debug for Handlers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Handlers::Single(_) => f.write_str("Handlers::Single"),
            Handlers::Dispatch(_) => f.debug_tuple("Handlers::Dispatch").field(&self.names()).finish(),
        }
    }
}

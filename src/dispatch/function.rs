//! Function proxy: invoke a handler with a resolved context.
//!
//! # Responsibilities
//! - Pick the handler from the request path
//! - Reject malformed JSON before any handler runs
//! - Build the per-request Context (parameters + shared cache)
//! - Await the handler and map its failure to a DispatchError

use std::sync::Arc;

use crate::dispatch::{DispatchError, Inbound};
use crate::event::{self, Event};
use crate::handler::{Context, HandlerRef, Handlers};
use crate::params::{self, ParamMap, StaticParams};
use crate::resource::Cache;

#[derive(Debug)]
pub struct FunctionProxy {
    handlers: Handlers,
    defaults: ParamMap,
    static_params: StaticParams,
    cache: Option<Arc<dyn Cache>>,
}

impl FunctionProxy {
    pub fn new(handlers: Handlers) -> Self {
        Self {
            handlers,
            defaults: ParamMap::new(),
            static_params: StaticParams::default(),
            cache: None,
        }
    }

    pub fn with_defaults(mut self, defaults: ParamMap) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn with_static_params(mut self, static_params: StaticParams) -> Self {
        self.static_params = static_params;
        self
    }

    pub fn with_cache(mut self, cache: Arc<dyn Cache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn handlers(&self) -> &Handlers {
        &self.handlers
    }

    /// Context for a request to `host` with the given query string.
    pub fn context(&self, host: Option<&str>, query: Option<&str>) -> Context {
        Context {
            params: params::resolve(&self.defaults, &self.static_params, host, query),
            cache: self.cache.clone(),
        }
    }

    /// Run the addressed handler and return its reply.
    pub async fn invoke(&self, inbound: &Inbound) -> Result<Option<Event>, DispatchError> {
        let target = HandlerRef::from_path(inbound.uri.path(), self.handlers.is_dispatch())
            .ok_or(DispatchError::NoRoute)?;
        let handler = self.handlers.get(&target).ok_or_else(|| {
            tracing::debug!(handler = ?target, "Unknown handler");
            DispatchError::NoRoute
        })?;

        let event = event::decode(&inbound.headers, &inbound.body).map_err(|e| {
            tracing::debug!(error = %e, "Rejecting malformed payload");
            DispatchError::InvalidPayload(e)
        })?;

        let host = inbound.host();
        let ctx = self.context(host.as_deref(), inbound.uri.query());
        tracing::debug!(
            handler = ?target,
            id = ?event.id(),
            params = %params::to_json(&ctx.params),
            "Invoking handler"
        );

        handler.call(ctx, event).await.map_err(|e| {
            tracing::warn!(handler = ?target, error = %e, "Handler failed");
            DispatchError::from(e)
        })
    }
}

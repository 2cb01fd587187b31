//! Handlers shipped with the gateway binary.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::event::Event;
use crate::handler::{Context, Handler, HandlerCatalog, HandlerError, HandlerResult};

/// Every built-in handler, keyed by the name used in `--handler`.
pub fn builtin_catalog() -> HandlerCatalog {
    let mut catalog: HashMap<String, Arc<dyn Handler>> = HashMap::new();
    catalog.insert("echo".to_string(), Arc::new(echo));
    catalog.insert("sleep".to_string(), Arc::new(sleep));
    catalog.insert("dedup".to_string(), Arc::new(dedup));
    catalog
}

/// Return the event unchanged.
pub async fn echo(_ctx: Context, event: Event) -> HandlerResult {
    Ok(Some(event))
}

/// Wait `params.seconds`, then return the event.
pub async fn sleep(ctx: Context, event: Event) -> HandlerResult {
    let seconds = ctx
        .param("seconds")
        .and_then(seconds_param)
        .ok_or_else(|| HandlerError::failed("params.seconds must be a non-negative number"))?;

    let delay = Duration::try_from_secs_f64(seconds)
        .map_err(|e| HandlerError::failed(format!("params.seconds {}: {}", seconds, e)))?;

    tracing::debug!(seconds, "Sleeping before reply");
    tokio::time::sleep(delay).await;
    Ok(Some(event))
}

/// Return the first event seen for each `id`; later duplicates get the stored copy.
pub async fn dedup(ctx: Context, event: Event) -> HandlerResult {
    let cache = ctx.cache()?;
    let id = event
        .id()
        .ok_or_else(|| HandlerError::failed("event has no id attribute"))?
        .to_string();

    if let Some(stored) = cache.get(&id).await? {
        tracing::debug!(id = %id, "Duplicate event");
        let stored: Value =
            serde_json::from_str(&stored).map_err(|e| HandlerError::failed(format!("cached event for {}: {}", id, e)))?;
        let stored = Event::from_json(stored).map_err(|e| HandlerError::failed(e.to_string()))?;
        return Ok(Some(stored));
    }

    cache.set(&id, event.to_json().to_string()).await?;
    Ok(Some(event))
}

fn seconds_param(value: &Value) -> Option<f64> {
    let seconds = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    (seconds.is_finite() && seconds >= 0.0).then_some(seconds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParamMap;
    use crate::resource::MemoryCache;
    use serde_json::json;

    fn context(params: &[(&str, Value)]) -> Context {
        Context {
            params: params
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect::<ParamMap>(),
            cache: None,
        }
    }

    #[test]
    fn test_catalog_names() {
        let catalog = builtin_catalog();
        let mut names: Vec<_> = catalog.keys().cloned().collect();
        names.sort();
        assert_eq!(names, vec!["dedup", "echo", "sleep"]);
    }

    #[tokio::test]
    async fn test_echo() {
        let event = Event::new().with_attribute("type", "t").with_data(json!([1]));
        assert_eq!(echo(Context::default(), event.clone()).await.unwrap(), Some(event));
    }

    #[tokio::test]
    async fn test_sleep_reads_seconds() {
        let event = Event::new().with_attribute("id", "1");
        let reply = sleep(context(&[("seconds", json!("0"))]), event.clone()).await.unwrap();
        assert_eq!(reply, Some(event.clone()));

        assert!(sleep(context(&[]), event.clone()).await.is_err());
        assert!(sleep(context(&[("seconds", json!("soon"))]), event.clone()).await.is_err());
        assert!(sleep(context(&[("seconds", json!(-1))]), event).await.is_err());
    }

    #[tokio::test]
    async fn test_sleep_rejects_unrepresentable_delay() {
        let event = Event::new().with_attribute("id", "1");
        let result = sleep(context(&[("seconds", json!(1e20))]), event).await;
        assert!(matches!(result, Err(HandlerError::Failed(_))));
    }

    #[tokio::test]
    async fn test_dedup_returns_first_copy() {
        let ctx = Context {
            params: ParamMap::new(),
            cache: Some(Arc::new(MemoryCache::new())),
        };

        let first = Event::new().with_attribute("id", "e1").with_data(json!({"n": 1}));
        let second = Event::new().with_attribute("id", "e1").with_data(json!({"n": 2}));

        assert_eq!(dedup(ctx.clone(), first.clone()).await.unwrap(), Some(first.clone()));
        assert_eq!(dedup(ctx, second).await.unwrap(), Some(first));
    }

    #[tokio::test]
    async fn test_dedup_failures() {
        let event = Event::new().with_attribute("id", "e1");
        assert!(matches!(
            dedup(Context::default(), event).await,
            Err(HandlerError::Failed(_))
        ));

        let ctx = Context {
            params: ParamMap::new(),
            cache: Some(Arc::new(MemoryCache::new())),
        };
        assert!(dedup(ctx, Event::new()).await.is_err());
    }
}

//! In-process cache.

use dashmap::DashMap;
use futures_util::future::{self, BoxFuture, FutureExt};

use crate::resource::{Cache, ResourceError};

/// A thread-safe in-memory cache.
#[derive(Debug, Default)]
pub struct MemoryCache {
    inner: DashMap<String, String>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl Cache for MemoryCache {
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<String>, ResourceError>> {
        let value = self.inner.get(key).map(|v| v.value().clone());
        future::ready(Ok(value)).boxed()
    }

    fn set<'a>(&'a self, key: &'a str, value: String) -> BoxFuture<'a, Result<(), ResourceError>> {
        self.inner.insert(key.to_string(), value);
        future::ready(Ok(())).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_set() {
        let cache = MemoryCache::new();
        assert_eq!(cache.get("k").await.unwrap(), None);

        cache.set("k", "v1".to_string()).await.unwrap();
        cache.set("k", "v2".to_string()).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap().as_deref(), Some("v2"));
        assert_eq!(cache.len(), 1);
    }
}

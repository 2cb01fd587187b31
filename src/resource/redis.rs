//! Redis-backed cache.
//!
//! The connection is opened lazily on first use and then shared; a failed
//! attempt is retried on the next request.

use std::fmt;

use futures_util::future::{BoxFuture, FutureExt};
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use tokio::sync::OnceCell;

use crate::resource::{Cache, ResourceError};

pub struct RedisCache {
    client: redis::Client,
    connection: OnceCell<MultiplexedConnection>,
}

impl RedisCache {
    /// Validate the URL; no connection is made yet.
    pub fn open(url: &str) -> Result<Self, ResourceError> {
        let client = redis::Client::open(url).map_err(|e| ResourceError::Connection(e.to_string()))?;
        Ok(Self {
            client,
            connection: OnceCell::new(),
        })
    }

    async fn connection(&self) -> Result<MultiplexedConnection, ResourceError> {
        self.connection
            .get_or_try_init(|| async {
                tracing::debug!("Opening Redis connection");
                self.client.get_multiplexed_async_connection().await
            })
            .await
            .cloned()
            .map_err(|e| {
                tracing::error!(error = %e, "Redis connection failed");
                ResourceError::Connection(e.to_string())
            })
    }
}

impl fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisCache")
            .field("connected", &self.connection.initialized())
            .finish()
    }
}

impl Cache for RedisCache {
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<String>, ResourceError>> {
        async move {
            let mut conn = self.connection().await?;
            conn.get::<_, Option<String>>(key)
                .await
                .map_err(|e| ResourceError::Command(e.to_string()))
        }
        .boxed()
    }

    fn set<'a>(&'a self, key: &'a str, value: String) -> BoxFuture<'a, Result<(), ResourceError>> {
        async move {
            let mut conn = self.connection().await?;
            conn.set::<_, _, ()>(key, value)
                .await
                .map_err(|e| ResourceError::Command(e.to_string()))
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_rejects_bad_url() {
        assert!(RedisCache::open("redis://127.0.0.1/").is_ok());
        assert!(RedisCache::open("not a url").is_err());
    }

    #[tokio::test]
    async fn test_unreachable_server_is_a_resource_error() {
        let cache = RedisCache::open("redis://127.0.0.1:1/").unwrap();
        assert!(matches!(
            cache.get("k").await,
            Err(ResourceError::Connection(_))
        ));
        assert!(!format!("{:?}", cache).contains("true"));
    }
}

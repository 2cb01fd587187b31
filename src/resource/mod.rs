//! Shared resources injected into handler contexts.
//!
//! # Data Flow
//! ```text
//! [cache] url (startup)
//!     → connect() → Arc<dyn Cache> (process singleton)
//!     → cloned into every handler Context
//!     → memory.rs (DashMap) or redis.rs (multiplexed connection)
//! ```
//!
//! # Design Decisions
//! - Resources are created once and shared; no request-level locking
//! - Implementations serialize access internally
//! - Connectivity failures surface as ResourceError, never as panics

pub mod memory;
pub mod redis;

use std::fmt;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use thiserror::Error;

use crate::config::CacheConfig;

pub use self::memory::MemoryCache;
pub use self::redis::RedisCache;

#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("unsupported cache url {0}")]
    UnsupportedUrl(String),

    #[error("cache connection failed: {0}")]
    Connection(String),

    #[error("cache command failed: {0}")]
    Command(String),
}

/// Key-value cache shared by all requests.
pub trait Cache: Send + Sync + fmt::Debug {
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<String>, ResourceError>>;

    fn set<'a>(&'a self, key: &'a str, value: String) -> BoxFuture<'a, Result<(), ResourceError>>;
}

/// Build the cache named by the configuration.
pub fn connect(config: &CacheConfig) -> Result<Arc<dyn Cache>, ResourceError> {
    let url = config.url.as_str();
    if url.starts_with("memory:") {
        tracing::info!("Using in-memory cache");
        Ok(Arc::new(MemoryCache::new()))
    } else if url.starts_with("redis:") || url.starts_with("rediss:") || url.starts_with("redis+unix:") {
        let cache = RedisCache::open(url)?;
        tracing::info!("Using Redis cache");
        Ok(Arc::new(cache))
    } else {
        Err(ResourceError::UnsupportedUrl(config.url.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(url: &str) -> CacheConfig {
        CacheConfig {
            url: url.to_string(),
        }
    }

    #[test]
    fn test_connect_by_scheme() {
        assert!(connect(&config("memory://")).is_ok());
        assert!(connect(&config("redis://127.0.0.1:6379/0")).is_ok());
        assert!(matches!(
            connect(&config("ftp://x")),
            Err(ResourceError::UnsupportedUrl(_))
        ));
    }
}

//! External durable cache seam.
//!
//! The only consumer is the InnoDB stopword set, which is expensive enough to
//! fetch that the host application may want it to survive process restarts.

use std::time::Duration;

use async_trait::async_trait;

/// Namespaced key under which the stopword set is stored.
pub const STOPWORD_CACHE_KEY: &str = "sql-steward:innodb-stopwords";

/// Daily refresh policy for the stopword set.
pub const STOPWORD_CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// A durable key/value cache provided by the host application (memcached,
/// Redis, a file, ...). Implementations own expiry; `set` passes the desired
/// ttl along.
#[async_trait]
pub trait DurableCache: Send + Sync {
    /// Fetch a value, or `None` when absent or expired.
    async fn get(&self, key: &str) -> Option<String>;

    /// Store a value with the given time-to-live.
    async fn set(&self, key: &str, value: &str, ttl: Duration);
}

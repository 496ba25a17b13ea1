//! chirp key-value store capability
//!
//! Narrow command set the timeline strategies are written against:
//! - GET/SET for serialized post bodies
//! - INCR for the global post id counter
//! - LPUSH/LRANGE for timelines, per-user post indices, and adjacency lists
//! - SADD/SMEMBERS for the global user set
//! - FLUSHALL for the destructive loader/setup path
//!
//! Two backends implement the set: `RedisKv` over a shared connection
//! manager, and `MemoryKv` for tests and local runs.

mod error;
mod keys;

pub mod memory;

pub use error::{KvError, KvResult};
pub use keys::StoreKey;
pub use memory::{CommandCounts, MemoryKv};

use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::warn;

/// Shared Redis connection manager
pub type SharedRedis = Arc<Mutex<ConnectionManager>>;

/// Core store operations trait
///
/// Every command is individually atomic on the backend; no multi-command
/// transaction is offered, and none of the consumers expect one.
#[async_trait::async_trait]
pub trait KvStore: Send + Sync {
    /// Get the string value at a key, if present.
    async fn get(&self, key: &str) -> KvResult<Option<String>>;

    /// Set the string value at a key.
    async fn set(&self, key: &str, value: &str) -> KvResult<()>;

    /// Atomically increment the integer at a key, initializing at 0 when the
    /// key is absent. Returns the incremented value.
    async fn incr(&self, key: &str) -> KvResult<i64>;

    /// Prepend a value to the list at a key.
    async fn lpush(&self, key: &str, value: &str) -> KvResult<()>;

    /// Read the inclusive range [start, stop] of the list at a key.
    /// Negative indices count from the end; stop = -1 means "to the end".
    async fn lrange(&self, key: &str, start: i64, stop: i64) -> KvResult<Vec<String>>;

    /// Add a member to the set at a key.
    async fn sadd(&self, key: &str, member: &str) -> KvResult<()>;

    /// Read every member of the set at a key. Order is unspecified.
    async fn smembers(&self, key: &str) -> KvResult<Vec<String>>;

    /// Delete every key in the store. Destructive; only the loader/setup
    /// path calls this.
    async fn flushall(&self) -> KvResult<()>;
}

/// Redis-backed store
#[derive(Clone)]
pub struct RedisKv {
    redis: SharedRedis,
}

impl RedisKv {
    pub fn new(redis: SharedRedis) -> Self {
        Self { redis }
    }

    /// Open a client and connection manager for the given URL.
    pub async fn connect(redis_url: &str) -> KvResult<Self> {
        let client = redis::Client::open(redis_url)?;
        let manager = ConnectionManager::new(client).await?;
        Ok(Self {
            redis: Arc::new(Mutex::new(manager)),
        })
    }
}

#[async_trait::async_trait]
impl KvStore for RedisKv {
    async fn get(&self, key: &str) -> KvResult<Option<String>> {
        let mut conn = self.redis.lock().await;
        let value: Option<String> = conn.get(key).await.map_err(KvError::Redis)?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> KvResult<()> {
        let mut conn = self.redis.lock().await;
        conn.set::<_, _, ()>(key, value)
            .await
            .map_err(KvError::Redis)?;
        Ok(())
    }

    async fn incr(&self, key: &str) -> KvResult<i64> {
        let mut conn = self.redis.lock().await;
        let value: i64 = conn.incr(key, 1).await.map_err(KvError::Redis)?;
        Ok(value)
    }

    async fn lpush(&self, key: &str, value: &str) -> KvResult<()> {
        let mut conn = self.redis.lock().await;
        conn.lpush::<_, _, ()>(key, value)
            .await
            .map_err(KvError::Redis)?;
        Ok(())
    }

    async fn lrange(&self, key: &str, start: i64, stop: i64) -> KvResult<Vec<String>> {
        let mut conn = self.redis.lock().await;
        let values: Vec<String> = conn
            .lrange(key, start as isize, stop as isize)
            .await
            .map_err(KvError::Redis)?;
        Ok(values)
    }

    async fn sadd(&self, key: &str, member: &str) -> KvResult<()> {
        let mut conn = self.redis.lock().await;
        conn.sadd::<_, _, ()>(key, member)
            .await
            .map_err(KvError::Redis)?;
        Ok(())
    }

    async fn smembers(&self, key: &str) -> KvResult<Vec<String>> {
        let mut conn = self.redis.lock().await;
        let members: Vec<String> = conn.smembers(key).await.map_err(KvError::Redis)?;
        Ok(members)
    }

    async fn flushall(&self) -> KvResult<()> {
        warn!("flushing every key in the store");
        let mut conn = self.redis.lock().await;
        redis::cmd("FLUSHALL")
            .query_async::<_, ()>(&mut *conn)
            .await
            .map_err(KvError::Redis)?;
        Ok(())
    }
}

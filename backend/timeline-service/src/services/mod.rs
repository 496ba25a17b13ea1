//! Timeline backends
//!
//! One `TimelineBackend` contract, three strategies:
//! - push: fan-out-on-write, O(followers) per post, O(1) read
//! - pull: fan-out-on-read, O(1) per post, merge + sort at read time
//! - relational: baseline join query, sorting and truncation in the store

mod pull;
mod push;
mod relational;

pub use pull::PullTimeline;
pub use push::PushTimeline;
pub use relational::RelationalTimeline;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::{decode_wire, Post};
use chirp_kv::{KvStore, RedisKv, StoreKey};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, warn};

/// Home timeline contract exposed to the CLI and jobs.
#[async_trait::async_trait]
pub trait TimelineBackend: Send + Sync {
    /// Insert a single post.
    async fn post(&self, author_id: i64, text: &str) -> Result<()>;

    /// Insert multiple posts.
    async fn post_batch(&self, posts: &[(i64, String)]) -> Result<()>;

    /// The up-to-10 most recent posts visible to a user from their
    /// followees, newest first.
    async fn timeline(&self, user_id: i64) -> Result<Vec<Post>>;

    /// Every user id with at least one outgoing follow edge.
    async fn users(&self) -> Result<Vec<i64>>;

    /// Ids that follow the given user.
    async fn followers(&self, user_id: i64) -> Result<Vec<i64>>;

    /// Ids the given user follows.
    async fn followees(&self, user_id: i64) -> Result<Vec<i64>>;
}

/// Timeline generation strategy, selected at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Push,
    Pull,
    Relational,
}

impl FromStr for Strategy {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "push" => Ok(Strategy::Push),
            "pull" => Ok(Strategy::Pull),
            "relational" => Ok(Strategy::Relational),
            other => Err(AppError::Config(format!(
                "unknown timeline strategy: {} (expected push, pull, or relational)",
                other
            ))),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Push => write!(f, "push"),
            Strategy::Pull => write!(f, "pull"),
            Strategy::Relational => write!(f, "relational"),
        }
    }
}

/// Construct the backend named by the configuration.
pub async fn build_backend(config: &Config) -> Result<Arc<dyn TimelineBackend>> {
    match config.strategy {
        Strategy::Push => {
            let store = connect_store(config).await?;
            Ok(Arc::new(PushTimeline::new(store)))
        }
        Strategy::Pull => {
            let store = connect_store(config).await?;
            Ok(Arc::new(PullTimeline::new(store)))
        }
        Strategy::Relational => {
            let pool = connect_relational(config).await?;
            Ok(Arc::new(RelationalTimeline::new(pool)))
        }
    }
}

/// Connect the key-value store used by the push and pull strategies.
pub async fn connect_store(config: &Config) -> Result<RedisKv> {
    let store = RedisKv::connect(&config.redis.url).await?;
    debug!(url = %config.redis.url, "connected to key-value store");
    Ok(store)
}

/// Connect the relational pool used by the baseline strategy.
pub async fn connect_relational(config: &Config) -> Result<PgPool> {
    let url = config.database.url.as_deref().ok_or_else(|| {
        AppError::Config("DATABASE_URL is required for the relational strategy".to_string())
    })?;
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(url)
        .await?;
    debug!("connected to relational store");
    Ok(pool)
}

/// Parse a list of raw id entries, skipping (with a warning) anything that
/// is not an integer.
pub(crate) fn parse_id_list(key: &str, raw: Vec<String>) -> Vec<i64> {
    let mut ids = Vec::with_capacity(raw.len());
    for entry in raw {
        match entry.parse::<i64>() {
            Ok(id) => ids.push(id),
            Err(_) => warn!(key = %key, entry = %entry, "skipping non-integer id entry"),
        }
    }
    ids
}

/// Fetch and decode one post body by its raw id entry.
///
/// Returns `None` (and keeps the caller's loop going) when the id entry is
/// not an integer, the body is missing, or the body does not decode. A
/// reserved id with no stored body is expected after a crash between the
/// counter increment and the body write.
pub(crate) async fn fetch_post<S: KvStore>(store: &S, raw_id: &str) -> Result<Option<Post>> {
    let id = match raw_id.parse::<i64>() {
        Ok(id) => id,
        Err(_) => {
            warn!(entry = %raw_id, "skipping non-integer post id entry");
            return Ok(None);
        }
    };

    let Some(wire) = store.get(&StoreKey::post(id)).await? else {
        debug!(post_id = id, "post body not found");
        return Ok(None);
    };

    match decode_wire(id, &wire) {
        Ok(post) => Ok(Some(post)),
        Err(err) => {
            warn!(post_id = id, error = %err, "skipping undecodable post");
            Ok(None)
        }
    }
}

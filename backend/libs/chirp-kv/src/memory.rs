//! In-memory store backend
//!
//! Implements the same command set as the Redis backend against plain
//! process-local maps, for suites that need a store without a running Redis
//! instance. Each command also bumps a per-command call counter so callers
//! can observe the store traffic a strategy generates.

use crate::{KvError, KvResult, KvStore};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Number of calls issued per store command since the last reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommandCounts {
    pub get: usize,
    pub set: usize,
    pub incr: usize,
    pub lpush: usize,
    pub lrange: usize,
    pub sadd: usize,
    pub smembers: usize,
    pub flushall: usize,
}

#[derive(Default)]
struct Inner {
    strings: HashMap<String, String>,
    // Index 0 is the newest entry: lpush prepends.
    lists: HashMap<String, Vec<String>>,
    sets: HashMap<String, HashSet<String>>,
    counts: CommandCounts,
}

impl Inner {
    fn check_not_list_or_set(&self, key: &str) -> KvResult<()> {
        if self.lists.contains_key(key) || self.sets.contains_key(key) {
            return Err(KvError::WrongType(key.to_string()));
        }
        Ok(())
    }

    fn check_not_string_or_set(&self, key: &str) -> KvResult<()> {
        if self.strings.contains_key(key) || self.sets.contains_key(key) {
            return Err(KvError::WrongType(key.to_string()));
        }
        Ok(())
    }

    fn check_not_string_or_list(&self, key: &str) -> KvResult<()> {
        if self.strings.contains_key(key) || self.lists.contains_key(key) {
            return Err(KvError::WrongType(key.to_string()));
        }
        Ok(())
    }
}

/// Process-local key-value store.
///
/// Cloning yields a handle to the same underlying maps, so a test can keep
/// one handle for inspection while a service owns another.
#[derive(Clone, Default)]
pub struct MemoryKv {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the per-command call counters.
    pub async fn command_counts(&self) -> CommandCounts {
        self.inner.lock().await.counts
    }

    /// Zero the per-command call counters without touching stored data.
    pub async fn reset_command_counts(&self) {
        self.inner.lock().await.counts = CommandCounts::default();
    }
}

/// Resolve an LRANGE-style (start, stop) pair against a list of `len`
/// elements. Negative indices count from the end; out-of-range indices are
/// clamped; an inverted range is empty.
fn resolve_range(len: usize, start: i64, stop: i64) -> Option<(usize, usize)> {
    let len = len as i64;
    let mut start = if start < 0 { len + start } else { start };
    let mut stop = if stop < 0 { len + stop } else { stop };
    if start < 0 {
        start = 0;
    }
    if stop >= len {
        stop = len - 1;
    }
    if start > stop || start >= len || stop < 0 {
        return None;
    }
    Some((start as usize, stop as usize))
}

#[async_trait::async_trait]
impl KvStore for MemoryKv {
    async fn get(&self, key: &str) -> KvResult<Option<String>> {
        let mut inner = self.inner.lock().await;
        inner.counts.get += 1;
        inner.check_not_list_or_set(key)?;
        Ok(inner.strings.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> KvResult<()> {
        let mut inner = self.inner.lock().await;
        inner.counts.set += 1;
        inner.check_not_list_or_set(key)?;
        inner.strings.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn incr(&self, key: &str) -> KvResult<i64> {
        let mut inner = self.inner.lock().await;
        inner.counts.incr += 1;
        inner.check_not_list_or_set(key)?;
        let current = match inner.strings.get(key) {
            Some(raw) => raw
                .parse::<i64>()
                .map_err(|_| KvError::NotInteger(key.to_string()))?,
            None => 0,
        };
        let next = current + 1;
        inner.strings.insert(key.to_string(), next.to_string());
        Ok(next)
    }

    async fn lpush(&self, key: &str, value: &str) -> KvResult<()> {
        let mut inner = self.inner.lock().await;
        inner.counts.lpush += 1;
        inner.check_not_string_or_set(key)?;
        inner
            .lists
            .entry(key.to_string())
            .or_default()
            .insert(0, value.to_string());
        Ok(())
    }

    async fn lrange(&self, key: &str, start: i64, stop: i64) -> KvResult<Vec<String>> {
        let mut inner = self.inner.lock().await;
        inner.counts.lrange += 1;
        inner.check_not_string_or_set(key)?;
        let Some(list) = inner.lists.get(key) else {
            return Ok(Vec::new());
        };
        match resolve_range(list.len(), start, stop) {
            Some((start, stop)) => Ok(list[start..=stop].to_vec()),
            None => Ok(Vec::new()),
        }
    }

    async fn sadd(&self, key: &str, member: &str) -> KvResult<()> {
        let mut inner = self.inner.lock().await;
        inner.counts.sadd += 1;
        inner.check_not_string_or_list(key)?;
        inner
            .sets
            .entry(key.to_string())
            .or_default()
            .insert(member.to_string());
        Ok(())
    }

    async fn smembers(&self, key: &str) -> KvResult<Vec<String>> {
        let mut inner = self.inner.lock().await;
        inner.counts.smembers += 1;
        inner.check_not_string_or_list(key)?;
        Ok(inner
            .sets
            .get(key)
            .map(|members| members.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn flushall(&self) -> KvResult<()> {
        let mut inner = self.inner.lock().await;
        inner.counts.flushall += 1;
        inner.strings.clear();
        inner.lists.clear();
        inner.sets.clear();
        Ok(())
    }
}

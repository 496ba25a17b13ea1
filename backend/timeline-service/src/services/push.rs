//! Push strategy: fan-out-on-write
//!
//! Posting writes the serialized body once, then prepends the new id to
//! every follower's precomputed timeline list. Reading a timeline is a
//! single list fetch; ordering is a write-time invariant, so no sort
//! happens on the read path.

use super::{fetch_post, parse_id_list, TimelineBackend};
use crate::error::Result;
use crate::models::{encode_wire, Post, TIMELINE_PAGE};
use chirp_kv::{KvStore, StoreKey};
use chrono::Utc;
use tracing::debug;

pub struct PushTimeline<S> {
    store: S,
}

impl<S: KvStore> PushTimeline<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

#[async_trait::async_trait]
impl<S: KvStore> TimelineBackend for PushTimeline<S> {
    async fn post(&self, author_id: i64, text: &str) -> Result<()> {
        let wire = encode_wire(author_id, Utc::now(), text);

        // The counter is incremented before the body is stored, so a crash
        // in between leaves a reserved id with no body. Readers treat that
        // as not-found.
        let post_id = self.store.incr(StoreKey::COUNTER).await?;
        self.store.set(&StoreKey::post(post_id), &wire).await?;

        let followers = self.followers(author_id).await?;
        let id_entry = post_id.to_string();
        for follower in &followers {
            self.store
                .lpush(&StoreKey::timeline(*follower), &id_entry)
                .await?;
        }

        debug!(
            post_id = post_id,
            author_id = author_id,
            fan_out = followers.len(),
            "fanned post out to follower timelines"
        );
        Ok(())
    }

    async fn post_batch(&self, posts: &[(i64, String)]) -> Result<()> {
        for (author_id, text) in posts {
            self.post(*author_id, text).await?;
        }
        Ok(())
    }

    async fn timeline(&self, user_id: i64) -> Result<Vec<Post>> {
        let ids = self
            .store
            .lrange(&StoreKey::timeline(user_id), 0, TIMELINE_PAGE as i64 - 1)
            .await?;

        let mut posts = Vec::with_capacity(ids.len());
        for raw_id in &ids {
            if let Some(post) = fetch_post(&self.store, raw_id).await? {
                posts.push(post);
            }
        }
        Ok(posts)
    }

    async fn users(&self) -> Result<Vec<i64>> {
        let members = self.store.smembers(StoreKey::USERS).await?;
        Ok(parse_id_list(StoreKey::USERS, members))
    }

    async fn followers(&self, user_id: i64) -> Result<Vec<i64>> {
        let key = StoreKey::followers(user_id);
        let entries = self.store.lrange(&key, 0, -1).await?;
        Ok(parse_id_list(&key, entries))
    }

    async fn followees(&self, user_id: i64) -> Result<Vec<i64>> {
        let key = StoreKey::following(user_id);
        let entries = self.store.lrange(&key, 0, -1).await?;
        Ok(parse_id_list(&key, entries))
    }
}

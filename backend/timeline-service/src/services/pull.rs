//! Pull strategy: fan-out-on-read
//!
//! Posting appends one entry to the author's own post index, nothing else.
//! Reading gathers the latest page of ids from every followee's index,
//! fetches the candidate bodies, sorts them with the recency ordering, and
//! keeps the first page. The write is O(1) regardless of follower count;
//! the read pays for the merge.

use super::{fetch_post, parse_id_list, TimelineBackend};
use crate::error::Result;
use crate::models::{encode_wire, Post, TIMELINE_PAGE};
use chirp_kv::{KvStore, StoreKey};
use chrono::Utc;
use tracing::debug;

pub struct PullTimeline<S> {
    store: S,
}

impl<S: KvStore> PullTimeline<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

#[async_trait::async_trait]
impl<S: KvStore> TimelineBackend for PullTimeline<S> {
    async fn post(&self, author_id: i64, text: &str) -> Result<()> {
        let wire = encode_wire(author_id, Utc::now(), text);

        let post_id = self.store.incr(StoreKey::COUNTER).await?;
        self.store.set(&StoreKey::post(post_id), &wire).await?;
        self.store
            .lpush(&StoreKey::user_posts(author_id), &post_id.to_string())
            .await?;

        debug!(post_id = post_id, author_id = author_id, "indexed post");
        Ok(())
    }

    async fn post_batch(&self, posts: &[(i64, String)]) -> Result<()> {
        for (author_id, text) in posts {
            self.post(*author_id, text).await?;
        }
        Ok(())
    }

    async fn timeline(&self, user_id: i64) -> Result<Vec<Post>> {
        let followees = self.followees(user_id).await?;

        // Candidate set: the latest page of ids from every followee.
        let mut candidate_ids = Vec::new();
        for followee in &followees {
            let page = self
                .store
                .lrange(
                    &StoreKey::user_posts(*followee),
                    0,
                    TIMELINE_PAGE as i64 - 1,
                )
                .await?;
            candidate_ids.extend(page);
        }

        let mut posts = Vec::with_capacity(candidate_ids.len());
        for raw_id in &candidate_ids {
            if let Some(post) = fetch_post(&self.store, raw_id).await? {
                posts.push(post);
            }
        }

        posts.sort_by(|a, b| a.recency_cmp(b));
        posts.truncate(TIMELINE_PAGE);

        debug!(
            user_id = user_id,
            followees = followees.len(),
            returned = posts.len(),
            "merged timeline on read"
        );
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

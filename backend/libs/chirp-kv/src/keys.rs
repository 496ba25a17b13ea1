//! Persisted key schema
//!
//! All timeline strategies must use these key generators to ensure the
//! push and pull variants can share one store without colliding.

/// Store key builder
pub struct StoreKey;

impl StoreKey {
    /// Global post id counter. Incremented once per posted item.
    pub const COUNTER: &'static str = "currPostID";

    /// Set of every user id with at least one outgoing follow edge.
    pub const USERS: &'static str = "users";

    /// Serialized post body.
    /// Format: post:{post_id}
    pub fn post(post_id: i64) -> String {
        format!("post:{}", post_id)
    }

    /// Precomputed home timeline (push strategy only).
    /// Format: timeline:{user_id}
    pub fn timeline(user_id: i64) -> String {
        format!("timeline:{}", user_id)
    }

    /// Post ids authored by a user, newest first (pull strategy only).
    /// Format: usertweet:{user_id}
    pub fn user_posts(user_id: i64) -> String {
        format!("usertweet:{}", user_id)
    }

    /// Ids the user follows.
    /// Format: following:{user_id}
    pub fn following(user_id: i64) -> String {
        format!("following:{}", user_id)
    }

    /// Ids that follow the user.
    /// Format: followers:{user_id}
    pub fn followers(user_id: i64) -> String {
        format!("followers:{}", user_id)
    }
}

//! Post entity, recency ordering, and the pipe-delimited wire codec shared
//! by the push and pull strategies.

use crate::error::{AppError, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Fixed home-timeline page size.
pub const TIMELINE_PAGE: usize = 10;

/// Textual timestamp format used in the serialized post body.
pub const WIRE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One feed item. Immutable once persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Store-assigned id; -1 until the post is inserted.
    pub id: i64,
    pub author_id: i64,
    /// Assigned at post time; None until then.
    pub created_at: Option<DateTime<Utc>>,
    pub text: String,
}

impl Post {
    /// A not-yet-persisted post.
    pub fn draft(author_id: i64, text: impl Into<String>) -> Self {
        Self {
            id: -1,
            author_id,
            created_at: None,
            text: text.into(),
        }
    }

    /// A persisted or reconstructed post.
    pub fn new(id: i64, author_id: i64, created_at: DateTime<Utc>, text: impl Into<String>) -> Self {
        Self {
            id,
            author_id,
            created_at: Some(created_at),
            text: text.into(),
        }
    }

    /// Recency ordering: `Less` when `self` is more recent than `other`.
    ///
    /// Later timestamp first; equal timestamps order by higher id first.
    /// A post with no timestamp sorts after any post with one.
    pub fn recency_cmp(&self, other: &Post) -> Ordering {
        other
            .created_at
            .cmp(&self.created_at)
            .then_with(|| other.id.cmp(&self.id))
    }
}

/// Serialize a post body as `author_id|yyyy-MM-dd HH:mm:ss|text`.
pub fn encode_wire(author_id: i64, created_at: DateTime<Utc>, text: &str) -> String {
    format!(
        "{}|{}|{}",
        author_id,
        created_at.format(WIRE_TIMESTAMP_FORMAT),
        text
    )
}

/// Parse a serialized post body back into a `Post`.
///
/// Splits into at most 3 fields so text containing the delimiter is kept
/// intact. A missing field, non-integer author id, or unparseable timestamp
/// is a malformed record.
pub fn decode_wire(id: i64, raw: &str) -> Result<Post> {
    let mut fields = raw.splitn(3, '|');

    let author = fields
        .next()
        .ok_or_else(|| AppError::MalformedRecord(format!("post {} has an empty body", id)))?;
    let author_id = author.parse::<i64>().map_err(|_| {
        AppError::MalformedRecord(format!("post {} has a non-integer author id: {}", id, author))
    })?;

    let timestamp = fields
        .next()
        .ok_or_else(|| AppError::MalformedRecord(format!("post {} is missing a timestamp", id)))?;
    let created_at = NaiveDateTime::parse_from_str(timestamp, WIRE_TIMESTAMP_FORMAT)
        .map_err(|err| {
            AppError::MalformedRecord(format!(
                "could not parse the post timestamp: {}: {}",
                timestamp, err
            ))
        })?
        .and_utc();

    let text = fields
        .next()
        .ok_or_else(|| AppError::MalformedRecord(format!("post {} is missing its text", id)))?;

    Ok(Post::new(id, author_id, created_at, text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(secs: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 17, 12, 30, secs).unwrap()
    }

    #[test]
    fn test_draft_has_no_identity() {
        let post = Post::draft(3, "hello");
        assert_eq!(post.id, -1);
        assert_eq!(post.created_at, None);
    }

    #[test]
    fn test_recency_orders_newest_first() {
        let older = Post::new(1, 5, ts(10), "older");
        let newer = Post::new(2, 5, ts(20), "newer");
        assert_eq!(newer.recency_cmp(&older), Ordering::Less);
        assert_eq!(older.recency_cmp(&newer), Ordering::Greater);
    }

    #[test]
    fn test_recency_breaks_ties_by_higher_id() {
        let first = Post::new(1, 5, ts(10), "first");
        let second = Post::new(2, 5, ts(10), "second");
        assert_eq!(second.recency_cmp(&first), Ordering::Less);
        assert_eq!(first.recency_cmp(&second), Ordering::Greater);
        assert_eq!(first.recency_cmp(&first), Ordering::Equal);
    }

    #[test]
    fn test_recency_is_a_strict_total_order_over_distinct_pairs() {
        let posts = [
            Post::new(1, 5, ts(10), ""),
            Post::new(2, 5, ts(10), ""),
            Post::new(3, 5, ts(20), ""),
        ];
        for a in &posts {
            for b in &posts {
                if a.id == b.id {
                    continue;
                }
                let forward = a.recency_cmp(b);
                let backward = b.recency_cmp(a);
                assert_ne!(forward, Ordering::Equal);
                assert_eq!(forward, backward.reverse());
            }
        }
    }

    #[test]
    fn test_missing_timestamp_sorts_last() {
        let persisted = Post::new(1, 5, ts(10), "persisted");
        let draft = Post::draft(5, "draft");
        assert_eq!(persisted.recency_cmp(&draft), Ordering::Less);
    }

    #[test]
    fn test_wire_round_trip() {
        let created_at = ts(42);
        let wire = encode_wire(7, created_at, "morning all");
        assert_eq!(wire, "7|2024-05-17 12:30:42|morning all");

        let post = decode_wire(99, &wire).unwrap();
        assert_eq!(post.id, 99);
        assert_eq!(post.author_id, 7);
        assert_eq!(post.created_at, Some(created_at));
        assert_eq!(post.text, "morning all");
    }

    #[test]
    fn test_wire_round_trip_preserves_delimiter_in_text() {
        let created_at = ts(0);
        let wire = encode_wire(7, created_at, "a|b|c");
        let post = decode_wire(1, &wire).unwrap();
        assert_eq!(post.text, "a|b|c");
    }

    #[test]
    fn test_wire_round_trip_empty_text() {
        let wire = encode_wire(7, ts(0), "");
        let post = decode_wire(1, &wire).unwrap();
        assert_eq!(post.text, "");
    }

    #[test]
    fn test_decode_rejects_bad_timestamp() {
        assert!(decode_wire(1, "7|not a timestamp|hello").is_err());
    }

    #[test]
    fn test_decode_rejects_missing_fields() {
        assert!(decode_wire(1, "7|2024-05-17 12:30:42").is_err());
        assert!(decode_wire(1, "not an id|2024-05-17 12:30:42|hello").is_err());
    }
}

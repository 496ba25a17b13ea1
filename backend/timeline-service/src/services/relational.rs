//! Relational strategy: baseline join query over a normalized schema
//!
//! Ids and timestamps are assigned by the store (BIGSERIAL + server clock),
//! the timeline is a single join ordered and truncated inside the store, and
//! batch inserts compose one multi-row parameterized statement instead of a
//! round trip per row. Query failures are logged with the failing statement
//! and degrade to an empty result, matching the other strategies'
//! best-effort read semantics.

use super::TimelineBackend;
use crate::error::Result;
use crate::models::Post;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{debug, error, info};

const TIMELINE_SQL: &str = "SELECT p.id, p.author_id, p.created_at, p.text \
     FROM follows f \
     JOIN posts p ON p.author_id = f.followee_id \
     WHERE f.follower_id = $1 \
     ORDER BY p.created_at DESC, p.id DESC \
     LIMIT 10";

const USERS_SQL: &str = "SELECT DISTINCT follower_id FROM follows";

const POST_SQL: &str = "INSERT INTO posts (author_id, text) VALUES ($1, $2)";

// Postgres caps bind parameters at 65535 per statement; two per row leaves
// plenty of headroom at this chunk size.
const INSERT_CHUNK: usize = 1000;

pub struct RelationalTimeline {
    pool: PgPool,
}

impl RelationalTimeline {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the `follows` and `posts` tables if they do not exist.
    /// Setup path only.
    pub async fn ensure_schema(&self) -> Result<()> {
        let statements = [
            "CREATE TABLE IF NOT EXISTS follows (
                follower_id BIGINT NOT NULL,
                followee_id BIGINT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )",
            "CREATE INDEX IF NOT EXISTS idx_follows_follower ON follows (follower_id)",
            "CREATE TABLE IF NOT EXISTS posts (
                id BIGSERIAL PRIMARY KEY,
                author_id BIGINT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                text TEXT NOT NULL
            )",
            "CREATE INDEX IF NOT EXISTS idx_posts_author ON posts (author_id)",
        ];
        for statement in statements {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        debug!("ensured relational schema");
        Ok(())
    }

    /// Drop all rows and restart the post id sequence. Destructive; setup
    /// path only.
    pub async fn clear(&self) -> Result<()> {
        sqlx::query("TRUNCATE follows, posts RESTART IDENTITY")
            .execute(&self.pool)
            .await?;
        info!("cleared relational tables");
        Ok(())
    }

    /// Bulk-load follow edges with chunked multi-row inserts. Mirrors the
    /// key-value loader so the strategies can be compared on one dataset.
    pub async fn load_follows(&self, edges: &[(i64, i64)]) -> Result<usize> {
        for chunk in edges.chunks(INSERT_CHUNK) {
            let sql = multi_row_insert("follows (follower_id, followee_id)", chunk.len(), 2);
            let mut query = sqlx::query(&sql);
            for (follower_id, followee_id) in chunk {
                query = query.bind(*follower_id).bind(*followee_id);
            }
            query.execute(&self.pool).await?;
        }
        info!(edges = edges.len(), "loaded follow edges");
        Ok(edges.len())
    }
}

/// Compose `INSERT INTO <target> VALUES ($1, $2), ($3, $4), ...` with one
/// numbered placeholder tuple per row.
fn multi_row_insert(target: &str, rows: usize, columns: usize) -> String {
    let mut sql = format!("INSERT INTO {} VALUES ", target);
    for row in 0..rows {
        if row > 0 {
            sql.push_str(", ");
        }
        sql.push('(');
        for column in 0..columns {
            if column > 0 {
                sql.push_str(", ");
            }
            sql.push('$');
            sql.push_str(&(row * columns + column + 1).to_string());
        }
        sql.push(')');
    }
    sql
}

#[async_trait::async_trait]
impl TimelineBackend for RelationalTimeline {
    async fn post(&self, author_id: i64, text: &str) -> Result<()> {
        if let Err(err) = sqlx::query(POST_SQL)
            .bind(author_id)
            .bind(text)
            .execute(&self.pool)
            .await
        {
            error!(statement = POST_SQL, error = %err, "could not execute insert");
        }
        Ok(())
    }

    async fn post_batch(&self, posts: &[(i64, String)]) -> Result<()> {
        if posts.is_empty() {
            return Ok(());
        }
        for chunk in posts.chunks(INSERT_CHUNK) {
            let sql = multi_row_insert("posts (author_id, text)", chunk.len(), 2);
            let mut query = sqlx::query(&sql);
            for (author_id, text) in chunk {
                query = query.bind(*author_id).bind(text.as_str());
            }
            if let Err(err) = query.execute(&self.pool).await {
                error!(statement = %sql, error = %err, "could not execute batch insert");
            }
        }
        Ok(())
    }

    async fn timeline(&self, user_id: i64) -> Result<Vec<Post>> {
        let rows: Vec<(i64, i64, DateTime<Utc>, String)> = match sqlx::query_as(TIMELINE_SQL)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
        {
            Ok(rows) => rows,
            Err(err) => {
                error!(statement = TIMELINE_SQL, error = %err, "could not execute query");
                return Ok(Vec::new());
            }
        };

        Ok(rows
            .into_iter()
            .map(|(id, author_id, created_at, text)| Post::new(id, author_id, created_at, text))
            .collect())
    }

    async fn users(&self) -> Result<Vec<i64>> {
        match sqlx::query_scalar(USERS_SQL).fetch_all(&self.pool).await {
            Ok(users) => Ok(users),
            Err(err) => {
                error!(statement = USERS_SQL, error = %err, "could not execute query");
                Ok(Vec::new())
            }
        }
    }

    // No reverse-adjacency table is modeled for this strategy, so follower
    // and followee lookups report empty rather than failing.

    async fn followers(&self, user_id: i64) -> Result<Vec<i64>> {
        debug!(
            user_id = user_id,
            "follower lookup is not modeled for the relational strategy"
        );
        Ok(Vec::new())
    }

    async fn followees(&self, user_id: i64) -> Result<Vec<i64>> {
        debug!(
            user_id = user_id,
            "followee lookup is not modeled for the relational strategy"
        );
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multi_row_insert_single_row() {
        assert_eq!(
            multi_row_insert("posts (author_id, text)", 1, 2),
            "INSERT INTO posts (author_id, text) VALUES ($1, $2)"
        );
    }

    #[test]
    fn test_multi_row_insert_numbers_placeholders_across_rows() {
        assert_eq!(
            multi_row_insert("follows (follower_id, followee_id)", 3, 2),
            "INSERT INTO follows (follower_id, followee_id) VALUES \
             ($1, $2), ($3, $4), ($5, $6)"
        );
    }

    #[test]
    fn test_timeline_sql_orders_and_truncates_in_store() {
        assert!(TIMELINE_SQL.contains("ORDER BY p.created_at DESC, p.id DESC"));
        assert!(TIMELINE_SQL.contains("LIMIT 10"));
        // Parameterized, never spliced.
        assert!(TIMELINE_SQL.contains("$1"));
    }
}

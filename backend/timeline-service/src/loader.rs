//! Social graph loader
//!
//! One-shot bulk load of the follow graph into the key-value store. For
//! every edge (source, followed) it writes both adjacency directions and
//! records the source in the global user set. The load is not idempotent:
//! running it twice without a reset duplicates every edge, so the setup
//! path clears the store first and re-seeds the post id counter.

use crate::error::{AppError, Result};
use chirp_kv::{KvStore, StoreKey};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{info, warn};

/// Clear the store and reset the global post id counter to 0, the baseline
/// push/pull id assignment starts from. Destructive.
pub async fn reset<S: KvStore>(store: &S) -> Result<()> {
    store.flushall().await?;
    store.set(StoreKey::COUNTER, "0").await?;
    info!("cleared store and reset the post id counter");
    Ok(())
}

/// Apply follow edges to the store. Both adjacency directions are written
/// per edge; duplicate input edges produce duplicate entries.
pub async fn load_follows<S, I>(store: &S, edges: I) -> Result<usize>
where
    S: KvStore,
    I: IntoIterator<Item = (i64, i64)>,
{
    let mut applied = 0;
    for (source, followed) in edges {
        store
            .lpush(&StoreKey::following(source), &followed.to_string())
            .await?;
        store
            .lpush(&StoreKey::followers(followed), &source.to_string())
            .await?;
        store.sadd(StoreKey::USERS, &source.to_string()).await?;
        applied += 1;
    }
    info!(edges = applied, "loaded social graph");
    Ok(applied)
}

/// Read `(source, followed)` edges from a CSV file. The header row is
/// skipped; malformed rows are logged and skipped.
pub fn read_edge_file(path: &Path) -> Result<Vec<(i64, i64)>> {
    let file = File::open(path).map_err(|err| {
        AppError::Config(format!("could not open file {}: {}", path.display(), err))
    })?;
    let mut edges = Vec::new();
    for line in BufReader::new(file).lines().skip(1) {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let mut columns = line.splitn(2, ',');
        let source = columns.next().unwrap_or_default().trim();
        let followed = columns.next().unwrap_or_default().trim();
        match (source.parse::<i64>(), followed.parse::<i64>()) {
            (Ok(source), Ok(followed)) => edges.push((source, followed)),
            _ => warn!(row = %line, "skipping malformed follow row"),
        }
    }
    Ok(edges)
}

/// Read `(user_id, text)` post rows from a CSV file. The header row is
/// skipped; a row with no text column posts empty text; text keeps any
/// commas past the first. Malformed rows are logged and skipped.
pub fn read_post_file(path: &Path) -> Result<Vec<(i64, String)>> {
    let file = File::open(path).map_err(|err| {
        AppError::Config(format!("could not open file {}: {}", path.display(), err))
    })?;
    let mut posts = Vec::new();
    for line in BufReader::new(file).lines().skip(1) {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let mut columns = line.splitn(2, ',');
        let user = columns.next().unwrap_or_default().trim();
        let text = columns.next().unwrap_or_default();
        match user.parse::<i64>() {
            Ok(user_id) => posts.push((user_id, text.to_string())),
            Err(_) => warn!(row = %line, "skipping malformed post row"),
        }
    }
    Ok(posts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn temp_file(name: &str, contents: &str) -> std::path::PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("chirp-loader-{}-{}.csv", std::process::id(), name));
        let mut file = File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_read_edge_file_skips_header_and_garbage() {
        let path = temp_file("edges", "user_id,follows_id\n1,2\nbogus,3\n2,3\n");
        let edges = read_edge_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(edges, vec![(1, 2), (2, 3)]);
    }

    #[test]
    fn test_read_post_file_keeps_commas_in_text() {
        let path = temp_file("posts", "user_id,tweet_text\n1,hello, world\n2\n");
        let posts = read_post_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(
            posts,
            vec![(1, "hello, world".to_string()), (2, String::new())]
        );
    }

    #[test]
    fn test_read_edge_file_missing_file_is_a_config_error() {
        let missing = Path::new("/definitely/not/here.csv");
        assert!(matches!(
            read_edge_file(missing),
            Err(AppError::Config(_))
        ));
    }
}

//! Post ingest job
//!
//! Feeds a batch of posts through the configured backend one at a time and
//! reports insert throughput along the way.

use crate::error::Result;
use crate::services::TimelineBackend;
use std::time::{Duration, Instant};
use tracing::info;

/// Progress is logged every this many inserts.
const PROGRESS_EVERY: usize = 50_000;

#[derive(Debug, Clone, Copy)]
pub struct IngestSummary {
    pub inserted: usize,
    pub elapsed: Duration,
}

impl IngestSummary {
    /// Inserts per second over the whole run.
    pub fn rate(&self) -> f64 {
        if self.elapsed.as_secs_f64() == 0.0 {
            return 0.0;
        }
        self.inserted as f64 / self.elapsed.as_secs_f64()
    }
}

pub async fn run(backend: &dyn TimelineBackend, posts: &[(i64, String)]) -> Result<IngestSummary> {
    let started = Instant::now();
    let mut inserted = 0;

    for (author_id, text) in posts {
        backend.post(*author_id, text).await?;
        inserted += 1;

        if inserted % PROGRESS_EVERY == 0 {
            let secs = started.elapsed().as_secs_f64();
            info!(
                inserted = inserted,
                elapsed_secs = secs,
                rate = inserted as f64 / secs,
                "ingest progress"
            );
        }
    }

    let summary = IngestSummary {
        inserted,
        elapsed: started.elapsed(),
    };
    info!(
        inserted = summary.inserted,
        elapsed_secs = summary.elapsed.as_secs_f64(),
        rate = summary.rate(),
        "ingest complete"
    );
    Ok(summary)
}

//! Timeline retrieval job
//!
//! Fetches the user set once, then retrieves home timelines for uniformly
//! random users, reporting retrieval throughput along the way.

use crate::error::{AppError, Result};
use crate::services::TimelineBackend;
use rand::Rng;
use std::time::{Duration, Instant};
use tracing::info;

/// Progress is logged every this many retrievals.
const PROGRESS_EVERY: usize = 10_000;

#[derive(Debug, Clone, Copy, Default)]
pub struct RetrievalSummary {
    pub retrieved: usize,
    pub elapsed: Duration,
}

impl RetrievalSummary {
    /// Timelines per second over the whole run.
    pub fn rate(&self) -> f64 {
        if self.elapsed.as_secs_f64() == 0.0 {
            return 0.0;
        }
        self.retrieved as f64 / self.elapsed.as_secs_f64()
    }
}

pub async fn run(backend: &dyn TimelineBackend, iterations: usize) -> Result<RetrievalSummary> {
    if iterations == 0 {
        return Ok(RetrievalSummary::default());
    }

    let users = backend.users().await?;
    if users.is_empty() {
        return Err(AppError::EmptyGraph);
    }

    let mut rng = rand::thread_rng();
    let started = Instant::now();

    for retrieved in 1..=iterations {
        let user_id = users[rng.gen_range(0..users.len())];
        backend.timeline(user_id).await?;

        if retrieved % PROGRESS_EVERY == 0 {
            let secs = started.elapsed().as_secs_f64();
            info!(
                retrieved = retrieved,
                elapsed_secs = secs,
                rate = retrieved as f64 / secs,
                "retrieval progress"
            );
        }
    }

    let summary = RetrievalSummary {
        retrieved: iterations,
        elapsed: started.elapsed(),
    };
    info!(
        retrieved = summary.retrieved,
        elapsed_secs = summary.elapsed.as_secs_f64(),
        rate = summary.rate(),
        "retrieval complete"
    );
    Ok(summary)
}

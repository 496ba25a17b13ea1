//! Service error types
//!
//! Connectivity failures are fatal on the driver path; everything else
//! degrades at the service boundary (skipped record or empty result).

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("store error: {0}")]
    Store(#[from] chirp_kv::KvError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed record: {0}")]
    MalformedRecord(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("no users loaded in the social graph")]
    EmptyGraph,
}

pub type Result<T> = std::result::Result<T, AppError>;

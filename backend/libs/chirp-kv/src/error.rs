//! Store error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum KvError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("operation against a key holding the wrong kind of value: {0}")]
    WrongType(String),

    #[error("value at {0} is not an integer")]
    NotInteger(String),
}

pub type KvResult<T> = Result<T, KvError>;

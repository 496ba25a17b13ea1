pub mod config;
pub mod error;
pub mod jobs;
pub mod loader;
pub mod models;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result};
pub use models::Post;
pub use services::{Strategy, TimelineBackend};

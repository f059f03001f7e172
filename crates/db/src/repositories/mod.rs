use chrono::{DateTime, Utc};
use thiserror::Error;

use claimflow_core::errors::StoreError;

pub mod audit;
pub mod claim;
pub mod directory;
pub mod memory;
pub mod notification;

pub use audit::SqlAuditLog;
pub use claim::SqlClaimStore;
pub use directory::SqlDirectory;
pub use memory::{InMemoryClaimStore, InMemoryDirectory, InMemoryNotificationSink};
pub use notification::SqlNotificationSink;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

impl From<RepositoryError> for StoreError {
    fn from(error: RepositoryError) -> Self {
        StoreError::unavailable("database", error.to_string())
    }
}

fn decode<E: std::fmt::Display>(error: E) -> RepositoryError {
    RepositoryError::Decode(error.to_string())
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(value).map(|dt| dt.with_timezone(&Utc)).map_err(decode)
}

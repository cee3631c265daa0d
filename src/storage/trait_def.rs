use crate::ratings::RatingEntry;
use async_trait::async_trait;
use thiserror::Error;

/// Failures of an external rating store.
///
/// These never reach API callers: the in-memory aggregator stays the source
/// of truth and a failing store only degrades durability.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("rating store request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("rating store responded with status {0}")]
    Status(reqwest::StatusCode),
    #[error("rating store unavailable")]
    Unavailable,
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait RatingStore: Send + Sync {
    /// Best-effort durable write of one accepted entry
    async fn persist(&self, entry: &RatingEntry) -> StoreResult<()>;

    /// Everything previously persisted, used to warm the cache at startup
    async fn load_all(&self) -> StoreResult<Vec<RatingEntry>>;
}

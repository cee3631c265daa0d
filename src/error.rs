use thiserror::Error;

/// Errors a caller of the core can observe.
///
/// Read paths never produce these; only write paths validate input and
/// moderate content.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// The free-text part of a submission tripped the content filter.
    #[error("content rejected by moderation policy")]
    ContentRejected,
    /// A required field was missing or out of range.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

pub type CoreResult<T> = Result<T, CoreError>;

//! User ratings
//!
//! Each submission scores four categories from 0 to 5 and may carry a
//! comment. Comments pass through the content filter before anything is
//! stored. The aggregate average is cached for a bounded time window.

pub mod aggregator;
pub mod models;

pub use aggregator::{Accepted, RatingAggregator, DEFAULT_CACHE_TTL, DEFAULT_EDIT_WINDOW};
pub use models::{
    RatingEntry, RatingScores, RatingSnapshot, RatingSubmission, SubmitRatingRequest,
    SubmitReceipt,
};

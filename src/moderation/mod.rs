//! Free-text moderation
//!
//! Comments are checked before anything reaches the rating store. The word
//! list and patterns are data (`FilterPolicy`); `ContentFilter` only knows
//! the algorithm.

pub mod filter;
pub mod policy;

pub use filter::{ContentFilter, FilterError, Verdict};
pub use policy::FilterPolicy;

pub mod memory;
pub mod trait_def;
pub mod webhook;

pub use memory::MemoryRatingStore;
pub use trait_def::{RatingStore, StoreError, StoreResult};
pub use webhook::WebhookRatingStore;

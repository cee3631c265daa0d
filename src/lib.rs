pub mod analytics;
pub mod api;
pub mod config;
pub mod error;
pub mod likes;
pub mod moderation;
pub mod ratings;
pub mod storage;

mod beacon;

pub use beacon::{Beacon, PingReport};
pub use error::{CoreError, CoreResult};

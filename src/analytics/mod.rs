//! Visitor analytics
//!
//! Tracks who is online right now (`SessionTracker`) and how many distinct
//! visitors and pings each calendar day has seen (`VisitLedger`). Everything
//! lives in process memory and starts empty on every restart; the "at least
//! one" floors in the reported figures hide that cold start from visitors.

pub mod identity;
pub mod ledger;
pub mod models;
pub mod sessions;

pub use identity::{derive_identity, resolve_identity};
pub use ledger::VisitLedger;
pub use models::{day_of, DayCounts, LedgerSnapshot, PingOutcome, Session, StatsSnapshot, VisitOutcome};
pub use sessions::{SessionTracker, DEFAULT_SESSION_TIMEOUT};

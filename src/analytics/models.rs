//! Data models for visitor analytics

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

/// A currently-or-recently-seen visitor
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Opaque visitor identity
    pub identity: String,

    /// Set when the session is created, never overwritten
    pub first_seen: DateTime<Utc>,

    /// Overwritten on every ping
    pub last_seen: DateTime<Utc>,
}

/// Result of recording a ping against the session tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PingOutcome {
    pub is_new_session: bool,
}

/// Result of recording a visit against the day ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisitOutcome {
    /// First ping from this identity on the given day
    pub is_new_today: bool,

    /// First ping from this identity since the process started
    pub is_new_all_time: bool,
}

/// Counters for a single calendar day
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayCounts {
    pub unique_count: u64,
    pub total_pings: u64,
}

/// Aggregate ledger figures, floors already applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerSnapshot {
    pub today: u64,
    pub all_time: u64,
    pub total_visits: u64,
    /// True distinct-identity count across all days (no floor)
    pub distinct_visitors: u64,
}

/// What `getStats` reports
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    pub online: u64,
    pub today: u64,
    /// Sum of daily uniques across every day this process has seen
    #[serde(rename = "total")]
    pub all_time: u64,
    pub total_visits: u64,
    pub distinct_visitors: u64,
    pub updated: DateTime<Utc>,
}

/// Canonical calendar day for a timestamp.
///
/// Always the UTC date, independent of the host's local timezone.
pub fn day_of(at: DateTime<Utc>) -> NaiveDate {
    at.date_naive()
}

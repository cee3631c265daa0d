//! Per-day unique visitor and ping counters
//!
//! Day records are created lazily and never removed for the lifetime of the
//! process. The unique check and both counter increments for a day happen
//! under that day's shard lock.

use chrono::NaiveDate;
use dashmap::{DashMap, DashSet};
use std::collections::HashSet;

use crate::analytics::models::{DayCounts, LedgerSnapshot, VisitOutcome};

#[derive(Debug, Default)]
struct DayRecord {
    visitors: HashSet<String>,
    total_pings: u64,
}

impl DayRecord {
    fn counts(&self) -> DayCounts {
        DayCounts {
            unique_count: self.visitors.len() as u64,
            total_pings: self.total_pings,
        }
    }
}

#[derive(Default)]
pub struct VisitLedger {
    days: DashMap<NaiveDate, DayRecord>,
    /// Every identity ever seen, so "new overall" needs no scan over days
    everyone: DashSet<String>,
}

impl VisitLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attribute one ping from `identity` to `day`.
    pub fn record_visit(&self, identity: &str, day: NaiveDate) -> VisitOutcome {
        let is_new_today = {
            let mut record = self.days.entry(day).or_default();
            record.total_pings += 1;
            record.visitors.insert(identity.to_string())
        };

        let is_new_all_time = is_new_today && self.everyone.insert(identity.to_string());

        VisitOutcome {
            is_new_today,
            is_new_all_time,
        }
    }

    pub fn day_counts(&self, day: NaiveDate) -> Option<DayCounts> {
        self.days.get(&day).map(|record| record.counts())
    }

    /// Aggregate figures as of `today`.
    ///
    /// `all_time` sums daily uniques, so an identity returning on another
    /// day is counted again; `distinct_visitors` is the true distinct count.
    pub fn snapshot(&self, today: NaiveDate) -> LedgerSnapshot {
        let today_unique = self
            .day_counts(today)
            .map(|counts| counts.unique_count)
            .unwrap_or(0);

        let (all_time, total_visits) = self.days.iter().fold((0u64, 0u64), |acc, entry| {
            let counts = entry.value().counts();
            (acc.0 + counts.unique_count, acc.1 + counts.total_pings)
        });

        LedgerSnapshot {
            today: today_unique.max(1),
            all_time: all_time.max(1),
            total_visits,
            distinct_visitors: self.everyone.len() as u64,
        }
    }

    /// Number of day records held
    pub fn days(&self) -> usize {
        self.days.len()
    }
}

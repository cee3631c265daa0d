//! In-memory rating aggregation with a bounded-staleness cache
//!
//! Entries are held in one `RatingBook` behind a mutex; that mutex is the
//! single exclusion domain for "does this identity have an editable entry"
//! and for recomputing the cache. Readers inside the staleness window only
//! take the cache's read lock and never recompute.

use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::{Mutex, RwLock};
use rand::RngExt;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{CoreError, CoreResult};
use crate::moderation::ContentFilter;
use crate::ratings::models::{RatingEntry, RatingSnapshot, RatingSubmission, SubmitReceipt, MAX_SCORE};

/// Default window during which a resubmission edits instead of appending
pub const DEFAULT_EDIT_WINDOW: TimeDelta = TimeDelta::days(3);

/// Default maximum age of a cached snapshot
pub const DEFAULT_CACHE_TTL: TimeDelta = TimeDelta::minutes(5);

#[derive(Default)]
struct RatingBook {
    entries: Vec<RatingEntry>,
    /// Index of each identity's most recent entry
    latest: HashMap<String, usize>,
}

impl RatingBook {
    fn push(&mut self, entry: RatingEntry) {
        let index = self.entries.len();
        let newer = self
            .latest
            .get(&entry.identity)
            .map_or(true, |&i| self.entries[i].submitted_at <= entry.submitted_at);
        if newer {
            self.latest.insert(entry.identity.clone(), index);
        }
        self.entries.push(entry);
    }
}

/// An accepted submission together with the entry as stored
#[derive(Debug, Clone)]
pub struct Accepted {
    pub receipt: SubmitReceipt,
    pub entry: RatingEntry,
}

pub struct RatingAggregator {
    book: Mutex<RatingBook>,
    cache: RwLock<Option<Arc<RatingSnapshot>>>,
    filter: Arc<ContentFilter>,
    edit_window: TimeDelta,
    cache_ttl: TimeDelta,
}

fn generate_rating_id(now: DateTime<Utc>) -> String {
    let suffix: u32 = rand::rng().random();
    format!("rating_{}_{:08x}", now.timestamp_millis(), suffix)
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

impl RatingAggregator {
    pub fn new(filter: Arc<ContentFilter>, edit_window: TimeDelta, cache_ttl: TimeDelta) -> Self {
        Self {
            book: Mutex::new(RatingBook::default()),
            cache: RwLock::new(None),
            filter,
            edit_window,
            cache_ttl,
        }
    }

    pub fn with_defaults(filter: Arc<ContentFilter>) -> Self {
        Self::new(filter, DEFAULT_EDIT_WINDOW, DEFAULT_CACHE_TTL)
    }

    /// Accept a validated submission.
    ///
    /// The comment is moderated first; a rejected comment leaves every
    /// piece of state untouched.
    pub fn submit(&self, submission: RatingSubmission, now: DateTime<Utc>) -> CoreResult<Accepted> {
        if let Some(comment) = submission.comment.as_deref() {
            let verdict = self.filter.verdict(comment);
            if verdict.is_rejected() {
                debug!(identity = %submission.identity, ?verdict, "rating comment rejected");
                return Err(CoreError::ContentRejected);
            }
        }

        let RatingSubmission {
            identity,
            scores,
            comment,
        } = submission;

        let mut book = self.book.lock();
        let editable = book
            .latest
            .get(&identity)
            .copied()
            .filter(|&i| now - book.entries[i].submitted_at < self.edit_window);

        let (entry, replaced) = match editable {
            Some(index) => {
                let existing = &mut book.entries[index];
                existing.scores = scores;
                existing.comment = comment;
                existing.submitted_at = now;
                (existing.clone(), true)
            }
            None => {
                let entry = RatingEntry {
                    id: generate_rating_id(now),
                    identity,
                    scores,
                    comment,
                    submitted_at: now,
                };
                book.push(entry.clone());
                (entry, false)
            }
        };

        *self.cache.write() = None;
        drop(book);

        debug!(rating_id = %entry.id, replaced, "rating accepted");

        Ok(Accepted {
            receipt: SubmitReceipt {
                rating_id: entry.id.clone(),
                editable_until: now + self.edit_window,
                replaced,
            },
            entry,
        })
    }

    fn fresh(&self, now: DateTime<Utc>) -> Option<Arc<RatingSnapshot>> {
        self.cache
            .read()
            .as_ref()
            .filter(|snapshot| snapshot.computed_at >= now - self.cache_ttl)
            .cloned()
    }

    /// Aggregate over all entries, served from cache while it is fresh.
    pub fn snapshot(&self, now: DateTime<Utc>) -> Arc<RatingSnapshot> {
        if let Some(cached) = self.fresh(now) {
            return cached;
        }

        let book = self.book.lock();

        // Another reader may have recomputed while we waited for the book
        if let Some(cached) = self.fresh(now) {
            return cached;
        }

        let snapshot = Arc::new(Self::compute(&book.entries, now));

        let mut cache = self.cache.write();
        let advances = cache
            .as_ref()
            .map_or(true, |current| current.computed_at <= snapshot.computed_at);
        if advances {
            *cache = Some(Arc::clone(&snapshot));
        }

        debug!(count = snapshot.count, average = snapshot.average, "rating cache recomputed");
        snapshot
    }

    fn compute(entries: &[RatingEntry], now: DateTime<Utc>) -> RatingSnapshot {
        let count = entries.len();
        let average = if count == 0 {
            0.0
        } else {
            let sum: f64 = entries.iter().map(|e| e.scores.average()).sum();
            round_one_decimal(sum / count as f64).clamp(0.0, f64::from(MAX_SCORE))
        };

        RatingSnapshot {
            average,
            count,
            entries: entries.to_vec(),
            computed_at: now,
        }
    }

    /// Seed entries loaded from an external store.
    ///
    /// Entries with out-of-range scores are skipped; entries without an id
    /// get one. Returns how many were kept.
    pub fn restore(&self, entries: Vec<RatingEntry>, now: DateTime<Utc>) -> usize {
        let mut book = self.book.lock();
        let mut kept = 0;

        for mut entry in entries {
            if !entry.scores.is_in_range() {
                warn!(rating_id = %entry.id, "skipping stored rating with out-of-range scores");
                continue;
            }
            if entry.id.is_empty() {
                entry.id = generate_rating_id(now);
            }
            book.push(entry);
            kept += 1;
        }

        *self.cache.write() = None;
        kept
    }

    pub fn len(&self) -> usize {
        self.book.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

//! Process-wide context tying the components together
//!
//! One `Beacon` is built at startup and shared by handle with every request
//! handler. Tests build their own isolated instances.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::analytics::{day_of, SessionTracker, StatsSnapshot, VisitLedger};
use crate::config::CoreConfig;
use crate::error::CoreResult;
use crate::likes::{LikeOutcome, LikeRegistry, LikesSnapshot};
use crate::moderation::ContentFilter;
use crate::ratings::{RatingAggregator, RatingEntry, RatingSnapshot, RatingSubmission, SubmitReceipt};
use crate::storage::RatingStore;

/// Result of a ping
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PingReport {
    pub is_new_session: bool,
    pub is_new_today: bool,
    pub is_new_all_time: bool,
    pub stats: StatsSnapshot,
}

pub struct Beacon {
    sessions: SessionTracker,
    ledger: VisitLedger,
    ratings: RatingAggregator,
    likes: LikeRegistry,
    store: Option<Arc<dyn RatingStore>>,
}

impl Beacon {
    pub fn new(config: &CoreConfig, filter: ContentFilter) -> Self {
        Self {
            sessions: SessionTracker::new(config.session_timeout()),
            ledger: VisitLedger::new(),
            ratings: RatingAggregator::new(
                Arc::new(filter),
                config.edit_window(),
                config.cache_ttl(),
            ),
            likes: LikeRegistry::new(),
            store: None,
        }
    }

    /// Attach an external store that receives every accepted rating
    pub fn with_store(mut self, store: Arc<dyn RatingStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Record a heartbeat from `identity` and report the resulting stats.
    pub fn ping(&self, identity: &str, now: DateTime<Utc>) -> PingReport {
        self.sessions.evict_stale(now);

        let session = self.sessions.record_ping(identity, now);
        let visit = self.ledger.record_visit(identity, day_of(now));

        debug!(
            identity,
            new_session = session.is_new_session,
            new_today = visit.is_new_today,
            new_overall = visit.is_new_all_time,
            "ping recorded"
        );

        PingReport {
            is_new_session: session.is_new_session,
            is_new_today: visit.is_new_today,
            is_new_all_time: visit.is_new_all_time,
            stats: self.read_stats(now),
        }
    }

    /// Current visitor figures; stale sessions are evicted first.
    pub fn stats(&self, now: DateTime<Utc>) -> StatsSnapshot {
        self.sessions.evict_stale(now);
        self.read_stats(now)
    }

    fn read_stats(&self, now: DateTime<Utc>) -> StatsSnapshot {
        let ledger = self.ledger.snapshot(day_of(now));

        StatsSnapshot {
            online: self.sessions.count_online(now),
            today: ledger.today,
            all_time: ledger.all_time,
            total_visits: ledger.total_visits,
            distinct_visitors: ledger.distinct_visitors,
            updated: now,
        }
    }

    /// Moderate and store a rating.
    ///
    /// Persistence to the attached store runs in the background; its
    /// outcome never changes the result.
    pub fn submit_rating(
        &self,
        submission: RatingSubmission,
        now: DateTime<Utc>,
    ) -> CoreResult<SubmitReceipt> {
        let accepted = self.ratings.submit(submission, now)?;

        if let Some(store) = &self.store {
            self.persist_in_background(Arc::clone(store), accepted.entry);
        }

        Ok(accepted.receipt)
    }

    fn persist_in_background(&self, store: Arc<dyn RatingStore>, entry: RatingEntry) {
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = store.persist(&entry).await {
                        warn!(rating_id = %entry.id, error = %e, "failed to persist rating, keeping in-memory copy");
                    }
                });
            }
            Err(_) => {
                warn!(rating_id = %entry.id, "no async runtime available, rating not persisted");
            }
        }
    }

    pub fn ratings(&self, now: DateTime<Utc>) -> Arc<RatingSnapshot> {
        self.ratings.snapshot(now)
    }

    pub fn like(&self, identity: &str, track: Option<&str>) -> CoreResult<LikeOutcome> {
        self.likes.like(identity, track)
    }

    pub fn unlike(&self, identity: &str, track: Option<&str>) -> CoreResult<LikeOutcome> {
        self.likes.unlike(identity, track)
    }

    pub fn likes(&self, identity: &str) -> LikesSnapshot {
        self.likes.snapshot(identity)
    }

    /// Seed ratings from the attached store, if any.
    ///
    /// A failing store is logged and otherwise ignored. Returns how many
    /// entries were loaded.
    pub async fn warm(&self) -> usize {
        let Some(store) = &self.store else {
            return 0;
        };

        match store.load_all().await {
            Ok(entries) => {
                let loaded = self.ratings.restore(entries, Utc::now());
                info!(loaded, "warmed rating cache from store");
                loaded
            }
            Err(e) => {
                warn!(error = %e, "could not load ratings from store, starting empty");
                0
            }
        }
    }

    /// Periodically evict idle sessions even when no request arrives
    pub fn start_sweep_task(self: &Arc<Self>, every: Duration) -> tokio::task::JoinHandle<()> {
        let beacon = Arc::clone(self);

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            // Skip the first tick which fires immediately
            interval.tick().await;

            loop {
                interval.tick().await;
                let removed = beacon.sessions.evict_stale(Utc::now());
                if removed > 0 {
                    debug!(removed, "background sweep evicted sessions");
                }
            }
        })
    }
}

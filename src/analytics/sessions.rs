//! Online-visitor tracking with inactivity eviction
//!
//! Each identity owns at most one session. All access to a session goes
//! through the DashMap shard lock for its key, so a ping and an eviction
//! sweep touching the same identity are mutually exclusive and two
//! concurrent first pings cannot both see "new".

use chrono::{DateTime, TimeDelta, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::debug;

use crate::analytics::models::{PingOutcome, Session};

/// Default inactivity threshold before a session is evicted
pub const DEFAULT_SESSION_TIMEOUT: TimeDelta = TimeDelta::minutes(15);

pub struct SessionTracker {
    sessions: DashMap<String, Session>,
    timeout: TimeDelta,
}

impl SessionTracker {
    pub fn new(timeout: TimeDelta) -> Self {
        Self {
            sessions: DashMap::new(),
            timeout,
        }
    }

    fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - self.timeout
    }

    /// Record a heartbeat from `identity`.
    ///
    /// A session that is still present but already past the inactivity
    /// threshold is restarted as if it had been evicted.
    pub fn record_ping(&self, identity: &str, now: DateTime<Utc>) -> PingOutcome {
        let cutoff = self.cutoff(now);

        match self.sessions.entry(identity.to_string()) {
            Entry::Occupied(mut occupied) => {
                let session = occupied.get_mut();
                if session.last_seen < cutoff {
                    session.first_seen = now;
                    session.last_seen = now;
                    return PingOutcome {
                        is_new_session: true,
                    };
                }

                // Out-of-order timestamps never move last_seen backwards
                if now > session.last_seen {
                    session.last_seen = now;
                }
                PingOutcome {
                    is_new_session: false,
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(Session {
                    identity: identity.to_string(),
                    first_seen: now,
                    last_seen: now,
                });
                PingOutcome {
                    is_new_session: true,
                }
            }
        }
    }

    /// Number of sessions seen within the inactivity window, never below 1.
    ///
    /// An empty tracker still reports the caller as online.
    pub fn count_online(&self, now: DateTime<Utc>) -> u64 {
        let cutoff = self.cutoff(now);
        let live = self
            .sessions
            .iter()
            .filter(|entry| entry.value().last_seen >= cutoff)
            .count() as u64;

        live.max(1)
    }

    /// Remove every session idle past the threshold; returns how many went.
    pub fn evict_stale(&self, now: DateTime<Utc>) -> usize {
        let cutoff = self.cutoff(now);
        let mut removed = 0;

        self.sessions.retain(|_, session| {
            let keep = session.last_seen >= cutoff;
            if !keep {
                removed += 1;
            }
            keep
        });

        if removed > 0 {
            debug!(removed, "evicted stale sessions");
        }
        removed
    }

    pub fn get(&self, identity: &str) -> Option<Session> {
        self.sessions.get(identity).map(|entry| entry.value().clone())
    }

    /// Number of sessions currently held, stale or not
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Default for SessionTracker {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_TIMEOUT)
    }
}

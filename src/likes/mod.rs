//! Per-track likes
//!
//! Global like counts per track plus the list of tracks each identity has
//! liked. Both maps change together under one lock so a count can never
//! drift from the lists that produced it.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{CoreError, CoreResult};

/// Identity used when a likes request names nobody
pub const ANONYMOUS: &str = "anonymous";

#[derive(Default)]
struct LikeBook {
    tracks: HashMap<String, u64>,
    users: HashMap<String, Vec<String>>,
}

/// Result of a like or unlike
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeOutcome {
    /// Global count for the track after the change
    pub count: u64,
    pub user_likes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikesSnapshot {
    pub tracks: HashMap<String, u64>,
    pub user_likes: Vec<String>,
}

/// Wire shape of a like/unlike request
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeRequest {
    pub track_id: Option<String>,
    pub user_id: Option<String>,
}

fn track_id(raw: Option<&str>) -> CoreResult<&str> {
    raw.map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| CoreError::InvalidInput("missing trackId".to_string()))
}

#[derive(Default)]
pub struct LikeRegistry {
    book: Mutex<LikeBook>,
}

impl LikeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Like `track` for `identity`; liking twice is a no-op.
    pub fn like(&self, identity: &str, track: Option<&str>) -> CoreResult<LikeOutcome> {
        let track = track_id(track)?;
        let mut book = self.book.lock();
        let book = &mut *book;

        let liked = book.users.entry(identity.to_string()).or_default();
        if !liked.iter().any(|t| t == track) {
            liked.push(track.to_string());
            *book.tracks.entry(track.to_string()).or_insert(0) += 1;
        }

        Ok(LikeOutcome {
            count: book.tracks.get(track).copied().unwrap_or(0),
            user_likes: liked.clone(),
        })
    }

    /// Remove a like; the count never drops below zero.
    pub fn unlike(&self, identity: &str, track: Option<&str>) -> CoreResult<LikeOutcome> {
        let track = track_id(track)?;
        let mut book = self.book.lock();
        let book = &mut *book;

        let user_likes = match book.users.get_mut(identity) {
            Some(liked) => {
                if let Some(position) = liked.iter().position(|t| t == track) {
                    liked.remove(position);
                    let count = book.tracks.entry(track.to_string()).or_insert(0);
                    *count = count.saturating_sub(1);
                }
                liked.clone()
            }
            None => Vec::new(),
        };

        Ok(LikeOutcome {
            count: book.tracks.get(track).copied().unwrap_or(0),
            user_likes,
        })
    }

    pub fn snapshot(&self, identity: &str) -> LikesSnapshot {
        let book = self.book.lock();

        LikesSnapshot {
            tracks: book.tracks.clone(),
            user_likes: book.users.get(identity).cloned().unwrap_or_default(),
        }
    }
}

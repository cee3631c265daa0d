//! Data models for ratings

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Highest score accepted for any category
pub const MAX_SCORE: u8 = 5;

/// Longest comment accepted, in characters
pub const MAX_COMMENT_CHARS: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingScores {
    pub sound: u8,
    pub design: u8,
    pub remix: u8,
    pub song: u8,
}

impl RatingScores {
    /// Mean of the four category scores
    pub fn average(&self) -> f64 {
        let sum = u32::from(self.sound)
            + u32::from(self.design)
            + u32::from(self.remix)
            + u32::from(self.song);
        f64::from(sum) / 4.0
    }

    pub fn is_in_range(&self) -> bool {
        [self.sound, self.design, self.remix, self.song]
            .iter()
            .all(|score| *score <= MAX_SCORE)
    }
}

/// One accepted rating
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingEntry {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub identity: String,

    #[serde(flatten)]
    pub scores: RatingScores,

    #[serde(default)]
    pub comment: Option<String>,

    #[serde(rename = "timestamp")]
    pub submitted_at: DateTime<Utc>,
}

/// Wire shape of a rating submission; every field may be missing
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRatingRequest {
    pub user_id: Option<String>,
    pub sound: Option<i64>,
    pub design: Option<i64>,
    pub remix: Option<i64>,
    pub song: Option<i64>,
    pub comment: Option<String>,
}

/// A submission whose fields have been checked
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RatingSubmission {
    pub identity: String,
    pub scores: RatingScores,
    pub comment: Option<String>,
}

fn score(field: &str, value: Option<i64>) -> CoreResult<u8> {
    let value = value.ok_or_else(|| CoreError::InvalidInput(format!("missing score: {field}")))?;

    u8::try_from(value)
        .ok()
        .filter(|score| *score <= MAX_SCORE)
        .ok_or_else(|| {
            CoreError::InvalidInput(format!("{field} must be between 0 and {MAX_SCORE}"))
        })
}

impl SubmitRatingRequest {
    /// Validate against `identity`, rejecting before any state is touched
    pub fn validate(self, identity: String) -> CoreResult<RatingSubmission> {
        if identity.trim().is_empty() {
            return Err(CoreError::InvalidInput("missing identity".to_string()));
        }

        let scores = RatingScores {
            sound: score("sound", self.sound)?,
            design: score("design", self.design)?,
            remix: score("remix", self.remix)?,
            song: score("song", self.song)?,
        };

        let comment = self
            .comment
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());

        if let Some(ref text) = comment {
            if text.chars().count() > MAX_COMMENT_CHARS {
                return Err(CoreError::InvalidInput(format!(
                    "comment longer than {MAX_COMMENT_CHARS} characters"
                )));
            }
        }

        Ok(RatingSubmission {
            identity,
            scores,
            comment,
        })
    }
}

/// What a successful submission reports back
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitReceipt {
    pub rating_id: String,
    /// After this instant a resubmission creates a new entry
    pub editable_until: DateTime<Utc>,
    /// Whether an editable entry was replaced rather than a new one appended
    pub replaced: bool,
}

/// Cached aggregate over every entry
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingSnapshot {
    pub average: f64,
    pub count: usize,
    pub entries: Vec<RatingEntry>,
    pub computed_at: DateTime<Utc>,
}

use crate::ratings::RatingEntry;
use crate::storage::{RatingStore, StoreError, StoreResult};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Rating store backed by an HTTP endpoint (e.g. a spreadsheet script).
///
/// `persist` POSTs the entry as JSON; `load_all` GETs either a bare JSON
/// array of entries or an object with a `ratings` array.
pub struct WebhookRatingStore {
    client: reqwest::Client,
    url: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RatingsPayload {
    Bare(Vec<RatingEntry>),
    Wrapped { ratings: Vec<RatingEntry> },
}

impl RatingsPayload {
    fn into_entries(self) -> Vec<RatingEntry> {
        match self {
            RatingsPayload::Bare(entries) => entries,
            RatingsPayload::Wrapped { ratings } => ratings,
        }
    }
}

impl WebhookRatingStore {
    pub fn new(url: impl Into<String>, timeout: Duration) -> StoreResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl RatingStore for WebhookRatingStore {
    async fn persist(&self, entry: &RatingEntry) -> StoreResult<()> {
        let response = self.client.post(&self.url).json(entry).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Status(status));
        }

        debug!(rating_id = %entry.id, "rating persisted to webhook store");
        Ok(())
    }

    async fn load_all(&self) -> StoreResult<Vec<RatingEntry>> {
        let response = self.client.get(&self.url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Status(status));
        }

        let payload: RatingsPayload = response.json().await?;
        Ok(payload.into_entries())
    }
}

use crate::ratings::RatingEntry;
use crate::storage::{RatingStore, StoreError, StoreResult};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// Rating store kept in process memory.
///
/// Can be switched into a failing mode to exercise degraded behaviour.
#[derive(Default)]
pub struct MemoryRatingStore {
    entries: Mutex<Vec<RatingEntry>>,
    unavailable: AtomicBool,
}

impl MemoryRatingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: Vec<RatingEntry>) -> Self {
        Self {
            entries: Mutex::new(entries),
            unavailable: AtomicBool::new(false),
        }
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn entries(&self) -> Vec<RatingEntry> {
        self.entries.lock().clone()
    }

    fn check(&self) -> StoreResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable);
        }
        Ok(())
    }
}

#[async_trait]
impl RatingStore for MemoryRatingStore {
    async fn persist(&self, entry: &RatingEntry) -> StoreResult<()> {
        self.check()?;

        // Replacements reuse the rating id; keep only the latest version
        let mut entries = self.entries.lock();
        match entries.iter_mut().find(|e| e.id == entry.id) {
            Some(existing) => *existing = entry.clone(),
            None => entries.push(entry.clone()),
        }
        Ok(())
    }

    async fn load_all(&self) -> StoreResult<Vec<RatingEntry>> {
        self.check()?;
        Ok(self.entries())
    }
}

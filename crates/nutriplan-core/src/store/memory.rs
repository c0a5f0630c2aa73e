//! In-memory [`ProfileStore`] and [`HistoryStore`], used by tests and dry runs.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;

use nutriplan_db::models::Profile;

use super::{Batch, History, HistoryStore, ProfileStore};

#[derive(Debug, Default)]
pub struct MemoryStore {
    profiles: Mutex<HashMap<String, Profile>>,
    histories: Mutex<HashMap<String, History>>,
    fail_commits: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent [`HistoryStore::commit_batch`] fail until reset.
    pub fn set_fail_commits(&self, fail: bool) {
        self.fail_commits.store(fail, Ordering::SeqCst);
    }
}

fn poisoned<T>(_: T) -> anyhow::Error {
    anyhow!("memory store lock poisoned")
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>> {
        Ok(self.profiles.lock().map_err(poisoned)?.get(user_id).cloned())
    }

    async fn save_profile(&self, profile: &Profile) -> Result<()> {
        self.profiles
            .lock()
            .map_err(poisoned)?
            .insert(profile.user_id.clone(), profile.clone());
        Ok(())
    }
}

#[async_trait]
impl HistoryStore for MemoryStore {
    async fn load_history(&self, user_id: &str) -> Result<History> {
        Ok(self
            .histories
            .lock()
            .map_err(poisoned)?
            .get(user_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn commit_batch(&self, user_id: &str, batch: &Batch) -> Result<()> {
        if self.fail_commits.load(Ordering::SeqCst) {
            bail!("commit rejected for user {user_id}");
        }
        let mut histories = self.histories.lock().map_err(poisoned)?;
        let history = histories.entry(user_id.to_owned()).or_default();
        if let Some(dup) = batch
            .weeks
            .iter()
            .find(|w| history.weeks.iter().any(|h| h.week_number == w.week_number))
        {
            bail!("week {} already stored for user {user_id}", dup.week_number);
        }
        history.weeks.extend(batch.weeks.iter().cloned());
        history.weeks.sort_by_key(|w| w.week_number);
        history.continuation = Some(batch.continuation);
        history.summary = Some(batch.summary.clone());
        Ok(())
    }

    async fn clear_history(&self, user_id: &str) -> Result<bool> {
        let removed = self.histories.lock().map_err(poisoned)?.remove(user_id);
        Ok(removed.is_some_and(|h| !h.is_empty()))
    }
}

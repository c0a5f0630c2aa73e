//! Persistence seam for profiles and plan history.
//!
//! [`ProfileStore`] and [`HistoryStore`] hide whether history lives in PostgreSQL ([`PgStore`]) or
//! in memory ([`MemoryStore`]). A batch is committed as a unit: the new
//! weeks, the advanced continuation state and the refreshed summary are
//! either all stored or none are.

pub mod memory;
pub mod pg;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use nutriplan_db::models::{ContinuationState, CumulativeSummary, Profile, WeekPlan};

pub use memory::MemoryStore;
pub use pg::PgStore;

/// Everything stored for one user's plan, weeks sorted by number.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct History {
    pub weeks: Vec<WeekPlan>,
    pub continuation: Option<ContinuationState>,
    pub summary: Option<CumulativeSummary>,
}

impl History {
    pub fn is_empty(&self) -> bool {
        self.weeks.is_empty() && self.continuation.is_none() && self.summary.is_none()
    }
}

/// An accepted batch ready to be committed.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    /// Only the weeks new in this batch.
    pub weeks: Vec<WeekPlan>,
    pub continuation: ContinuationState,
    /// Summary over the full span, replacing the stored one.
    pub summary: CumulativeSummary,
}

/// Where profiles live.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>>;

    async fn save_profile(&self, profile: &Profile) -> Result<()>;
}

/// Where accepted weeks, the continuation state and the summary live.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn load_history(&self, user_id: &str) -> Result<History>;

    /// Store `batch` atomically.
    async fn commit_batch(&self, user_id: &str, batch: &Batch) -> Result<()>;

    /// Remove weeks, continuation state and summary. Returns whether
    /// anything was stored.
    async fn clear_history(&self, user_id: &str) -> Result<bool>;
}

#[async_trait]
impl<T: ProfileStore + ?Sized> ProfileStore for Arc<T> {
    async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>> {
        (**self).get_profile(user_id).await
    }

    async fn save_profile(&self, profile: &Profile) -> Result<()> {
        (**self).save_profile(profile).await
    }
}

#[async_trait]
impl<T: HistoryStore + ?Sized> HistoryStore for Arc<T> {
    async fn load_history(&self, user_id: &str) -> Result<History> {
        (**self).load_history(user_id).await
    }

    async fn commit_batch(&self, user_id: &str, batch: &Batch) -> Result<()> {
        (**self).commit_batch(user_id, batch).await
    }

    async fn clear_history(&self, user_id: &str) -> Result<bool> {
        (**self).clear_history(user_id).await
    }
}

// Compile-time check: both stores must be usable as trait objects.
const _: () = {
    fn _assert_object_safe(_: &dyn ProfileStore, _: &dyn HistoryStore) {}
};

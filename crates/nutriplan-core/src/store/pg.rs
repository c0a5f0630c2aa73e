//! PostgreSQL-backed [`ProfileStore`] and [`HistoryStore`].

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;

use nutriplan_db::models::Profile;
use nutriplan_db::queries::{continuation, profiles, summaries, weeks};

use super::{Batch, History, HistoryStore, ProfileStore};

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileStore for PgStore {
    async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>> {
        profiles::get_profile(&self.pool, user_id).await
    }

    async fn save_profile(&self, profile: &Profile) -> Result<()> {
        profiles::upsert_profile(&self.pool, profile).await
    }
}

#[async_trait]
impl HistoryStore for PgStore {
    async fn load_history(&self, user_id: &str) -> Result<History> {
        Ok(History {
            weeks: weeks::list_weeks(&self.pool, user_id).await?,
            continuation: continuation::get_state(&self.pool, user_id).await?,
            summary: summaries::get_summary(&self.pool, user_id).await?,
        })
    }

    async fn commit_batch(&self, user_id: &str, batch: &Batch) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("failed to begin transaction")?;

        for week in &batch.weeks {
            weeks::insert_week(&mut *tx, user_id, week).await?;
        }
        continuation::upsert_state(&mut *tx, user_id, &batch.continuation).await?;
        summaries::upsert_summary(&mut *tx, user_id, &batch.summary).await?;

        // Nothing is visible until commit; dropping `tx` on error rolls back.
        tx.commit().await.context("failed to commit batch")?;

        debug!(
            user_id,
            weeks = batch.weeks.len(),
            week_offset = batch.continuation.week_offset,
            "batch committed"
        );
        Ok(())
    }

    async fn clear_history(&self, user_id: &str) -> Result<bool> {
        let had_state = continuation::get_state(&self.pool, user_id).await?.is_some();

        let mut tx = self
            .pool
            .begin()
            .await
            .context("failed to begin transaction")?;

        let deleted = weeks::delete_weeks(&mut *tx, user_id).await?;
        continuation::delete_state(&mut *tx, user_id).await?;
        summaries::delete_summary(&mut *tx, user_id).await?;

        tx.commit().await.context("failed to commit reset")?;
        Ok(deleted > 0 || had_state)
    }
}

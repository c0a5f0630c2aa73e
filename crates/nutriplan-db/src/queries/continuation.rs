//! Database query functions for the `continuation_states` table.

use anyhow::{Context, Result};
use sqlx::{PgExecutor, PgPool};

use crate::models::ContinuationState;

pub async fn get_state(pool: &PgPool, user_id: &str) -> Result<Option<ContinuationState>> {
    let state = sqlx::query_as::<_, ContinuationState>(
        "SELECT end_weight_kg, week_offset FROM continuation_states WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .with_context(|| format!("failed to fetch continuation state for {user_id}"))?;

    Ok(state)
}

/// Insert or replace the continuation state.
pub async fn upsert_state<'e>(
    executor: impl PgExecutor<'e>,
    user_id: &str,
    state: &ContinuationState,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO continuation_states (user_id, end_weight_kg, week_offset) \
         VALUES ($1, $2, $3) \
         ON CONFLICT (user_id) DO UPDATE SET \
             end_weight_kg = EXCLUDED.end_weight_kg, \
             week_offset = EXCLUDED.week_offset, \
             updated_at = now()",
    )
    .bind(user_id)
    .bind(state.end_weight_kg)
    .bind(state.week_offset)
    .execute(executor)
    .await
    .with_context(|| format!("failed to save continuation state for {user_id}"))?;

    Ok(())
}

pub async fn delete_state<'e>(executor: impl PgExecutor<'e>, user_id: &str) -> Result<()> {
    sqlx::query("DELETE FROM continuation_states WHERE user_id = $1")
        .bind(user_id)
        .execute(executor)
        .await
        .with_context(|| format!("failed to delete continuation state for {user_id}"))?;

    Ok(())
}

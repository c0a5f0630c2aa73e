//! Database query functions for the `cumulative_summaries` table.

use anyhow::{Context, Result};
use sqlx::{PgExecutor, PgPool};

use crate::models::CumulativeSummary;

pub async fn get_summary(pool: &PgPool, user_id: &str) -> Result<Option<CumulativeSummary>> {
    let summary = sqlx::query_as::<_, CumulativeSummary>(
        "SELECT total_kcal, total_protein_g, total_carbs_g, total_fat_g, \
                start_weight_kg, end_weight_kg, week_count, analysis_text, warning_text \
         FROM cumulative_summaries WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .with_context(|| format!("failed to fetch summary for {user_id}"))?;

    Ok(summary)
}

/// Replace the user's summary wholesale.
pub async fn upsert_summary<'e>(
    executor: impl PgExecutor<'e>,
    user_id: &str,
    summary: &CumulativeSummary,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO cumulative_summaries (user_id, total_kcal, total_protein_g, total_carbs_g, \
                                           total_fat_g, start_weight_kg, end_weight_kg, \
                                           week_count, analysis_text, warning_text) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
         ON CONFLICT (user_id) DO UPDATE SET \
             total_kcal = EXCLUDED.total_kcal, \
             total_protein_g = EXCLUDED.total_protein_g, \
             total_carbs_g = EXCLUDED.total_carbs_g, \
             total_fat_g = EXCLUDED.total_fat_g, \
             start_weight_kg = EXCLUDED.start_weight_kg, \
             end_weight_kg = EXCLUDED.end_weight_kg, \
             week_count = EXCLUDED.week_count, \
             analysis_text = EXCLUDED.analysis_text, \
             warning_text = EXCLUDED.warning_text, \
             updated_at = now()",
    )
    .bind(user_id)
    .bind(summary.total_kcal)
    .bind(summary.total_protein_g)
    .bind(summary.total_carbs_g)
    .bind(summary.total_fat_g)
    .bind(summary.start_weight_kg)
    .bind(summary.end_weight_kg)
    .bind(summary.week_count)
    .bind(&summary.analysis_text)
    .bind(&summary.warning_text)
    .execute(executor)
    .await
    .with_context(|| format!("failed to save summary for {user_id}"))?;

    Ok(())
}

pub async fn delete_summary<'e>(executor: impl PgExecutor<'e>, user_id: &str) -> Result<()> {
    sqlx::query("DELETE FROM cumulative_summaries WHERE user_id = $1")
        .bind(user_id)
        .execute(executor)
        .await
        .with_context(|| format!("failed to delete summary for {user_id}"))?;

    Ok(())
}

//! Database query functions for the `week_plans` table.

use anyhow::{Context, Result};
use sqlx::{PgExecutor, PgPool};

use crate::models::WeekPlan;

const WEEK_COLUMNS: &str = "week_number, plan_text, kcal, protein_g, carbs_g, fat_g, \
                            start_weight_kg, end_weight_kg, tdee, protein_goal";

/// Insert one week. Fails if the user already has a week with that number.
pub async fn insert_week<'e>(
    executor: impl PgExecutor<'e>,
    user_id: &str,
    week: &WeekPlan,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO week_plans (user_id, week_number, plan_text, kcal, protein_g, carbs_g, fat_g, \
                                 start_weight_kg, end_weight_kg, tdee, protein_goal) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
    )
    .bind(user_id)
    .bind(week.week_number)
    .bind(&week.plan_text)
    .bind(week.totals.kcal)
    .bind(week.totals.protein_g)
    .bind(week.totals.carbs_g)
    .bind(week.totals.fat_g)
    .bind(week.start_weight_kg)
    .bind(week.end_weight_kg)
    .bind(week.tdee)
    .bind(week.protein_goal)
    .execute(executor)
    .await
    .with_context(|| format!("failed to insert week {} for {user_id}", week.week_number))?;

    Ok(())
}

/// All weeks for a user, ascending by week number.
pub async fn list_weeks(pool: &PgPool, user_id: &str) -> Result<Vec<WeekPlan>> {
    let query = format!(
        "SELECT {WEEK_COLUMNS} FROM week_plans WHERE user_id = $1 ORDER BY week_number"
    );
    let weeks = sqlx::query_as::<_, WeekPlan>(&query)
        .bind(user_id)
        .fetch_all(pool)
        .await
        .with_context(|| format!("failed to list weeks for {user_id}"))?;

    Ok(weeks)
}

/// Fetch a single week by number.
pub async fn get_week(pool: &PgPool, user_id: &str, week_number: i32) -> Result<Option<WeekPlan>> {
    let query = format!(
        "SELECT {WEEK_COLUMNS} FROM week_plans WHERE user_id = $1 AND week_number = $2"
    );
    let week = sqlx::query_as::<_, WeekPlan>(&query)
        .bind(user_id)
        .bind(week_number)
        .fetch_optional(pool)
        .await
        .with_context(|| format!("failed to fetch week {week_number} for {user_id}"))?;

    Ok(week)
}

/// Delete every week for a user. Returns the number of rows removed.
pub async fn delete_weeks<'e>(executor: impl PgExecutor<'e>, user_id: &str) -> Result<u64> {
    let result = sqlx::query("DELETE FROM week_plans WHERE user_id = $1")
        .bind(user_id)
        .execute(executor)
        .await
        .with_context(|| format!("failed to delete weeks for {user_id}"))?;

    Ok(result.rows_affected())
}

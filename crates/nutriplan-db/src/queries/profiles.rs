//! Database query functions for the `profiles` table.

use anyhow::{Context, Result};
use sqlx::{PgExecutor, PgPool};

use crate::models::Profile;

/// Fetch a profile by user id.
pub async fn get_profile(pool: &PgPool, user_id: &str) -> Result<Option<Profile>> {
    let profile = sqlx::query_as::<_, Profile>(
        "SELECT user_id, name, goal, goal_intensity, diet_type, dislikes, \
                weight_kg, height_cm, age, gender, activity_level, \
                tenure_months, target_weight \
         FROM profiles WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .with_context(|| format!("failed to fetch profile for {user_id}"))?;

    Ok(profile)
}

/// Insert or fully replace a profile.
pub async fn upsert_profile<'e>(executor: impl PgExecutor<'e>, profile: &Profile) -> Result<()> {
    sqlx::query(
        "INSERT INTO profiles (user_id, name, goal, goal_intensity, diet_type, dislikes, \
                               weight_kg, height_cm, age, gender, activity_level, \
                               tenure_months, target_weight) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) \
         ON CONFLICT (user_id) DO UPDATE SET \
             name = EXCLUDED.name, \
             goal = EXCLUDED.goal, \
             goal_intensity = EXCLUDED.goal_intensity, \
             diet_type = EXCLUDED.diet_type, \
             dislikes = EXCLUDED.dislikes, \
             weight_kg = EXCLUDED.weight_kg, \
             height_cm = EXCLUDED.height_cm, \
             age = EXCLUDED.age, \
             gender = EXCLUDED.gender, \
             activity_level = EXCLUDED.activity_level, \
             tenure_months = EXCLUDED.tenure_months, \
             target_weight = EXCLUDED.target_weight, \
             updated_at = now()",
    )
    .bind(&profile.user_id)
    .bind(&profile.name)
    .bind(profile.goal)
    .bind(profile.goal_intensity)
    .bind(profile.diet_type)
    .bind(&profile.dislikes)
    .bind(profile.weight_kg)
    .bind(profile.height_cm)
    .bind(profile.age)
    .bind(profile.gender)
    .bind(profile.activity_level)
    .bind(profile.tenure_months)
    .bind(profile.target_weight)
    .execute(executor)
    .await
    .with_context(|| format!("failed to save profile for {}", profile.user_id))?;

    Ok(())
}

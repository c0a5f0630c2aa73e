//! Plan length from the weight goal and chosen intensity.

use serde::Serialize;

use nutriplan_db::models::{Goal, GoalIntensity};

/// Tenure used for maintenance goals.
pub const MAINTAIN_MONTHS: i32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Tenure {
    pub weeks: i32,
    pub months: i32,
    pub target_weight_kg: f64,
}

/// Weeks and months needed to move from `current_kg` to `target_kg` at the
/// intensity's weekly rate.
///
/// Maintenance ignores the target and always runs four months. Months never
/// drop below one, so a target equal to the current weight still yields a
/// one-month plan.
pub fn compute_tenure(
    goal: Goal,
    current_kg: f64,
    target_kg: f64,
    intensity: GoalIntensity,
) -> Tenure {
    if goal == Goal::Maintain {
        return Tenure {
            weeks: MAINTAIN_MONTHS * 4,
            months: MAINTAIN_MONTHS,
            target_weight_kg: current_kg,
        };
    }

    let weeks = ((current_kg - target_kg).abs() / intensity.weekly_rate_kg()).ceil() as i32;
    let months = (weeks.max(0) as u32).div_ceil(4).max(1) as i32;
    Tenure {
        weeks,
        months,
        target_weight_kg: target_kg,
    }
}

//! Daily calorie and macro targets from a safe weekly rate of change.

use std::fmt::Write as _;

use serde::Serialize;

use nutriplan_db::models::Goal;

use super::{bmr, protein_goal, tdee};
use crate::profile::CompleteProfile;

/// Energy per kg of mixed body mass, used to turn a weekly rate into a
/// daily calorie adjustment.
pub const KCAL_PER_KG_MIXED: f64 = 7000.0;

/// Largest weekly change, in kg, the plan will aim for.
pub const SAFE_MAX_WEEKLY_CHANGE_KG: f64 = 1.0;

const CALORIE_FLOOR: f64 = 1200.0;
const SURPLUS_CEILING: f64 = 500.0;

/// Weekly rate bounds for a goal, in kg/week (negative for a cut).
#[derive(Debug, Clone, Copy, PartialEq)]
struct SafeRates {
    min: f64,
    recommended: f64,
    aggressive: f64,
}

fn safe_rates(goal: Goal) -> Option<SafeRates> {
    match goal {
        Goal::Cut => Some(SafeRates {
            min: -1.0,
            recommended: -0.5,
            aggressive: -0.75,
        }),
        Goal::Bulk => Some(SafeRates {
            min: 0.1,
            recommended: 0.25,
            aggressive: 0.4,
        }),
        Goal::Maintain => None,
    }
}

/// Fat and carb shares of daily calories.
fn macro_split(goal: Goal) -> (f64, f64) {
    match goal {
        Goal::Cut => (0.25, 0.35),
        Goal::Bulk => (0.2, 0.5),
        Goal::Maintain => (0.25, 0.45),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DailyTargets {
    pub bmr: f64,
    pub tdee: f64,
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
    /// Weekly change the calorie target is built around, kg/week.
    pub weekly_change_kg: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetPlan {
    pub targets: DailyTargets,
    pub analysis: String,
    pub warning: Option<String>,
}

/// Compute targets for `profile` over `weeks_available` weeks.
pub fn compute_targets(profile: &CompleteProfile, weeks_available: i32) -> TargetPlan {
    let bmr = bmr(
        profile.weight_kg,
        profile.height_cm,
        profile.age,
        profile.gender,
    );
    let tdee = tdee(bmr, profile.activity_level);
    let total_change = profile.target_weight_kg - profile.weight_kg;
    let required = if weeks_available > 0 {
        total_change / f64::from(weeks_available)
    } else {
        0.0
    };

    let (weekly_change_kg, verdict) = match safe_rates(profile.goal) {
        None => (0.0, "Maintaining current weight".to_owned()),
        Some(rates) => {
            let realistic = match profile.goal {
                Goal::Cut => required >= rates.min,
                _ => required <= rates.aggressive,
            };
            if realistic && required.abs() <= rates.aggressive.abs() {
                (required, "Timeline is realistic".to_owned())
            } else {
                let weeks = (total_change / rates.recommended).abs();
                (
                    rates.recommended,
                    format!(
                        "Timeline needs adjustment: {weeks:.0} weeks recommended vs {weeks_available} requested"
                    ),
                )
            }
        }
    };

    let calories = if profile.goal == Goal::Maintain {
        tdee
    } else {
        let adjusted = tdee + weekly_change_kg * KCAL_PER_KG_MIXED / 7.0;
        let floor = CALORIE_FLOOR.max(bmr * 1.1);
        adjusted.min(tdee + SURPLUS_CEILING).max(floor)
    };

    let protein_g = protein_goal(profile.weight_kg, profile.goal);
    let protein_kcal = protein_g * 4.0;
    let (fat_share, carb_share) = macro_split(profile.goal);
    let mut fat_kcal = calories * fat_share;
    let mut carb_kcal = calories * carb_share;
    let excess = protein_kcal + fat_kcal + carb_kcal - calories;
    if excess > 0.0 {
        // Carbs give way first, down to 20% of calories; fat absorbs the rest.
        carb_kcal = (carb_kcal - excess).max(calories * 0.2);
        fat_kcal = calories - protein_kcal - carb_kcal;
    }

    let targets = DailyTargets {
        bmr,
        tdee,
        calories,
        protein_g,
        carbs_g: carb_kcal / 4.0,
        fat_g: fat_kcal / 9.0,
        weekly_change_kg,
    };

    TargetPlan {
        analysis: analysis_text(profile, weeks_available, required, &targets, &verdict),
        warning: rate_warning(profile.weight_kg, profile.target_weight_kg, weeks_available),
        targets,
    }
}

/// Warning text when reaching the target needs more than the safe maximum
/// weekly change, suggesting the minimum number of weeks.
pub fn rate_warning(current_kg: f64, target_kg: f64, weeks_available: i32) -> Option<String> {
    if weeks_available <= 0 {
        return None;
    }
    let total_change = target_kg - current_kg;
    let required = total_change / f64::from(weeks_available);
    if required.abs() <= SAFE_MAX_WEEKLY_CHANGE_KG {
        return None;
    }
    let suggested_weeks = (total_change.abs() / SAFE_MAX_WEEKLY_CHANGE_KG).ceil();
    Some(format!(
        "The required weekly weight change ({required:.2} kg/week) exceeds the safe maximum of \
         {SAFE_MAX_WEEKLY_CHANGE_KG:.1} kg/week. Consider a tenure of at least {suggested_weeks:.0} \
         weeks, or a less aggressive target weight."
    ))
}

fn analysis_text(
    profile: &CompleteProfile,
    weeks_available: i32,
    required: f64,
    targets: &DailyTargets,
    verdict: &str,
) -> String {
    let mut out = String::new();
    let change = profile.target_weight_kg - profile.weight_kg;
    let _ = writeln!(out, "Nutrition Plan Analysis");
    let _ = writeln!(
        out,
        "Weight: {:.1} kg -> {:.1} kg ({change:+.1} kg) over {weeks_available} weeks, goal {}",
        profile.weight_kg,
        profile.target_weight_kg,
        profile.goal.as_str().to_uppercase(),
    );
    let _ = writeln!(
        out,
        "BMR: {:.0} kcal/day, TDEE: {:.0} kcal/day ({})",
        targets.bmr, targets.tdee, profile.activity_level
    );
    let _ = writeln!(
        out,
        "Required rate: {required:.2} kg/week, planned rate: {:.2} kg/week. {verdict}",
        targets.weekly_change_kg
    );
    let _ = write!(
        out,
        "Daily targets: {:.0} kcal, {:.0}g protein, {:.0}g carbs, {:.0}g fat",
        targets.calories, targets.protein_g, targets.carbs_g, targets.fat_g
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use nutriplan_db::models::{ActivityLevel, DietType, Gender, GoalIntensity};

    fn profile(goal: Goal, weight: f64, target: f64) -> CompleteProfile {
        CompleteProfile {
            user_id: "u1".to_owned(),
            name: None,
            goal,
            goal_intensity: GoalIntensity::Balanced,
            diet_type: DietType::NonVeg,
            dislikes: None,
            weight_kg: weight,
            height_cm: 180.0,
            age: 30,
            gender: Gender::Male,
            activity_level: ActivityLevel::Sedentary,
            tenure_months: 4,
            target_weight_kg: target,
        }
    }

    #[test]
    fn maintain_eats_at_tdee() {
        let plan = compute_targets(&profile(Goal::Maintain, 80.0, 80.0), 16);
        // BMR 1780, sedentary 1.2
        assert!((plan.targets.tdee - 2136.0).abs() < 1e-9);
        assert_eq!(plan.targets.calories, plan.targets.tdee);
        assert_eq!(plan.targets.weekly_change_kg, 0.0);
        assert!(plan.analysis.contains("Maintaining current weight"));
        assert_eq!(plan.warning, None);
    }

    #[test]
    fn realistic_cut_uses_required_rate() {
        let plan = compute_targets(&profile(Goal::Cut, 80.0, 72.0), 16);
        assert_eq!(plan.targets.weekly_change_kg, -0.5);
        // 2136 - 500 = 1636, floor is max(1200, 1958) = 1958
        assert!((plan.targets.calories - 1958.0).abs() < 1e-9);
        assert!(plan.analysis.contains("Timeline is realistic"));
        assert_eq!(plan.targets.protein_g, 160.0);
    }

    #[test]
    fn unrealistic_cut_falls_back_to_recommended() {
        let plan = compute_targets(&profile(Goal::Cut, 80.0, 60.0), 8);
        assert_eq!(plan.targets.weekly_change_kg, -0.5);
        assert!(
            plan.analysis
                .contains("Timeline needs adjustment: 40 weeks recommended vs 8 requested"),
            "{}",
            plan.analysis
        );
        assert!(plan.warning.is_some());
    }

    #[test]
    fn bulk_is_capped_above_tdee() {
        let mut p = profile(Goal::Bulk, 60.0, 62.0);
        p.activity_level = ActivityLevel::Active;
        let plan = compute_targets(&p, 8);
        assert_eq!(plan.targets.weekly_change_kg, 0.25);
        assert!(plan.targets.calories <= plan.targets.tdee + SURPLUS_CEILING);
        assert!((plan.targets.calories - (plan.targets.tdee + 250.0)).abs() < 1e-9);
    }

    #[test]
    fn macros_fit_inside_calories() {
        let plan = compute_targets(&profile(Goal::Cut, 120.0, 100.0), 40);
        let t = plan.targets;
        let total = t.protein_g * 4.0 + t.carbs_g * 4.0 + t.fat_g * 9.0;
        assert!(total <= t.calories + 1e-6, "{total} > {}", t.calories);
    }

    #[test]
    fn warning_only_above_one_kg_per_week() {
        assert_eq!(rate_warning(80.0, 76.0, 4), None);
        let warning = rate_warning(80.0, 70.0, 4).unwrap();
        assert!(warning.contains("-2.50 kg/week"), "{warning}");
        assert!(warning.contains("at least 10 weeks"), "{warning}");
        assert_eq!(rate_warning(80.0, 70.0, 0), None);
    }
}

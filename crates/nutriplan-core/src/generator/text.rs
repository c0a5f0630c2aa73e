//! Building week records from free-text plans.
//!
//! Used by the agent generator and by text import: the text is split into
//! weeks, totals are read from each week, and weights are projected from
//! the daily calorie target.

use nutriplan_db::models::WeekPlan;

use super::{GenerationError, GenerationResponse};
use crate::continuation::StartState;
use crate::nutrition::targets::compute_targets;
use crate::nutrition::{parse_totals, project_weight};
use crate::plan::parse_weeks;
use crate::profile::CompleteProfile;
use crate::summary::aggregate_with_commentary;

/// Turn `raw` into a batch continuing from `start`.
///
/// Weeks are numbered from `start.week_offset + 1`. A week whose totals
/// cannot be read keeps zero totals and a flat weight.
pub fn response_from_text(
    raw: &str,
    profile: &CompleteProfile,
    start: StartState,
) -> Result<GenerationResponse, GenerationError> {
    let fragments = parse_weeks(raw, start.week_offset + 1);
    if fragments.is_empty() {
        return Err(GenerationError::Malformed("plan text is empty".to_owned()));
    }

    let plan = compute_targets(profile, profile.tenure_weeks());
    let daily_target = plan.targets.calories;

    let mut weight = start.weight;
    let weeks: Vec<WeekPlan> = fragments
        .into_iter()
        .map(|fragment| {
            let totals = parse_totals(&fragment.plan_text);
            let end = project_weight(weight, totals.as_ref(), daily_target);
            let week = WeekPlan {
                week_number: fragment.week_number,
                plan_text: fragment.plan_text,
                totals: totals.unwrap_or_default(),
                start_weight_kg: weight,
                end_weight_kg: end,
                tdee: plan.targets.tdee,
                protein_goal: plan.targets.protein_g,
            };
            weight = end;
            week
        })
        .collect();

    let summary = aggregate_with_commentary(&weeks, Some(plan.analysis), plan.warning);
    let end_state = StartState {
        weight,
        week_offset: weeks.last().map_or(start.week_offset, |w| w.week_number),
    };
    Ok(GenerationResponse {
        weeks,
        summary,
        end_state,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use nutriplan_db::models::{ActivityLevel, DietType, Gender, Goal, GoalIntensity};

    fn profile() -> CompleteProfile {
        CompleteProfile {
            user_id: "u1".to_owned(),
            name: Some("Asha".to_owned()),
            goal: Goal::Maintain,
            goal_intensity: GoalIntensity::Balanced,
            diet_type: DietType::Veg,
            dislikes: None,
            weight_kg: 80.0,
            height_cm: 180.0,
            age: 30,
            gender: Gender::Male,
            activity_level: ActivityLevel::Sedentary,
            tenure_months: 1,
            target_weight_kg: 80.0,
        }
    }

    #[test]
    fn builds_chained_weeks() {
        // Maintenance at TDEE 2136: a week of 7 * 2136 - 7700 kcal loses 1 kg.
        let deficit_week = 7.0 * 2136.0 - 7700.0;
        let raw = format!(
            "Week 1\n📊 Weekly Summary:\nTotal: {deficit_week:.1} kcal, 700.0g protein, 1400.0g carbs, 400.0g fat\n\
             Week 2\nno totals here"
        );
        let start = StartState {
            weight: 80.0,
            week_offset: 4,
        };
        let resp = response_from_text(&raw, &profile(), start).unwrap();

        assert_eq!(resp.weeks.len(), 2);
        assert_eq!(resp.weeks[0].week_number, 5);
        assert_eq!(resp.weeks[1].week_number, 6);
        assert!((resp.weeks[0].end_weight_kg - 79.0).abs() < 1e-6);
        assert_eq!(resp.weeks[1].start_weight_kg, resp.weeks[0].end_weight_kg);
        assert_eq!(resp.weeks[1].end_weight_kg, resp.weeks[1].start_weight_kg);
        assert_eq!(resp.weeks[1].totals.kcal, 0.0);
        assert_eq!(resp.end_state.week_offset, 6);
        assert_eq!(resp.end_state.weight, resp.weeks[1].end_weight_kg);
        assert_eq!(resp.summary.week_count, 2);
        assert!(resp.summary.analysis_text.is_some());
        resp.check_continuity(start).unwrap();
    }

    #[test]
    fn empty_text_is_malformed() {
        let start = StartState {
            weight: 80.0,
            week_offset: 0,
        };
        assert!(matches!(
            response_from_text("  \n", &profile(), start),
            Err(GenerationError::Malformed(_))
        ));
    }
}

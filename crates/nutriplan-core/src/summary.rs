//! Cumulative summaries over a span of weeks.
//!
//! Callers in this crate always pass the full continuation span: every
//! week in the user's history since the last reset.

use nutriplan_db::models::{CumulativeSummary, WeekPlan};

/// Sum the weeks in the order given. The slice is not sorted here.
pub fn aggregate(weeks: &[WeekPlan]) -> CumulativeSummary {
    let (Some(first), Some(last)) = (weeks.first(), weeks.last()) else {
        return CumulativeSummary::default();
    };

    let mut summary = CumulativeSummary {
        start_weight_kg: first.start_weight_kg,
        end_weight_kg: last.end_weight_kg,
        week_count: i32::try_from(weeks.len()).unwrap_or(i32::MAX),
        ..CumulativeSummary::default()
    };
    for week in weeks {
        summary.total_kcal += week.totals.kcal;
        summary.total_protein_g += week.totals.protein_g;
        summary.total_carbs_g += week.totals.carbs_g;
        summary.total_fat_g += week.totals.fat_g;
    }
    summary
}

/// Aggregate `weeks` and attach the generator's commentary.
pub fn aggregate_with_commentary(
    weeks: &[WeekPlan],
    analysis_text: Option<String>,
    warning_text: Option<String>,
) -> CumulativeSummary {
    CumulativeSummary {
        analysis_text,
        warning_text,
        ..aggregate(weeks)
    }
}

//! Nutrition arithmetic: totals extraction from plan text, metabolic
//! estimates and weight trajectory.

pub mod targets;

use std::sync::LazyLock;

use regex::Regex;

use nutriplan_db::models::{ActivityLevel, Gender, Goal, NutritionTotals};

/// Energy in one kilogram of body fat, used for weight projection.
pub const KCAL_PER_KG_FAT: f64 = 7700.0;

/// Marks the weekly summary section of a plan text.
pub const WEEKLY_SUMMARY_MARKER: &str = "📊";

static TOTAL_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*Total:\s*([\d.]+)\s*kcal\s*,\s*([\d.]+)\s*g\s*protein\s*,\s*([\d.]+)\s*g\s*carbs\s*,\s*([\d.]+)\s*g\s*fat",
    )
    .expect("total line pattern is valid")
});

static LEGACY_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"Calories:\s*([\d.]+).*?Protein:\s*([\d.]+)\s*g?.*?Carbs:\s*([\d.]+)\s*g?.*?Fat:\s*([\d.]+)",
    )
    .expect("legacy line pattern is valid")
});

fn number(text: &str) -> f64 {
    text.parse().unwrap_or(0.0)
}

fn captured_totals(pattern: &Regex, line: &str) -> Option<NutritionTotals> {
    let caps = pattern.captures(line)?;
    Some(NutritionTotals {
        kcal: number(&caps[1]),
        protein_g: number(&caps[2]),
        carbs_g: number(&caps[3]),
        fat_g: number(&caps[4]),
    })
}

/// Extract weekly totals from plan text.
///
/// Recognizes `Total: X kcal, Yg protein, Zg carbs, Wg fat` lines and the
/// older `Calories: X, Protein: Y, Carbs: Z, Fat: W` lines. A `Total:` line
/// inside the weekly summary section (after a line starting with `📊`)
/// replaces the per-day sums. Returns `None` when nothing was recognized.
pub fn parse_totals(text: &str) -> Option<NutritionTotals> {
    let mut days = NutritionTotals::default();
    let mut weekly: Option<NutritionTotals> = None;
    let mut in_summary = false;
    let mut found = false;

    for line in text.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with(WEEKLY_SUMMARY_MARKER) {
            in_summary = true;
            continue;
        }
        if let Some(totals) = captured_totals(&TOTAL_LINE, trimmed) {
            found = true;
            if in_summary {
                weekly.get_or_insert(totals);
            } else {
                days += totals;
            }
            continue;
        }
        if in_summary {
            continue;
        }
        if let Some(totals) = captured_totals(&LEGACY_LINE, trimmed) {
            found = true;
            days += totals;
        }
    }

    if !found {
        return None;
    }
    Some(weekly.unwrap_or(days))
}

/// Basal metabolic rate (Mifflin-St Jeor), kcal/day.
pub fn bmr(weight_kg: f64, height_cm: f64, age: i32, gender: Gender) -> f64 {
    let offset = match gender {
        Gender::Male => 5.0,
        Gender::Female | Gender::Other => -161.0,
    };
    10.0 * weight_kg + 6.25 * height_cm - 5.0 * f64::from(age) + offset
}

pub fn activity_multiplier(level: ActivityLevel) -> f64 {
    match level {
        ActivityLevel::Sedentary => 1.2,
        ActivityLevel::Light => 1.375,
        ActivityLevel::Moderate => 1.55,
        ActivityLevel::Active => 1.725,
        ActivityLevel::VeryActive => 1.9,
    }
}

/// Total daily energy expenditure, kcal/day.
pub fn tdee(bmr: f64, level: ActivityLevel) -> f64 {
    bmr * activity_multiplier(level)
}

/// Grams of protein per kg of body weight.
pub fn protein_per_kg(goal: Goal) -> f64 {
    match goal {
        Goal::Cut => 2.0,
        Goal::Bulk => 1.6,
        Goal::Maintain => 1.2,
    }
}

/// Daily protein goal in grams.
pub fn protein_goal(weight_kg: f64, goal: Goal) -> f64 {
    weight_kg * protein_per_kg(goal)
}

/// End-of-week weight after eating `week_totals` against a daily calorie
/// target. Without totals the weight stays flat.
pub fn project_weight(
    start_weight_kg: f64,
    week_totals: Option<&NutritionTotals>,
    daily_calorie_target: f64,
) -> f64 {
    match week_totals {
        Some(totals) => {
            start_weight_kg + (totals.kcal - 7.0 * daily_calorie_target) / KCAL_PER_KG_FAT
        }
        None => start_weight_kg,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WEEK_TEXT: &str = "Week 1\n\n\
        📅 Day 1:\nBreakfast: oats\nTotal: 2000.0 kcal, 150.0g protein, 200.0g carbs, 60.0g fat\n\n\
        📅 Day 2:\nLunch: dal\nTotal: 2100.5 kcal, 140.0g protein, 210.0g carbs, 70.0g fat\n\n\
        📊 Weekly Summary:\n\
        Total: 14000.0 kcal, 1000.0g protein, 1400.0g carbs, 450.0g fat\n\
        Daily Average: 2000.0 kcal, 142.9g protein, 200.0g carbs, 64.3g fat";

    #[test]
    fn weekly_summary_total_is_authoritative() {
        let totals = parse_totals(WEEK_TEXT).unwrap();
        assert_eq!(totals.kcal, 14000.0);
        assert_eq!(totals.protein_g, 1000.0);
        assert_eq!(totals.carbs_g, 1400.0);
        assert_eq!(totals.fat_g, 450.0);
    }

    #[test]
    fn day_totals_are_summed_without_summary() {
        let text = WEEK_TEXT
            .split(WEEKLY_SUMMARY_MARKER)
            .next()
            .unwrap_or_default();
        let totals = parse_totals(text).unwrap();
        assert_eq!(totals.kcal, 4100.5);
        assert_eq!(totals.protein_g, 290.0);
        assert_eq!(totals.fat_g, 130.0);
    }

    #[test]
    fn legacy_lines_are_summed() {
        let text = "Day 1\nCalories: 1800, Protein: 120g, Carbs: 200g, Fat: 55g\n\
                    Day 2\nCalories: 1900.5, Protein: 130, Carbs: 210, Fat: 60\n\
                    Protein: 999g";
        let totals = parse_totals(text).unwrap();
        assert_eq!(totals.kcal, 3700.5);
        assert_eq!(totals.protein_g, 250.0);
        assert_eq!(totals.carbs_g, 410.0);
        assert_eq!(totals.fat_g, 115.0);
    }

    #[test]
    fn unrecognized_text_has_no_totals() {
        assert_eq!(parse_totals("Monday: eat well"), None);
        assert_eq!(parse_totals(""), None);
    }

    #[test]
    fn bmr_and_tdee() {
        // 10*80 + 6.25*180 - 5*30 + 5 = 1780
        let male = bmr(80.0, 180.0, 30, Gender::Male);
        assert_eq!(male, 1780.0);
        assert_eq!(bmr(80.0, 180.0, 30, Gender::Female), 1614.0);
        assert_eq!(tdee(1000.0, ActivityLevel::Sedentary), 1200.0);
        assert_eq!(tdee(1000.0, ActivityLevel::VeryActive), 1900.0);
    }

    #[test]
    fn protein_goal_by_goal() {
        assert_eq!(protein_goal(80.0, Goal::Cut), 160.0);
        assert_eq!(protein_goal(80.0, Goal::Maintain), 96.0);
        assert!((protein_goal(80.0, Goal::Bulk) - 128.0).abs() < 1e-9);
    }

    #[test]
    fn projection_uses_deficit() {
        let totals = NutritionTotals {
            kcal: 7.0 * 2000.0 - 7700.0,
            ..NutritionTotals::default()
        };
        assert_eq!(project_weight(80.0, Some(&totals), 2000.0), 79.0);
        assert_eq!(project_weight(80.0, None, 2000.0), 80.0);
    }
}

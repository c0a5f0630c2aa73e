use std::fmt;
use std::ops::AddAssign;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Error returned when a stored or user-supplied string is not a known
/// variant of one of the profile enums.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {kind}: {value:?} (expected one of: {expected})")]
pub struct EnumParseError {
    pub kind: &'static str,
    pub value: String,
    pub expected: &'static str,
}

/// Declares `Display`, `FromStr` and `ALL` for a text-backed enum so the
/// same spelling is used on the wire, in the database and on the CLI.
macro_rules! text_enum {
    ($ty:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $ty {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$ty] = &[$($ty::$variant),+];

            /// The canonical text form.
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = EnumParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($text => Ok(Self::$variant),)+
                    other => Err(EnumParseError {
                        kind: $kind,
                        value: other.to_owned(),
                        expected: concat!($($text, " "),+),
                    }),
                }
            }
        }
    };
}

/// Direction of the user's weight goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Goal {
    Cut,
    Bulk,
    Maintain,
}

text_enum!(Goal, "goal", { Cut => "cut", Bulk => "bulk", Maintain => "maintain" });

/// How fast the user wants to move toward the target weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum GoalIntensity {
    Conservative,
    Balanced,
    Aggressive,
}

text_enum!(GoalIntensity, "goal intensity", {
    Conservative => "conservative",
    Balanced => "balanced",
    Aggressive => "aggressive",
});

impl GoalIntensity {
    /// Planned weight change in kg per week.
    pub fn weekly_rate_kg(self) -> f64 {
        match self {
            Self::Conservative => 0.25,
            Self::Balanced => 0.5,
            Self::Aggressive => 1.0,
        }
    }
}

impl Default for GoalIntensity {
    fn default() -> Self {
        Self::Balanced
    }
}

/// Dietary style the meal plans must respect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text")]
pub enum DietType {
    #[sqlx(rename = "veg")]
    #[serde(rename = "veg")]
    Veg,
    #[sqlx(rename = "non-veg")]
    #[serde(rename = "non-veg")]
    NonVeg,
}

text_enum!(DietType, "diet type", { Veg => "veg", NonVeg => "non-veg" });

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    Other,
}

text_enum!(Gender, "gender", { Male => "male", Female => "female", Other => "other" });

/// Habitual activity level, mapped to a TDEE multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text")]
pub enum ActivityLevel {
    #[sqlx(rename = "sedentary")]
    #[serde(rename = "sedentary")]
    Sedentary,
    #[sqlx(rename = "light")]
    #[serde(rename = "light")]
    Light,
    #[sqlx(rename = "moderate")]
    #[serde(rename = "moderate")]
    Moderate,
    #[sqlx(rename = "active")]
    #[serde(rename = "active")]
    Active,
    #[sqlx(rename = "very active")]
    #[serde(rename = "very active")]
    VeryActive,
}

text_enum!(ActivityLevel, "activity level", {
    Sedentary => "sedentary",
    Light => "light",
    Moderate => "moderate",
    Active => "active",
    VeryActive => "very active",
});

// ---------------------------------------------------------------------------
// Row structs
// ---------------------------------------------------------------------------

/// A user profile as captured by the intake flow.
///
/// Every field other than `user_id` is optional: a partially filled profile
/// is stored as-is and only checked for completeness before plan generation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Profile {
    pub user_id: String,
    pub name: Option<String>,
    pub goal: Option<Goal>,
    pub goal_intensity: Option<GoalIntensity>,
    pub diet_type: Option<DietType>,
    pub dislikes: Option<String>,
    pub weight_kg: Option<f64>,
    pub height_cm: Option<f64>,
    pub age: Option<i32>,
    pub gender: Option<Gender>,
    pub activity_level: Option<ActivityLevel>,
    pub tenure_months: Option<i32>,
    pub target_weight: Option<f64>,
}

/// Weekly nutrition totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, FromRow)]
pub struct NutritionTotals {
    pub kcal: f64,
    #[serde(alias = "protein")]
    pub protein_g: f64,
    #[serde(alias = "carbs")]
    pub carbs_g: f64,
    #[serde(alias = "fat")]
    pub fat_g: f64,
}

impl AddAssign for NutritionTotals {
    fn add_assign(&mut self, rhs: Self) {
        self.kcal += rhs.kcal;
        self.protein_g += rhs.protein_g;
        self.carbs_g += rhs.carbs_g;
        self.fat_g += rhs.fat_g;
    }
}

/// One planning week.
///
/// `week_number` is 1-based and global across the user's history. Records
/// are immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct WeekPlan {
    #[serde(alias = "week")]
    pub week_number: i32,
    #[serde(alias = "plan")]
    pub plan_text: String,
    #[sqlx(flatten)]
    pub totals: NutritionTotals,
    #[serde(alias = "start_weight")]
    pub start_weight_kg: f64,
    #[serde(alias = "end_weight")]
    pub end_weight_kg: f64,
    /// Zero when the collaborator did not report it; filled from the
    /// profile before the batch is validated.
    #[serde(default)]
    pub tdee: f64,
    #[serde(default, alias = "protein_target")]
    pub protein_goal: f64,
}

impl WeekPlan {
    /// Display label, e.g. `"Week 3"`.
    pub fn label(&self) -> String {
        format!("Week {}", self.week_number)
    }
}

/// Where the next generation batch resumes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ContinuationState {
    pub end_weight_kg: f64,
    /// Number of weeks generated so far.
    pub week_offset: i32,
}

/// Totals over a span of weeks, plus the collaborator's commentary.
///
/// Every field defaults on decode: the totals are recomputed locally, so a
/// collaborator may send commentary only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(default)]
pub struct CumulativeSummary {
    pub total_kcal: f64,
    #[serde(alias = "total_protein")]
    pub total_protein_g: f64,
    #[serde(alias = "total_carbs")]
    pub total_carbs_g: f64,
    #[serde(alias = "total_fat")]
    pub total_fat_g: f64,
    #[serde(alias = "start_weight")]
    pub start_weight_kg: f64,
    #[serde(alias = "end_weight")]
    pub end_weight_kg: f64,
    #[serde(alias = "weeks")]
    pub week_count: i32,
    #[serde(alias = "analysis")]
    pub analysis_text: Option<String>,
    #[serde(alias = "warning")]
    pub warning_text: Option<String>,
}

impl CumulativeSummary {
    /// Combine this span with the span immediately after it.
    ///
    /// Totals and week counts add; the start weight comes from the earlier
    /// span and the end weight from the later one. An empty side is the
    /// identity. Commentary is taken from the later span when present.
    pub fn merge(self, later: CumulativeSummary) -> CumulativeSummary {
        if later.week_count == 0 {
            return self;
        }
        if self.week_count == 0 {
            return later;
        }
        CumulativeSummary {
            total_kcal: self.total_kcal + later.total_kcal,
            total_protein_g: self.total_protein_g + later.total_protein_g,
            total_carbs_g: self.total_carbs_g + later.total_carbs_g,
            total_fat_g: self.total_fat_g + later.total_fat_g,
            start_weight_kg: self.start_weight_kg,
            end_weight_kg: later.end_weight_kg,
            week_count: self.week_count + later.week_count,
            analysis_text: later.analysis_text.or(self.analysis_text),
            warning_text: later.warning_text.or(self.warning_text),
        }
    }

    /// Net weight change over the span (negative when losing).
    pub fn weight_change_kg(&self) -> f64 {
        self.end_weight_kg - self.start_weight_kg
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn goal_display_roundtrip() {
        for v in Goal::ALL {
            let parsed: Goal = v.to_string().parse().expect("should parse");
            assert_eq!(*v, parsed);
        }
    }

    #[test]
    fn multi_word_variants_use_original_spelling() {
        assert_eq!(DietType::NonVeg.to_string(), "non-veg");
        assert_eq!(ActivityLevel::VeryActive.to_string(), "very active");
        assert_eq!("Very Active".parse::<ActivityLevel>(), Ok(ActivityLevel::VeryActive));
    }

    #[test]
    fn invalid_value_reports_kind_and_choices() {
        let err = "keto".parse::<DietType>().unwrap_err();
        assert_eq!(err.kind, "diet type");
        let msg = err.to_string();
        assert!(msg.contains("keto"), "unexpected message: {msg}");
        assert!(msg.contains("non-veg"), "unexpected message: {msg}");
    }

    #[test]
    fn intensity_rates() {
        assert_eq!(GoalIntensity::Conservative.weekly_rate_kg(), 0.25);
        assert_eq!(GoalIntensity::Balanced.weekly_rate_kg(), 0.5);
        assert_eq!(GoalIntensity::Aggressive.weekly_rate_kg(), 1.0);
    }

    #[test]
    fn week_plan_accepts_legacy_field_names() {
        let json = r#"{
            "week": 3,
            "plan": "Week 3\n📅 Day 1:\n- oats",
            "totals": {"kcal": 14000.0, "protein": 840.0, "carbs": 1500.0, "fat": 420.0},
            "start_weight": 80.0,
            "end_weight": 79.5,
            "protein_target": 160.0
        }"#;
        let week: WeekPlan = serde_json::from_str(json).expect("should decode");
        assert_eq!(week.week_number, 3);
        assert_eq!(week.totals.protein_g, 840.0);
        assert_eq!(week.end_weight_kg, 79.5);
        assert_eq!(week.tdee, 0.0);
        assert_eq!(week.protein_goal, 160.0);
        assert_eq!(week.label(), "Week 3");
    }

    #[test]
    fn totals_add_assign() {
        let mut a = NutritionTotals {
            kcal: 100.0,
            protein_g: 10.0,
            carbs_g: 20.0,
            fat_g: 5.0,
        };
        a += a;
        assert_eq!(a.kcal, 200.0);
        assert_eq!(a.fat_g, 10.0);
    }

    #[test]
    fn summary_decodes_without_commentary() {
        let json = r#"{
            "total_kcal": 1.0, "total_protein": 2.0, "total_carbs": 3.0, "total_fat": 4.0,
            "start_weight": 80.0, "end_weight": 78.0, "weeks": 4
        }"#;
        let summary: CumulativeSummary = serde_json::from_str(json).expect("should decode");
        assert_eq!(summary.week_count, 4);
        assert_eq!(summary.analysis_text, None);
        assert_eq!(summary.warning_text, None);
    }
}

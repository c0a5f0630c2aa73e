//! Completeness check for stored profiles.
//!
//! A [`Profile`] row may be partially filled. Generation needs the fields
//! below, so the session converts the row into a [`CompleteProfile`] first.

use nutriplan_db::models::{
    ActivityLevel, DietType, Gender, Goal, GoalIntensity, Profile,
};

/// Fields that must be present before a plan can be generated.
pub const REQUIRED_FIELDS: &[&str] = &[
    "goal",
    "diet_type",
    "weight_kg",
    "height_cm",
    "age",
    "gender",
    "activity_level",
    "tenure_months",
];

/// A profile with every generation input present.
#[derive(Debug, Clone, PartialEq)]
pub struct CompleteProfile {
    pub user_id: String,
    pub name: Option<String>,
    pub goal: Goal,
    pub goal_intensity: GoalIntensity,
    pub diet_type: DietType,
    pub dislikes: Option<String>,
    pub weight_kg: f64,
    pub height_cm: f64,
    pub age: i32,
    pub gender: Gender,
    pub activity_level: ActivityLevel,
    pub tenure_months: i32,
    /// Falls back to the current weight when the profile has none.
    pub target_weight_kg: f64,
}

impl CompleteProfile {
    /// Weeks covered by the configured tenure.
    pub fn tenure_weeks(&self) -> i32 {
        self.tenure_months * 4
    }
}

fn positive_f64(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v > 0.0)
}

fn positive_i32(value: Option<i32>) -> Option<i32> {
    value.filter(|v| *v > 0)
}

/// Convert a stored profile, or list the required fields that are missing.
///
/// Zero or negative numbers count as missing.
pub fn require_complete(profile: &Profile) -> Result<CompleteProfile, Vec<&'static str>> {
    let goal = profile.goal;
    let diet_type = profile.diet_type;
    let weight_kg = positive_f64(profile.weight_kg);
    let height_cm = positive_f64(profile.height_cm);
    let age = positive_i32(profile.age);
    let gender = profile.gender;
    let activity_level = profile.activity_level;
    let tenure_months = positive_i32(profile.tenure_months);

    let present = [
        goal.is_some(),
        diet_type.is_some(),
        weight_kg.is_some(),
        height_cm.is_some(),
        age.is_some(),
        gender.is_some(),
        activity_level.is_some(),
        tenure_months.is_some(),
    ];
    let missing: Vec<&'static str> = REQUIRED_FIELDS
        .iter()
        .zip(present)
        .filter_map(|(field, ok)| (!ok).then_some(*field))
        .collect();

    match (
        goal,
        diet_type,
        weight_kg,
        height_cm,
        age,
        gender,
        activity_level,
        tenure_months,
    ) {
        (
            Some(goal),
            Some(diet_type),
            Some(weight_kg),
            Some(height_cm),
            Some(age),
            Some(gender),
            Some(activity_level),
            Some(tenure_months),
        ) => {
            let target_weight_kg = match goal {
                Goal::Maintain => weight_kg,
                _ => positive_f64(profile.target_weight).unwrap_or(weight_kg),
            };
            Ok(CompleteProfile {
                user_id: profile.user_id.clone(),
                name: profile.name.clone().filter(|n| !n.trim().is_empty()),
                goal,
                goal_intensity: profile.goal_intensity.unwrap_or_default(),
                diet_type,
                dislikes: profile.dislikes.clone().filter(|d| !d.trim().is_empty()),
                weight_kg,
                height_cm,
                age,
                gender,
                activity_level,
                tenure_months,
                target_weight_kg,
            })
        }
        _ => Err(missing),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full() -> Profile {
        Profile {
            user_id: "u1".to_owned(),
            name: Some("Asha".to_owned()),
            goal: Some(Goal::Cut),
            goal_intensity: None,
            diet_type: Some(DietType::Veg),
            dislikes: Some("  ".to_owned()),
            weight_kg: Some(80.0),
            height_cm: Some(178.0),
            age: Some(30),
            gender: Some(Gender::Male),
            activity_level: Some(ActivityLevel::Moderate),
            tenure_months: Some(4),
            target_weight: Some(72.0),
        }
    }

    #[test]
    fn complete_profile_converts() {
        let complete = require_complete(&full()).unwrap();
        assert_eq!(complete.goal_intensity, GoalIntensity::Balanced);
        assert_eq!(complete.dislikes, None);
        assert_eq!(complete.target_weight_kg, 72.0);
        assert_eq!(complete.tenure_weeks(), 16);
    }

    #[test]
    fn missing_fields_are_listed_in_order() {
        let profile = Profile {
            age: Some(0),
            gender: None,
            tenure_months: None,
            ..full()
        };
        assert_eq!(
            require_complete(&profile).unwrap_err(),
            vec!["age", "gender", "tenure_months"]
        );
    }

    #[test]
    fn empty_profile_misses_everything() {
        let profile = Profile {
            user_id: "u1".to_owned(),
            ..Profile::default()
        };
        assert_eq!(require_complete(&profile).unwrap_err(), REQUIRED_FIELDS);
    }

    #[test]
    fn maintain_pins_target_to_current_weight() {
        let profile = Profile {
            goal: Some(Goal::Maintain),
            ..full()
        };
        assert_eq!(require_complete(&profile).unwrap().target_weight_kg, 80.0);
    }

    #[test]
    fn missing_target_defaults_to_current_weight() {
        let profile = Profile {
            target_weight: None,
            ..full()
        };
        assert_eq!(require_complete(&profile).unwrap().target_weight_kg, 80.0);
    }
}

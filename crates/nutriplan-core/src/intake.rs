//! Profile intake: validates a submitted form and turns it into a stored
//! [`Profile`], auto-computing the tenure when none is given.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;
use validator::Validate;

use nutriplan_db::models::{ActivityLevel, DietType, Gender, Goal, GoalIntensity, Profile};

use crate::tenure::{MAINTAIN_MONTHS, compute_tenure};

/// One rejected form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("invalid profile: {}", join_errors(.0))]
    Invalid(Vec<FieldError>),
}

fn join_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Raw profile form, as typed by the user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct ProfileForm {
    #[validate(length(min = 1, max = 100, message = "Name is required (at most 100 characters)"))]
    pub name: String,

    #[validate(
        required(message = "Age is required"),
        range(min = 13, max = 120, message = "Age must be between 13 and 120")
    )]
    pub age: Option<i32>,

    pub gender: Option<String>,

    #[validate(
        required(message = "Height is required"),
        range(min = 50.0, max = 280.0, message = "Height must be between 50 and 280 cm")
    )]
    pub height_cm: Option<f64>,

    #[validate(
        required(message = "Weight is required"),
        range(min = 20.0, max = 400.0, message = "Weight must be between 20 and 400 kg")
    )]
    pub weight_kg: Option<f64>,

    #[validate(range(min = 20.0, max = 400.0, message = "Target weight must be between 20 and 400 kg"))]
    pub target_weight: Option<f64>,

    pub goal: Option<String>,
    pub goal_intensity: Option<String>,
    pub diet_type: Option<String>,
    pub activity_level: Option<String>,

    #[validate(length(max = 500, message = "Dislikes must be at most 500 characters"))]
    pub dislikes: Option<String>,

    #[validate(range(min = 1, max = 60, message = "Tenure must be between 1 and 60 months"))]
    pub tenure_months: Option<i32>,
}

impl ProfileForm {
    /// Prefill a form from a stored profile.
    pub fn from_profile(profile: &Profile) -> Self {
        Self {
            name: profile.name.clone().unwrap_or_default(),
            age: profile.age,
            gender: profile.gender.map(|g| g.to_string()),
            height_cm: profile.height_cm,
            weight_kg: profile.weight_kg,
            target_weight: profile.target_weight,
            goal: profile.goal.map(|g| g.to_string()),
            goal_intensity: profile.goal_intensity.map(|g| g.to_string()),
            diet_type: profile.diet_type.map(|d| d.to_string()),
            activity_level: profile.activity_level.map(|a| a.to_string()),
            dislikes: profile.dislikes.clone(),
            tenure_months: profile.tenure_months,
        }
    }
}

struct Collector(Vec<FieldError>);

impl Collector {
    fn push(&mut self, field: &str, message: impl Into<String>) {
        self.0.push(FieldError {
            field: field.to_owned(),
            message: message.into(),
        });
    }

    /// Parse an optional enum field, recording an error for unknown values
    /// and, when `required`, for missing ones.
    fn choice<T: FromStr>(&mut self, field: &str, value: Option<&str>, required: bool) -> Option<T>
    where
        T::Err: fmt::Display,
    {
        match value.map(str::trim).filter(|v| !v.is_empty()) {
            Some(raw) => match raw.parse() {
                Ok(parsed) => Some(parsed),
                Err(e) => {
                    self.push(field, e.to_string());
                    None
                }
            },
            None => {
                if required {
                    self.push(field, format!("{} is required", field.replace('_', " ")));
                }
                None
            }
        }
    }
}

/// Validate `form` and build the profile to store for `user_id`.
///
/// Missing activity level and intensity default to `moderate` and
/// `balanced`. A maintenance goal pins the target to the current weight and
/// the tenure to [`MAINTAIN_MONTHS`]. Otherwise, without an explicit
/// tenure, it is computed from the target and intensity.
pub fn build_profile(user_id: &str, form: &ProfileForm) -> Result<Profile, IntakeError> {
    let mut errors = Collector(Vec::new());

    if let Err(validation) = form.validate() {
        let mut fields: Vec<_> = validation.field_errors().into_iter().collect();
        fields.sort_by(|a, b| a.0.cmp(&b.0));
        for (field, errs) in fields {
            let message = errs
                .first()
                .and_then(|e| e.message.as_ref())
                .map(|m| m.to_string())
                .unwrap_or_else(|| "Validation failed".to_owned());
            errors.push(&field, message);
        }
    }
    if form.name.trim().is_empty() && !errors.0.iter().any(|e| e.field == "name") {
        errors.push("name", "Name is required (at most 100 characters)");
    }

    let goal: Option<Goal> = errors.choice("goal", form.goal.as_deref(), true);
    let gender: Option<Gender> = errors.choice("gender", form.gender.as_deref(), true);
    let diet_type: Option<DietType> = errors.choice("diet_type", form.diet_type.as_deref(), true);
    let activity_level: Option<ActivityLevel> =
        errors.choice("activity_level", form.activity_level.as_deref(), false);
    let goal_intensity: Option<GoalIntensity> =
        errors.choice("goal_intensity", form.goal_intensity.as_deref(), false);

    let target_weight = match (goal, form.weight_kg, form.target_weight) {
        (Some(Goal::Maintain), weight, _) => weight,
        (Some(_), _, None) => {
            errors.push("target_weight", "Target weight is required");
            None
        }
        (Some(Goal::Cut), Some(weight), Some(target)) if target >= weight => {
            errors.push("target_weight", "Target weight must be below current weight for a cut");
            None
        }
        (Some(Goal::Bulk), Some(weight), Some(target)) if target <= weight => {
            errors.push("target_weight", "Target weight must be above current weight for a bulk");
            None
        }
        (_, _, target) => target,
    };

    if !errors.0.is_empty() {
        warn!(user_id, errors = ?errors.0, "profile validation failed");
        return Err(IntakeError::Invalid(errors.0));
    }

    let goal_intensity = goal_intensity.unwrap_or_default();
    let tenure_months = match (form.tenure_months, goal, form.weight_kg, target_weight) {
        (_, Some(Goal::Maintain), _, _) => Some(MAINTAIN_MONTHS),
        (Some(months), _, _, _) => Some(months),
        (None, Some(goal), Some(weight), Some(target)) => {
            Some(compute_tenure(goal, weight, target, goal_intensity).months)
        }
        _ => None,
    };

    Ok(Profile {
        user_id: user_id.to_owned(),
        name: Some(form.name.trim().to_owned()),
        goal,
        goal_intensity: Some(goal_intensity),
        diet_type,
        dislikes: form
            .dislikes
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_owned),
        weight_kg: form.weight_kg,
        height_cm: form.height_cm,
        age: form.age,
        gender,
        activity_level: Some(activity_level.unwrap_or(ActivityLevel::Moderate)),
        tenure_months,
        target_weight,
    })
}

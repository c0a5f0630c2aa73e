//! `nutriplan profile` and `nutriplan tenure` commands.

use anyhow::{Result, bail};
use clap::Args;

use nutriplan_core::intake::ProfileForm;
use nutriplan_core::profile::require_complete;
use nutriplan_core::session::SessionError;
use nutriplan_core::tenure::{Tenure, compute_tenure};
use nutriplan_db::models::{Goal, GoalIntensity, Profile};

use crate::{CliSession, ProfileCommands};

/// Profile fields settable from the command line.
#[derive(Debug, Default, Args)]
pub struct ProfileArgs {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub age: Option<i32>,
    /// male, female or other
    #[arg(long)]
    pub gender: Option<String>,
    /// Height in cm
    #[arg(long)]
    pub height: Option<f64>,
    /// Current weight in kg
    #[arg(long)]
    pub weight: Option<f64>,
    /// Target weight in kg
    #[arg(long)]
    pub target: Option<f64>,
    /// cut, bulk or maintain
    #[arg(long)]
    pub goal: Option<String>,
    /// conservative, balanced or aggressive
    #[arg(long)]
    pub intensity: Option<String>,
    /// veg or non-veg
    #[arg(long)]
    pub diet: Option<String>,
    /// sedentary, light, moderate, active or "very active"
    #[arg(long)]
    pub activity: Option<String>,
    /// Foods to avoid, comma separated
    #[arg(long)]
    pub dislikes: Option<String>,
    /// Plan length in months (computed from the target when omitted; always 4 for maintain)
    #[arg(long)]
    pub tenure: Option<i32>,
}

impl ProfileArgs {
    /// Overlay the given flags on `form`.
    ///
    /// A new weight, target, goal or intensity drops the stored tenure so it
    /// is recomputed, unless `--tenure` is also given.
    pub fn apply(self, mut form: ProfileForm) -> ProfileForm {
        let goal_changed = self.weight.is_some()
            || self.target.is_some()
            || self.goal.is_some()
            || self.intensity.is_some();
        if goal_changed {
            form.tenure_months = None;
        }

        if let Some(name) = self.name {
            form.name = name;
        }
        form.age = self.age.or(form.age);
        form.gender = self.gender.or(form.gender);
        form.height_cm = self.height.or(form.height_cm);
        form.weight_kg = self.weight.or(form.weight_kg);
        form.target_weight = self.target.or(form.target_weight);
        form.goal = self.goal.or(form.goal);
        form.goal_intensity = self.intensity.or(form.goal_intensity);
        form.diet_type = self.diet.or(form.diet_type);
        form.activity_level = self.activity.or(form.activity_level);
        form.dislikes = self.dislikes.or(form.dislikes);
        form.tenure_months = self.tenure.or(form.tenure_months);
        form
    }
}

pub async fn run_profile_command(command: ProfileCommands, session: &CliSession) -> Result<()> {
    match command {
        ProfileCommands::Show => match session.profile().await? {
            Some(profile) => print!("{}", format_profile(&profile)),
            None => println!(
                "No profile for {}. Run `nutriplan profile set` to create one.",
                session.user_id()
            ),
        },
        ProfileCommands::Set(args) => {
            let stored = session.profile().await?;
            let form = args.apply(
                stored
                    .as_ref()
                    .map(ProfileForm::from_profile)
                    .unwrap_or_default(),
            );
            match session.save_profile(&form).await {
                Ok(profile) => {
                    println!("Profile saved.");
                    print!("{}", format_profile(&profile));
                }
                Err(SessionError::Intake(err)) => bail!("{err}\nNothing was saved."),
                Err(err) => return Err(err.into()),
            }
        }
    }
    Ok(())
}

fn or_not_set<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "Not set".to_owned(), |v| v.to_string())
}

/// Plain-text profile listing, ending with the missing-field hint if any.
pub fn format_profile(profile: &Profile) -> String {
    let mut out = String::new();
    let rows = [
        ("User", profile.user_id.clone()),
        ("Name", or_not_set(profile.name.as_deref())),
        ("Goal", or_not_set(profile.goal)),
        ("Intensity", or_not_set(profile.goal_intensity)),
        ("Diet", or_not_set(profile.diet_type)),
        ("Dislikes", profile.dislikes.clone().unwrap_or_else(|| "None".to_owned())),
        ("Age", or_not_set(profile.age)),
        ("Gender", or_not_set(profile.gender)),
        ("Height", or_not_set(profile.height_cm.map(|h| format!("{h:.1} cm")))),
        ("Weight", or_not_set(profile.weight_kg.map(|w| format!("{w:.1} kg")))),
        ("Target", or_not_set(profile.target_weight.map(|w| format!("{w:.1} kg")))),
        ("Activity", or_not_set(profile.activity_level)),
        ("Tenure", or_not_set(profile.tenure_months.map(|m| format!("{m} months")))),
    ];
    for (label, value) in rows {
        out.push_str(&format!("{label:<10} {value}\n"));
    }
    if let Err(missing) = require_complete(profile) {
        out.push_str(&format!("\nIncomplete: missing {}\n", missing.join(", ")));
    }
    out
}

/// Execute `nutriplan tenure`.
pub fn run_tenure(goal: &str, weight: f64, target: Option<f64>, intensity: &str) -> Result<()> {
    let goal: Goal = goal.parse()?;
    let intensity: GoalIntensity = intensity.parse()?;
    let target = match (goal, target) {
        (Goal::Maintain, _) => weight,
        (_, Some(target)) => target,
        (_, None) => bail!("--target is required for a {goal} goal"),
    };
    print!("{}", format_tenure(&compute_tenure(goal, weight, target, intensity)));
    Ok(())
}

pub fn format_tenure(tenure: &Tenure) -> String {
    format!(
        "Target weight: {:.1} kg\nWeeks needed:  {}\nPlan length:   {} months\n",
        tenure.target_weight_kg, tenure.weeks, tenure.months
    )
}

//! The plan-generation collaborator.
//!
//! [`PlanGenerator`] is the adapter interface: given a complete profile and
//! a starting state it returns a batch of weeks, a summary and the batch's
//! terminal state. Two HTTP implementations exist, one for the structured
//! JSON endpoint and one for the free-text agent endpoint.

pub mod agent;
pub mod http;
pub mod text;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use nutriplan_db::models::{CumulativeSummary, WeekPlan};

use crate::continuation::StartState;
use crate::nutrition::targets::compute_targets;
use crate::profile::CompleteProfile;

pub use agent::AgentQueryGenerator;
pub use http::HttpPlanGenerator;

/// Weights closer than this are treated as equal when checking that a
/// response's terminal state matches its last week.
const WEIGHT_TOLERANCE_KG: f64 = 1e-6;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("plan generator unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("plan generator returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode plan generator response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("plan generator response is missing `{0}`")]
    MissingField(&'static str),

    #[error("plan generator rejected the request: {0}")]
    Rejected(String),

    #[error("malformed plan batch: {0}")]
    Malformed(String),

    #[error("invalid plan generator URL {0}")]
    InvalidUrl(String),
}

/// Body of a generation request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationRequest {
    pub tenure_months: i32,
    /// Omitted on the first request so the generator starts from the
    /// profile.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_state: Option<StartState>,
}

/// A decoded batch. Not yet checked for continuity.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationResponse {
    pub weeks: Vec<WeekPlan>,
    pub summary: CumulativeSummary,
    pub end_state: StartState,
}

/// Wire shape of a response: every field optional so a missing one is
/// reported by name rather than as a decode failure.
#[derive(Debug, Default, Deserialize)]
pub struct RawResponse {
    pub weeks: Option<Vec<WeekPlan>>,
    pub summary: Option<CumulativeSummary>,
    pub end_state: Option<StartState>,
    pub error: Option<String>,
}

impl RawResponse {
    pub fn into_response(self) -> Result<GenerationResponse, GenerationError> {
        if let Some(message) = self.error {
            return Err(GenerationError::Rejected(message));
        }
        Ok(GenerationResponse {
            weeks: self.weeks.ok_or(GenerationError::MissingField("weeks"))?,
            summary: self.summary.ok_or(GenerationError::MissingField("summary"))?,
            end_state: self
                .end_state
                .ok_or(GenerationError::MissingField("end_state"))?,
        })
    }
}

/// Decode a structured response body.
pub fn decode_response(body: &str) -> Result<GenerationResponse, GenerationError> {
    serde_json::from_str::<RawResponse>(body)?.into_response()
}

impl GenerationResponse {
    /// Give weeks that came back without a tdee or protein goal the
    /// profile's own targets. Reported values are kept as they are.
    pub fn fill_missing_targets(&mut self, profile: &CompleteProfile) {
        if !self
            .weeks
            .iter()
            .any(|w| w.tdee == 0.0 || w.protein_goal == 0.0)
        {
            return;
        }
        let targets = compute_targets(profile, profile.tenure_weeks()).targets;
        for week in &mut self.weeks {
            if week.tdee == 0.0 {
                week.tdee = targets.tdee;
            }
            if week.protein_goal == 0.0 {
                week.protein_goal = targets.protein_g;
            }
        }
    }

    /// Check that the batch continues the history ending at `from`:
    /// non-empty, numbered `from.week_offset + 1` onward without gaps,
    /// starting at `from.weight`, chained by weight, within the record
    /// bounds, and ending where `end_state` says.
    pub fn check_continuity(&self, from: StartState) -> Result<(), GenerationError> {
        let (Some(first), Some(last)) = (self.weeks.first(), self.weeks.last()) else {
            return Err(GenerationError::Malformed("batch contains no weeks".to_owned()));
        };

        for (expected, week) in (from.week_offset + 1..).zip(&self.weeks) {
            if week.week_number != expected {
                return Err(GenerationError::Malformed(format!(
                    "expected week {expected}, got week {}",
                    week.week_number
                )));
            }
            check_bounds(week)?;
        }
        if (first.start_weight_kg - from.weight).abs() > WEIGHT_TOLERANCE_KG {
            return Err(GenerationError::Malformed(format!(
                "week {} starts at {} kg but the plan so far ends at {} kg",
                first.week_number, first.start_weight_kg, from.weight
            )));
        }
        for pair in self.weeks.windows(2) {
            if (pair[0].end_weight_kg - pair[1].start_weight_kg).abs() > WEIGHT_TOLERANCE_KG {
                return Err(GenerationError::Malformed(format!(
                    "week {} ends at {} kg but week {} starts at {} kg",
                    pair[0].week_number,
                    pair[0].end_weight_kg,
                    pair[1].week_number,
                    pair[1].start_weight_kg
                )));
            }
        }
        if self.end_state.week_offset != last.week_number
            || (self.end_state.weight - last.end_weight_kg).abs() > WEIGHT_TOLERANCE_KG
        {
            return Err(GenerationError::Malformed(format!(
                "end state (week {}, {} kg) does not match last week (week {}, {} kg)",
                self.end_state.week_offset,
                self.end_state.weight,
                last.week_number,
                last.end_weight_kg
            )));
        }
        Ok(())
    }
}

/// Totals must be non-negative; weights and targets must be positive.
fn check_bounds(week: &WeekPlan) -> Result<(), GenerationError> {
    let totals = &week.totals;
    let non_negative = [
        ("kcal", totals.kcal),
        ("protein", totals.protein_g),
        ("carbs", totals.carbs_g),
        ("fat", totals.fat_g),
    ];
    let positive = [
        ("start weight", week.start_weight_kg),
        ("end weight", week.end_weight_kg),
        ("tdee", week.tdee),
        ("protein goal", week.protein_goal),
    ];

    let bad = non_negative
        .iter()
        .find(|(_, value)| value.is_nan() || *value < 0.0)
        .or_else(|| positive.iter().find(|(_, value)| value.is_nan() || *value <= 0.0));
    match bad {
        Some((field, value)) => Err(GenerationError::Malformed(format!(
            "week {} has {field} {value}",
            week.week_number
        ))),
        None => Ok(()),
    }
}

/// Adapter interface for plan generators.
#[async_trait]
pub trait PlanGenerator: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    async fn generate(
        &self,
        profile: &CompleteProfile,
        request: &GenerationRequest,
    ) -> Result<GenerationResponse, GenerationError>;
}

#[async_trait]
impl<T: PlanGenerator + ?Sized> PlanGenerator for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn generate(
        &self,
        profile: &CompleteProfile,
        request: &GenerationRequest,
    ) -> Result<GenerationResponse, GenerationError> {
        (**self).generate(profile, request).await
    }
}

// PlanGenerator must stay usable as `dyn PlanGenerator`.
const _: () = {
    fn _assert_object_safe(_: &dyn PlanGenerator) {}
};

//! Continuation tracking across generation batches.
//!
//! The tracker is the single source of truth for where the next batch
//! resumes. It moves forward exactly once per accepted batch and is never
//! rolled back.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use nutriplan_db::models::{ContinuationState, WeekPlan};

/// Starting condition sent to the plan generator, and the terminal state it
/// reports back.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StartState {
    pub weight: f64,
    pub week_offset: i32,
}

impl From<ContinuationState> for StartState {
    fn from(state: ContinuationState) -> Self {
        Self {
            weight: state.end_weight_kg,
            week_offset: state.week_offset,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ContinuationError {
    #[error("cannot advance by {0} weeks")]
    InvalidCount(i32),

    #[error("last week is {got} but offset {offset} plus {added} new weeks ends at week {expected}")]
    OutOfSequence {
        offset: i32,
        added: i32,
        expected: i32,
        got: i32,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContinuationTracker {
    state: ContinuationState,
}

impl ContinuationTracker {
    /// A fresh tracker with no weeks, starting at the profile weight.
    pub fn new(initial_weight_kg: f64) -> Self {
        Self {
            state: ContinuationState {
                end_weight_kg: initial_weight_kg,
                week_offset: 0,
            },
        }
    }

    /// Resume from a persisted state, or start fresh when there is none.
    pub fn resume(saved: Option<ContinuationState>, initial_weight_kg: f64) -> Self {
        match saved {
            Some(state) => Self { state },
            None => Self::new(initial_weight_kg),
        }
    }

    pub fn current_state(&self) -> ContinuationState {
        self.state
    }

    /// Number the next batch starts at.
    pub fn next_week_number(&self) -> i32 {
        self.state.week_offset + 1
    }

    /// Starting condition for the next request. `None` before the first
    /// batch, meaning the generator starts from profile defaults.
    pub fn resume_point(&self) -> Option<StartState> {
        (self.state.week_offset > 0).then(|| self.state.into())
    }

    /// Record an accepted batch of `weeks_added` weeks ending in `last_week`.
    ///
    /// Rejected unless `last_week` is exactly the week the batch should end
    /// on, so replaying the same batch cannot move the tracker twice.
    pub fn advance(
        &mut self,
        last_week: &WeekPlan,
        weeks_added: i32,
    ) -> Result<ContinuationState, ContinuationError> {
        if weeks_added < 1 {
            return Err(ContinuationError::InvalidCount(weeks_added));
        }
        let expected = self.state.week_offset + weeks_added;
        if last_week.week_number != expected {
            return Err(ContinuationError::OutOfSequence {
                offset: self.state.week_offset,
                added: weeks_added,
                expected,
                got: last_week.week_number,
            });
        }

        self.state = ContinuationState {
            end_weight_kg: last_week.end_weight_kg,
            week_offset: expected,
        };
        Ok(self.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nutriplan_db::models::NutritionTotals;

    fn week(n: i32, end_weight_kg: f64) -> WeekPlan {
        WeekPlan {
            week_number: n,
            plan_text: String::new(),
            totals: NutritionTotals::default(),
            start_weight_kg: end_weight_kg + 0.5,
            end_weight_kg,
            tdee: 2600.0,
            protein_goal: 160.0,
        }
    }

    #[test]
    fn fresh_tracker_has_no_resume_point() {
        let tracker = ContinuationTracker::new(80.0);
        assert_eq!(tracker.resume_point(), None);
        assert_eq!(tracker.next_week_number(), 1);
        assert_eq!(tracker.current_state().end_weight_kg, 80.0);
    }

    #[test]
    fn advance_moves_offset_and_weight() {
        let mut tracker = ContinuationTracker::new(80.0);
        let state = tracker.advance(&week(4, 78.0), 4).unwrap();
        assert_eq!(state.week_offset, 4);
        assert_eq!(state.end_weight_kg, 78.0);
        assert_eq!(
            tracker.resume_point(),
            Some(StartState {
                weight: 78.0,
                week_offset: 4,
            })
        );
        assert_eq!(tracker.next_week_number(), 5);
    }

    #[test]
    fn replaying_the_same_batch_is_rejected() {
        let mut tracker = ContinuationTracker::new(80.0);
        let last = week(4, 78.0);
        tracker.advance(&last, 4).unwrap();

        let err = tracker.advance(&last, 4).unwrap_err();
        assert_eq!(
            err,
            ContinuationError::OutOfSequence {
                offset: 4,
                added: 4,
                expected: 8,
                got: 4,
            }
        );
        assert_eq!(tracker.current_state().week_offset, 4);
        assert_eq!(tracker.current_state().end_weight_kg, 78.0);
    }

    #[test]
    fn zero_weeks_is_rejected() {
        let mut tracker = ContinuationTracker::new(80.0);
        assert_eq!(
            tracker.advance(&week(0, 80.0), 0),
            Err(ContinuationError::InvalidCount(0))
        );
        assert_eq!(tracker.current_state().week_offset, 0);
    }

    #[test]
    fn resume_prefers_saved_state() {
        let saved = ContinuationState {
            end_weight_kg: 75.5,
            week_offset: 8,
        };
        let tracker = ContinuationTracker::resume(Some(saved), 80.0);
        assert_eq!(tracker.current_state(), saved);
        assert_eq!(ContinuationTracker::resume(None, 80.0).current_state().week_offset, 0);
    }
}

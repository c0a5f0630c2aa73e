//! Per-user plan session.
//!
//! [`PlanSession`] owns the accumulated history for one user and is the only
//! place that advances it. A batch is accepted in this order:
//!
//! 1. decode and continuity check (in the generator module)
//! 2. advance a copy of the continuation tracker
//! 3. aggregate the full span, old weeks plus new
//! 4. commit weeks, state and summary to the store in one unit
//! 5. swap the in-memory history
//!
//! A failure at any step leaves both the store and the in-memory history as
//! they were.

use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, warn};

use nutriplan_db::models::{CumulativeSummary, Profile, WeekPlan};

use crate::continuation::{ContinuationError, ContinuationTracker, StartState};
use crate::generator::text::response_from_text;
use crate::generator::{GenerationError, GenerationRequest, GenerationResponse, PlanGenerator};
use crate::intake::{IntakeError, ProfileForm, build_profile};
use crate::plan::{MonthBucket, group_by_month};
use crate::profile::{CompleteProfile, require_complete};
use crate::report::{self, Document};
use crate::store::{Batch, History, HistoryStore, ProfileStore};
use crate::summary::aggregate_with_commentary;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no profile for user {0}; run `nutriplan profile set` first")]
    ProfileNotFound(String),

    #[error("profile is missing {}; run `nutriplan profile set` to complete it", .missing.join(", "))]
    ProfileIncomplete { missing: Vec<&'static str> },

    #[error(transparent)]
    Intake(#[from] IntakeError),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Continuation(#[from] ContinuationError),

    #[error("week {0} is not in the plan history")]
    WeekNotFound(i32),

    #[error("a plan batch is being generated; try again when it finishes")]
    Busy,

    #[error("storage failure: {0:#}")]
    Store(#[from] anyhow::Error),
}

impl SessionError {
    /// Whether retrying the same call may succeed without user action.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Generation(_) | Self::Continuation(_) | Self::Store(_) | Self::Busy
        )
    }
}

/// What an accepted batch changed.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchReport {
    pub weeks_added: i32,
    pub first_week: i32,
    pub last_week: i32,
    pub end_weight_kg: f64,
    pub warning: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GenerateOutcome {
    Generated(BatchReport),
    /// Another batch was in flight; nothing was done.
    AlreadyRunning,
}

/// Clears the busy flag when dropped.
struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct PlanSession<G, S> {
    user_id: String,
    generator: G,
    store: S,
    busy: AtomicBool,
    history: Mutex<History>,
}

impl<G, S> PlanSession<G, S>
where
    G: PlanGenerator,
    S: ProfileStore + HistoryStore,
{
    /// Load the user's stored history and start a session over it.
    pub async fn open(
        user_id: impl Into<String>,
        generator: G,
        store: S,
    ) -> Result<Self, SessionError> {
        let user_id = user_id.into();
        let history = store.load_history(&user_id).await?;
        info!(
            user_id = %user_id,
            weeks = history.weeks.len(),
            generator = generator.name(),
            "plan session opened"
        );
        Ok(Self {
            user_id,
            generator,
            store,
            busy: AtomicBool::new(false),
            history: Mutex::new(history),
        })
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    /// Whether a batch is currently being generated or imported.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub async fn profile(&self) -> Result<Option<Profile>, SessionError> {
        Ok(self.store.get_profile(&self.user_id).await?)
    }

    /// Validate `form` and store it as the user's profile. History is left
    /// alone; use [`PlanSession::reset`] to start over.
    pub async fn save_profile(&self, form: &ProfileForm) -> Result<Profile, SessionError> {
        let profile = build_profile(&self.user_id, form)?;
        self.store.save_profile(&profile).await?;
        info!(user_id = %self.user_id, tenure_months = ?profile.tenure_months, "profile saved");
        Ok(profile)
    }

    async fn complete_profile(&self) -> Result<CompleteProfile, SessionError> {
        let profile = self
            .store
            .get_profile(&self.user_id)
            .await?
            .ok_or_else(|| SessionError::ProfileNotFound(self.user_id.clone()))?;
        require_complete(&profile).map_err(|missing| SessionError::ProfileIncomplete { missing })
    }

    /// Request the next batch from the generator and accept it.
    pub async fn generate(&self) -> Result<GenerateOutcome, SessionError> {
        let Some(_guard) = BusyGuard::acquire(&self.busy) else {
            info!(user_id = %self.user_id, "generation already running");
            return Ok(GenerateOutcome::AlreadyRunning);
        };

        let profile = self.complete_profile().await?;
        let continuation = self.history.lock().await.continuation;
        let tracker = ContinuationTracker::resume(continuation, profile.weight_kg);
        let request = GenerationRequest {
            tenure_months: profile.tenure_months,
            start_state: tracker.resume_point(),
        };

        info!(
            user_id = %self.user_id,
            generator = self.generator.name(),
            next_week = tracker.next_week_number(),
            "requesting plan batch"
        );
        let response = self
            .generator
            .generate(&profile, &request)
            .await
            .inspect_err(|e| warn!(user_id = %self.user_id, error = %e, "plan generation failed"))?;

        self.accept(tracker, response).await
    }

    /// Append weeks parsed from free text, numbered after the stored ones.
    pub async fn import_text(&self, raw: &str) -> Result<GenerateOutcome, SessionError> {
        let Some(_guard) = BusyGuard::acquire(&self.busy) else {
            return Ok(GenerateOutcome::AlreadyRunning);
        };

        let profile = self.complete_profile().await?;
        let continuation = self.history.lock().await.continuation;
        let tracker = ContinuationTracker::resume(continuation, profile.weight_kg);
        let response = response_from_text(raw, &profile, StartState::from(tracker.current_state()))?;

        self.accept(tracker, response).await
    }

    async fn accept(
        &self,
        mut tracker: ContinuationTracker,
        response: GenerationResponse,
    ) -> Result<GenerateOutcome, SessionError> {
        let offset = tracker.current_state().week_offset;
        response.check_continuity(StartState::from(tracker.current_state()))?;

        let GenerationResponse { weeks, summary, .. } = response;
        let Some(last) = weeks.last() else {
            return Err(GenerationError::Malformed("batch contains no weeks".to_owned()).into());
        };
        let weeks_added = i32::try_from(weeks.len()).unwrap_or(i32::MAX);
        let state = tracker.advance(last, weeks_added)?;

        let mut history = self.history.lock().await;
        if history.continuation.map_or(0, |c| c.week_offset) != offset {
            // Stored history moved since the tracker was resumed.
            return Err(ContinuationError::OutOfSequence {
                offset,
                added: weeks_added,
                expected: offset + weeks_added,
                got: last.week_number,
            }
            .into());
        }

        let mut span = history.weeks.clone();
        span.extend(weeks.iter().cloned());
        let batch = Batch {
            weeks,
            continuation: state,
            summary: aggregate_with_commentary(&span, summary.analysis_text, summary.warning_text),
        };
        self.store.commit_batch(&self.user_id, &batch).await?;

        let report = BatchReport {
            weeks_added,
            first_week: offset + 1,
            last_week: state.week_offset,
            end_weight_kg: state.end_weight_kg,
            warning: batch.summary.warning_text.clone(),
        };
        *history = History {
            weeks: span,
            continuation: Some(state),
            summary: Some(batch.summary),
        };

        info!(
            user_id = %self.user_id,
            weeks_added,
            week_offset = state.week_offset,
            end_weight_kg = state.end_weight_kg,
            "plan batch accepted"
        );
        Ok(GenerateOutcome::Generated(report))
    }

    /// Discard all weeks, the continuation state and the summary. Returns
    /// whether there was anything to discard.
    pub async fn reset(&self) -> Result<bool, SessionError> {
        let Some(_guard) = BusyGuard::acquire(&self.busy) else {
            return Err(SessionError::Busy);
        };
        let mut history = self.history.lock().await;
        let cleared = self.store.clear_history(&self.user_id).await?;
        *history = History::default();
        info!(user_id = %self.user_id, cleared, "plan history reset");
        Ok(cleared)
    }

    pub async fn weeks(&self) -> Vec<WeekPlan> {
        self.history.lock().await.weeks.clone()
    }

    pub async fn months(&self) -> Vec<MonthBucket> {
        group_by_month(&self.history.lock().await.weeks)
    }

    /// Summary over every accepted week, `None` before the first batch.
    pub async fn summary(&self) -> Option<CumulativeSummary> {
        self.history.lock().await.summary.clone()
    }

    /// Compile the report for `week_number`.
    pub async fn report(
        &self,
        week_number: i32,
        include_cumulative: bool,
    ) -> Result<Document, SessionError> {
        let profile = self
            .store
            .get_profile(&self.user_id)
            .await?
            .ok_or_else(|| SessionError::ProfileNotFound(self.user_id.clone()))?;

        let history = self.history.lock().await;
        let week = history
            .weeks
            .iter()
            .find(|w| w.week_number == week_number)
            .ok_or(SessionError::WeekNotFound(week_number))?;
        Ok(report::compile(
            &profile,
            week,
            history.summary.as_ref(),
            include_cumulative,
        ))
    }
}

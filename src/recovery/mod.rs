//! Recovery module - fatigue accumulation, decay, classification and recommendations
//!
//! Features:
//! - Session volume folded into per-muscle fatigue (read-decay-add-write)
//! - Exponential decay applied lazily on every read
//! - Recovered / recovering / fatigued classification with recovery ETA
//! - Next-workout split recommendation with rotation tie-break

pub mod aggregator;
pub mod classifier;
pub mod decay;
pub mod recommender;

pub use aggregator::{SessionContribution, VolumeAggregator};
pub use classifier::{MuscleStatus, RecoveryStatus};
pub use recommender::{NeedsRest, RecoveryRecommendation, Recommender, SplitReadiness};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::db::{Database, MuscleFatigueRecord, RecoveryLogEntry};
use crate::error::{RecoveryError, Result};
use crate::muscles::{MuscleGroup, SuggestedWorkout};
use crate::session::SessionLog;

/// Result of handing a completed session to the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordOutcome {
    pub session_id: String,
    /// `false` when the session id was already applied
    pub applied: bool,
    /// Muscle states right after the session
    pub updated: Vec<MuscleStatus>,
}

/// Classify every taxonomy muscle, defaulting the ones without a stored row
fn classify_all(user_id: &str, stored: &[MuscleFatigueRecord], now: DateTime<Utc>) -> Vec<MuscleStatus> {
    MuscleGroup::all()
        .iter()
        .map(|group| match stored.iter().find(|r| r.muscle_group == *group) {
            Some(record) => MuscleStatus::from_record(record, now),
            None => MuscleStatus::from_record(&MuscleFatigueRecord::untrained(user_id, *group), now),
        })
        .collect()
}

/// Stateless between calls: everything lives in the database
pub struct RecoveryEngine {
    db: Database,
    config: EngineConfig,
}

impl RecoveryEngine {
    pub fn new(db: Database, config: EngineConfig) -> Self {
        Self { db, config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Live state of every muscle group as of `now`
    pub fn fatigue_report(&self, user_id: &str, now: DateTime<Utc>) -> Result<Vec<MuscleStatus>> {
        let stored = self.db.get_fatigue_records(user_id)?;
        Ok(classify_all(user_id, &stored, now))
    }

    /// Ready / needs-rest lists and a suggested split as of `now`
    pub fn recommend(&self, user_id: &str, now: DateTime<Utc>) -> Result<RecoveryRecommendation> {
        let statuses = self.fatigue_report(user_id, now)?;
        let last_suggested = self.db.last_suggested_workout(user_id)?;
        Ok(Recommender::new(&self.config).recommend(statuses, last_suggested))
    }

    /// Applied sessions, newest first
    pub fn history(&self, user_id: &str, limit: usize) -> Result<Vec<RecoveryLogEntry>> {
        self.db.get_recovery_log(user_id, limit)
    }

    /// Account deletion cascade
    pub fn delete_user(&mut self, user_id: &str) -> Result<usize> {
        let removed = self.db.delete_user_data(user_id)?;
        info!(user_id, removed, "Deleted recovery data");
        Ok(removed)
    }

    /// Fold a completed session into the user's fatigue records.
    ///
    /// The whole session is validated against the taxonomy before storage is
    /// touched. Concurrent writers are detected per row and the fold is
    /// retried from a fresh read.
    pub fn record_session(&mut self, session: &SessionLog) -> Result<RecordOutcome> {
        session.validate()?;
        let contributions = VolumeAggregator::new(&self.config).session_volumes(session)?;

        let attempts = self.config.max_write_attempts.max(1);
        for attempt in 1..=attempts {
            match self.try_record(session, &contributions) {
                Ok(outcome) => {
                    if outcome.applied {
                        info!(
                            user_id = %session.user_id,
                            session_id = %session.session_id,
                            muscles = outcome.updated.len(),
                            "Recorded session"
                        );
                    } else {
                        info!(
                            user_id = %session.user_id,
                            session_id = %session.session_id,
                            "Session already recorded, skipping"
                        );
                    }
                    return Ok(outcome);
                }
                Err(e) if e.is_retryable() => {
                    warn!(
                        user_id = %session.user_id,
                        session_id = %session.session_id,
                        attempt,
                        error = %e,
                        "Fatigue write conflict, retrying"
                    );
                }
                Err(e) => return Err(e),
            }
        }

        Err(RecoveryError::WriteConflict { attempts })
    }

    fn try_record(
        &mut self,
        session: &SessionLog,
        contributions: &[SessionContribution],
    ) -> Result<RecordOutcome> {
        let config = &self.config;
        let user_id = session.user_id.as_str();
        let trained_at = session.completed_at;

        self.db.write_transaction(|tx| {
            if tx.session_recorded(user_id, &session.session_id)? {
                return Ok(RecordOutcome {
                    session_id: session.session_id.clone(),
                    applied: false,
                    updated: Vec::new(),
                });
            }

            let stored = tx.fatigue_records(user_id)?;

            // What the user would have been told right before this session
            let before = classify_all(user_id, &stored, trained_at);
            let last_suggested = tx.last_suggested_workout(user_id)?;
            let recommender = Recommender::new(config);
            let suggested: SuggestedWorkout =
                recommender.choose(&recommender.split_readiness(&before), last_suggested);

            let aggregator = VolumeAggregator::new(config);
            let mut updated = Vec::with_capacity(contributions.len());
            for contribution in contributions {
                let current = stored
                    .iter()
                    .find(|r| r.muscle_group == contribution.muscle_group)
                    .cloned()
                    .unwrap_or_else(|| MuscleFatigueRecord::untrained(user_id, contribution.muscle_group));

                let next = aggregator.apply(&current, contribution, trained_at);
                debug!(
                    muscle = %contribution.muscle_group,
                    volume = contribution.volume,
                    before = current.fatigue_level,
                    after = next.fatigue_level,
                    "Folded session volume"
                );
                tx.write_record(&next)?;
                updated.push(MuscleStatus::from_record(&next, trained_at));
            }

            let touched: Vec<MuscleGroup> = contributions.iter().map(|c| c.muscle_group).collect();
            tx.append_log(user_id, &session.session_id, trained_at, &touched, Some(suggested))?;

            Ok(RecordOutcome {
                session_id: session.session_id.clone(),
                applied: true,
                updated,
            })
        })
    }
}

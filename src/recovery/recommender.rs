//! Next-workout recommendation from per-muscle recovery state

use serde::{Deserialize, Serialize};

use super::classifier::{MuscleStatus, RecoveryStatus};
use crate::config::EngineConfig;
use crate::muscles::{MuscleGroup, SplitType, SuggestedWorkout};

/// A muscle that is not ready yet, with how far along it is
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NeedsRest {
    pub muscle_group: MuscleGroup,
    pub recovery_progress: u8,
}

/// Readiness score for one split
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitReadiness {
    pub split: SplitType,
    /// Mean recovery progress of the split's members, 0-100
    pub score: f64,
    /// Every member is fatigued; never suggested
    pub blocked: bool,
}

/// Per-request recommendation, never persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryRecommendation {
    pub ready_to_train: Vec<MuscleGroup>,
    pub needs_rest: Vec<NeedsRest>,
    pub suggested_workout: SuggestedWorkout,
    pub split_readiness: Vec<SplitReadiness>,
    pub muscle_status: Vec<MuscleStatus>,
}

/// Split selection policy
pub struct Recommender<'a> {
    config: &'a EngineConfig,
}

impl<'a> Recommender<'a> {
    pub fn new(config: &'a EngineConfig) -> Self {
        Self { config }
    }

    /// Score every trainable split. Muscles without a status count as fresh.
    pub fn split_readiness(&self, statuses: &[MuscleStatus]) -> Vec<SplitReadiness> {
        SplitType::trainable()
            .iter()
            .map(|split| {
                let members = split.members();
                let member_states: Vec<(u8, RecoveryStatus)> = members
                    .iter()
                    .map(|group| {
                        statuses
                            .iter()
                            .find(|s| s.muscle_group == *group)
                            .map(|s| (s.recovery_progress, s.recovery_status))
                            .unwrap_or((100, RecoveryStatus::Recovered))
                    })
                    .collect();

                let score = if member_states.is_empty() {
                    0.0
                } else {
                    member_states.iter().map(|(p, _)| *p as f64).sum::<f64>() / member_states.len() as f64
                };
                let blocked = !member_states.is_empty()
                    && member_states.iter().all(|(_, s)| *s == RecoveryStatus::Fatigued);

                SplitReadiness { split: *split, score, blocked }
            })
            .collect()
    }

    /// Highest readiness wins. Among near ties the split suggested last time is
    /// skipped; a clearly better score is never overridden.
    pub fn choose(
        &self,
        readiness: &[SplitReadiness],
        last_suggested: Option<SuggestedWorkout>,
    ) -> SuggestedWorkout {
        let candidates: Vec<&SplitReadiness> = readiness.iter().filter(|r| !r.blocked).collect();

        let best = candidates.iter().map(|r| r.score).fold(f64::NEG_INFINITY, f64::max);
        if candidates.is_empty() || best < self.config.rest_threshold {
            return SuggestedWorkout::Rest;
        }

        let tied: Vec<&SplitReadiness> = candidates
            .into_iter()
            .filter(|r| best - r.score <= self.config.tie_margin && r.score >= self.config.rest_threshold)
            .collect();

        let last_split = last_suggested.and_then(|s| s.split());
        let rotated: Vec<&SplitReadiness> = if tied.len() > 1 {
            tied.iter().copied().filter(|r| Some(r.split) != last_split).collect()
        } else {
            tied.clone()
        };
        let pool = if rotated.is_empty() { &tied } else { &rotated };

        // Strict comparison keeps the earliest split on exact ties
        let mut pick = pool[0];
        for &r in pool.iter().skip(1) {
            if r.score > pick.score {
                pick = r;
            }
        }
        pick.split.into()
    }

    /// Compose the classified state of every muscle into one suggestion
    pub fn recommend(
        &self,
        statuses: Vec<MuscleStatus>,
        last_suggested: Option<SuggestedWorkout>,
    ) -> RecoveryRecommendation {
        let ready_to_train = statuses
            .iter()
            .filter(|s| s.recovery_status == RecoveryStatus::Recovered)
            .map(|s| s.muscle_group)
            .collect();

        let needs_rest = statuses
            .iter()
            .filter(|s| s.recovery_status != RecoveryStatus::Recovered)
            .map(|s| NeedsRest {
                muscle_group: s.muscle_group,
                recovery_progress: s.recovery_progress,
            })
            .collect();

        let split_readiness = self.split_readiness(&statuses);
        let suggested_workout = self.choose(&split_readiness, last_suggested);

        RecoveryRecommendation {
            ready_to_train,
            needs_rest,
            suggested_workout,
            split_readiness,
            muscle_status: statuses,
        }
    }
}

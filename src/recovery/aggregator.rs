//! Folds a completed session's volume into per-muscle fatigue

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::decay::decay;
use crate::config::EngineConfig;
use crate::db::MuscleFatigueRecord;
use crate::error::Result;
use crate::muscles::MuscleGroup;
use crate::session::{AttributionRole, SessionLog};

/// One muscle group's share of a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionContribution {
    pub muscle_group: MuscleGroup,
    /// Weighted load x reps x sets
    pub volume: f64,
    pub sets: i32,
}

/// Turns logged sets into fatigue updates
pub struct VolumeAggregator<'a> {
    config: &'a EngineConfig,
}

impl<'a> VolumeAggregator<'a> {
    pub fn new(config: &'a EngineConfig) -> Self {
        Self { config }
    }

    fn role_weight(&self, role: AttributionRole) -> f64 {
        match role {
            AttributionRole::Primary => self.config.primary_weight,
            AttributionRole::Secondary => self.config.secondary_weight,
        }
    }

    /// Sum volume per muscle group across every exercise in the session.
    ///
    /// Fails on the first muscle id outside the taxonomy so that no part of
    /// the session is applied.
    pub fn session_volumes(&self, session: &SessionLog) -> Result<Vec<SessionContribution>> {
        let mut totals: BTreeMap<MuscleGroup, SessionContribution> = BTreeMap::new();

        for exercise in &session.exercises {
            // Strongest role wins if a caller lists the same muscle twice for one exercise
            let mut weights: BTreeMap<MuscleGroup, f64> = BTreeMap::new();
            for attribution in &exercise.muscle_groups {
                let group = MuscleGroup::from_id(&attribution.muscle_group)?;
                let weight = self.role_weight(attribution.role);
                let entry = weights.entry(group).or_insert(weight);
                *entry = entry.max(weight);
            }

            let load = match exercise.load {
                Some(load) => load,
                None => self.config.bodyweight_load,
            };
            let sets = exercise.sets.max(0);
            let base_volume = if load > 0.0 && exercise.reps > 0 && sets > 0 {
                load * exercise.reps as f64 * sets as f64
            } else {
                0.0
            };

            for (group, weight) in weights {
                let total = totals.entry(group).or_insert(SessionContribution {
                    muscle_group: group,
                    volume: 0.0,
                    sets: 0,
                });
                total.volume += base_volume * weight.max(0.0);
                total.sets = total.sets.saturating_add(sets);
            }
        }

        Ok(totals.into_values().collect())
    }

    /// Saturating volume -> fatigue conversion
    pub fn fatigue_delta(&self, group: MuscleGroup, volume: f64) -> f64 {
        if volume <= 0.0 {
            return 0.0;
        }
        (volume / group.volume_normalizer()).min(self.config.max_fatigue_delta)
    }

    /// Bring `current` forward to `trained_at`, stack the session on top, clamp.
    pub fn apply(
        &self,
        current: &MuscleFatigueRecord,
        contribution: &SessionContribution,
        trained_at: DateTime<Utc>,
    ) -> MuscleFatigueRecord {
        let half_life = contribution.muscle_group.recovery_half_life_hours();
        let carried = match current.last_trained_at {
            Some(at) => decay(current.fatigue_level as f64, at, trained_at, half_life),
            None => 0.0,
        };
        let delta = self.fatigue_delta(contribution.muscle_group, contribution.volume);
        let fatigue_level = (carried + delta).clamp(0.0, 100.0).round() as u8;

        // An out-of-order (older) session only adds fatigue; the decay reference
        // and last-session snapshot stay with the newest session
        let (last_trained_at, volume_last_session, sets_last_session) = match current.last_trained_at {
            Some(at) if at > trained_at => (at, current.volume_last_session, current.sets_last_session),
            _ => (trained_at, contribution.volume, contribution.sets),
        };

        MuscleFatigueRecord {
            user_id: current.user_id.clone(),
            muscle_group: contribution.muscle_group,
            fatigue_level,
            last_trained_at: Some(last_trained_at),
            volume_last_session,
            sets_last_session,
            version: current.version,
        }
    }
}

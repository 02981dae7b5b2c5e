//! Maps decayed fatigue to a readiness status and a recovery ETA

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::decay::decayed_level;
use crate::db::MuscleFatigueRecord;
use crate::muscles::MuscleGroup;

/// At or below this level a muscle counts as recovered
pub const RECOVERED_MAX: u8 = 30;
/// At or below this level (and above `RECOVERED_MAX`) a muscle is recovering
pub const RECOVERING_MAX: u8 = 60;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryStatus {
    Recovered,
    Recovering,
    Fatigued,
}

impl RecoveryStatus {
    pub fn id(&self) -> &'static str {
        match self {
            RecoveryStatus::Recovered => "recovered",
            RecoveryStatus::Recovering => "recovering",
            RecoveryStatus::Fatigued => "fatigued",
        }
    }
}

/// Status for a (decayed) fatigue level
pub fn classify(fatigue: u8) -> RecoveryStatus {
    if fatigue <= RECOVERED_MAX {
        RecoveryStatus::Recovered
    } else if fatigue <= RECOVERING_MAX {
        RecoveryStatus::Recovering
    } else {
        RecoveryStatus::Fatigued
    }
}

/// 0 = exhausted, 100 = fully fresh
pub fn recovery_progress(fatigue: u8) -> u8 {
    100 - fatigue.min(100)
}

/// When the stored level decays to `RECOVERED_MAX`, solving
/// `stored * 0.5^(t / half_life) = 30` for `t`.
pub fn recovery_eta(
    stored_fatigue: u8,
    last_trained_at: DateTime<Utc>,
    half_life_hours: f64,
) -> Option<DateTime<Utc>> {
    if stored_fatigue <= RECOVERED_MAX {
        return None;
    }
    let hours = half_life_hours * (stored_fatigue as f64 / RECOVERED_MAX as f64).log2();
    let millis = (hours * 3_600_000.0).round() as i64;
    Some(last_trained_at + Duration::milliseconds(millis))
}

/// Live, classified view of one muscle group for one user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MuscleStatus {
    pub muscle_group: MuscleGroup,
    /// Decayed to the instant the status was computed
    pub fatigue_level: u8,
    pub last_trained_at: Option<DateTime<Utc>>,
    pub estimated_full_recovery_at: Option<DateTime<Utc>>,
    pub volume_last_session: f64,
    pub sets_last_session: i32,
    pub recovery_status: RecoveryStatus,
    pub recovery_progress: u8,
}

impl MuscleStatus {
    /// Classify a stored record as of `now`
    pub fn from_record(record: &MuscleFatigueRecord, now: DateTime<Utc>) -> Self {
        let half_life = record.muscle_group.recovery_half_life_hours();
        let fatigue_level = decayed_level(record.fatigue_level, record.last_trained_at, now, half_life);
        let recovery_status = classify(fatigue_level);

        let estimated_full_recovery_at = match (recovery_status, record.last_trained_at) {
            (RecoveryStatus::Recovered, _) | (_, None) => None,
            (_, Some(at)) => recovery_eta(record.fatigue_level, at, half_life),
        };

        Self {
            muscle_group: record.muscle_group,
            fatigue_level,
            last_trained_at: record.last_trained_at,
            estimated_full_recovery_at,
            volume_last_session: record.volume_last_session,
            sets_last_session: record.sets_last_session,
            recovery_status,
            recovery_progress: recovery_progress(fatigue_level),
        }
    }
}

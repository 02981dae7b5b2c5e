//! Completed-session payload handed over by the workout logging subsystem

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{RecoveryError, Result};

/// Whether a muscle is the main target of an exercise or assists it
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AttributionRole {
    #[default]
    Primary,
    Secondary,
}

/// One muscle group an exercise works, as declared by the caller
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MuscleAttribution {
    pub muscle_group: String,
    #[serde(default)]
    pub role: AttributionRole,
}

/// Logged work for one exercise in a session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggedExercise {
    pub exercise_id: String,
    pub muscle_groups: Vec<MuscleAttribution>,
    pub sets: i32,
    pub reps: i32,
    /// External load in kg; `None` for bodyweight work
    #[serde(default)]
    pub load: Option<f64>,
}

/// A completed training session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionLog {
    pub session_id: String,
    pub user_id: String,
    pub completed_at: DateTime<Utc>,
    pub exercises: Vec<LoggedExercise>,
}

impl SessionLog {
    /// Reject payloads that cannot be attributed to a user or deduplicated
    pub fn validate(&self) -> Result<()> {
        if self.session_id.trim().is_empty() {
            return Err(RecoveryError::InvalidSession("session id is empty".into()));
        }
        if self.user_id.trim().is_empty() {
            return Err(RecoveryError::InvalidSession("user id is empty".into()));
        }
        Ok(())
    }
}

//! Recovery API endpoint handlers

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Value, json};

use super::{ApiError, AppState, USER_HEADER};
use crate::error::RecoveryError;
use crate::muscles::TAXONOMY_VERSION;
use crate::recovery::{MuscleStatus, RecordOutcome, RecoveryRecommendation};
use crate::session::SessionLog;

/// Optional evaluation instant; defaults to now
#[derive(Debug, Deserialize)]
pub struct AsOfParams {
    pub at: Option<DateTime<Utc>>,
}

impl AsOfParams {
    fn instant(&self) -> DateTime<Utc> {
        self.at.unwrap_or_else(Utc::now)
    }
}

/// Evaluation instant from `?at=`, rejecting anything that is not RFC 3339
fn as_of(params: Result<Query<AsOfParams>, QueryRejection>) -> Result<DateTime<Utc>, ApiError> {
    let Query(params) = params.map_err(|e| RecoveryError::InvalidTimestamp(e.body_text()))?;
    Ok(params.instant())
}

fn user_id(headers: &HeaderMap) -> Result<String, ApiError> {
    headers
        .get(USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or(ApiError::MissingUser)
}

/// Liveness check
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "taxonomyVersion": TAXONOMY_VERSION,
    }))
}

/// Live fatigue for every muscle group
pub async fn get_fatigue(
    State(state): State<AppState>,
    headers: HeaderMap,
    params: Result<Query<AsOfParams>, QueryRejection>,
) -> Result<Json<Vec<MuscleStatus>>, ApiError> {
    let user_id = user_id(&headers)?;
    let at = as_of(params)?;
    let engine = state.engine.lock().await;
    let report = engine.fatigue_report(&user_id, at)?;
    Ok(Json(report))
}

/// Ready / needs-rest lists and the suggested workout
pub async fn get_recommendations(
    State(state): State<AppState>,
    headers: HeaderMap,
    params: Result<Query<AsOfParams>, QueryRejection>,
) -> Result<Json<RecoveryRecommendation>, ApiError> {
    let user_id = user_id(&headers)?;
    let at = as_of(params)?;
    let engine = state.engine.lock().await;
    let recommendation = engine.recommend(&user_id, at)?;
    Ok(Json(recommendation))
}

/// Completed session from the workout logging subsystem
pub async fn record_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<SessionLog>, JsonRejection>,
) -> Result<Json<RecordOutcome>, ApiError> {
    let user_id = user_id(&headers)?;
    let Json(session) = payload.map_err(|e| RecoveryError::InvalidSession(e.body_text()))?;
    if session.user_id != user_id {
        return Err(RecoveryError::InvalidSession(format!(
            "session belongs to {}, not {}",
            session.user_id, user_id
        ))
        .into());
    }

    let mut engine = state.engine.lock().await;
    let outcome = engine.record_session(&session)?;
    Ok(Json(outcome))
}

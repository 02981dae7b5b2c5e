//! HTTP API - recovery endpoints consumed by the client app

pub mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use serde_json::json;
use tokio::sync::Mutex;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::error::RecoveryError;
use crate::recovery::RecoveryEngine;

/// Header carrying the authenticated user id, set by the auth layer in front of us
pub const USER_HEADER: &str = "x-user-id";

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Mutex<RecoveryEngine>>,
}

impl AppState {
    pub fn new(engine: RecoveryEngine) -> Self {
        Self {
            engine: Arc::new(Mutex::new(engine)),
        }
    }
}

/// Errors surfaced to HTTP clients
#[derive(Debug)]
pub enum ApiError {
    MissingUser,
    Engine(RecoveryError),
}

impl From<RecoveryError> for ApiError {
    fn from(e: RecoveryError) -> Self {
        ApiError::Engine(e)
    }
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::MissingUser => (StatusCode::UNAUTHORIZED, "MISSING_USER"),
            ApiError::Engine(RecoveryError::UnknownMuscleGroup(_)) => {
                (StatusCode::BAD_REQUEST, "UNKNOWN_MUSCLE_GROUP")
            }
            ApiError::Engine(RecoveryError::InvalidSession(_)) => (StatusCode::BAD_REQUEST, "INVALID_SESSION"),
            ApiError::Engine(RecoveryError::InvalidTimestamp(_)) => {
                (StatusCode::BAD_REQUEST, "INVALID_TIMESTAMP")
            }
            ApiError::Engine(RecoveryError::WriteConflict { .. }) => {
                (StatusCode::SERVICE_UNAVAILABLE, "WRITE_CONFLICT")
            }
            ApiError::Engine(e) if e.is_retryable() => (StatusCode::SERVICE_UNAVAILABLE, "WRITE_CONFLICT"),
            ApiError::Engine(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let message = match &self {
            ApiError::MissingUser => format!("missing {} header", USER_HEADER),
            ApiError::Engine(e) => e.to_string(),
        };

        if status.is_server_error() {
            error!(code, %message, "Request failed");
        }

        (status, Json(json!({ "error": { "code": code, "message": message } }))).into_response()
    }
}

/// Build the axum router with all recovery routes
pub fn build_router(engine: RecoveryEngine) -> Router {
    let state = AppState::new(engine);

    Router::new()
        .route("/api/health", get(handlers::health_check))
        .route("/api/recovery/fatigue", get(handlers::get_fatigue))
        .route("/api/recovery/recommendations", get(handlers::get_recommendations))
        .route("/api/recovery/sessions", post(handlers::record_session))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

/// Bind and serve until the process is stopped
pub async fn serve(engine: RecoveryEngine, addr: SocketAddr) -> anyhow::Result<()> {
    let app = build_router(engine);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Recovery API listening on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::MissingUser.status_and_code().0, StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::from(RecoveryError::UnknownMuscleGroup("neck".into())).status_and_code(),
            (StatusCode::BAD_REQUEST, "UNKNOWN_MUSCLE_GROUP")
        );
        assert_eq!(
            ApiError::from(RecoveryError::WriteConflict { attempts: 3 }).status_and_code().0,
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError::from(RecoveryError::InvalidTimestamp("x".into())).status_and_code(),
            (StatusCode::BAD_REQUEST, "INVALID_TIMESTAMP")
        );
        assert_eq!(
            ApiError::from(RecoveryError::StaleRecord).status_and_code().0,
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}

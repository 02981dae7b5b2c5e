//! HTTP tests for the recovery API, driven in-process through the router

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

use recovery_engine::api::{USER_HEADER, build_router};
use recovery_engine::{Database, EngineConfig, RecoveryEngine};

fn app() -> Router {
    let engine = RecoveryEngine::new(Database::open_in_memory().unwrap(), EngineConfig::default());
    build_router(engine)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn get(uri: &str, user: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(Method::GET).uri(uri);
    if let Some(user) = user {
        builder = builder.header(USER_HEADER, user);
    }
    builder.body(Body::empty()).unwrap()
}

fn post_session(user: &str, payload: &Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/api/recovery/sessions")
        .header(USER_HEADER, user)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap()
}

fn chest_day(session_id: &str, user: &str) -> Value {
    json!({
        "sessionId": session_id,
        "userId": user,
        "completedAt": "2026-03-01T08:00:00Z",
        "exercises": [
            {
                "exerciseId": "bench-press",
                "muscleGroups": [
                    {"muscleGroup": "chest"},
                    {"muscleGroup": "triceps", "role": "secondary"}
                ],
                "sets": 5, "reps": 10, "load": 80.0
            },
            {
                "exerciseId": "dips",
                "muscleGroups": [
                    {"muscleGroup": "triceps"},
                    {"muscleGroup": "chest", "role": "secondary"}
                ],
                "sets": 3, "reps": 12
            }
        ]
    })
}

fn entry<'a>(report: &'a Value, muscle: &str) -> &'a Value {
    report
        .as_array()
        .unwrap()
        .iter()
        .find(|m| m["muscleGroup"] == muscle)
        .unwrap()
}

#[tokio::test]
async fn test_health() {
    let app = app();
    let (status, body) = send(&app, get("/api/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_fatigue_requires_user() {
    let app = app();
    let (status, body) = send(&app, get("/api/recovery/fatigue", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "MISSING_USER");
}

#[tokio::test]
async fn test_untrained_user_is_fully_recovered() {
    let app = app();
    let (status, body) = send(&app, get("/api/recovery/fatigue", Some("client-1"))).await;
    assert_eq!(status, StatusCode::OK);

    let muscles = body.as_array().unwrap();
    assert_eq!(muscles.len(), 10);
    for m in muscles {
        assert_eq!(m["fatigueLevel"], 0);
        assert_eq!(m["recoveryStatus"], "recovered");
        assert!(m["lastTrainedAt"].is_null());
        assert!(m["estimatedFullRecoveryAt"].is_null());
        assert_eq!(m["setsLastSession"], 0);
    }
}

#[tokio::test]
async fn test_record_session_then_read_fatigue() {
    let app = app();
    let (status, outcome) = send(&app, post_session("client-1", &chest_day("s-1", "client-1"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["applied"], true);
    assert_eq!(outcome["sessionId"], "s-1");

    // Read at the session instant so no decay has happened yet
    let uri = "/api/recovery/fatigue?at=2026-03-01T08:00:00Z";
    let (status, report) = send(&app, get(uri, Some("client-1"))).await;
    assert_eq!(status, StatusCode::OK);

    let chest = entry(&report, "chest");
    // bench 80*10*5 + dips (bodyweight 40)*12*3*0.5
    assert_eq!(chest["volumeLastSession"], 4000.0 + 720.0);
    assert_eq!(chest["setsLastSession"], 8);
    // one session saturates at the maximum delta
    assert_eq!(chest["fatigueLevel"], 60);
    assert_eq!(chest["recoveryStatus"], "recovering");
    assert_eq!(chest["lastTrainedAt"], "2026-03-01T08:00:00Z");
    assert!(chest["estimatedFullRecoveryAt"].is_string());

    assert_eq!(entry(&report, "quads")["fatigueLevel"], 0);

    // Another user is unaffected
    let (_, other) = send(&app, get(uri, Some("client-2"))).await;
    assert_eq!(entry(&other, "chest")["fatigueLevel"], 0);
}

#[tokio::test]
async fn test_fatigue_read_is_idempotent() {
    let app = app();
    send(&app, post_session("client-1", &chest_day("s-1", "client-1"))).await;

    let uri = "/api/recovery/fatigue?at=2026-03-02T12:30:00Z";
    let (_, first) = send(&app, get(uri, Some("client-1"))).await;
    let (_, second) = send(&app, get(uri, Some("client-1"))).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_fatigue_decays_over_time() {
    let app = app();
    send(&app, post_session("client-1", &chest_day("s-1", "client-1"))).await;

    let mut previous = i64::MAX;
    for at in [
        "2026-03-01T08:00:00Z",
        "2026-03-02T08:00:00Z",
        "2026-03-04T08:00:00Z",
        "2026-03-10T08:00:00Z",
    ] {
        let (_, report) = send(&app, get(&format!("/api/recovery/fatigue?at={}", at), Some("client-1"))).await;
        let level = entry(&report, "chest")["fatigueLevel"].as_i64().unwrap();
        assert!(level <= previous, "fatigue rose to {} at {}", level, at);
        previous = level;
    }
    assert!(previous <= 30);
}

#[tokio::test]
async fn test_recommendations_shape_and_rotation() {
    let app = app();
    send(&app, post_session("client-1", &chest_day("s-1", "client-1"))).await;

    let uri = "/api/recovery/recommendations?at=2026-03-01T10:00:00Z";
    let (status, body) = send(&app, get(uri, Some("client-1"))).await;
    assert_eq!(status, StatusCode::OK);

    assert!(body["readyToTrain"].as_array().unwrap().iter().any(|m| m == "back"));
    let needs_rest = body["needsRest"].as_array().unwrap();
    let chest = needs_rest.iter().find(|n| n["muscleGroup"] == "chest").unwrap();
    assert!(chest["recoveryProgress"].as_u64().unwrap() < 50);
    assert_eq!(body["muscleStatus"].as_array().unwrap().len(), 10);

    // Push muscles are worn out; pull and legs are tied at 100, and push was
    // the suggestion logged with the last session, so pull wins the tie
    assert_eq!(body["suggestedWorkout"], "pull");
}

#[tokio::test]
async fn test_duplicate_session_is_not_reapplied() {
    let app = app();
    let payload = chest_day("s-1", "client-1");
    send(&app, post_session("client-1", &payload)).await;
    let (status, outcome) = send(&app, post_session("client-1", &payload)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["applied"], false);
    assert!(outcome["updated"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_muscle_group_is_client_error() {
    let app = app();
    let mut payload = chest_day("s-1", "client-1");
    payload["exercises"][1]["muscleGroups"][0]["muscleGroup"] = json!("forearms");

    let (status, body) = send(&app, post_session("client-1", &payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "UNKNOWN_MUSCLE_GROUP");

    // Nothing from the rejected session was applied
    let (_, report) = send(&app, get("/api/recovery/fatigue", Some("client-1"))).await;
    assert_eq!(entry(&report, "chest")["fatigueLevel"], 0);
}

#[tokio::test]
async fn test_malformed_timestamp_is_json_client_error() {
    let app = app();
    for uri in [
        "/api/recovery/fatigue?at=yesterday",
        "/api/recovery/recommendations?at=2026-13-45",
    ] {
        let (status, body) = send(&app, get(uri, Some("client-1"))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(body["error"]["code"], "INVALID_TIMESTAMP");
        assert!(body["error"]["message"].is_string());
    }
}

#[tokio::test]
async fn test_malformed_session_body_is_json_client_error() {
    let app = app();
    let (status, body) = send(&app, post_session("client-1", &json!({ "sessionId": "s" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_SESSION");

    let (_, report) = send(&app, get("/api/recovery/fatigue", Some("client-1"))).await;
    assert!(report.as_array().unwrap().iter().all(|m| m["fatigueLevel"] == 0));
}

#[tokio::test]
async fn test_session_for_another_user_rejected() {
    let app = app();
    let (status, body) = send(&app, post_session("client-1", &chest_day("s-1", "client-2"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_SESSION");
}

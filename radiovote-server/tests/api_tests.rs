//! Integration tests for radiovote-server API endpoints
//!
//! Tests cover:
//! - Tally lookup for fresh and voted tracks
//! - Vote submission, duplicate-vote conflict and validation errors
//! - Per-caller vote status
//! - Identity resolution precedence through the HTTP stack
//! - Health and build-info endpoints

use axum::{
    body::Body,
    extract::connect_info::MockConnectInfo,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use radiovote_common::db::{init_database, VoteLedger};
use radiovote_server::identity::ConnectionPeer;
use radiovote_server::{build_router, AppState};
use serde_json::{json, Value};
use std::net::SocketAddr;
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot` method

/// Test helper: app backed by a fresh database in a temp directory
async fn setup_app() -> (TempDir, VoteLedger, Router) {
    let dir = TempDir::new().unwrap();
    let pool = init_database(&dir.path().join("radiovote.db")).await.unwrap();
    let ledger = VoteLedger::new(pool);
    let app = build_router(AppState::new(ledger.clone()));
    (dir, ledger, app)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// POST /api/votes from a client at `ip` (sent as X-Forwarded-For)
fn vote_from(ip: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/votes")
        .header("content-type", "application/json")
        .header("x-forwarded-for", ip)
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

// =============================================================================
// Tally
// =============================================================================

#[tokio::test]
async fn test_fresh_track_tally() {
    let (_dir, _ledger, app) = setup_app().await;

    let (status, body) = send(&app, get("/api/votes/artistx%7C%7Csongy")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"trackIdentity": "artistx||songy", "upCount": 0, "downCount": 0})
    );
}

#[tokio::test]
async fn test_tally_path_is_url_decoded() {
    let (_dir, ledger, app) = setup_app().await;
    ledger
        .submit("some track/with spaces", "a", radiovote_common::db::Polarity::Up)
        .await
        .unwrap();

    let (status, body) = send(&app, get("/api/votes/some%20track%2Fwith%20spaces")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["trackIdentity"], "some track/with spaces");
    assert_eq!(body["upCount"], 1);
}

#[tokio::test]
async fn test_undecodable_path_is_json_validation_error() {
    let (_dir, _ledger, app) = setup_app().await;

    for uri in ["/api/votes/%FF%FE", "/api/votes/%FF%FE/status"] {
        let (status, body) = send(&app, get(uri)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST, "uri {}", uri);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "validation");
        assert!(body["message"].is_string());
    }
}

// =============================================================================
// Submission
// =============================================================================

#[tokio::test]
async fn test_first_vote_succeeds() {
    let (_dir, _ledger, app) = setup_app().await;

    let (status, body) = send(
        &app,
        vote_from("203.0.113.1", json!({"trackIdentity": "artistx||songy", "polarity": 1})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true, "upCount": 1, "downCount": 0}));
}

#[tokio::test]
async fn test_duplicate_vote_conflict() {
    let (_dir, _ledger, app) = setup_app().await;

    let (status, _) = send(
        &app,
        vote_from("203.0.113.1", json!({"trackIdentity": "artistx||songy", "polarity": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        vote_from("203.0.113.1", json!({"trackIdentity": "artistx||songy", "polarity": -1})),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "conflict");
    assert!(body["message"].as_str().unwrap().contains("already voted"));

    let (_, tally) = send(&app, get("/api/votes/artistx%7C%7Csongy")).await;
    assert_eq!(tally["upCount"], 1);
    assert_eq!(tally["downCount"], 0);
}

#[tokio::test]
async fn test_distinct_identities_both_counted() {
    let (_dir, _ledger, app) = setup_app().await;

    send(
        &app,
        vote_from("203.0.113.1", json!({"trackIdentity": "artistx||songy", "polarity": 1})),
    )
    .await;
    let (status, body) = send(
        &app,
        vote_from("203.0.113.2", json!({"trackIdentity": "artistx||songy", "polarity": -1})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true, "upCount": 1, "downCount": 1}));

    let (_, tally) = send(&app, get("/api/votes/artistx%7C%7Csongy")).await;
    assert_eq!(tally["upCount"], 1);
    assert_eq!(tally["downCount"], 1);
}

#[tokio::test]
async fn test_invalid_polarity_rejected() {
    let (_dir, ledger, app) = setup_app().await;

    for polarity in [json!(0), json!(2), json!("1"), json!(1.5), json!(true)] {
        let (status, body) = send(
            &app,
            vote_from("203.0.113.1", json!({"trackIdentity": "t1", "polarity": polarity})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST, "polarity {}", polarity);
        assert_eq!(body["error"], "validation");
    }

    let (_, tally) = send(&app, get("/api/votes/t1")).await;
    assert_eq!(tally["upCount"], 0);
    assert_eq!(tally["downCount"], 0);
    assert!(ledger.votes_for_track("t1").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_fields_rejected() {
    let (_dir, _ledger, app) = setup_app().await;

    let cases = [
        json!({"polarity": 1}),
        json!({"trackIdentity": "", "polarity": 1}),
        json!({"trackIdentity": "t1"}),
        json!({"trackIdentity": "t1", "polarity": null}),
        json!({}),
    ];

    for body in cases {
        let (status, response) = send(&app, vote_from("203.0.113.1", body.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body {}", body);
        assert_eq!(response["success"], false);
        assert_eq!(response["error"], "validation");
    }
}

#[tokio::test]
async fn test_malformed_json_rejected() {
    let (_dir, _ledger, app) = setup_app().await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/votes")
        .header("content-type", "application/json")
        .header("x-forwarded-for", "203.0.113.1")
        .body(Body::from("{not json"))
        .unwrap();

    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation");
}

#[tokio::test]
async fn test_vote_without_identity_rejected() {
    let (_dir, ledger, app) = setup_app().await;

    // No headers and no connection info: identity cannot be resolved
    let request = Request::builder()
        .method("POST")
        .uri("/api/votes")
        .header("content-type", "application/json")
        .body(Body::from(json!({"trackIdentity": "t1", "polarity": 1}).to_string()))
        .unwrap();

    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation");
    assert!(ledger.votes_for_track("t1").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_storage_failure_is_generic_internal_error() {
    let (_dir, ledger, app) = setup_app().await;

    sqlx::query("DROP TABLE votes")
        .execute(ledger.pool())
        .await
        .unwrap();

    let (status, body) = send(
        &app,
        vote_from("203.0.113.1", json!({"trackIdentity": "t1", "polarity": 1})),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "internal");

    // Storage details are logged, not returned
    let message = body["message"].as_str().unwrap();
    assert_eq!(message, "Internal server error");
    assert!(!message.to_lowercase().contains("sqlx"));
    assert!(!message.contains("votes"));
}

// =============================================================================
// Vote status
// =============================================================================

#[tokio::test]
async fn test_vote_status() {
    let (_dir, _ledger, app) = setup_app().await;

    let status_request = |ip: &str| {
        Request::builder()
            .method("GET")
            .uri("/api/votes/t1/status")
            .header("x-forwarded-for", ip)
            .body(Body::empty())
            .unwrap()
    };

    let (status, body) = send(&app, status_request("203.0.113.1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"hasVoted": false, "polarity": null}));

    send(
        &app,
        vote_from("203.0.113.1", json!({"trackIdentity": "t1", "polarity": -1})),
    )
    .await;

    let (_, body) = send(&app, status_request("203.0.113.1")).await;
    assert_eq!(body, json!({"hasVoted": true, "polarity": -1}));

    let (_, body) = send(&app, status_request("203.0.113.2")).await;
    assert_eq!(body, json!({"hasVoted": false, "polarity": null}));
}

#[tokio::test]
async fn test_vote_status_without_identity() {
    let (_dir, _ledger, app) = setup_app().await;

    let (status, body) = send(&app, get("/api/votes/t1/status")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"hasVoted": false, "polarity": null}));
}

// =============================================================================
// Identity precedence through the HTTP stack
// =============================================================================

#[tokio::test]
async fn test_forwarded_for_beats_real_ip_and_socket() {
    let (_dir, ledger, app) = setup_app().await;
    let socket: SocketAddr = "192.0.2.10:50000".parse().unwrap();
    let app = app.layer(MockConnectInfo(socket));

    let request = Request::builder()
        .method("POST")
        .uri("/api/votes")
        .header("content-type", "application/json")
        .header("x-forwarded-for", "203.0.113.1, 10.0.0.1")
        .header("x-real-ip", "198.51.100.7")
        .body(Body::from(json!({"trackIdentity": "t1", "polarity": 1}).to_string()))
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);

    let votes = ledger.votes_for_track("t1").await.unwrap();
    assert_eq!(votes.len(), 1);
    assert_eq!(votes[0].identity, "203.0.113.1");
}

#[tokio::test]
async fn test_real_ip_then_socket_fallbacks() {
    let (_dir, ledger, app) = setup_app().await;
    let socket: SocketAddr = "192.0.2.10:50000".parse().unwrap();
    let app = app.layer(MockConnectInfo(socket));

    let with_real_ip = Request::builder()
        .method("POST")
        .uri("/api/votes")
        .header("content-type", "application/json")
        .header("x-real-ip", "198.51.100.7")
        .body(Body::from(json!({"trackIdentity": "t1", "polarity": 1}).to_string()))
        .unwrap();
    send(&app, with_real_ip).await;

    let socket_only = Request::builder()
        .method("POST")
        .uri("/api/votes")
        .header("content-type", "application/json")
        .body(Body::from(json!({"trackIdentity": "t1", "polarity": -1}).to_string()))
        .unwrap();
    send(&app, socket_only).await;

    let identities: Vec<String> = ledger
        .votes_for_track("t1")
        .await
        .unwrap()
        .into_iter()
        .map(|v| v.identity)
        .collect();
    assert_eq!(identities, vec!["198.51.100.7", "192.0.2.10"]);
}

#[tokio::test]
async fn test_connection_peer_fallback() {
    let (_dir, ledger, app) = setup_app().await;

    let mut request = Request::builder()
        .method("POST")
        .uri("/api/votes")
        .header("content-type", "application/json")
        .body(Body::from(json!({"trackIdentity": "t1", "polarity": 1}).to_string()))
        .unwrap();
    request
        .extensions_mut()
        .insert(ConnectionPeer("192.0.2.99".to_string()));

    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);

    let votes = ledger.votes_for_track("t1").await.unwrap();
    assert_eq!(votes[0].identity, "192.0.2.99");
}

// =============================================================================
// Ambient endpoints
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let (_dir, _ledger, app) = setup_app().await;

    let (status, body) = send(&app, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "radiovote-server");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_build_info_endpoint() {
    let (_dir, _ledger, app) = setup_app().await;

    let (status, body) = send(&app, get("/api/buildinfo")).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["version"].is_string());
    assert!(body["gitHash"].is_string());
    assert!(body["buildTimestamp"].is_string());
    assert!(body["buildProfile"].is_string());
}

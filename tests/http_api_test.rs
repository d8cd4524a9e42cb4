//! Tests for the REST transport.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use axum::routing::get;
use bulls_cows::{
    CodeRules, ENV_ALLOWED_HOST, ENV_REQUEST_TIMEOUT, ErrorKind, InMemoryMatchStore,
    MatchService, ServerConfig, router, status_for, with_http_policy,
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

fn app() -> Router {
    router(Arc::new(MatchService::new(
        InMemoryMatchStore::default(),
        CodeRules::default(),
    )))
}

const FRONTEND: &str = "http://localhost:5173";

fn config_with(name: &'static str, value: &'static str) -> ServerConfig {
    ServerConfig::default()
        .with_env_from(move |var: &str| (var == name).then(|| value.to_string()))
        .expect("Env failed")
        .validated()
        .expect("Invalid config")
}

fn browser_app(origin: &'static str) -> Router {
    with_http_policy(app(), &config_with(ENV_ALLOWED_HOST, origin))
}

fn preflight(origin: &str) -> Request<Body> {
    Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/v1/matches/create")
        .header(header::ORIGIN, origin)
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
        .body(Body::empty())
        .expect("Failed to build request")
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("Failed to build request");

    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("Router failed");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to read body")
        .to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("Body is not JSON")
    };
    (status, value)
}

/// Creates a room and joins it; returns (room id, alice id, bob id).
async fn full_room(app: &Router) -> (String, String, String) {
    let (status, created) = send(
        app,
        Method::POST,
        "/api/v1/matches/create",
        Some(json!({"username": "alice"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let room = created["room_id"].as_str().expect("room_id").to_string();

    let (status, joined) = send(
        app,
        Method::PUT,
        &format!("/api/v1/matches/join/{room}"),
        Some(json!({"username": "bob"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    (
        room,
        created["player"]["id"].as_str().expect("alice id").to_string(),
        joined["player"]["id"].as_str().expect("bob id").to_string(),
    )
}

#[test]
fn test_status_mapping() {
    assert_eq!(status_for(ErrorKind::InvalidCombination), StatusCode::BAD_REQUEST);
    assert_eq!(status_for(ErrorKind::MatchNotFound), StatusCode::NOT_FOUND);
    for kind in [
        ErrorKind::RoomFull,
        ErrorKind::RoomNotReady,
        ErrorKind::CombinationsMissing,
        ErrorKind::MatchNotStarted,
        ErrorKind::NotYourTurn,
    ] {
        assert_eq!(status_for(kind), StatusCode::CONFLICT, "{kind}");
    }
    assert_eq!(
        status_for(ErrorKind::StorageFailure),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

#[tokio::test]
async fn test_create_returns_room_and_player() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/matches/create",
        Some(json!({"username": "alice"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["room_id"].as_str().expect("room_id").len(), 7);
    assert_eq!(body["player"]["username"], "alice");
    assert!(body["player"]["id"].is_string());
}

#[tokio::test]
async fn test_blank_username_is_bad_request() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/matches/create",
        Some(json!({"username": "   "})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_long_username_is_bad_request() {
    let app = app();
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/matches/create",
        Some(json!({"username": "x".repeat(33)})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/matches/create",
        Some(json!({"name": "alice"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_malformed_room_id_is_bad_request() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/api/v1/matches/short", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(
        body["error"]
            .as_str()
            .expect("error message")
            .contains("7 alphanumeric")
    );
}

#[tokio::test]
async fn test_unknown_room_is_not_found() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/v1/matches/join/ZZZZZZZ",
        Some(json!({"username": "bob"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "match not found"}));
}

#[tokio::test]
async fn test_third_player_is_conflict() {
    let app = app();
    let (room, _, _) = full_room(&app).await;
    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/v1/matches/join/{room}"),
        Some(json!({"username": "carol"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "can not add another player to this room");
}

#[tokio::test]
async fn test_invalid_combination_is_bad_request() {
    let app = app();
    let (room, alice, _) = full_room(&app).await;
    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/v1/matches/setCombination/{room}"),
        Some(json!({"player_id": alice, "combination": "1123"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(
        body["error"]
            .as_str()
            .expect("error message")
            .starts_with("invalid combination")
    );
}

#[tokio::test]
async fn test_numeric_combination_is_bad_request() {
    let app = app();
    let (room, alice, _) = full_room(&app).await;
    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/api/v1/matches/setCombination/{room}"),
        Some(json!({"player_id": alice, "combination": 1234})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_start_before_combinations_is_conflict() {
    let app = app();
    let (room, _, _) = full_room(&app).await;
    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/v1/matches/startGame/{room}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "can not start game until players set combinations");
}

#[tokio::test]
async fn test_full_match_flow() {
    let app = app();
    let (room, alice, bob) = full_room(&app).await;

    for (player, combination) in [(&alice, "0123"), (&bob, "4567")] {
        let (status, body) = send(
            &app,
            Method::PUT,
            &format!("/api/v1/matches/setCombination/{room}"),
            Some(json!({"player_id": player, "combination": combination})),
        )
        .await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(body, json!({"success": true}));
    }

    let (status, started) = send(
        &app,
        Method::PUT,
        &format!("/api/v1/matches/startGame/{room}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    let first = started["is_turn_of"].as_str().expect("is_turn_of").to_string();
    assert!(first == alice || first == bob);

    let (second, winning_guess, losing_guess) = if first == alice {
        (bob.clone(), "4567", "0123")
    } else {
        (alice.clone(), "0123", "4567")
    };

    // Out of turn.
    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/v1/matches/makeGuess/{room}"),
        Some(json!({"player_id": second, "guess": "0123"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "this is not your turn");

    let (status, missed) = send(
        &app,
        Method::PUT,
        &format!("/api/v1/matches/makeGuess/{room}"),
        Some(json!({"player_id": first, "guess": losing_guess})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(missed["is_winner"], false);
    assert_eq!(missed["is_turn_of"], second.as_str());
    assert_eq!(missed["result"]["marks"][0]["kind"], "none");
    assert_eq!(missed["guesses"][&first].as_array().expect("history").len(), 1);

    let second_target = if winning_guess == "4567" { "0123" } else { "4567" };
    let (status, won) = send(
        &app,
        Method::PUT,
        &format!("/api/v1/matches/makeGuess/{room}"),
        Some(json!({"player_id": second, "guess": second_target})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(won["is_winner"], true);
    assert_eq!(won["result"]["is_winning"], true);

    let (status, view) = send(&app, Method::GET, &format!("/api/v1/matches/{room}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["status"], "Finished");
    assert!(!view.to_string().contains("OpponentsCombinations"));

    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/api/v1/matches/makeGuess/{room}"),
        Some(json!({"player_id": first, "guess": winning_guess})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/v1/matches/restart/{room}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true}));

    let (_, view) = send(&app, Method::GET, &format!("/api/v1/matches/{room}"), None).await;
    assert_eq!(view["status"], "FullRoom");
    assert_eq!(view["guesses"], json!({}));
    assert_eq!(view["players"].as_object().expect("players").len(), 2);
}

#[tokio::test]
async fn test_preflight_from_allowed_origin_is_answered() {
    let response = browser_app(FRONTEND)
        .oneshot(preflight(FRONTEND))
        .await
        .expect("Router failed");

    assert!(response.status().is_success());
    let headers = response.headers();
    assert_eq!(
        headers
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .expect("No allow-origin header"),
        FRONTEND
    );
    assert_eq!(
        headers
            .get(header::ACCESS_CONTROL_MAX_AGE)
            .expect("No max-age header"),
        "300"
    );
    let methods = headers
        .get(header::ACCESS_CONTROL_ALLOW_METHODS)
        .expect("No allow-methods header")
        .to_str()
        .expect("Methods not ASCII");
    for method in ["GET", "POST", "PUT", "DELETE", "OPTIONS"] {
        assert!(methods.contains(method), "{methods}");
    }
    let allowed_headers = headers
        .get(header::ACCESS_CONTROL_ALLOW_HEADERS)
        .expect("No allow-headers header")
        .to_str()
        .expect("Headers not ASCII")
        .to_ascii_lowercase();
    assert!(allowed_headers.contains("x-csrf-token"), "{allowed_headers}");
}

#[tokio::test]
async fn test_preflight_from_other_origin_is_not_allowed() {
    let response = browser_app(FRONTEND)
        .oneshot(preflight("http://evil.example"))
        .await
        .expect("Router failed");
    assert!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none()
    );
}

#[tokio::test]
async fn test_cross_origin_request_reaches_routes() {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/matches/create")
        .header(header::ORIGIN, FRONTEND)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({"username": "alice"}).to_string()))
        .expect("Failed to build request");

    let response = browser_app(FRONTEND)
        .oneshot(request)
        .await
        .expect("Router failed");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .expect("No allow-origin header"),
        FRONTEND
    );
}

#[tokio::test]
async fn test_slow_request_times_out() {
    let slow = Router::new().route(
        "/slow",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            "done"
        }),
    );
    let app = with_http_policy(slow, &config_with(ENV_REQUEST_TIMEOUT, "1"));

    let (status, body) = send(&app, Method::GET, "/slow", None).await;
    assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
    assert_eq!(body, json!({"error": "request timed out"}));
}

#[tokio::test]
async fn test_policy_keeps_fast_requests_intact() {
    let app = with_http_policy(app(), &ServerConfig::default());
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/matches/create",
        Some(json!({"username": "alice"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["player"]["username"], "alice");
}

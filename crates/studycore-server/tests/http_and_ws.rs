//! Exercises the HTTP routes and the `/ws` duplex channel (spec.md §6)
//! against a real bound listener, the same router `run` serves, backed by
//! an in-memory `StudyCore` so nothing touches disk.

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio_tungstenite::tungstenite::Message;

use studycore_server::state::AppState;
use studycore_testing::World;

/// Binds the router to an ephemeral port and returns its base HTTP/WS URLs.
async fn spawn_server(world: &World) -> (String, String) {
    let state = AppState { core: world.core.clone() };
    let app = studycore_server::build_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}"), format!("ws://{addr}/ws"))
}

#[tokio::test]
async fn create_verify_complete_round_trip_over_http() {
    let world = World::new();
    let (http, _ws) = spawn_server(&world).await;
    let client = reqwest::Client::new();
    let session_id = World::new_session_id();

    let created: Value = client
        .post(format!("{http}/session"))
        .json(&json!({"session_id": session_id.as_str()}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(created["success"], true);

    let verified: Value = client
        .post(format!("{http}/session/verify"))
        .json(&json!({"session_id": session_id.as_str()}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(verified["valid"], true);

    let completed = client
        .post(format!("{http}/session/complete"))
        .json(&json!({"session_id": session_id.as_str()}))
        .send()
        .await
        .unwrap();
    assert_eq!(completed.status(), reqwest::StatusCode::OK);

    let game_data_resp = client.get(format!("{http}/game-data")).query(&[("session_id", session_id.as_str())]).send().await.unwrap();
    assert_eq!(game_data_resp.status(), reqwest::StatusCode::NOT_FOUND);
    let body: Value = game_data_resp.json().await.unwrap();
    assert_eq!(body["session_completed"], true);
}

#[tokio::test]
async fn create_session_rejects_a_blank_session_id() {
    let world = World::new();
    let (http, _ws) = spawn_server(&world).await;
    let client = reqwest::Client::new();

    let resp = client.post(format!("{http}/session")).json(&json!({"session_id": "  "})).send().await.unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "missing-fields");
}

#[tokio::test]
async fn creating_the_same_session_twice_returns_a_conflict() {
    let world = World::new();
    let (http, _ws) = spawn_server(&world).await;
    let client = reqwest::Client::new();
    let session_id = World::new_session_id();

    let first = client.post(format!("{http}/session")).json(&json!({"session_id": session_id.as_str()})).send().await.unwrap();
    assert_eq!(first.status(), reqwest::StatusCode::OK);

    let second = client.post(format!("{http}/session")).json(&json!({"session_id": session_id.as_str()})).send().await.unwrap();
    assert_eq!(second.status(), reqwest::StatusCode::CONFLICT);
}

#[tokio::test]
async fn game_data_reflects_the_configured_defaults() {
    let world = World::new();
    let (http, _ws) = spawn_server(&world).await;
    let client = reqwest::Client::new();
    let session_id = World::new_session_id();

    client.post(format!("{http}/session")).json(&json!({"session_id": session_id.as_str()})).send().await.unwrap();

    let body: Value = client
        .get(format!("{http}/game-data"))
        .query(&[("session_id", session_id.as_str())])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let devices = body["gameConfig"]["devices"].as_array().unwrap();
    let light = devices.iter().find(|d| d["id"] == "light").unwrap();
    let power = light["interactions"].as_array().unwrap().iter().find(|i| i["name"] == "power").unwrap();
    assert_eq!(power["value"], false);
}

/// A round trip over the socket itself: a direct `device-interaction`
/// frame satisfies the only task's goal, so the client sees the resulting
/// `game-update` push (a client's own interaction never gets an
/// `update-interaction` echo — that push is reserved for rule-applied
/// mutations, spec.md §6).
#[tokio::test]
async fn websocket_round_trips_a_device_interaction() {
    let world = World::new();
    let (http, ws) = spawn_server(&world).await;
    let client = reqwest::Client::new();
    let session_id = World::new_session_id();

    client.post(format!("{http}/session")).json(&json!({"session_id": session_id.as_str()})).send().await.unwrap();

    let (mut socket, _response) = tokio_tungstenite::connect_async(format!("{ws}?session_id={}", session_id.as_str())).await.unwrap();

    socket
        .send(Message::Text(json!({"type": "device-interaction", "device": "light", "interaction": "power", "value": true}).to_string()))
        .await
        .unwrap();

    let pushed = socket.next().await.unwrap().unwrap();
    let pushed: Value = serde_json::from_str(pushed.to_text().unwrap()).unwrap();
    assert_eq!(pushed["type"], "game-update");
    assert_eq!(pushed["updatedTasks"][0]["is_completed"], true);
}

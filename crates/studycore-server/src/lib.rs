//! The HTTP/WS binding for the study orchestration core: a thin binary
//! that parses arguments, builds a `studycore_sdk::StudyCore`, and serves
//! the routes and duplex channel of spec.md §6.

pub mod args;
pub mod error;
pub mod routes;
pub mod state;
pub mod ws;

use std::fs;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use studycore_sdk::StudyCore;
use studycore_types::Result;

use args::Args;
use state::AppState;

/// Wires spec.md §6's routes and the `/ws` duplex channel onto a shared
/// `AppState`. Pulled out of `run` so integration tests can serve the
/// exact same router against an in-memory `StudyCore`.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/session", post(routes::create_session))
        .route("/session/verify", post(routes::verify_session))
        .route("/session/complete", post(routes::complete_session))
        .route("/game-data", get(routes::game_data))
        .route("/ws", get(ws::socket_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run(args: Args) -> Result<()> {
    let game_config_json = fs::read_to_string(&args.game_config)?;
    let explanation_config_json = fs::read_to_string(&args.explanation_config)?;

    let db_path = args.resolved_db_path();
    let core = StudyCore::open(&game_config_json, &explanation_config_json, &db_path)?;
    let state = AppState { core: Arc::new(core) };
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&args.bind).await?;
    tracing::info!(bind = %args.bind, "study orchestration core listening");
    axum::serve(listener, app).await?;
    Ok(())
}

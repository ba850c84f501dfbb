use axum::{
    extract::State,
    http::{HeaderValue, Method},
    routing::{get, post},
    Json, Router,
};
use chess_tutor_core::config::ServerConfig;
use serde::Serialize;
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

use crate::AppState;

pub mod chess;

#[derive(Debug, Serialize)]
pub struct IndexResponse {
    pub message: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Serialize)]
pub struct EngineStatusResponse {
    pub available: bool,
}

pub fn router(state: Arc<AppState>, server: &ServerConfig) -> Router {
    let origins: Vec<HeaderValue> = server
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/chess/validate-move", post(chess::validate_move))
        .route("/api/chess/analyze", post(chess::analyze))
        .route("/api/chess/legal-moves/*fen", get(chess::legal_moves))
        .route("/api/chess/make-move", post(chess::make_move))
        .route("/api/chess/engine-status", get(engine_status))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn index() -> Json<IndexResponse> {
    Json(IndexResponse {
        message: "Chess Tutor API",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn health() -> &'static str {
    "ok"
}

pub async fn engine_status(State(state): State<Arc<AppState>>) -> Json<EngineStatusResponse> {
    Json(EngineStatusResponse {
        available: state.orchestrator.status().await,
    })
}

//! Chess API endpoints.

use axum::{
    extract::{Path, State},
    Json,
};
use chess_tutor_core::validation;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct MoveRequest {
    pub fen: String,
    #[serde(rename = "move")]
    pub mv: String,
}

#[derive(Debug, Serialize)]
pub struct ValidateResponse {
    pub valid: bool,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub fen: String,
    /// Search depth (default from the analysis config)
    pub depth: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    /// Pawns from the side to move's view; 0.0 for mate scores
    pub evaluation: f64,
    pub best_move: Option<String>,
    pub principal_variation: Vec<String>,
    pub mate_in: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct LegalMovesResponse {
    pub moves: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct MakeMoveResponse {
    pub fen: Option<String>,
    pub valid: bool,
}

/// POST /api/chess/validate-move
pub async fn validate_move(Json(request): Json<MoveRequest>) -> Json<ValidateResponse> {
    Json(ValidateResponse {
        valid: validation::validate(&request.fen, &request.mv),
    })
}

/// POST /api/chess/analyze
///
/// # Errors
/// * 400 Bad Request - FEN does not parse
/// * 503 Service Unavailable - engine missing, timed out or misbehaved
pub async fn analyze(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let orchestrator = &state.orchestrator;
    let depth = request
        .depth
        .unwrap_or_else(|| i64::from(orchestrator.default_depth()));

    let result = orchestrator.analyze(&request.fen, depth).await?;

    Ok(Json(AnalyzeResponse {
        evaluation: result
            .evaluation
            .and_then(|e| e.pawns())
            .unwrap_or(0.0),
        mate_in: result.mate_in(),
        best_move: result.best_move.map(|m| m.to_string()),
        principal_variation: result
            .principal_variation
            .iter()
            .map(ToString::to_string)
            .collect(),
    }))
}

/// GET /api/chess/legal-moves/*fen
pub async fn legal_moves(Path(fen): Path<String>) -> Json<LegalMovesResponse> {
    Json(LegalMovesResponse {
        moves: validation::legal_moves(&fen),
    })
}

/// POST /api/chess/make-move
pub async fn make_move(Json(request): Json<MoveRequest>) -> Json<MakeMoveResponse> {
    let fen = validation::make_move(&request.fen, &request.mv);
    Json(MakeMoveResponse {
        valid: fen.is_some(),
        fen,
    })
}

//! Engine-backed analysis endpoints

use std::sync::Arc;

use axum::{extract::State, Json};
use chess_coach_core::{analyze_line, PositionAnalyzer, SearchLimits, Side};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use super::pgn::{parse_or_diagnose, require_pgn};
use crate::error::{ApiError, INSTALL_SUGGESTION};
use crate::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeGameRequest {
    #[serde(default)]
    pub pgn_text: String,
    pub user_player: Option<String>,
}

#[derive(Deserialize)]
pub struct AnalyzePositionRequest {
    #[serde(default)]
    pub fen: String,
    pub depth: Option<u32>,
}

pub async fn analyze_game(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AnalyzeGameRequest>,
) -> Result<Json<Value>, ApiError> {
    let text = require_pgn(&req.pgn_text)?;
    let user_side: Side = req.user_player.as_deref().unwrap_or("white").parse()?;
    let game = parse_or_diagnose(text)?;
    info!("Starting analysis of {} for {}", game.summary(), user_side);

    let mut evaluator = state.acquire_engine().await?;
    let limits = evaluator.game_limits();
    let analysis = analyze_line(&mut *evaluator, &game.line(), user_side, limits).await?;
    drop(evaluator);

    Ok(Json(json!({
        "success": true,
        "status": analysis.status,
        "failedPlies": analysis.failed_plies(),
        "analysis": analysis.records,
        "timestamp": Utc::now().to_rfc3339(),
    })))
}

pub async fn analyze_position(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AnalyzePositionRequest>,
) -> Result<Json<Value>, ApiError> {
    let fen = req.fen.trim();
    if fen.is_empty() {
        return Err(ApiError::BadRequest("FEN position required".to_string()));
    }

    let mut evaluator = state.acquire_engine().await?;
    let defaults = evaluator.position_limits();
    let limits = SearchLimits::new(req.depth.unwrap_or(defaults.depth), defaults.movetime_ms);
    let result = evaluator.analyze_position(fen, limits).await?;
    drop(evaluator);

    Ok(Json(json!({
        "success": true,
        "bestMove": result.best_move,
        "evaluation": result.evaluation.map(|e| e.to_string()),
        "depth": result.depth,
        "nodes": result.nodes,
        "nps": result.nps,
        "principalVariation": result.pv,
        "timestamp": Utc::now().to_rfc3339(),
    })))
}

pub async fn test_engine(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    info!("Testing engine availability");
    let status = state.acquire_engine().await?.engine_status().await;

    Ok(if status.available {
        Json(json!({
            "available": true,
            "message": format!(
                "{} is working correctly",
                status.engine_name.as_deref().unwrap_or("Engine")
            ),
            "testResult": {
                "bestMove": status.best_move,
                "evaluation": status.evaluation,
            },
        }))
    } else {
        Json(json!({
            "available": false,
            "message": status.error,
            "suggestion": INSTALL_SUGGESTION,
        }))
    })
}

//! PGN upload, parsing and inspection

use axum::{extract::Multipart, Json};
use chess_coach_core::parser::{diagnose, parse_pgn, position_at_move, validate_pgn, ParsedGame};
use chess_coach_core::Error;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::error::ApiError;

pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PgnRequest {
    #[serde(default)]
    pub pgn_text: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionRequest {
    #[serde(default)]
    pub pgn_text: String,
    pub move_number: Option<i64>,
}

pub(crate) fn require_pgn(text: &str) -> Result<&str, ApiError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ApiError::BadRequest("PGN text is required".to_string()));
    }
    Ok(text)
}

/// Parses a game, attaching likely causes when the text is rejected
pub(crate) fn parse_or_diagnose(text: &str) -> Result<ParsedGame, ApiError> {
    parse_pgn(text).map_err(|e| {
        let error = match e {
            Error::Pgn(msg) => msg,
            other => other.to_string(),
        };
        warn!("PGN parsing error: {}", error);
        let details = diagnose(text, &error);
        ApiError::InvalidPgn { error, details }
    })
}

pub async fn upload_pgn(mut multipart: Multipart) -> Result<Json<Value>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.body_text()))?
    {
        if field.name() != Some("pgnFile") {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        if !filename.to_lowercase().ends_with(".pgn") {
            return Err(ApiError::BadRequest("Only PGN files are allowed".to_string()));
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;
        let text = String::from_utf8_lossy(&bytes);
        let game = parse_or_diagnose(&text)?;
        info!("PGN file uploaded and parsed: {} ({} plies)", filename, game.move_count());

        return Ok(Json(json!({
            "success": true,
            "message": "PGN file uploaded and parsed successfully",
            "filename": filename,
            "data": game,
        })));
    }

    Err(ApiError::BadRequest("No file uploaded".to_string()))
}

pub async fn parse_pgn_text(Json(req): Json<PgnRequest>) -> Result<Json<Value>, ApiError> {
    let text = require_pgn(&req.pgn_text)?;
    let game = parse_or_diagnose(text)?;
    info!("Parsed PGN: {}", game.summary());

    Ok(Json(json!({
        "success": true,
        "message": "PGN text parsed successfully",
        "data": game,
    })))
}

pub async fn validate_pgn_text(Json(req): Json<PgnRequest>) -> Result<Json<Value>, ApiError> {
    let text = require_pgn(&req.pgn_text)?;
    let validation = validate_pgn(text);
    Ok(Json(json!({
        "valid": validation.valid,
        "error": validation.error,
    })))
}

pub async fn position_at(Json(req): Json<PositionRequest>) -> Result<Json<Value>, ApiError> {
    let text = require_pgn(&req.pgn_text)?;
    let move_number = req
        .move_number
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| ApiError::BadRequest("Valid move number is required".to_string()))?;

    let position = position_at_move(text, move_number)?;
    Ok(Json(json!({ "success": true, "position": position })))
}

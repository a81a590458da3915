//! JSON error responses

use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chess_coach_core::parser::Diagnosis;
use chess_coach_core::Error;
use serde_json::json;
use tracing::error;

pub const INSTALL_SUGGESTION: &str =
    "Please install Stockfish and ensure it's available in your system PATH (or set STOCKFISH_PATH)";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    /// PGN that failed to parse, with hints for fixing it
    #[error("{error}")]
    InvalidPgn { error: String, details: Diagnosis },

    /// Another request held the engine for longer than we wait
    #[error("Analysis engine is busy with another request (waited {0:?})")]
    EngineBusy(Duration),

    #[error(transparent)]
    Core(#[from] Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                json!({ "success": false, "error": msg }),
            ),
            ApiError::InvalidPgn { error, details } => (
                StatusCode::BAD_REQUEST,
                json!({ "success": false, "error": error, "details": details }),
            ),
            busy @ ApiError::EngineBusy(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                json!({ "success": false, "busy": true, "error": busy.to_string() }),
            ),
            ApiError::Core(e) => core_response(e),
        };
        (status, Json(body)).into_response()
    }
}

fn core_response(e: Error) -> (StatusCode, serde_json::Value) {
    let message = e.to_string();
    match e {
        Error::EngineUnavailable(_) | Error::EngineTimeout(_) => {
            error!("Engine failure: {}", message);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                json!({ "success": false, "error": message, "suggestion": INSTALL_SUGGESTION }),
            )
        }
        Error::AnalysisTimeout(_) => (
            StatusCode::GATEWAY_TIMEOUT,
            json!({ "success": false, "error": message }),
        ),
        Error::MalformedInput(_) | Error::Pgn(_) | Error::Config(_) => (
            StatusCode::BAD_REQUEST,
            json!({ "success": false, "error": message }),
        ),
        Error::AssistantUnavailable => (
            StatusCode::SERVICE_UNAVAILABLE,
            json!({
                "success": false,
                "available": false,
                "error": "AI chat is not available. Please provide your own API key or configure MISTRAL_API_KEY.",
            }),
        ),
        _ => {
            error!("Request failed: {}", message);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "success": false, "error": message }),
            )
        }
    }
}

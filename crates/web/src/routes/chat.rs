//! Assistant endpoints

use std::sync::Arc;

use axum::{extract::State, Json};
use chess_coach_core::assistant::{AssistantClient, ChatMessage, GameContext};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::error::ApiError;
use crate::AppState;

const MIN_KEY_LEN: usize = 10;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AskRequest {
    #[serde(default)]
    pub question: String,
    pub game_data: Option<GameContext>,
    pub current_move: Option<usize>,
    pub user_api_key: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyRequest {
    #[serde(default)]
    pub api_key: String,
}

pub async fn ask(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AskRequest>,
) -> Result<Json<Value>, ApiError> {
    let question = req.question.trim();
    if question.is_empty() {
        return Err(ApiError::BadRequest("Question is required".to_string()));
    }

    let client = AssistantClient::with_key(&state.config, req.user_api_key.as_deref())?;
    info!("Answering chat question with {}", client.model());

    let context = req.game_data.unwrap_or_default();
    let response = client
        .ask_about_game(&context, question, req.current_move)
        .await?;

    Ok(Json(json!({
        "success": true,
        "response": response,
        "timestamp": Utc::now().to_rfc3339(),
    })))
}

pub async fn test_api_key(
    State(state): State<Arc<AppState>>,
    Json(req): Json<KeyRequest>,
) -> Result<Json<Value>, ApiError> {
    let key = req.api_key.trim();
    if key.is_empty() {
        return Err(ApiError::BadRequest("API key is required".to_string()));
    }
    if key.len() < MIN_KEY_LEN {
        return Err(ApiError::BadRequest("API key format appears invalid".to_string()));
    }

    let client = AssistantClient::with_key(&state.config, Some(key))?;
    let probe = [ChatMessage::user("Say \"API key works\" if you can see this.")];
    match client.send_chat(&probe).await {
        Ok(_) => Ok(Json(json!({ "success": true, "message": "API key is valid" }))),
        Err(e) => {
            warn!("API key test failed: {}", e);
            Err(ApiError::BadRequest(key_failure_message(&e.to_string()).to_string()))
        }
    }
}

pub async fn status(State(state): State<Arc<AppState>>) -> Json<Value> {
    if !state.config.assistant_configured() {
        return Json(json!({
            "available": false,
            "message": "Assistant is not configured. Add MISTRAL_API_KEY to enable chat features.",
        }));
    }

    match AssistantClient::from_config(&state.config) {
        Ok(client) => {
            let status = client.test_connection().await;
            Json(json!({
                "available": status.available,
                "message": status.message,
                "testResponse": status.test_response,
            }))
        }
        Err(e) => Json(json!({ "available": false, "message": e.to_string() })),
    }
}

/// Maps an assistant failure onto advice for the key's owner
fn key_failure_message(error: &str) -> &'static str {
    let lower = error.to_lowercase();
    if error.contains("401") || lower.contains("unauthorized") {
        "Invalid API key - please check your Mistral AI API key"
    } else if error.contains("403") || lower.contains("forbidden") {
        "API key does not have required permissions"
    } else if error.contains("429") {
        "API rate limit exceeded - please try again later"
    } else if error.contains("500") {
        "Mistral AI service temporarily unavailable"
    } else if lower.contains("timed out") || lower.contains("timeout") {
        "Connection to Mistral AI timed out - please try again"
    } else {
        "API key test failed"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_failure_messages() {
        assert!(key_failure_message("Assistant error: API error (401): Unauthorized").starts_with("Invalid API key"));
        assert!(key_failure_message("API error (403): nope").contains("permissions"));
        assert!(key_failure_message("API error (429): slow down").contains("rate limit"));
        assert!(key_failure_message("operation timed out").contains("timed out"));
        assert_eq!(key_failure_message("something else"), "API key test failed");
    }
}

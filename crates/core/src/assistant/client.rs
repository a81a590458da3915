//! Chat-completion client for the coaching assistant

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::prompt::{build_game_context, GameContext, COACH_PERSONA};
use crate::config::CoachConfig;
use crate::error::{Error, Result};

const MAX_TOKENS: u32 = 1000;
const TEMPERATURE: f32 = 0.7;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        ChatMessage {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        ChatMessage {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Outcome of a connectivity check
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionStatus {
    pub available: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_response: Option<String>,
}

pub struct AssistantClient {
    client: Client,
    api_key: String,
    model: String,
    url: String,
}

impl AssistantClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            model: model.into(),
            url: url.into(),
        })
    }

    /// Client using the configured key; fails when none is set
    pub fn from_config(config: &CoachConfig) -> Result<Self> {
        let key = config
            .assistant_api_key
            .clone()
            .ok_or(Error::AssistantUnavailable)?;
        Self::new(key, config.assistant_model.clone(), config.assistant_url.clone())
    }

    /// Client using a caller-supplied key, falling back to the configured one
    pub fn with_key(config: &CoachConfig, key: Option<&str>) -> Result<Self> {
        match key.map(str::trim).filter(|k| !k.is_empty()) {
            Some(key) => Self::new(key, config.assistant_model.clone(), config.assistant_url.clone()),
            None => Self::from_config(config),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", self.api_key)) {
            headers.insert(AUTHORIZATION, value);
        }
        headers
    }

    /// Sends a conversation and returns the first reply
    pub async fn send_chat(&self, messages: &[ChatMessage]) -> Result<String> {
        let body = ChatRequest {
            model: &self.model,
            messages,
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
            stream: false,
        };
        debug!("Sending {} messages to {}", messages.len(), self.model);

        let response = self
            .client
            .post(&self.url)
            .headers(self.headers())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            warn!("Assistant API returned {}", status);
            return Err(Error::Assistant(format!(
                "API error ({}): {}",
                status.as_u16(),
                error_message(&text)
            )));
        }

        let parsed: ChatResponse = serde_json::from_str(&text)?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| Error::Assistant("No response from the assistant".to_string()))
    }

    /// Answers a question about an analysed game
    pub async fn ask_about_game(
        &self,
        context: &GameContext,
        question: &str,
        current_move: Option<usize>,
    ) -> Result<String> {
        let messages = [
            ChatMessage::system(COACH_PERSONA),
            ChatMessage::user(build_game_context(context, question, current_move)),
        ];
        self.send_chat(&messages)
            .await
            .map_err(|e| Error::Assistant(format!("Chess analysis failed: {}", e)))
    }

    pub async fn test_connection(&self) -> ConnectionStatus {
        let messages = [ChatMessage::user(
            "Say \"Hello\" if you can respond to chess questions.",
        )];
        match self.send_chat(&messages).await {
            Ok(reply) => ConnectionStatus {
                available: true,
                message: "Assistant is working correctly".to_string(),
                test_response: Some(reply),
            },
            Err(e) => ConnectionStatus {
                available: false,
                message: e.to_string(),
                test_response: None,
            },
        }
    }
}

/// Pulls `error.message` or `message` out of an error body
fn error_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return "Unknown error".to_string();
    };
    value
        .pointer("/error/message")
        .or_else(|| value.get("message"))
        .and_then(|m| m.as_str())
        .unwrap_or("Unknown error")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_shape() {
        let messages = [ChatMessage::user("hi")];
        let body = ChatRequest {
            model: "mistral-small",
            messages: &messages,
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
            stream: false,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "mistral-small");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["max_tokens"], 1000);
        assert_eq!(json["stream"], false);
    }

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(
            error_message(r#"{"error":{"message":"Unauthorized"}}"#),
            "Unauthorized"
        );
        assert_eq!(error_message(r#"{"message":"Rate limited"}"#), "Rate limited");
        assert_eq!(error_message("<html>"), "Unknown error");
    }

    #[test]
    fn test_missing_key_is_unavailable() {
        let config = CoachConfig::default();
        assert!(matches!(
            AssistantClient::from_config(&config),
            Err(Error::AssistantUnavailable)
        ));
        let client = AssistantClient::with_key(&config, Some("user-key")).unwrap();
        assert_eq!(client.model(), "mistral-small");
    }
}

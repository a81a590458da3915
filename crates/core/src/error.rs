//! Error types for chess-coach-core

use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// The engine executable could not be spawned.
    #[error("Analysis engine not installed or not reachable: {0}")]
    EngineUnavailable(String),

    /// The engine never acknowledged the readiness probe.
    #[error("Analysis engine did not become ready within {0:?}")]
    EngineTimeout(Duration),

    /// A single analysis request ran past its bound.
    #[error("Analysis timed out after {0:?}")]
    AnalysisTimeout(Duration),

    #[error("Analysis failed: {0}")]
    AnalysisFailed(String),

    /// Move or position input could not be sequenced.
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("PGN parsing error: {0}")]
    Pgn(String),

    #[error("Assistant error: {0}")]
    Assistant(String),

    #[error("Assistant is not configured")]
    AssistantUnavailable,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True when no analysis is possible at all without a working engine.
    pub fn is_session_failure(&self) -> bool {
        matches!(self, Error::EngineUnavailable(_) | Error::EngineTimeout(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

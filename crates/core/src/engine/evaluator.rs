//! Position Evaluator
//!
//! Thin layer over [`EngineSession`] that applies default search budgets and
//! turns low-level failures into the crate's uniform analysis errors.

use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, warn};

use super::analysis::{EngineResult, SearchLimits};
use super::session::EngineSession;
use crate::config::CoachConfig;
use crate::error::{Error, Result};
use crate::game::parse_fen;

const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Anything that can score a position; the game orchestrator depends only on this
#[async_trait]
pub trait PositionAnalyzer: Send {
    /// Brings the analyzer up, failing if no analysis is possible at all
    async fn ensure_ready(&mut self) -> Result<()>;

    /// Scores the position given as FEN within `limits`
    async fn analyze_position(&mut self, fen: &str, limits: SearchLimits) -> Result<EngineResult>;
}

/// Outcome of the availability probe
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineStatus {
    pub available: bool,
    pub engine_name: Option<String>,
    pub best_move: Option<String>,
    pub evaluation: Option<String>,
    pub error: Option<String>,
}

pub struct PositionEvaluator {
    session: EngineSession,
    game_limits: SearchLimits,
    position_limits: SearchLimits,
}

impl PositionEvaluator {
    pub fn new(session: EngineSession) -> Self {
        PositionEvaluator {
            session,
            game_limits: SearchLimits::game(),
            position_limits: SearchLimits::position(),
        }
    }

    pub fn from_config(config: &CoachConfig) -> Self {
        let session =
            EngineSession::new(config.engine_path.clone()).with_ready_timeout(config.ready_timeout);
        PositionEvaluator {
            session,
            game_limits: config.game_limits,
            position_limits: config.position_limits,
        }
    }

    /// Budget used per position during whole-game analysis
    pub fn game_limits(&self) -> SearchLimits {
        self.game_limits
    }

    /// Budget used for one-off position analysis
    pub fn position_limits(&self) -> SearchLimits {
        self.position_limits
    }

    pub fn session(&self) -> &EngineSession {
        &self.session
    }

    /// Runs the availability probe on the initial position
    pub async fn engine_status(&mut self) -> EngineStatus {
        match self.analyze_position(START_FEN, SearchLimits::probe()).await {
            Ok(result) => EngineStatus {
                available: true,
                engine_name: self.session.engine_name().map(str::to_string),
                best_move: Some(result.best_move),
                evaluation: result.evaluation.map(|e| e.to_string()),
                error: None,
            },
            Err(e) => EngineStatus {
                available: false,
                engine_name: None,
                best_move: None,
                evaluation: None,
                error: Some(e.to_string()),
            },
        }
    }

    pub async fn stop(&mut self) {
        self.session.stop().await;
    }
}

#[async_trait]
impl PositionAnalyzer for PositionEvaluator {
    async fn ensure_ready(&mut self) -> Result<()> {
        self.session.start().await.map_err(translate)
    }

    async fn analyze_position(&mut self, fen: &str, limits: SearchLimits) -> Result<EngineResult> {
        parse_fen(fen)?;
        let limits = SearchLimits::new(limits.depth, limits.movetime_ms);
        match self.session.analyze(fen, &limits).await {
            Ok(result) => {
                info!("Analyzed position: {}", result.summary());
                Ok(result)
            }
            Err(e) => {
                warn!("Position analysis failed: {}", e);
                Err(translate(e))
            }
        }
    }
}

fn translate(err: Error) -> Error {
    match err {
        Error::EngineUnavailable(_)
        | Error::EngineTimeout(_)
        | Error::AnalysisTimeout(_)
        | Error::AnalysisFailed(_)
        | Error::MalformedInput(_) => err,
        other => Error::AnalysisFailed(other.to_string()),
    }
}

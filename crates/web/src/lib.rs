//! HTTP front end for chess-coach-core

pub mod error;
pub mod routes;

use chess_coach_core::{CoachConfig, PositionEvaluator};
use tokio::sync::{Mutex, MutexGuard};

use crate::error::ApiError;

pub use routes::build_router;

/// Shared by every handler; the single evaluator serializes engine access
pub struct AppState {
    pub config: CoachConfig,
    pub evaluator: Mutex<PositionEvaluator>,
}

impl AppState {
    pub fn new(config: CoachConfig) -> Self {
        let evaluator = PositionEvaluator::from_config(&config);
        AppState {
            config,
            evaluator: Mutex::new(evaluator),
        }
    }

    /// Waits at most `config.engine_wait` for the engine to come free
    pub async fn acquire_engine(&self) -> Result<MutexGuard<'_, PositionEvaluator>, ApiError> {
        let wait = self.config.engine_wait;
        tokio::time::timeout(wait, self.evaluator.lock())
            .await
            .map_err(|_| ApiError::EngineBusy(wait))
    }
}

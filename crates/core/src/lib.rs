//! Chess Coach Core Library
//!
//! Game records, engine-driven position evaluation and move quality
//! classification for post-game review.

pub mod assistant;
pub mod config;
pub mod engine;
pub mod error;
pub mod game;
pub mod parser;
pub mod quality;
pub mod review;

pub use config::CoachConfig;
pub use engine::{EngineResult, EngineSession, Evaluation, PositionAnalyzer, PositionEvaluator, SearchLimits};
pub use error::{Error, Result};
pub use game::{GameLine, GameMove, Position, Side};
pub use quality::{Classification, MoveQuality};
pub use review::{analyze_game, analyze_line, GameAnalysis, PlyRecord, RunStatus};

/// Initializes `tracing` output filtered by `RUST_LOG` (default `info`)
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

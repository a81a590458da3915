//! Chess engine integration
//!
//! Drives a UCI engine subprocess for position evaluation.

pub mod analysis;
mod evaluator;
mod session;
pub mod uci;

pub use analysis::{EngineResult, Evaluation, SearchLimits, MATE_SCORE};
pub use evaluator::{EngineStatus, PositionAnalyzer, PositionEvaluator};
pub use session::{EngineSession, SessionState, DEFAULT_READY_TIMEOUT};

//! PGN game-record layer

mod inspect;
mod pgn;
mod summary;

pub use inspect::{diagnose, position_at_move, validate_pgn, Diagnosis, PositionAtMove, Validation};
pub use pgn::{parse_pgn, ParsedGame};
pub use summary::{
    game_over_reason, EventInfo, GameInfo, GameOverReason, GameState, GameStatistics, Opening,
    PieceActivity, PieceCounts, Players, SideCounts,
};

//! Game model and position sequencing

mod sequencer;
mod types;

pub use sequencer::{sequence_from, sequence_moves, GameLine, LineBuilder};
pub(crate) use sequencer::move_to_uci;
pub use types::{parse_fen, CastlingSide, GameMove, PieceKind, Position, Side};

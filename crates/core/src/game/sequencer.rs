//! Position Sequencer
//!
//! Replays an ordered move list and records the board after every ply.
//! The resulting line always holds one more position than it has moves.

use serde::{Deserialize, Serialize};
use shakmaty::{san::San, Chess, File, Move, Position as _, Square};

use super::types::{CastlingSide, GameMove, Position, Side};
use crate::error::{Error, Result};

/// Moves of a game together with every position they pass through
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameLine {
    pub moves: Vec<GameMove>,
    pub positions: Vec<Position>,
}

impl GameLine {
    pub fn move_count(&self) -> usize {
        self.moves.len()
    }

    pub fn final_position(&self) -> Option<&Position> {
        self.positions.last()
    }

    /// Plies played up to and including full move `move_number`, counted in
    /// the game's own numbering (a game set up from FEN may start late or
    /// with Black to move)
    pub fn plies_through_move(&self, move_number: usize) -> usize {
        self.moves
            .iter()
            .take_while(|mv| mv.move_number <= move_number)
            .count()
    }

    /// Position after full move `move_number` (clamped to the game length)
    pub fn position_after_move(&self, move_number: usize) -> Option<&Position> {
        self.positions.get(self.plies_through_move(move_number))
    }
}

/// Incrementally builds a [`GameLine`] from a starting board
pub struct LineBuilder {
    board: Chess,
    start_move_number: usize,
    line: GameLine,
}

impl LineBuilder {
    pub fn new(start: Chess) -> Self {
        let start_move_number = start.fullmoves().get() as usize;
        let first = Position::from_chess(0, &start);
        LineBuilder {
            board: start,
            start_move_number,
            line: GameLine {
                moves: Vec::new(),
                positions: vec![first],
            },
        }
    }

    pub fn board(&self) -> &Chess {
        &self.board
    }

    /// Plays one SAN move, failing if it is not legal here
    pub fn play_san(&mut self, san: &San) -> Result<&GameMove> {
        let ply = self.line.moves.len() + 1;
        let mv = san.to_move(&self.board).map_err(|e| {
            Error::MalformedInput(format!("illegal move '{}' at ply {}: {}", san, ply, e))
        })?;
        self.play(mv, san.to_string())
    }

    fn play(&mut self, mv: Move, san_text: String) -> Result<&GameMove> {
        let ply = self.line.moves.len() + 1;
        let side: Side = self.board.turn().into();
        let (from, to) = uci_squares(&mv);
        let castling = match &mv {
            Move::Castle { king, rook } => Some(if rook.file() > king.file() {
                CastlingSide::Kingside
            } else {
                CastlingSide::Queenside
            }),
            _ => None,
        };
        let black_first = usize::from(self.line.positions[0].turn == Side::Black);
        let move_number = self.start_move_number + (ply - 1 + black_first) / 2;

        let next = self.board.clone().play(mv.clone()).map_err(|_| {
            Error::MalformedInput(format!("cannot play '{}' at ply {}", san_text, ply))
        })?;

        let position = Position::from_chess(ply, &next);
        let checkmate = position.checkmate;
        let check = position.in_check && !checkmate;
        let mut san = san_text;
        if checkmate {
            san.push('#');
        } else if check {
            san.push('+');
        }

        self.line.moves.push(GameMove {
            ply,
            move_number,
            side,
            san,
            from: from.to_string(),
            to: to.to_string(),
            piece: mv.role().into(),
            captured: mv.capture().map(Into::into),
            promotion: mv.promotion().map(Into::into),
            castling,
            check,
            checkmate,
        });
        self.line.positions.push(position);
        self.mark_repetition();
        self.board = next;

        Ok(&self.line.moves[ply - 1])
    }

    /// Threefold repetition is only visible with the whole history at hand
    fn mark_repetition(&mut self) {
        let Some(last) = self.line.positions.last() else {
            return;
        };
        let key = last.repetition_key().to_string();
        let seen = self
            .line
            .positions
            .iter()
            .filter(|p| p.repetition_key() == key)
            .count();
        if seen >= 3 {
            if let Some(last) = self.line.positions.last_mut() {
                last.draw = true;
            }
        }
    }

    pub fn finish(self) -> GameLine {
        self.line
    }
}

/// Sequences SAN moves from the standard starting position
pub fn sequence_moves<S: AsRef<str>>(moves: &[S]) -> Result<GameLine> {
    sequence_from(Chess::default(), moves)
}

/// Sequences SAN moves from an arbitrary starting board.
///
/// Check, mate and annotation suffixes (`+`, `#`, `!`, `?`) are accepted and
/// recomputed from the resulting positions.
pub fn sequence_from<S: AsRef<str>>(start: Chess, moves: &[S]) -> Result<GameLine> {
    let mut builder = LineBuilder::new(start);
    for (idx, text) in moves.iter().enumerate() {
        let cleaned = text.as_ref().trim().trim_end_matches(['+', '#', '!', '?']);
        let san: San = cleaned.parse().map_err(|e| {
            Error::MalformedInput(format!("unreadable move '{}' at ply {}: {}", text.as_ref(), idx + 1, e))
        })?;
        builder.play_san(&san)?;
    }
    Ok(builder.finish())
}

/// Origin and destination squares in engine notation; castling maps to the king's path
pub(crate) fn uci_squares(mv: &Move) -> (Square, Square) {
    match mv {
        Move::Normal { from, to, .. } => (*from, *to),
        Move::EnPassant { from, to } => (*from, *to),
        Move::Castle { king, rook } => {
            let file = if rook.file() > king.file() { File::G } else { File::C };
            (*king, Square::from_coords(file, king.rank()))
        }
        Move::Put { to, .. } => (*to, *to),
    }
}

/// Engine notation for a move, e.g. `e1g1` for white short castling
pub(crate) fn move_to_uci(mv: &Move) -> String {
    let (from, to) = uci_squares(mv);
    let mut uci = format!("{}{}", from, to);
    if let Some(role) = mv.promotion() {
        uci.push(super::PieceKind::from(role).uci_char());
    }
    uci
}

//! Explanation templates for classified moves

use super::classify::{Classification, MoveQuality};
use crate::engine::{EngineResult, Evaluation};
use crate::game::{CastlingSide, GameMove, PieceKind};

/// Raw centipawn swing above which the evaluation change is called out
const SIGNIFICANT_SWING: i32 = 100;

/// Loss above which the engine's preferred move is suggested
const SUGGEST_BEST_ABOVE: i32 = 25;

/// Builds the explanation for a classified move by concatenating every
/// applicable fragment in a fixed order.
pub fn explain_move(
    before: &EngineResult,
    after: &EngineResult,
    mv: &GameMove,
    quality: &MoveQuality,
) -> String {
    let mut parts: Vec<String> = Vec::new();

    if let Some(phrase) = quality_phrase(quality) {
        parts.push(phrase);
    }

    if let Some(captured) = mv.captured {
        parts.push(format!("Captures the {} on {}.", captured, mv.to));
    }

    match mv.castling {
        Some(CastlingSide::Queenside) => {
            parts.push("Castles queenside, bringing the king to safety.".to_string())
        }
        Some(CastlingSide::Kingside) => parts.push("Castles kingside, securing the king.".to_string()),
        None => {}
    }

    if mv.check {
        parts.push("Gives check, forcing the opponent to respond.".to_string());
    }
    if mv.checkmate {
        parts.push("Checkmate! The game is over.".to_string());
    }

    if let Some(promotion) = mv.promotion {
        parts.push(format!("Promotes to a {}, gaining material.", promotion));
    }

    if let (Some(b), Some(a)) = (before.evaluation, after.evaluation) {
        if let (Evaluation::Centipawns(b), Evaluation::Centipawns(a)) = (b, a) {
            if (b - a).abs() > SIGNIFICANT_SWING {
                parts.push("This significantly changes the evaluation.".to_string());
            }
        }
        if b.is_mate() || a.is_mate() {
            parts.push("Forces or allows a mating sequence.".to_string());
        }
    }

    if let Some(hint) = piece_hint(mv) {
        parts.push(hint.to_string());
    }

    if !before.best_move.is_empty()
        && !mv.matches_engine_move(&before.best_move)
        && quality.score > SUGGEST_BEST_ABOVE
    {
        parts.push(format!("Better was {}.", before.best_move));
    }

    parts.join(" ")
}

/// Explanation for a move that was not analysed in depth
pub fn explain_opponent_move(mv: &GameMove) -> String {
    format!("Opponent played {}", mv.san)
}

fn quality_phrase(quality: &MoveQuality) -> Option<String> {
    let pawns = format_pawns(quality.score);
    let phrase = match quality.classification {
        Classification::Brilliant => {
            "Brilliant move! A spectacular sacrifice or tactical shot.".to_string()
        }
        Classification::Best => "Perfect! This is the best move in the position.".to_string(),
        Classification::Excellent => "Excellent move, practically as good as the best.".to_string(),
        Classification::Good => "Good move that maintains the position.".to_string(),
        Classification::Inaccuracy => {
            format!("Inaccuracy. Loses about {} pawns of advantage.", pawns)
        }
        Classification::Mistake => format!("Mistake! This loses {} pawns.", pawns),
        Classification::Blunder => format!("Blunder!! This throws away {} pawns.", pawns),
        Classification::Opponent | Classification::Unknown => return None,
    };
    Some(phrase)
}

fn piece_hint(mv: &GameMove) -> Option<&'static str> {
    match mv.piece {
        PieceKind::Pawn if mv.to.ends_with('7') || mv.to.ends_with('2') => {
            Some("Advances the pawn towards promotion.")
        }
        PieceKind::Pawn => None,
        PieceKind::Knight => Some("Develops or repositions the knight."),
        PieceKind::Bishop => Some("The bishop controls important diagonal squares."),
        PieceKind::Rook => Some("The rook takes control of important files or ranks."),
        PieceKind::Queen => Some("The queen exerts powerful influence on the position."),
        PieceKind::King if mv.castling.is_none() => {
            Some("King move - possibly for safety or activity.")
        }
        PieceKind::King => None,
    }
}

/// Centipawns as pawns with the shortest exact decimal form (`150` -> `1.5`)
fn format_pawns(centipawns: i32) -> String {
    format!("{}", f64::from(centipawns) / 100.0)
}

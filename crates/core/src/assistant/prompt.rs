//! Game context handed to the assistant

use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::Deserialize;

use crate::quality::Classification;

pub const COACH_PERSONA: &str = "You are an expert chess coach and analyst. You help players \
improve by analyzing their games and answering questions about strategy, tactics and specific \
moves. Be encouraging and educational.";

/// Analysed game as sent back by the browser; every part is optional
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameContext {
    pub game_info: Option<ContextInfo>,
    pub header: BTreeMap<String, String>,
    pub result: Option<String>,
    pub moves: Vec<ContextMove>,
    pub analysis: Vec<ContextPly>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ContextInfo {
    pub players: Option<ContextPlayers>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContextPlayers {
    pub white: Option<String>,
    pub black: Option<String>,
    pub white_elo: Option<serde_json::Value>,
    pub black_elo: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ContextMove {
    pub san: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContextPly {
    pub move_index: usize,
    pub actual_move: Option<String>,
    pub best_move: Option<String>,
    pub move_quality: Option<ContextQuality>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContextQuality {
    pub classification: Classification,
    #[serde(default)]
    pub score: i32,
}

impl GameContext {
    fn result(&self) -> Option<&str> {
        self.result
            .as_deref()
            .or_else(|| self.header.get("Result").map(String::as_str))
    }
}

/// Builds the user prompt: game facts, notable moves, what is on screen and
/// the question itself.
pub fn build_game_context(context: &GameContext, question: &str, current_move: Option<usize>) -> String {
    let mut prompt = String::from(
        "You are a chess analysis assistant. Use this game to answer the user's question.\n\n",
    );

    if let Some(players) = context.game_info.as_ref().and_then(|i| i.players.as_ref()) {
        prompt.push_str("GAME INFO:\n");
        let _ = writeln!(
            prompt,
            "White: {}{}",
            players.white.as_deref().unwrap_or("Unknown"),
            elo_suffix(players.white_elo.as_ref())
        );
        let _ = writeln!(
            prompt,
            "Black: {}{}",
            players.black.as_deref().unwrap_or("Unknown"),
            elo_suffix(players.black_elo.as_ref())
        );
        if let Some(result) = context.result() {
            let _ = writeln!(prompt, "Result: {}", result);
        }
        prompt.push('\n');
    }

    if !context.moves.is_empty() {
        prompt.push_str("GAME MOVES:\n");
        let movetext: Vec<String> = context
            .moves
            .chunks(2)
            .enumerate()
            .map(|(idx, pair)| match pair {
                [white, black] => format!("{}.{} {}", idx + 1, white.san, black.san),
                [white] => format!("{}.{}", idx + 1, white.san),
                _ => String::new(),
            })
            .collect();
        prompt.push_str(&movetext.join(" "));
        prompt.push_str("\n\n");
    }

    let notable: Vec<&ContextPly> = context
        .analysis
        .iter()
        .filter(|ply| {
            ply.move_quality
                .as_ref()
                .is_some_and(|q| q.classification.is_significant())
        })
        .collect();
    if !notable.is_empty() {
        prompt.push_str("MOVE ANALYSIS:\n");
        for ply in notable {
            let Some(quality) = ply.move_quality.as_ref() else {
                continue;
            };
            let white = ply.move_index % 2 == 0;
            let actual = ply.actual_move.as_deref().unwrap_or("?");
            let _ = write!(
                prompt,
                "Move {}{} {} ({}): {}",
                ply.move_index / 2 + 1,
                if white { "." } else { "..." },
                actual,
                if white { "White" } else { "Black" },
                quality.classification.as_str().to_uppercase()
            );
            if quality.score != 0 {
                let sign = if quality.score > 0 { "+" } else { "" };
                let _ = write!(prompt, " ({}{:.1})", sign, f64::from(quality.score) / 100.0);
            }
            prompt.push('\n');
            if let Some(best) = ply.best_move.as_deref().filter(|b| *b != actual) {
                let _ = writeln!(prompt, "  Better: {}", best);
            }
        }
        prompt.push('\n');
    }

    if let Some(ply) = current_move.filter(|m| *m > 0) {
        let _ = write!(
            prompt,
            "USER IS CURRENTLY VIEWING: Move {} ({})\n\n",
            ply / 2 + 1,
            if ply % 2 == 1 { "White" } else { "Black" }
        );
    }

    let _ = write!(prompt, "USER QUESTION: {}\n\n", question);
    prompt.push_str(
        "Answer helpfully and educationally, focusing on chess principles and strategy, \
         the specific moves involved, and practical ways to improve. Use chess notation when \
         referring to moves and keep the answer under 500 words.",
    );
    prompt
}

fn elo_suffix(elo: Option<&serde_json::Value>) -> String {
    match elo {
        Some(serde_json::Value::Number(n)) => format!(" ({})", n),
        Some(serde_json::Value::String(s)) if !s.is_empty() => format!(" ({})", s),
        _ => String::new(),
    }
}

//! Natural-language coaching assistant

mod client;
mod prompt;

pub use client::{AssistantClient, ChatMessage, ConnectionStatus};
pub use prompt::{build_game_context, ContextPly, GameContext, COACH_PERSONA};

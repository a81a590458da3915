//! Environment-driven configuration

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::engine::{SearchLimits, DEFAULT_READY_TIMEOUT};
use crate::error::{Error, Result};

pub const DEFAULT_ASSISTANT_URL: &str = "https://api.mistral.ai/v1/chat/completions";
pub const DEFAULT_ASSISTANT_MODEL: &str = "mistral-small";
pub const DEFAULT_ENGINE_WAIT: Duration = Duration::from_secs(30);

#[derive(Clone, Debug)]
pub struct CoachConfig {
    /// Engine binary path or a name resolved through `PATH`
    pub engine_path: String,
    pub ready_timeout: Duration,
    /// How long a request queues for the shared engine before giving up
    pub engine_wait: Duration,
    pub game_limits: SearchLimits,
    pub position_limits: SearchLimits,
    pub assistant_api_key: Option<String>,
    pub assistant_model: String,
    pub assistant_url: String,
    pub host: String,
    pub port: u16,
    pub static_dir: String,
}

impl Default for CoachConfig {
    fn default() -> Self {
        CoachConfig {
            engine_path: "stockfish".to_string(),
            ready_timeout: DEFAULT_READY_TIMEOUT,
            engine_wait: DEFAULT_ENGINE_WAIT,
            game_limits: SearchLimits::game(),
            position_limits: SearchLimits::position(),
            assistant_api_key: None,
            assistant_model: DEFAULT_ASSISTANT_MODEL.to_string(),
            assistant_url: DEFAULT_ASSISTANT_URL.to_string(),
            host: "127.0.0.1".to_string(),
            port: 3000,
            static_dir: "public".to_string(),
        }
    }
}

impl CoachConfig {
    /// Loads `.env` (if present) and reads the process environment
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from any key lookup; unset or blank keys keep their defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = CoachConfig::default();

        let game_limits = SearchLimits::new(
            parse_or(&get, "GAME_ANALYSIS_DEPTH", defaults.game_limits.depth)?,
            parse_or(&get, "GAME_ANALYSIS_MOVETIME_MS", defaults.game_limits.movetime_ms)?,
        );
        let position_limits = SearchLimits::new(
            parse_or(&get, "POSITION_ANALYSIS_DEPTH", defaults.position_limits.depth)?,
            parse_or(
                &get,
                "POSITION_ANALYSIS_MOVETIME_MS",
                defaults.position_limits.movetime_ms,
            )?,
        );

        Ok(CoachConfig {
            engine_path: get("STOCKFISH_PATH").unwrap_or(defaults.engine_path),
            ready_timeout: Duration::from_secs(parse_or(
                &get,
                "ENGINE_READY_TIMEOUT_SECS",
                defaults.ready_timeout.as_secs(),
            )?),
            engine_wait: Duration::from_secs(parse_or(
                &get,
                "ENGINE_WAIT_SECS",
                defaults.engine_wait.as_secs(),
            )?),
            game_limits,
            position_limits,
            assistant_api_key: get("MISTRAL_API_KEY"),
            assistant_model: get("MISTRAL_MODEL").unwrap_or(defaults.assistant_model),
            assistant_url: get("MISTRAL_API_URL").unwrap_or(defaults.assistant_url),
            host: get("HOST").unwrap_or(defaults.host),
            port: parse_or(&get, "PORT", defaults.port)?,
            static_dir: get("STATIC_DIR").unwrap_or(defaults.static_dir),
        })
    }

    pub fn assistant_configured(&self) -> bool {
        self.assistant_api_key.is_some()
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .parse()
            .map_err(|_| Error::Config(format!("{} has an invalid value: '{}'", key, raw))),
        None => Ok(default),
    }
}

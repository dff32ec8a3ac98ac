//! Engine configuration from environment variables.

use vigil_domain::RunConfig;

use crate::infrastructure::narrative::{DEFAULT_PROVIDER_BASE_URL, DEFAULT_PROVIDER_MODEL};

/// Everything the engine needs to boot.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// SQLite database path.
    pub db_path: String,
    /// Narrative provider base URL (OpenAI-compatible).
    pub provider_base_url: String,
    /// Narrative provider model.
    pub provider_model: String,
    /// Bind host.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Whether the in-process board layer is enabled. When off, observers
    /// fall back to store-backed polling and the stream endpoint refuses
    /// connections.
    pub board_enabled: bool,
    /// Game balance parameters stamped onto every run.
    pub game: RunConfig,
}

impl EngineConfig {
    /// Read configuration from the environment, with defaults for local runs.
    pub fn from_env() -> Self {
        let provider_base_url = std::env::var("PROVIDER_URL")
            .or_else(|_| std::env::var("PROVIDER_BASE_URL"))
            .unwrap_or_else(|_| DEFAULT_PROVIDER_BASE_URL.into());
        let provider_model =
            std::env::var("PROVIDER_MODEL").unwrap_or_else(|_| DEFAULT_PROVIDER_MODEL.into());

        let game = RunConfig {
            provider: "openai-compatible".to_string(),
            model: provider_model.clone(),
            temperature: env_parse("GAME_TEMPERATURE", 0.8),
            initial_sanity: env_parse("GAME_INITIAL_SANITY", 100),
            max_history_turns: env_parse("GAME_MAX_HISTORY_TURNS", 10),
        };

        Self {
            db_path: std::env::var("DATABASE_PATH").unwrap_or_else(|_| "vigil.db".into()),
            provider_base_url,
            provider_model,
            host: std::env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env_parse("SERVER_PORT", 3000),
            board_enabled: std::env::var("BOARD_ENABLED")
                .map(|v| v != "0" && !v.eq_ignore_ascii_case("false"))
                .unwrap_or(true),
            game,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

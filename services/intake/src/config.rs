//! Application Configuration Module
//!
//! Loads the intake service settings from environment variables into a
//! single struct that `main` hands to the pieces it wires together.

use secrecy::SecretString;
use std::env;
use std::path::PathBuf;
use tracing::Level;

// --- Application Constants ---

/// Capacity of the session input queue.
pub const INPUT_QUEUE_CAPACITY: usize = 256;
/// Capacity of the UI command channel.
pub const COMMAND_CHANNEL_CAPACITY: usize = 32;
/// Capacity of the engine event broadcast channel.
pub const ENGINE_CHANNEL_CAPACITY: usize = 1024;

pub const DEFAULT_ENGINE_URL: &str = "ws://127.0.0.1:8787";
pub const DEFAULT_GENERATE_ENDPOINT: &str = "http://localhost:3000/api/vapi/generate";

/// Holds all configuration loaded from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub engine_url: String,
    pub public_key: SecretString,
    pub generate_endpoint: String,
    pub dispatch_on_call_end: bool,
    pub username: Option<String>,
    pub prompts_dir: Option<PathBuf>,
    pub log_level: Level,
}

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid log level provided for RUST_LOG: {0}")]
    InvalidLogLevel(String),
    #[error("Invalid boolean provided for {0}: {1}")]
    InvalidFlag(String, String),
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    // *   `VOICE_ENGINE_URL`: (Optional) WebSocket URL of the voice engine bridge. Defaults to "ws://127.0.0.1:8787".
    // *   `VOICE_PUBLIC_KEY`: Public key used to authenticate with the voice engine.
    // *   `GENERATE_ENDPOINT_URL`: (Optional) Where the collected answers are posted.
    // *   `DISPATCH_ON_CALL_END`: (Optional) "true" to also post when the engine ends the call. Defaults to "false".
    // *   `INTAKE_USERNAME`: (Optional) Name used in the greeting.
    // *   `PROMPTS_DIR`: (Optional) Directory of `.md` prompt overrides.
    // *   `RUST_LOG`: (Optional) The logging level. Defaults to "INFO". Can be "TRACE", "DEBUG", "INFO", "WARN", or "ERROR".
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file. This is useful for local development and is ignored if not present.
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let public_key = lookup("VOICE_PUBLIC_KEY")
            .filter(|key| !key.is_empty())
            .ok_or_else(|| ConfigError::MissingVar("VOICE_PUBLIC_KEY".to_string()))?;

        let engine_url =
            lookup("VOICE_ENGINE_URL").unwrap_or_else(|| DEFAULT_ENGINE_URL.to_string());
        let generate_endpoint = lookup("GENERATE_ENDPOINT_URL")
            .unwrap_or_else(|| DEFAULT_GENERATE_ENDPOINT.to_string());

        let dispatch_on_call_end = match lookup("DISPATCH_ON_CALL_END") {
            None => false,
            Some(value) => match value.to_lowercase().as_str() {
                "true" | "1" | "yes" => true,
                "false" | "0" | "no" | "" => false,
                _ => {
                    return Err(ConfigError::InvalidFlag(
                        "DISPATCH_ON_CALL_END".to_string(),
                        value,
                    ));
                }
            },
        };

        let username = lookup("INTAKE_USERNAME").filter(|name| !name.trim().is_empty());
        let prompts_dir = lookup("PROMPTS_DIR").map(PathBuf::from);

        // Configure logging level from RUST_LOG, with a sensible default.
        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str
            .parse::<Level>()
            .map_err(|_| ConfigError::InvalidLogLevel(log_level_str))?;

        Ok(Self {
            engine_url,
            public_key: SecretString::from(public_key),
            generate_endpoint,
            dispatch_on_call_end,
            username,
            prompts_dir,
            log_level,
        })
    }
}

use std::path::PathBuf;

use crate::errors::TriviaError;
use crate::llm_client::GROQ_API_URL;

const DEFAULT_HISTORY_PATH: &str = "historial.json";

/// Application configuration loaded from environment variables.
/// Fails at startup if the API key is missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub groq_api_key: String,
    pub groq_api_url: String,
    pub history_path: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self, TriviaError> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            groq_api_key: require_env("GROQ_API_KEY")?,
            groq_api_url: optional_env("GROQ_API_URL").unwrap_or_else(|| GROQ_API_URL.to_string()),
            history_path: optional_env("HISTORIAL_PATH")
                .unwrap_or_else(|| DEFAULT_HISTORY_PATH.to_string())
                .into(),
        })
    }
}

fn require_env(key: &'static str) -> Result<String, TriviaError> {
    optional_env(key).ok_or(TriviaError::MissingCredential(key))
}

/// Unset and blank variables are treated the same.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

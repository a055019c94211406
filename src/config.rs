use std::time::Duration;

use serde::Deserialize;

const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Clone, Deserialize)]
pub struct GeminiConfig {
    /// Absent key is not a startup error; estimation fails fast when it is used.
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl GeminiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_GEMINI_MODEL.into(),
            base_url: DEFAULT_GEMINI_BASE_URL.into(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// `None` runs the server on the in-memory store.
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub cors_origins: Vec<String>,
    pub max_upload_bytes: usize,
    pub gemini: GeminiConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = non_empty_var("DATABASE_URL");
        let gemini = GeminiConfig {
            api_key: non_empty_var("GEMINI_API_KEY"),
            model: std::env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_GEMINI_MODEL.into()),
            base_url: std::env::var("GEMINI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_GEMINI_BASE_URL.into()),
            timeout_secs: parsed_var("AI_TIMEOUT_SECS").unwrap_or(30),
        };
        let cors_origins = std::env::var("CORS_ORIGINS")
            .map(|v| split_origins(&v))
            .unwrap_or_default();
        Ok(Self {
            database_url,
            db_max_connections: parsed_var("DB_MAX_CONNECTIONS").unwrap_or(10),
            cors_origins,
            max_upload_bytes: parsed_var("MAX_UPLOAD_BYTES").unwrap_or(20 * 1024 * 1024),
            gemini,
        })
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            db_max_connections: 10,
            cors_origins: Vec::new(),
            max_upload_bytes: 20 * 1024 * 1024,
            gemini: GeminiConfig::default(),
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parsed_var<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse::<T>().ok())
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod config_tests {
    use super::*;

    #[test]
    fn split_origins_ignores_blanks() {
        let origins = split_origins(" http://localhost:5173, ,https://example.app ");
        assert_eq!(origins, vec!["http://localhost:5173", "https://example.app"]);
    }

    #[test]
    fn defaults_leave_ai_unconfigured() {
        let cfg = AppConfig::default();
        assert!(cfg.gemini.api_key.is_none());
        assert_eq!(cfg.gemini.model, "gemini-2.5-flash");
        assert_eq!(cfg.gemini.timeout(), Duration::from_secs(30));
    }
}

//! Configuration management for talentflow.
//!
//! Configuration is set via environment variables:
//! - `OPENROUTER_API_KEY` - API key for the generation client. When unset the
//!   server still starts, but every task fails with a configuration error.
//! - `DEFAULT_MODEL` - Optional. The LLM model to use. Defaults to `openai/gpt-4o-mini`.
//! - `HOST` - Optional. Server host. Defaults to `127.0.0.1`.
//! - `PORT` - Optional. Server port. Defaults to `3100`.
//! - `DATA_DIR` - Optional. Directory for the SQLite store and blob payloads. Defaults to `./data`.
//! - `TASK_STORE` - Optional. `memory` or `sqlite`. Defaults to `sqlite`.
//! - `CANDIDATE_SOURCES` - Optional. Comma-separated `name=url` pairs for HTTP
//!   source connectors, e.g. `linkedin=https://ats.internal/linkedin,github=https://ats.internal/github`.
//! - `PER_SOURCE_LIMIT` - Optional. Result cap per source query. Defaults to `25`.
//! - `INLINE_RESULT_LIMIT` - Optional. Max result payload size (bytes) stored
//!   inline on the task record; larger payloads go to the blob store. Defaults to `65536`.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// A named HTTP candidate source endpoint.
#[derive(Debug, Clone)]
pub struct SourceEndpoint {
    pub name: String,
    pub url: String,
}

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// OpenRouter API key. Absent key means the generation client reports not-ready.
    pub api_key: Option<String>,

    /// Default LLM model identifier (OpenRouter format)
    pub default_model: String,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Directory for persistent state (task store database, blob payloads)
    pub data_dir: PathBuf,

    /// Task store backend selector (`memory` or `sqlite`)
    pub task_store: String,

    /// Configured candidate source endpoints
    pub sources: Vec<SourceEndpoint>,

    /// Result cap per source query
    pub per_source_limit: usize,

    /// Max result payload size stored inline on the task record
    pub inline_result_limit: usize,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if a numeric variable fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var("OPENROUTER_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty());

        let default_model =
            std::env::var("DEFAULT_MODEL").unwrap_or_else(|_| "openai/gpt-4o-mini".to_string());

        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "3100".to_string())
            .parse()
            .map_err(|e| ConfigError::InvalidValue("PORT".to_string(), format!("{}", e)))?;

        let data_dir = std::env::var("DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data"));

        let task_store = std::env::var("TASK_STORE").unwrap_or_else(|_| "sqlite".to_string());

        let sources = std::env::var("CANDIDATE_SOURCES")
            .map(|raw| Self::parse_sources(&raw))
            .unwrap_or_default();

        let per_source_limit = std::env::var("PER_SOURCE_LIMIT")
            .unwrap_or_else(|_| "25".to_string())
            .parse()
            .map_err(|e| {
                ConfigError::InvalidValue("PER_SOURCE_LIMIT".to_string(), format!("{}", e))
            })?;

        let inline_result_limit = std::env::var("INLINE_RESULT_LIMIT")
            .unwrap_or_else(|_| "65536".to_string())
            .parse()
            .map_err(|e| {
                ConfigError::InvalidValue("INLINE_RESULT_LIMIT".to_string(), format!("{}", e))
            })?;

        Ok(Self {
            api_key,
            default_model,
            host,
            port,
            data_dir,
            task_store,
            sources,
            per_source_limit,
            inline_result_limit,
        })
    }

    /// Parse `name=url` pairs from a comma-separated list.
    ///
    /// Entries without a `=` or with an empty side are skipped with a warning.
    fn parse_sources(raw: &str) -> Vec<SourceEndpoint> {
        let mut endpoints = Vec::new();
        for entry in raw.split(',') {
            let entry = entry.trim();
            if entry.is_empty() {
                continue;
            }
            match entry.split_once('=') {
                Some((name, url)) if !name.trim().is_empty() && !url.trim().is_empty() => {
                    endpoints.push(SourceEndpoint {
                        name: name.trim().to_string(),
                        url: url.trim().to_string(),
                    });
                }
                _ => {
                    tracing::warn!("Ignoring malformed CANDIDATE_SOURCES entry: {}", entry);
                }
            }
        }
        endpoints
    }

    /// Create a config with custom values (useful for testing).
    pub fn new(api_key: Option<String>, default_model: String, data_dir: PathBuf) -> Self {
        Self {
            api_key,
            default_model,
            host: "127.0.0.1".to_string(),
            port: 3100,
            data_dir,
            task_store: "memory".to_string(),
            sources: Vec::new(),
            per_source_limit: 25,
            inline_result_limit: 64 * 1024,
        }
    }
}

//! Environment-backed configuration.
//!
//! Every setting has a default. Override with `SIFT_*` environment variables. Tunables
//! owned by a single module ([`RetryPolicy`], [`RetrievalConfig`], [`JudgeConfig`]) read
//! their own variables; [`Config`] gathers them and validates the whole.

pub mod error;


pub use error::ConfigError;

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::{DEFAULT_EMBEDDING_DIM, DEFAULT_MAX_QUERY_CHARS};
use crate::judge::{JudgeConfig, JudgeKind};
use crate::retrieval::RetrievalConfig;
use crate::retry::RetryPolicy;
use crate::routing::RoutingConfig;
use crate::services::{DEFAULT_HISTORY_CAPACITY, DEFAULT_HISTORY_MAX_TURNS};

/// Default chat model for synthesis and follow-up rewriting.
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";

/// Default embedding model name sent to `SIFT_EMBEDDING_URL`.
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// Router configuration loaded from environment variables.
///
/// Use [`Config::from_env`] to read `SIFT_*` overrides on top of defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// JSONL corpus file. Without one the router starts with an empty index.
    pub corpus_path: Option<PathBuf>,

    /// Plain-text schema description for the structured executor.
    pub schema_path: Option<PathBuf>,

    /// OpenAI-compatible `/embeddings` endpoint. Unset uses the hashed stub embedder.
    pub embedding_url: Option<String>,

    pub embedding_model: String,

    /// Default: `384`.
    pub embedding_dim: usize,

    pub embedding_api_key: Option<String>,

    /// Structured-query executor endpoint. Unset makes every structured path fail over
    /// to retrieval.
    pub structured_url: Option<String>,

    pub synthesis_model: String,

    /// `None` disables follow-up rewriting (`SIFT_REWRITE_MODEL=off`).
    pub rewrite_model: Option<String>,

    /// Default: `1000`.
    pub max_query_chars: usize,

    pub history_capacity: u64,

    pub history_max_turns: usize,

    /// Per-request timeout for HTTP adapters. Default: 30 s.
    pub request_timeout: Duration,

    pub retry: RetryPolicy,

    pub retrieval: RetrievalConfig,

    pub judge: JudgeConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            corpus_path: None,
            schema_path: None,
            embedding_url: None,
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            embedding_dim: DEFAULT_EMBEDDING_DIM,
            embedding_api_key: None,
            structured_url: None,
            synthesis_model: DEFAULT_CHAT_MODEL.to_string(),
            rewrite_model: Some(DEFAULT_CHAT_MODEL.to_string()),
            max_query_chars: DEFAULT_MAX_QUERY_CHARS,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            history_max_turns: DEFAULT_HISTORY_MAX_TURNS,
            request_timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
            retrieval: RetrievalConfig::default(),
            judge: JudgeConfig::default(),
        }
    }
}

impl Config {
    const ENV_CORPUS_PATH: &'static str = "SIFT_CORPUS_PATH";
    const ENV_SCHEMA_PATH: &'static str = "SIFT_SCHEMA_PATH";
    const ENV_EMBEDDING_URL: &'static str = "SIFT_EMBEDDING_URL";
    const ENV_EMBEDDING_MODEL: &'static str = "SIFT_EMBEDDING_MODEL";
    const ENV_EMBEDDING_DIM: &'static str = "SIFT_EMBEDDING_DIM";
    const ENV_EMBEDDING_API_KEY: &'static str = "SIFT_EMBEDDING_API_KEY";
    const ENV_STRUCTURED_URL: &'static str = "SIFT_STRUCTURED_URL";
    const ENV_SYNTHESIS_MODEL: &'static str = "SIFT_SYNTHESIS_MODEL";
    const ENV_REWRITE_MODEL: &'static str = "SIFT_REWRITE_MODEL";
    const ENV_MAX_QUERY_CHARS: &'static str = "SIFT_MAX_QUERY_CHARS";
    const ENV_HISTORY_CAPACITY: &'static str = "SIFT_HISTORY_CAPACITY";
    const ENV_HISTORY_MAX_TURNS: &'static str = "SIFT_HISTORY_MAX_TURNS";
    const ENV_REQUEST_TIMEOUT_SECS: &'static str = "SIFT_REQUEST_TIMEOUT_SECS";

    /// Loads configuration from environment variables (falling back to defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let rewrite_model = match Self::parse_optional_string_from_env(Self::ENV_REWRITE_MODEL) {
            Some(v) if v.eq_ignore_ascii_case("off") || v.eq_ignore_ascii_case("none") => None,
            Some(v) => Some(v),
            None => defaults.rewrite_model,
        };

        Ok(Self {
            corpus_path: Self::parse_optional_path_from_env(Self::ENV_CORPUS_PATH),
            schema_path: Self::parse_optional_path_from_env(Self::ENV_SCHEMA_PATH),
            embedding_url: Self::parse_optional_string_from_env(Self::ENV_EMBEDDING_URL),
            embedding_model: Self::parse_optional_string_from_env(Self::ENV_EMBEDDING_MODEL)
                .unwrap_or(defaults.embedding_model),
            embedding_dim: Self::parse_number_from_env(
                Self::ENV_EMBEDDING_DIM,
                defaults.embedding_dim,
            )?,
            embedding_api_key: Self::parse_optional_string_from_env(Self::ENV_EMBEDDING_API_KEY),
            structured_url: Self::parse_optional_string_from_env(Self::ENV_STRUCTURED_URL),
            synthesis_model: Self::parse_optional_string_from_env(Self::ENV_SYNTHESIS_MODEL)
                .unwrap_or(defaults.synthesis_model),
            rewrite_model,
            max_query_chars: Self::parse_number_from_env(
                Self::ENV_MAX_QUERY_CHARS,
                defaults.max_query_chars,
            )?,
            history_capacity: Self::parse_number_from_env(
                Self::ENV_HISTORY_CAPACITY,
                defaults.history_capacity,
            )?,
            history_max_turns: Self::parse_number_from_env(
                Self::ENV_HISTORY_MAX_TURNS,
                defaults.history_max_turns,
            )?,
            request_timeout: Duration::from_secs(Self::parse_number_from_env(
                Self::ENV_REQUEST_TIMEOUT_SECS,
                defaults.request_timeout.as_secs(),
            )?),
            retry: RetryPolicy::from_env(),
            retrieval: RetrievalConfig::from_env(),
            judge: JudgeConfig::from_env(),
        })
    }

    /// Validates paths and cross-field invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for path in [&self.corpus_path, &self.schema_path].into_iter().flatten() {
            Self::require_file(path)?;
        }

        if self.embedding_dim == 0 {
            return Err(ConfigError::InvalidValue {
                name: Self::ENV_EMBEDDING_DIM,
                reason: "must be positive".to_string(),
            });
        }

        if self.request_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                name: Self::ENV_REQUEST_TIMEOUT_SECS,
                reason: "must be positive".to_string(),
            });
        }

        self.retry
            .validate()
            .map_err(|reason| ConfigError::Retry { reason })?;
        self.retrieval
            .validate()
            .map_err(|reason| ConfigError::Retrieval { reason })?;
        self.judge
            .validate()
            .map_err(|reason| ConfigError::Judge { reason })?;

        if self.judge.kind == JudgeKind::CrossEncoder
            && let Some(ref path) = self.judge.model_path
            && !path.is_dir()
        {
            return Err(if path.exists() {
                ConfigError::NotADirectory { path: path.clone() }
            } else {
                ConfigError::PathNotFound { path: path.clone() }
            });
        }

        self.routing()
            .validate()
            .map_err(|reason| ConfigError::Routing { reason })?;

        Ok(())
    }

    pub fn routing(&self) -> RoutingConfig {
        RoutingConfig {
            max_query_chars: self.max_query_chars,
            ..RoutingConfig::default()
        }
    }

    fn require_file(path: &Path) -> Result<(), ConfigError> {
        if !path.exists() {
            return Err(ConfigError::PathNotFound {
                path: path.to_path_buf(),
            });
        }
        if !path.is_file() {
            return Err(ConfigError::NotAFile {
                path: path.to_path_buf(),
            });
        }
        Ok(())
    }

    fn parse_optional_path_from_env(var_name: &str) -> Option<PathBuf> {
        Self::parse_optional_string_from_env(var_name).map(PathBuf::from)
    }

    fn parse_optional_string_from_env(var_name: &str) -> Option<String> {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parse_number_from_env<T>(var_name: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: std::str::FromStr<Err = std::num::ParseIntError>,
    {
        match env::var(var_name) {
            Ok(value) => value
                .trim()
                .parse()
                .map_err(|source| ConfigError::InvalidNumber {
                    name: var_name,
                    value,
                    source,
                }),
            Err(_) => Ok(default),
        }
    }
}

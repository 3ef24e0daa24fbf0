use quorum::oracle::providers::{COHERE_DEFAULT_MODEL, GEMINI_DEFAULT_MODEL, GPT_DEFAULT_MODEL};
use quorum::schema::DEFAULT_CACHE_FILE;
use quorum::ConsensusMode;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Default per-call oracle deadline in seconds.
pub const DEFAULT_ORACLE_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("{0} is not set (environment or config file)")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// One `[gpt]`, `[cohere]` or `[gemini]` table in the config file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProviderSection {
    pub api_key: Option<String>,
    pub model: Option<String>,
}

/// On-disk TOML configuration. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub database_url: Option<String>,
    pub schema_cache: Option<PathBuf>,
    pub mode: Option<ConsensusMode>,
    pub oracle_timeout_secs: Option<u64>,
    pub gpt: ProviderSection,
    pub cohere: ProviderSection,
    pub gemini: ProviderSection,
}

impl FileConfig {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&text)?)
    }
}

/// Values given on the command line; they win over everything else.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub database_url: Option<String>,
    pub schema_cache: Option<PathBuf>,
    pub mode: Option<ConsensusMode>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub api_key: String,
    pub model: String,
}

/// Fully resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub schema_cache: PathBuf,
    /// `None` asks the operator at startup.
    pub mode: Option<ConsensusMode>,
    pub oracle_timeout: Duration,
    pub gpt: ProviderConfig,
    pub cohere: ProviderConfig,
    pub gemini: ProviderConfig,
}

impl AppConfig {
    /// Resolve with precedence CLI > environment > file > defaults.
    pub fn resolve(
        cli: CliOverrides,
        file: FileConfig,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let database_url = cli
            .database_url
            .or_else(|| env("DATABASE_URL"))
            .or(file.database_url)
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let schema_cache = cli
            .schema_cache
            .or_else(|| env("QUORUM_SCHEMA_CACHE").map(PathBuf::from))
            .or(file.schema_cache)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE_FILE));

        let timeout_secs = match env("QUORUM_ORACLE_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or(ConfigError::Invalid {
                    name: "QUORUM_ORACLE_TIMEOUT_SECS",
                    value: raw,
                })?,
            None => file
                .oracle_timeout_secs
                .unwrap_or(DEFAULT_ORACLE_TIMEOUT_SECS),
        };

        Ok(Self {
            database_url,
            schema_cache,
            mode: cli.mode.or(file.mode),
            oracle_timeout: Duration::from_secs(timeout_secs),
            gpt: provider(
                &env,
                file.gpt,
                "OPENAI_API_KEY",
                "QUORUM_GPT_MODEL",
                GPT_DEFAULT_MODEL,
            )?,
            cohere: provider(
                &env,
                file.cohere,
                "COHERE_API_KEY",
                "QUORUM_COHERE_MODEL",
                COHERE_DEFAULT_MODEL,
            )?,
            gemini: provider(
                &env,
                file.gemini,
                "GEMINI_API_KEY",
                "QUORUM_GEMINI_MODEL",
                GEMINI_DEFAULT_MODEL,
            )?,
        })
    }

    /// Resolve against the process environment.
    pub fn load(cli: CliOverrides, config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match config_path {
            Some(path) => FileConfig::from_path(path)?,
            None => FileConfig::default(),
        };
        Self::resolve(cli, file, |name| {
            std::env::var(name).ok().filter(|v| !v.is_empty())
        })
    }
}

fn provider(
    env: &impl Fn(&str) -> Option<String>,
    section: ProviderSection,
    key_var: &'static str,
    model_var: &str,
    default_model: &str,
) -> Result<ProviderConfig, ConfigError> {
    let api_key = env(key_var)
        .or(section.api_key)
        .ok_or(ConfigError::Missing(key_var))?;
    let model = env(model_var)
        .or(section.model)
        .unwrap_or_else(|| default_model.to_string());
    Ok(ProviderConfig { api_key, model })
}


use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

pub const DEFAULT_TABLE_NAME: &str = "embeddings_table";
pub const DEFAULT_SEARCH_LIMIT: usize = 5;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Config {
    #[serde(default)]
    pub ollama: OllamaConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(skip)]
    pub base_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct OllamaConfig {
    pub protocol: String,
    pub host: String,
    pub port: u16,
    pub model: String,
    pub timeout_secs: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            protocol: "http".to_string(),
            host: "localhost".to_string(),
            port: 11434,
            model: "nomic-embed-text:latest".to_string(),
            timeout_secs: 30,
        }
    }
}

/// How `upsert` writes a vector for a path that may already be stored.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum UpsertMode {
    /// Existence check followed by a separate update or insert.
    /// Only safe with a single running ingester.
    #[default]
    CheckThenWrite,
    /// One merge-insert keyed on `file_path`.
    Merge,
}

impl std::fmt::Display for UpsertMode {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CheckThenWrite => write!(f, "check_then_write"),
            Self::Merge => write!(f, "merge"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DatabaseConfig {
    /// LanceDB URI. Defaults to `<config dir>/vectors` when unset.
    pub uri: Option<String>,
    pub table_name: String,
    pub upsert_mode: UpsertMode,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            uri: None,
            table_name: DEFAULT_TABLE_NAME.to_string(),
            upsert_mode: UpsertMode::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SearchConfig {
    pub limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            limit: DEFAULT_SEARCH_LIMIT,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration directory not found or could not be created")]
    DirectoryError,
    #[error("Invalid URL format: {0}")]
    InvalidUrl(String),
    #[error("Invalid port: {0} (must be between 1 and 65535)")]
    InvalidPort(u16),
    #[error("Invalid model name: {0} (cannot be empty)")]
    InvalidModel(String),
    #[error("Invalid protocol: {0} (must be 'http' or 'https')")]
    InvalidProtocol(String),
    #[error("Invalid timeout: {0} (must be between 1 and 600 seconds)")]
    InvalidTimeout(u64),
    #[error("Invalid table name: {0} (letters, digits, '_' and '-' only)")]
    InvalidTableName(String),
    #[error("Invalid database URI: {0} (cannot be empty)")]
    InvalidDatabaseUri(String),
    #[error("Invalid search limit: {0} (must be between 1 and 100)")]
    InvalidSearchLimit(usize),
    #[error("Invalid value for {name}: {value}")]
    InvalidEnvironmentValue { name: &'static str, value: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl Config {
    /// Directory used when neither `--config-dir` nor `FILE_VECTOR_HOME` is given
    #[inline]
    pub fn default_config_dir() -> Result<PathBuf, ConfigError> {
        if let Some(home) = std::env::var_os("FILE_VECTOR_HOME") {
            return Ok(PathBuf::from(home));
        }

        dirs::home_dir()
            .map(|home| home.join(".file-vector"))
            .or({
                #[cfg(windows)]
                {
                    dirs::data_dir().map(|data| data.join("file-vector"))
                }
                #[cfg(not(windows))]
                {
                    None
                }
            })
            .ok_or(ConfigError::DirectoryError)
    }

    /// Load `config.toml` from `config_dir` and apply environment overrides
    #[inline]
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let mut config = Self::load_file(config_dir)?;
        config
            .apply_env_overrides(|name| std::env::var(name).ok())
            .context("Invalid environment override")?;
        config
            .validate()
            .with_context(|| "Configuration validation failed")?;
        Ok(config)
    }

    /// Load `config.toml` from `config_dir` without consulting the environment
    #[inline]
    pub fn load_file<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join("config.toml");

        if !config_path.exists() {
            return Ok(Self {
                base_dir: config_dir.as_ref().to_path_buf(),
                ..Self::default()
            });
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;
        config.base_dir = config_dir.as_ref().to_path_buf();

        config
            .validate()
            .with_context(|| "Configuration validation failed")?;

        Ok(config)
    }

    #[inline]
    pub fn save(&self) -> Result<()> {
        self.validate()
            .context("Configuration validation failed before saving")?;

        let config_dir = self.get_base_dir();

        fs::create_dir_all(config_dir).with_context(|| {
            format!(
                "Failed to create config directory: {}",
                config_dir.display()
            )
        })?;

        let config_path = self.config_file_path();
        let content = toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        fs::write(&config_path, content)
            .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;

        Ok(())
    }

    /// Override settings from `FILE_VECTOR_*` variables.
    ///
    /// `lookup` resolves a variable name to its value, so callers other than
    /// [`Config::load`] can supply their own environment.
    #[inline]
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("FILE_VECTOR_OLLAMA_HOST") {
            self.ollama.host = host;
        }
        if let Some(port) = lookup("FILE_VECTOR_OLLAMA_PORT") {
            self.ollama.port =
                port.trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidEnvironmentValue {
                        name: "FILE_VECTOR_OLLAMA_PORT",
                        value: port.clone(),
                    })?;
        }
        if let Some(model) = lookup("FILE_VECTOR_OLLAMA_MODEL") {
            self.ollama.model = model;
        }
        if let Some(uri) = lookup("FILE_VECTOR_DATABASE_URI") {
            self.database.uri = Some(uri);
        }
        if let Some(table) = lookup("FILE_VECTOR_TABLE") {
            self.database.table_name = table;
        }
        Ok(())
    }

    /// Get the base directory for the application
    #[inline]
    pub fn get_base_dir(&self) -> &Path {
        &self.base_dir
    }

    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.ollama.validate()?;
        self.database.validate()?;
        self.search.validate()?;
        Ok(())
    }

    #[inline]
    pub fn config_file_path(&self) -> PathBuf {
        self.get_base_dir().join("config.toml")
    }

    /// Get the path for the vector database directory
    #[inline]
    pub fn vector_database_path(&self) -> PathBuf {
        self.get_base_dir().join("vectors")
    }

    /// Resolve the LanceDB URI, falling back to the vector directory under the base dir
    #[inline]
    pub fn database_uri(&self) -> String {
        self.database
            .uri
            .clone()
            .unwrap_or_else(|| self.vector_database_path().display().to_string())
    }

    #[inline]
    pub fn ollama_url(&self) -> Result<Url, ConfigError> {
        self.ollama.ollama_url()
    }
}

impl OllamaConfig {
    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.protocol != "http" && self.protocol != "https" {
            return Err(ConfigError::InvalidProtocol(self.protocol.clone()));
        }

        self.ollama_url()?;

        if self.port == 0 {
            return Err(ConfigError::InvalidPort(self.port));
        }

        if self.model.trim().is_empty() {
            return Err(ConfigError::InvalidModel(self.model.clone()));
        }

        if !(1..=600).contains(&self.timeout_secs) {
            return Err(ConfigError::InvalidTimeout(self.timeout_secs));
        }

        Ok(())
    }

    #[inline]
    pub fn ollama_url(&self) -> Result<Url, ConfigError> {
        let url_str = format!("{}://{}:{}", self.protocol, self.host, self.port);
        Url::parse(&url_str).map_err(|_| ConfigError::InvalidUrl(url_str))
    }

    #[inline]
    pub fn set_protocol(&mut self, protocol: String) -> Result<(), ConfigError> {
        if protocol != "http" && protocol != "https" {
            return Err(ConfigError::InvalidProtocol(protocol));
        }
        self.protocol = protocol;
        Ok(())
    }

    #[inline]
    pub fn set_host(&mut self, host: String) -> Result<(), ConfigError> {
        let temp_config = OllamaConfig {
            host: host.clone(),
            ..self.clone()
        };
        temp_config.validate()?;
        self.host = host;
        Ok(())
    }

    #[inline]
    pub fn set_port(&mut self, port: u16) -> Result<(), ConfigError> {
        if port == 0 {
            return Err(ConfigError::InvalidPort(port));
        }
        self.port = port;
        Ok(())
    }

    #[inline]
    pub fn set_model(&mut self, model: String) -> Result<(), ConfigError> {
        if model.trim().is_empty() {
            return Err(ConfigError::InvalidModel(model));
        }
        self.model = model;
        Ok(())
    }

    #[inline]
    pub fn set_timeout_secs(&mut self, timeout_secs: u64) -> Result<(), ConfigError> {
        if !(1..=600).contains(&timeout_secs) {
            return Err(ConfigError::InvalidTimeout(timeout_secs));
        }
        self.timeout_secs = timeout_secs;
        Ok(())
    }
}

impl DatabaseConfig {
    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(uri) = self.uri.as_ref().filter(|uri| uri.trim().is_empty()) {
            return Err(ConfigError::InvalidDatabaseUri(uri.clone()));
        }

        if !is_valid_table_name(&self.table_name) {
            return Err(ConfigError::InvalidTableName(self.table_name.clone()));
        }

        Ok(())
    }

    #[inline]
    pub fn set_table_name(&mut self, table_name: String) -> Result<(), ConfigError> {
        if !is_valid_table_name(&table_name) {
            return Err(ConfigError::InvalidTableName(table_name));
        }
        self.table_name = table_name;
        Ok(())
    }
}

impl SearchConfig {
    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.limit) {
            return Err(ConfigError::InvalidSearchLimit(self.limit));
        }
        Ok(())
    }
}

fn is_valid_table_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

//! Application configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/moco/config.toml)
//! 3. Environment variables (MOCO_* prefix)
//!
//! Environment variables take precedence over config file values.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// Environment variable prefix
const ENV_PREFIX: &str = "MOCO";

/// Default HTTP timeout for page fetches and remote calls
const DEFAULT_FETCH_TIMEOUT: u64 = 10;

/// What the store does when an inserted article's link already exists
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictPolicy {
    /// Overwrite the existing row
    #[default]
    Replace,
    /// Keep the existing row, drop the new one
    Ignore,
}

/// How the remote payload parser treats malformed elements
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ParsePolicy {
    /// One malformed element discards the whole payload
    #[default]
    FailFast,
    /// Malformed elements are dropped, valid ones are kept
    SkipMalformed,
}

impl fmt::Display for ConflictPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictPolicy::Replace => write!(f, "replace"),
            ConflictPolicy::Ignore => write!(f, "ignore"),
        }
    }
}

impl FromStr for ConflictPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "replace" => Ok(ConflictPolicy::Replace),
            "ignore" => Ok(ConflictPolicy::Ignore),
            other => bail!("Unknown conflict policy '{}' (expected replace or ignore)", other),
        }
    }
}

impl fmt::Display for ParsePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParsePolicy::FailFast => write!(f, "fail-fast"),
            ParsePolicy::SkipMalformed => write!(f, "skip-malformed"),
        }
    }
}

impl FromStr for ParsePolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail-fast" => Ok(ParsePolicy::FailFast),
            "skip-malformed" => Ok(ParsePolicy::SkipMalformed),
            other => bail!(
                "Unknown parse policy '{}' (expected fail-fast or skip-malformed)",
                other
            ),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory for data storage (SQLite db, session)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Base URL of the remote document store (optional)
    #[serde(default)]
    pub remote_url: Option<String>,

    /// Insert behavior for duplicate links
    #[serde(default)]
    pub conflict_policy: ConflictPolicy,

    /// Remote payload parsing behavior
    #[serde(default)]
    pub parse_policy: ParsePolicy,

    /// Timeout in seconds for HTTP requests
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,

    /// User agent sent when fetching pages
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            remote_url: None,
            conflict_policy: ConflictPolicy::default(),
            parse_policy: ParsePolicy::default(),
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT,
            user_agent: default_user_agent(),
        }
    }
}

impl Config {
    /// Load configuration from default location and environment
    ///
    /// Order of precedence (highest to lowest):
    /// 1. Environment variables (MOCO_DATA_DIR, MOCO_REMOTE_URL, ...)
    /// 2. Config file (~/.config/moco/config.toml or MOCO_CONFIG)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_file_path())
    }

    /// Load configuration from a specific path
    ///
    /// Environment variables are still applied as overrides.
    /// If the file doesn't exist, defaults are used.
    pub fn load_from_path(path: &PathBuf) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?
        } else {
            Self::default()
        };

        config.apply_env_overrides()?;
        config.ensure_data_dir()?;
        Ok(config)
    }

    /// Load configuration from a TOML string (useful for testing)
    pub fn load_from_str(toml_content: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(toml_content).context("Failed to parse config TOML")?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Configuration rooted at an explicit data directory, everything else default
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(val) = std::env::var(format!("{}_DATA_DIR", ENV_PREFIX)) {
            self.data_dir = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var(format!("{}_REMOTE_URL", ENV_PREFIX)) {
            self.remote_url = if val.is_empty() { None } else { Some(val) };
        }

        if let Ok(val) = std::env::var(format!("{}_CONFLICT_POLICY", ENV_PREFIX)) {
            self.conflict_policy = val.parse()?;
        }

        if let Ok(val) = std::env::var(format!("{}_PARSE_POLICY", ENV_PREFIX)) {
            self.parse_policy = val.parse()?;
        }

        if let Ok(val) = std::env::var(format!("{}_FETCH_TIMEOUT", ENV_PREFIX)) {
            self.fetch_timeout_secs = val
                .parse()
                .with_context(|| format!("Invalid {}_FETCH_TIMEOUT: {}", ENV_PREFIX, val))?;
        }

        Ok(())
    }

    /// Set a single value by key, as used by `moco config set`
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "data_dir" => self.data_dir = PathBuf::from(value),
            "remote_url" => {
                self.remote_url = if value.is_empty() {
                    None
                } else {
                    Some(value.to_string())
                }
            }
            "conflict_policy" => self.conflict_policy = value.parse()?,
            "parse_policy" => self.parse_policy = value.parse()?,
            "fetch_timeout_secs" => {
                self.fetch_timeout_secs = value
                    .parse()
                    .with_context(|| format!("Invalid timeout: {}", value))?
            }
            "user_agent" => self.user_agent = value.to_string(),
            other => bail!(
                "Unknown config key '{}'. Valid keys: data_dir, remote_url, conflict_policy, \
                 parse_policy, fetch_timeout_secs, user_agent",
                other
            ),
        }
        Ok(())
    }

    /// Ensure data directory exists
    fn ensure_data_dir(&self) -> Result<()> {
        if !self.data_dir.exists() {
            std::fs::create_dir_all(&self.data_dir)
                .with_context(|| format!("Failed to create data directory: {:?}", self.data_dir))?;
        }
        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_file_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(&config_path, content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;
        Ok(())
    }

    /// Get the config file path
    ///
    /// Can be overridden with MOCO_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("moco")
            .join("config.toml")
    }

    /// Get the path to the SQLite database
    pub fn sqlite_path(&self) -> PathBuf {
        self.data_dir.join("moco.db")
    }

    /// Get the path to the signed-in session file
    pub fn session_path(&self) -> PathBuf {
        self.data_dir.join("session.json")
    }
}

/// Get the default data directory
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("moco")
}

fn default_fetch_timeout() -> u64 {
    DEFAULT_FETCH_TIMEOUT
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (compatible; Moco/0.3)".to_string()
}

//! Scout configuration: one TOML file per league.
//!
//! ```toml
//! league_id = "4711"
//! token_env = "KICKBASE_TOKEN"
//! snapshot = "data/snapshot.parquet"
//! model = "models/mv_target.json"
//! payload_dir = "data/payloads"
//! output_dir = "reports"
//! features = ["mv_change_1d", "mv_trend_1d", "form"]
//! ```
//!
//! Relative paths are resolved against the config file's directory.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScoutConfig {
    /// League whose squad and market are reconciled.
    pub league_id: String,

    /// Environment variable holding the API token. The token is passed to
    /// the collaborators untouched.
    #[serde(default)]
    pub token_env: Option<String>,

    /// Daily snapshot file (`.parquet` or `.csv`).
    pub snapshot: PathBuf,

    /// Serialized value model (JSON).
    pub model: PathBuf,

    /// Directory of captured squad/market payloads, laid out as
    /// `{payload_dir}/{league_id}/{squad,market}.json`.
    pub payload_dir: PathBuf,

    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Model feature columns, in the order the model expects them.
    pub features: Vec<String>,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("reports")
}

impl ScoutConfig {
    /// Load, validate and resolve a config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&content)?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        Ok(config.resolved_against(base))
    }

    /// Parse and validate a config from a TOML string. Paths stay as written.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.league_id.trim().is_empty() {
            return Err(ConfigError::Invalid("league_id must not be empty".into()));
        }
        if self.features.is_empty() {
            return Err(ConfigError::Invalid("features must list at least one column".into()));
        }
        let mut seen = HashSet::new();
        for feature in &self.features {
            if !seen.insert(feature.as_str()) {
                return Err(ConfigError::Invalid(format!("duplicate feature '{feature}'")));
            }
        }
        Ok(())
    }

    /// Make relative paths relative to `base`.
    pub fn resolved_against(mut self, base: &Path) -> Self {
        for path in [
            &mut self.snapshot,
            &mut self.model,
            &mut self.payload_dir,
            &mut self.output_dir,
        ] {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
        self
    }

    /// API token from `token_env`, or an empty string when unset.
    pub fn token(&self) -> String {
        self.token_env
            .as_deref()
            .and_then(|var| std::env::var(var).ok())
            .unwrap_or_default()
    }
}

//! Collaborator traits for squad and market data, and structured errors.
//!
//! The league API client lives outside this crate. The traits below are the
//! only surface the reconcilers see, so tests and offline runs can swap in
//! [`JsonDirProvider`] or a hand-rolled mock.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// One loosely-schematized JSON object from a collaborator payload.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Squad endpoint payload: `{ "it": [ ...players ] }`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SquadPayload {
    #[serde(default)]
    pub it: Option<Vec<Record>>,
}

impl SquadPayload {
    pub fn new(players: Vec<Record>) -> Self {
        Self { it: Some(players) }
    }

    /// Roster entries, empty when the payload carried none.
    pub fn roster(&self) -> &[Record] {
        self.it.as_deref().unwrap_or(&[])
    }
}

/// Errors raised by collaborator implementations.
///
/// The reconcilers never recover from these; they propagate unchanged.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("payload not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed payload in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("provider error: {0}")]
    Other(String),
}

/// Players currently in the manager's squad.
pub trait SquadProvider: Send + Sync {
    fn players_in_squad(&self, token: &str, league_id: &str) -> Result<SquadPayload, ProviderError>;
}

/// Players currently listed on the league's transfer market.
pub trait MarketProvider: Send + Sync {
    fn players_on_market(&self, token: &str, league_id: &str) -> Result<Vec<Record>, ProviderError>;
}

/// Serves captured payloads from disk.
///
/// Layout: `{root}/{league_id}/squad.json` and `{root}/{league_id}/market.json`.
/// The token is accepted for interface parity and ignored.
#[derive(Debug, Clone)]
pub struct JsonDirProvider {
    root: PathBuf,
}

impl JsonDirProvider {
    pub const SQUAD_FILE: &'static str = "squad.json";
    pub const MARKET_FILE: &'static str = "market.json";

    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn payload_path(&self, league_id: &str, file: &str) -> PathBuf {
        self.root.join(league_id).join(file)
    }

    fn read<T: DeserializeOwned>(&self, league_id: &str, file: &str) -> Result<T, ProviderError> {
        let path = self.payload_path(league_id, file);
        if !path.exists() {
            return Err(ProviderError::NotFound { path });
        }
        let content = fs::read_to_string(&path).map_err(|source| ProviderError::Io {
            path: path.clone(),
            source,
        })?;
        debug!(path = %path.display(), bytes = content.len(), "loaded payload");
        serde_json::from_str(&content).map_err(|source| ProviderError::Json { path, source })
    }
}

impl SquadProvider for JsonDirProvider {
    fn players_in_squad(&self, _token: &str, league_id: &str) -> Result<SquadPayload, ProviderError> {
        self.read(league_id, Self::SQUAD_FILE)
    }
}

impl MarketProvider for JsonDirProvider {
    fn players_on_market(&self, _token: &str, league_id: &str) -> Result<Vec<Record>, ProviderError> {
        self.read(league_id, Self::MARKET_FILE)
    }
}

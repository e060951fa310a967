use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{Result, TokenDbError};

/// How hard a committed batch is pushed to disk before `commit` returns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Durability {
    /// fsync data and metadata after every batch
    SyncAll,
    /// fsync data only
    SyncData,
    /// leave flushing to the store's background journal writer
    Buffered,
}

impl Durability {
    pub(crate) fn persist_mode(&self) -> Option<fjall::PersistMode> {
        match self {
            Durability::SyncAll => Some(fjall::PersistMode::SyncAll),
            Durability::SyncData => Some(fjall::PersistMode::SyncData),
            Durability::Buffered => None,
        }
    }
}

impl Default for Durability {
    fn default() -> Self {
        Durability::SyncAll
    }
}

impl FromStr for Durability {
    type Err = TokenDbError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "sync-all" | "sync_all" | "sync" => Ok(Durability::SyncAll),
            "sync-data" | "sync_data" => Ok(Durability::SyncData),
            "buffered" | "buffer" => Ok(Durability::Buffered),
            other => Err(TokenDbError::InvalidRequest(format!(
                "unknown durability mode '{}'",
                other
            ))),
        }
    }
}

/// Engine configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EngineConfig {
    pub data_dir: PathBuf,
    #[serde(default)]
    pub durability: Durability,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            durability: Durability::SyncAll,
        }
    }
}

impl EngineConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Default::default()
        }
    }

    pub fn with_durability(mut self, durability: Durability) -> Self {
        self.durability = durability;
        self
    }

    /// Load a configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read(path.as_ref())?;
        Ok(serde_json::from_slice(&raw)?)
    }
}

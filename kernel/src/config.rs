// Persistence Configuration
//
// Chooses the dataset backend and where the durable one keeps its files.
// Loaded from the environment, from JSON, or built directly.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Environment variable naming the persistence mode.
pub const PERSIST_MODE_VAR: &str = "PERSIST_MODE";

/// Environment variable naming the durable backend's directory.
pub const DATA_DIR_VAR: &str = "DATA_DIR";

pub const DEFAULT_DATA_DIR: &str = "./data";

/// Requested persistence mode.
///
/// Parsing never fails: values other than `memory` and `files` are kept
/// as `Unrecognized` so the selector can report them and fall back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PersistMode {
    Memory,
    #[default]
    Files,
    Unrecognized(String),
}

impl PersistMode {
    pub fn parse(raw: &str) -> Self {
        let normalized = raw.trim().to_lowercase();
        match normalized.as_str() {
            "memory" => PersistMode::Memory,
            "files" => PersistMode::Files,
            _ => PersistMode::Unrecognized(normalized),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            PersistMode::Memory => "memory",
            PersistMode::Files => "files",
            PersistMode::Unrecognized(raw) => raw,
        }
    }
}

impl fmt::Display for PersistMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for PersistMode {
    fn from(value: String) -> Self {
        PersistMode::parse(&value)
    }
}

impl From<PersistMode> for String {
    fn from(value: PersistMode) -> Self {
        value.as_str().to_string()
    }
}

/// Persistence settings consumed at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistConfig {
    #[serde(default)]
    pub mode: PersistMode,

    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_DIR)
}

impl Default for PersistConfig {
    fn default() -> Self {
        Self {
            mode: PersistMode::default(),
            data_dir: default_data_dir(),
        }
    }
}

impl PersistConfig {
    pub fn memory() -> Self {
        Self {
            mode: PersistMode::Memory,
            ..Self::default()
        }
    }

    pub fn files(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            mode: PersistMode::Files,
            data_dir: data_dir.into(),
        }
    }

    /// Read `PERSIST_MODE` and `DATA_DIR` from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Missing keys fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mode = lookup(PERSIST_MODE_VAR)
            .map(|raw| PersistMode::parse(&raw))
            .unwrap_or_default();

        let data_dir = lookup(DATA_DIR_VAR)
            .filter(|dir| !dir.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_data_dir);

        Self { mode, data_dir }
    }
}

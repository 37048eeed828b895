// Dataset Persistence
//
// Data model and error taxonomy shared by every dataset backend.
// Backends live in sibling modules and agree on the `DatasetStore` contract.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

pub mod files;
pub mod manifest;
pub mod memory;
pub mod store;

pub use files::FileDatasetStore;
pub use memory::InMemoryDatasetStore;
pub use store::{BackendKind, DatasetStore};

/// Caller-defined summary fields. Stored and returned verbatim.
pub type Meta = serde_json::Map<String, serde_json::Value>;

/// A single record: field name to scalar value.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Opaque identifier assigned by a backend at creation time.
///
/// The format differs between backends and carries no ordering guarantee.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DatasetId(pub String);

impl DatasetId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DatasetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DatasetId {
    fn from(value: &str) -> Self {
        DatasetId(value.to_string())
    }
}

impl From<String> for DatasetId {
    fn from(value: String) -> Self {
        DatasetId(value)
    }
}

/// One stored tabular resource, rows included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub id: DatasetId,
    pub name: String,
    pub meta: Meta,
    pub rows: Vec<Row>,
}

/// Metadata-only view of a dataset.
///
/// This is also the shape of a manifest entry in the durable backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub id: DatasetId,
    pub name: String,
    pub meta: Meta,
}

impl Dataset {
    pub fn summary(&self) -> DatasetSummary {
        DatasetSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            meta: self.meta.clone(),
        }
    }
}

impl DatasetSummary {
    /// Attach a row payload to this summary.
    pub fn with_rows(self, rows: Vec<Row>) -> Dataset {
        Dataset {
            id: self.id,
            name: self.name,
            meta: self.meta,
            rows,
        }
    }
}

/// Failures surfaced by dataset backends.
///
/// Unknown ids are not errors: `get` reports them as `Ok(None)`.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("cannot prepare data directory {path}: {source}")]
    BaseDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("encoding error: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("manifest {path} is not valid JSON: {source}")]
    CorruptManifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}

// Dataset Storage Abstraction
//
// Defines the persistence contract every dataset backend honours.
// Callers hold a `dyn DatasetStore` and never learn which backend they got.
//
// This module defines *interfaces only*.

use serde::Serialize;

use super::{Dataset, DatasetId, DatasetSummary, Meta, Row, StoreError};

/// Durability tier of a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// In-process only. Everything is lost when the instance is dropped.
    Memory,

    /// Directory-backed manifest plus per-dataset record files.
    Files,
}

/// Storage backend for uploaded datasets.
///
/// Properties required from implementations:
/// - Every id returned by `save` resolves through `get` and shows up in `list`
/// - Rows come back element-for-element in insertion order
/// - Repeated saves with identical arguments yield distinct ids
/// - `list` order is stable between calls with no intervening `save`
///
/// Implementations MUST NOT:
/// - Mutate a dataset after `save` returns
/// - Hand out references into internal state
/// - Touch row payloads while listing
pub trait DatasetStore: Send + Sync {
    /// Store a new dataset and return its freshly generated id.
    ///
    /// Empty `name`, `meta` and `rows` are all valid.
    fn save(&self, name: &str, meta: Meta, rows: Vec<Row>) -> Result<DatasetId, StoreError>;

    /// Load a dataset with its rows. Unknown ids yield `Ok(None)`.
    fn get(&self, id: &DatasetId) -> Result<Option<Dataset>, StoreError>;

    /// Summaries of every known dataset, without rows.
    fn list(&self) -> Result<Vec<DatasetSummary>, StoreError>;

    /// Which durability tier this backend provides.
    fn kind(&self) -> BackendKind;
}

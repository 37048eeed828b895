// Volatile Dataset Backend
//
// Keeps every dataset in process memory behind a single coarse lock.
// Nothing is persisted: all state disappears when the store is dropped.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

use super::store::{BackendKind, DatasetStore};
use super::{Dataset, DatasetId, DatasetSummary, Meta, Row, StoreError};

#[derive(Debug, Default)]
struct Inner {
    next_seq: u64,
    entries: Vec<Dataset>,
    index: HashMap<DatasetId, usize>,
}

impl Inner {
    /// Millisecond timestamp plus a per-store sequence number.
    ///
    /// The sequence alone guarantees uniqueness; the timestamp keeps ids
    /// readable.
    fn next_id(&mut self) -> DatasetId {
        let ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        self.next_seq += 1;
        DatasetId(format!("{ms}-{}", self.next_seq))
    }
}

/// Non-persistent backend, listing in insertion order.
#[derive(Debug, Default)]
pub struct InMemoryDatasetStore {
    inner: Mutex<Inner>,
}

impl InMemoryDatasetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DatasetStore for InMemoryDatasetStore {
    fn save(&self, name: &str, meta: Meta, rows: Vec<Row>) -> Result<DatasetId, StoreError> {
        let mut inner = self.inner.lock();
        let id = inner.next_id();
        let row_count = rows.len();

        let position = inner.entries.len();
        inner.entries.push(Dataset {
            id: id.clone(),
            name: name.to_string(),
            meta,
            rows,
        });
        inner.index.insert(id.clone(), position);

        debug!(dataset_id = %id, rows = row_count, "dataset stored in memory");
        Ok(id)
    }

    fn get(&self, id: &DatasetId) -> Result<Option<Dataset>, StoreError> {
        let inner = self.inner.lock();
        Ok(inner
            .index
            .get(id)
            .map(|&position| inner.entries[position].clone()))
    }

    fn list(&self) -> Result<Vec<DatasetSummary>, StoreError> {
        let inner = self.inner.lock();
        Ok(inner.entries.iter().map(Dataset::summary).collect())
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Memory
    }
}

// Dataset Manifest
//
// Metadata index for the durable backend: a pretty-printed JSON object
// mapping dataset id to `{id, name, meta}`. Row payloads never appear here,
// so the whole file is cheap to rewrite on every save.
//
// Rewrites go through `manifest.json.tmp`, fsync, then a rename over the
// live file, so readers see either the old or the new manifest. Where the
// rename is refused the live file is rewritten in place, and that fallback
// is not atomic.

use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use super::{DatasetId, DatasetSummary, StoreError};

/// Name of the manifest file inside the data directory.
pub const MANIFEST_FILENAME: &str = "manifest.json";

/// Temporary file used during atomic manifest writes.
const MANIFEST_TMP_FILENAME: &str = "manifest.json.tmp";

/// In-memory copy of the manifest.
///
/// Entries are keyed by id in a `BTreeMap`, which fixes the listing order.
#[derive(Debug, Clone)]
pub struct Manifest {
    path: PathBuf,
    entries: BTreeMap<DatasetId, DatasetSummary>,
}

impl Manifest {
    /// Read the manifest in `dir`.
    ///
    /// A missing or empty file reads as an empty manifest. Invalid JSON is an
    /// error: silently treating it as empty would drop every entry on the
    /// next save.
    pub fn load(dir: &Path) -> Result<Self, StoreError> {
        let path = dir.join(MANIFEST_FILENAME);

        let entries = match fs::read_to_string(&path) {
            Ok(text) if text.trim().is_empty() => BTreeMap::new(),
            Ok(text) => serde_json::from_str(&text).map_err(|source| {
                StoreError::CorruptManifest {
                    path: path.clone(),
                    source,
                }
            })?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => return Err(StoreError::io(&path, err)),
        };

        Ok(Self { path, entries })
    }

    /// Load the manifest, writing an empty one first if none exists yet.
    pub fn load_or_create(dir: &Path) -> Result<Self, StoreError> {
        let manifest = Self::load(dir)?;
        if !manifest.path.exists() {
            manifest.save()?;
        }
        Ok(manifest)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &DatasetId) -> Option<&DatasetSummary> {
        self.entries.get(id)
    }

    /// Add an entry (does **not** save to disk).
    pub fn insert(&mut self, entry: DatasetSummary) {
        self.entries.insert(entry.id.clone(), entry);
    }

    /// All entries, in id order.
    pub fn summaries(&self) -> Vec<DatasetSummary> {
        self.entries.values().cloned().collect()
    }

    /// Rewrite the whole manifest file.
    ///
    /// If the rename fails (Windows can refuse to replace a file that is
    /// still open elsewhere) the live file is truncated and rewritten
    /// directly instead.
    pub fn save(&self) -> Result<(), StoreError> {
        let mut encoded = serde_json::to_vec_pretty(&self.entries)?;
        encoded.push(b'\n');

        let tmp_path = self.path.with_file_name(MANIFEST_TMP_FILENAME);
        write_synced(&tmp_path, &encoded)?;

        if fs::rename(&tmp_path, &self.path).is_err() {
            write_synced(&self.path, &encoded)?;
            let _ = fs::remove_file(&tmp_path);
        }

        Ok(())
    }
}

fn write_synced(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)
        .map_err(|err| StoreError::io(path, err))?;

    file.write_all(bytes)
        .and_then(|_| file.sync_all())
        .map_err(|err| StoreError::io(path, err))
}

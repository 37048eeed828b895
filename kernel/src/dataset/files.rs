// Durable Dataset Backend
//
// Directory layout:
//
//   <root>/manifest.json          id -> {id, name, meta}
//   <root>/<id>.rows.jsonl        one JSON object per line, written once
//
// Save ordering: the record file is fully written and fsynced before the
// manifest learns about the id. A dataset whose rows failed to land never
// appears in the manifest.

use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::manifest::Manifest;
use super::store::{BackendKind, DatasetStore};
use super::{Dataset, DatasetId, DatasetSummary, Meta, Row, StoreError};

/// Suffix appended to the dataset id to name its record file.
pub const RECORD_FILE_SUFFIX: &str = ".rows.jsonl";

/// Directory-backed store that survives restarts.
#[derive(Debug)]
pub struct FileDatasetStore {
    root: PathBuf,
    // Serializes manifest read-modify-write within this instance.
    manifest_lock: Mutex<()>,
}

impl FileDatasetStore {
    /// Open (or initialise) a store rooted at `root`.
    ///
    /// Creates the directory and an empty manifest when missing. Fails if the
    /// directory cannot be created or an existing manifest does not parse, so
    /// a broken data directory stops startup instead of the first request.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|source| StoreError::BaseDir {
            path: root.clone(),
            source,
        })?;

        let manifest = Manifest::load_or_create(&root)?;
        info!(
            root = %root.display(),
            datasets = manifest.len(),
            "opened file dataset store"
        );

        Ok(Self {
            root,
            manifest_lock: Mutex::new(()),
        })
    }

    /// Path of the record file holding the rows for `id`.
    pub fn record_path(&self, id: &DatasetId) -> PathBuf {
        self.root.join(format!("{}{}", id.as_str(), RECORD_FILE_SUFFIX))
    }

    fn read_manifest(&self) -> Result<Manifest, StoreError> {
        let _guard = self.manifest_lock.lock();
        Manifest::load(&self.root)
    }
}

impl DatasetStore for FileDatasetStore {
    fn save(&self, name: &str, meta: Meta, rows: Vec<Row>) -> Result<DatasetId, StoreError> {
        let id = DatasetId(Uuid::new_v4().simple().to_string());
        let record_path = self.record_path(&id);

        write_records(&record_path, &rows)?;

        let committed = {
            let _guard = self.manifest_lock.lock();
            Manifest::load(&self.root).and_then(|mut manifest| {
                manifest.insert(DatasetSummary {
                    id: id.clone(),
                    name: name.to_string(),
                    meta,
                });
                manifest.save()
            })
        };

        if let Err(err) = committed {
            // Nothing references the record file yet.
            let _ = fs::remove_file(&record_path);
            return Err(err);
        }

        debug!(dataset_id = %id, rows = rows.len(), "dataset committed to manifest");
        Ok(id)
    }

    fn get(&self, id: &DatasetId) -> Result<Option<Dataset>, StoreError> {
        let entry = match self.read_manifest()?.get(id) {
            Some(entry) => entry.clone(),
            None => return Ok(None),
        };

        let rows = read_records(&self.record_path(id));
        Ok(Some(entry.with_rows(rows)))
    }

    fn list(&self) -> Result<Vec<DatasetSummary>, StoreError> {
        Ok(self.read_manifest()?.summaries())
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Files
    }
}

/// Write `rows` to a new record file at `path`.
///
/// A file that already exists is left alone. A file this call created is
/// removed again if writing it fails.
fn write_records(path: &Path, rows: &[Row]) -> Result<(), StoreError> {
    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|err| StoreError::io(path, err))?;

    let written = fill_records(file, path, rows);
    if written.is_err() {
        let _ = fs::remove_file(path);
    }
    written
}

fn fill_records(file: File, path: &Path, rows: &[Row]) -> Result<(), StoreError> {
    let mut writer = BufWriter::new(file);
    for row in rows {
        serde_json::to_writer(&mut writer, row)?;
        writer
            .write_all(b"\n")
            .map_err(|err| StoreError::io(path, err))?;
    }

    let file = writer
        .into_inner()
        .map_err(|err| StoreError::io(path, err.into_error()))?;
    file.sync_all().map_err(|err| StoreError::io(path, err))
}

/// Read every parseable record from `path`.
///
/// Unreadable files and malformed lines are tolerated: metadata stays useful
/// even when the row payload is damaged.
fn read_records(path: &Path) -> Vec<Row> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            warn!(path = %path.display(), "record file missing, returning no rows");
            return Vec::new();
        }
        Err(err) => {
            warn!(path = %path.display(), error = %err, "record file unreadable, returning no rows");
            return Vec::new();
        }
    };

    let mut reader = BufReader::new(file);
    let mut rows = Vec::new();
    let mut line = Vec::new();
    let mut skipped = 0usize;

    loop {
        line.clear();
        match reader.read_until(b'\n', &mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(err) => {
                warn!(path = %path.display(), error = %err, "stopped reading record file");
                break;
            }
        }

        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }

        match serde_json::from_slice::<Row>(&line) {
            Ok(row) => rows.push(row),
            Err(err) => {
                skipped += 1;
                debug!(path = %path.display(), error = %err, "skipping malformed record");
            }
        }
    }

    if skipped > 0 {
        warn!(path = %path.display(), skipped, kept = rows.len(), "record file had malformed lines");
    }

    rows
}

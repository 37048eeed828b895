// Backend Selection & Service Context
//
// Turns a `PersistConfig` into the one dataset backend the process holds
// for its lifetime, and wraps it in a context handed to every handler.
// There is no global: callers thread the context explicitly.

use std::sync::Arc;
use tracing::{info, warn};

use crate::config::{PersistConfig, PersistMode};
use crate::dataset::{DatasetStore, FileDatasetStore, InMemoryDatasetStore, StoreError};

/// Build the backend named by `config`.
///
/// - `memory` -> in-process store
/// - `files`  -> durable store under `config.data_dir`; open errors are fatal
/// - anything else -> in-process store, with a warning
pub fn select_store(config: &PersistConfig) -> Result<Arc<dyn DatasetStore>, StoreError> {
    let store: Arc<dyn DatasetStore> = match &config.mode {
        PersistMode::Memory => Arc::new(InMemoryDatasetStore::new()),
        PersistMode::Files => Arc::new(FileDatasetStore::open(&config.data_dir)?),
        PersistMode::Unrecognized(raw) => {
            warn!(
                mode = %raw,
                "unrecognized persistence mode, datasets will not survive a restart"
            );
            Arc::new(InMemoryDatasetStore::new())
        }
    };

    info!(backend = ?store.kind(), "dataset backend selected");
    Ok(store)
}

/// Handles shared by request-handling code.
///
/// Cloning is cheap; every clone points at the same backend.
#[derive(Clone)]
pub struct AppContext {
    store: Arc<dyn DatasetStore>,
}

impl AppContext {
    pub fn new(store: Arc<dyn DatasetStore>) -> Self {
        Self { store }
    }

    /// Select the backend once and wrap it.
    pub fn from_config(config: &PersistConfig) -> Result<Self, StoreError> {
        Ok(Self::new(select_store(config)?))
    }

    pub fn store(&self) -> &dyn DatasetStore {
        self.store.as_ref()
    }
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("backend", &self.store.kind())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{BackendKind, Meta};
    use tempfile::tempdir;

    #[test]
    fn memory_mode_selects_volatile_backend() {
        let store = select_store(&PersistConfig::memory()).unwrap();
        assert_eq!(store.kind(), BackendKind::Memory);
    }

    #[test]
    fn files_mode_selects_durable_backend() {
        let dir = tempdir().unwrap();
        let store = select_store(&PersistConfig::files(dir.path())).unwrap();
        assert_eq!(store.kind(), BackendKind::Files);
    }

    #[test]
    fn unrecognized_mode_falls_back_to_memory() {
        let config = PersistConfig {
            mode: PersistMode::parse("sql"),
            ..PersistConfig::default()
        };

        let store = select_store(&config).unwrap();
        assert_eq!(store.kind(), BackendKind::Memory);

        let id = store.save("fallback", Meta::new(), vec![]).unwrap();
        assert!(store.get(&id).unwrap().is_some());
    }

    #[test]
    fn files_mode_with_bad_directory_fails_startup() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "x").unwrap();

        let err = AppContext::from_config(&PersistConfig::files(&blocker)).unwrap_err();
        assert!(matches!(err, StoreError::BaseDir { .. }));
    }

    #[test]
    fn context_clones_share_one_backend() {
        let ctx = AppContext::from_config(&PersistConfig::memory()).unwrap();
        let handler_ctx = ctx.clone();

        let id = handler_ctx.store().save("shared", Meta::new(), vec![]).unwrap();
        assert!(ctx.store().get(&id).unwrap().is_some());
        assert_eq!(ctx.store().list().unwrap().len(), 1);
    }
}

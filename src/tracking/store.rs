use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arc_swap::{ArcSwap, ArcSwapOption};
use chrono::{DateTime, Utc};
use tempfile::NamedTempFile;
use tokio::sync::Mutex;

use super::entities::VehicleMap;

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialize error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Background write failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl From<tempfile::PersistError> for StoreError {
    fn from(e: tempfile::PersistError) -> Self {
        StoreError::Io(e.error)
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

enum Backend {
    Memory,
    File(PathBuf),
}

/// The one authoritative copy of vehicle state.
///
/// Readers get an immutable `Arc` of whichever map was last committed and never wait
/// on a writer. Commits persist first and only then swap the visible map, so a failed
/// write leaves readers on the previous state.
pub struct StateStore {
    visible: ArcSwap<VehicleMap>,
    committed_at: ArcSwapOption<DateTime<Utc>>,
    backend: Backend,
    commit_lock: Mutex<()>,
}

impl StateStore {
    pub fn in_memory() -> Self {
        StateStore::with_backend(Backend::Memory, VehicleMap::new())
    }

    /// Opens a file backed store, starting empty if the file is missing or unreadable
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let initial = bootstrap(&path);
        log::info!("Loaded {} vehicles from {}", initial.len(), path.display());
        StateStore::with_backend(Backend::File(path), initial)
    }

    fn with_backend(backend: Backend, initial: VehicleMap) -> Self {
        StateStore {
            visible: ArcSwap::from_pointee(initial),
            committed_at: ArcSwapOption::empty(),
            backend,
            commit_lock: Mutex::new(()),
        }
    }

    pub fn read(&self) -> Arc<VehicleMap> {
        self.visible.load_full()
    }

    /// When the visible state was last committed by this process
    pub fn committed_at(&self) -> Option<DateTime<Utc>> {
        self.committed_at.load_full().map(|t| *t)
    }

    pub async fn commit(&self, vehicles: VehicleMap) -> StoreResult<()> {
        let _guard = self.commit_lock.lock().await;

        if let Backend::File(path) = &self.backend {
            let bytes = serde_json::to_vec_pretty(&vehicles)?;
            let path = path.clone();
            tokio::task::spawn_blocking(move || write_atomically(&path, &bytes)).await??;
        }

        self.visible.store(Arc::new(vehicles));
        self.committed_at.store(Some(Arc::new(Utc::now())));
        Ok(())
    }
}

fn bootstrap(path: &Path) -> VehicleMap {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            log::info!("No saved state at {}, starting empty", path.display());
            return VehicleMap::new();
        }
        Err(e) => {
            log::warn!("Could not read {}, starting empty: {}", path.display(), e);
            return VehicleMap::new();
        }
    };

    let mut vehicles: VehicleMap = match serde_json::from_str(&contents) {
        Ok(vehicles) => vehicles,
        Err(e) => {
            log::warn!("Saved state in {} is corrupt, starting empty: {}", path.display(), e);
            return VehicleMap::new();
        }
    };

    vehicles.retain(|id, vehicle| {
        let problem = if *id != vehicle.id {
            Some("stored under another id")
        } else {
            vehicle.inconsistency()
        };
        if let Some(problem) = problem {
            log::warn!("Dropping saved vehicle {}: {}", id, problem);
        }
        problem.is_none()
    });

    vehicles
}

/// Writes next to the target then renames over it, so the file is never half written
fn write_atomically(path: &Path, bytes: &[u8]) -> StoreResult<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(bytes)?;
    file.as_file().sync_all()?;
    file.persist(path)?;
    Ok(())
}

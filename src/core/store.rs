// src/core/store.rs

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use tracing::{debug, info};

use crate::core::error::StoreError;
use crate::core::models::Accumulator;

/// Persistent home of the passing/failing URL sets.
///
/// `record` is one read-merge-write under the store's lock, so concurrent
/// batches cannot lose each other's updates.
pub trait UrlStore: Send + Sync {
    fn passing_urls(&self) -> Result<BTreeSet<String>, StoreError>;
    fn failing_urls(&self) -> Result<BTreeSet<String>, StoreError>;
    fn record(&self, passing: &[String], failing: &[String]) -> Result<(), StoreError>;
    fn reset(&self) -> Result<(), StoreError>;

    fn snapshot(&self) -> Result<Accumulator, StoreError> {
        Ok(Accumulator {
            passing: self.passing_urls()?,
            failing: self.failing_urls()?,
        })
    }
}

fn lock(inner: &Mutex<Accumulator>) -> Result<MutexGuard<'_, Accumulator>, StoreError> {
    inner.lock().map_err(|_| StoreError::Poisoned)
}

// --- In-Memory Store ---

#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Accumulator>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contents(accumulator: Accumulator) -> Self {
        Self {
            inner: Mutex::new(accumulator),
        }
    }
}

impl UrlStore for MemoryStore {
    fn passing_urls(&self) -> Result<BTreeSet<String>, StoreError> {
        Ok(lock(&self.inner)?.passing.clone())
    }

    fn failing_urls(&self) -> Result<BTreeSet<String>, StoreError> {
        Ok(lock(&self.inner)?.failing.clone())
    }

    fn record(&self, passing: &[String], failing: &[String]) -> Result<(), StoreError> {
        lock(&self.inner)?.merge(passing, failing);
        Ok(())
    }

    fn reset(&self) -> Result<(), StoreError> {
        lock(&self.inner)?.clear();
        Ok(())
    }
}

// --- JSON File Store ---

/// Keeps the accumulator in memory and rewrites a JSON file after each change.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    inner: Mutex<Accumulator>,
}

impl JsonFileStore {
    /// Opens the store at `path`; a missing file is an empty accumulator.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let accumulator = match std::fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => Accumulator::default(),
            Ok(raw) => serde_json::from_str(&raw).map_err(|source| StoreError::Corrupt {
                path: path.clone(),
                source,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No result store yet, starting empty.");
                Accumulator::default()
            }
            Err(source) => return Err(StoreError::Read { path, source }),
        };
        info!(
            path = %path.display(),
            passing = accumulator.passing.len(),
            failing = accumulator.failing.len(),
            "Opened result store."
        );
        Ok(Self {
            path,
            inner: Mutex::new(accumulator),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    // Called with the lock held so file and memory never diverge between writers.
    fn persist(&self, accumulator: &Accumulator) -> Result<(), StoreError> {
        let write_err = |source| StoreError::Write {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        let encoded = serde_json::to_vec_pretty(accumulator)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, encoded).map_err(write_err)?;
        std::fs::rename(&tmp, &self.path).map_err(write_err)?;
        Ok(())
    }
}

impl UrlStore for JsonFileStore {
    fn passing_urls(&self) -> Result<BTreeSet<String>, StoreError> {
        Ok(lock(&self.inner)?.passing.clone())
    }

    fn failing_urls(&self) -> Result<BTreeSet<String>, StoreError> {
        Ok(lock(&self.inner)?.failing.clone())
    }

    fn record(&self, passing: &[String], failing: &[String]) -> Result<(), StoreError> {
        let mut guard = lock(&self.inner)?;
        let mut updated = guard.clone();
        updated.merge(passing, failing);
        self.persist(&updated)?;
        *guard = updated;
        Ok(())
    }

    fn reset(&self) -> Result<(), StoreError> {
        let mut guard = lock(&self.inner)?;
        let empty = Accumulator::default();
        self.persist(&empty)?;
        *guard = empty;
        info!(path = %self.path.display(), "Result store cleared.");
        Ok(())
    }
}

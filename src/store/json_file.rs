use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use fd_lock::RwLock;
use log::debug;

use super::{EpisodeStore, StoreError, compare_and_set, record_order};
use crate::models::EpisodeRecord;
use crate::selection::EpisodeInclusion;

/// Store backed by a JSON array export of the episodes collection.
///
/// Reads are served from the copy loaded by [`JsonFileStore::open`]. Saves take an exclusive
/// lock on a `<export>.lock` sibling, re-read the export, apply the compare-and-set to the fresh
/// records and rewrite the whole file through a temporary sibling and a rename. Several handles
/// on one export, in this process or another, therefore never overwrite each other's writes.
#[derive(Debug)]
pub struct JsonFileStore {
  path: PathBuf,
  records: Mutex<Vec<EpisodeRecord>>,
}

impl JsonFileStore {
  /// Load the export at `path`.
  pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
    let path = path.as_ref().to_path_buf();
    let records = read_records(&path)?;
    debug!("loaded {} records from {}", records.len(), path.display());

    Ok(Self {
      path,
      records: Mutex::new(records),
    })
  }

  /// Location of the backing export.
  pub fn path(&self) -> &Path {
    &self.path
  }

  fn lock(&self) -> MutexGuard<'_, Vec<EpisodeRecord>> {
    self.records.lock().unwrap_or_else(PoisonError::into_inner)
  }

  fn sibling(&self, suffix: &str) -> PathBuf {
    let mut name = self.path.clone().into_os_string();
    name.push(suffix);
    PathBuf::from(name)
  }

  fn write_all(&self, records: &[EpisodeRecord]) -> Result<(), StoreError> {
    let serialised = serde_json::to_string_pretty(records).map_err(|source| StoreError::Parse {
      path: self.path.clone(),
      source,
    })?;

    let staging = self.sibling(".tmp");
    fs::write(&staging, serialised).map_err(|source| StoreError::Io {
      path: staging.clone(),
      source,
    })?;
    fs::rename(&staging, &self.path).map_err(|source| StoreError::Io {
      path: self.path.clone(),
      source,
    })
  }
}

fn read_records(path: &Path) -> Result<Vec<EpisodeRecord>, StoreError> {
  let contents = fs::read_to_string(path).map_err(|source| StoreError::Io {
    path: path.to_path_buf(),
    source,
  })?;
  serde_json::from_str(&contents).map_err(|source| StoreError::Parse {
    path: path.to_path_buf(),
    source,
  })
}

impl EpisodeStore for JsonFileStore {
  fn find(&self, selection: &dyn EpisodeInclusion) -> Result<Vec<EpisodeRecord>, StoreError> {
    let mut found: Vec<EpisodeRecord> = self
      .lock()
      .iter()
      .filter(|record| selection.is_included(record))
      .cloned()
      .collect();
    found.sort_by_key(record_order);
    Ok(found)
  }

  fn find_by_number(&self, episode_number: u32) -> Result<Option<EpisodeRecord>, StoreError> {
    Ok(
      self
        .lock()
        .iter()
        .find(|record| record.episode_number == Some(episode_number))
        .cloned(),
    )
  }

  fn save_thumbnail(&self, id: &str, expected: Option<&str>, next: &str) -> Result<(), StoreError> {
    let mut cached = self.lock();

    let lock_path = self.sibling(".lock");
    let lock_file = OpenOptions::new()
      .create(true)
      .truncate(false)
      .write(true)
      .open(&lock_path)
      .map_err(|source| StoreError::Io {
        path: lock_path.clone(),
        source,
      })?;
    let mut file_lock = RwLock::new(lock_file);
    let _guard = file_lock.write().map_err(|source| StoreError::Io {
      path: lock_path.clone(),
      source,
    })?;

    let mut records = read_records(&self.path)?;
    let record = records
      .iter_mut()
      .find(|record| record.id.as_str() == id)
      .ok_or_else(|| StoreError::NotFound { id: id.to_string() })?;
    compare_and_set(record, expected, next)?;

    self.write_all(&records)?;
    debug!("saved thumbnail of {} to {}", id, self.path.display());
    *cached = records;
    Ok(())
  }
}

//! Storage collaborators holding episode records.
//!
//! The repair job only needs three operations: filtered reads, a lookup by episode number and
//! a compare-and-set write of the thumbnail field. The compare-and-set is what serialises
//! concurrent repairs of the same record: a write based on a stale read is rejected with
//! [`StoreError::Conflict`] instead of re-applying a superseded decision.

use std::path::PathBuf;

use crate::models::EpisodeRecord;
use crate::selection::EpisodeInclusion;

mod json_file;
mod memory;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

/// Errors reported by an [`EpisodeStore`].
#[derive(Debug)]
pub enum StoreError {
  /// No record carries the identifier.
  NotFound {
    /// Identifier that was requested.
    id: String,
  },
  /// The stored thumbnail changed since it was read.
  Conflict {
    /// Identifier of the contended record.
    id: String,
  },
  /// Failed to read or write the backing file.
  Io {
    /// Path that caused the error.
    path: PathBuf,
    /// Source I/O error.
    source: std::io::Error,
  },
  /// Failed to parse or serialise the backing file.
  Parse {
    /// Path that caused the error.
    path: PathBuf,
    /// Source parse error.
    source: serde_json::Error,
  },
}

impl std::fmt::Display for StoreError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::NotFound { id } => write!(f, "record {id} not found"),
      Self::Conflict { id } => {
        write!(f, "record {id} was modified concurrently; thumbnail not written")
      }
      Self::Io { path, source } => {
        write!(f, "failed to access {}: {}", path.display(), source)
      }
      Self::Parse { path, source } => {
        write!(f, "failed to parse {}: {}", path.display(), source)
      }
    }
  }
}

impl std::error::Error for StoreError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      Self::Io { source, .. } => Some(source),
      Self::Parse { source, .. } => Some(source),
      Self::NotFound { .. } | Self::Conflict { .. } => None,
    }
  }
}

/// Persistence operations required by the repair job.
pub trait EpisodeStore {
  /// Records accepted by `selection`, ordered by episode number then identifier.
  fn find(&self, selection: &dyn EpisodeInclusion) -> Result<Vec<EpisodeRecord>, StoreError>;

  /// The record carrying `episode_number`, if any.
  fn find_by_number(&self, episode_number: u32) -> Result<Option<EpisodeRecord>, StoreError>;

  /// Replace the thumbnail of record `id` with `next`, provided it still equals `expected`.
  fn save_thumbnail(&self, id: &str, expected: Option<&str>, next: &str)
  -> Result<(), StoreError>;
}

/// Sort key shared by the store implementations. Unnumbered records sort last.
pub(crate) fn record_order(record: &EpisodeRecord) -> (u32, String) {
  (
    record.episode_number.unwrap_or(u32::MAX),
    record.id.as_str().to_string(),
  )
}

/// Apply a compare-and-set thumbnail write to an in-memory record.
pub(crate) fn compare_and_set(
  record: &mut EpisodeRecord,
  expected: Option<&str>,
  next: &str,
) -> Result<(), StoreError> {
  if record.thumbnail_image.as_deref() != expected {
    return Err(StoreError::Conflict {
      id: record.id.as_str().to_string(),
    });
  }
  record.thumbnail_image = Some(next.to_string());
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn compare_and_set_rejects_stale_expectations() {
    let mut record =
      EpisodeRecord::new("a", Some(1), None).with_images(Some("/uploads/a.jpg"), None);

    let err = compare_and_set(&mut record, Some("/uploads/other.jpg"), "").unwrap_err();
    assert!(matches!(err, StoreError::Conflict { ref id } if id == "a"));
    assert_eq!(record.thumbnail_image.as_deref(), Some("/uploads/a.jpg"));

    compare_and_set(&mut record, Some("/uploads/a.jpg"), "").unwrap();
    assert_eq!(record.thumbnail_image.as_deref(), Some(""));
  }

  #[test]
  fn missing_thumbnail_matches_none() {
    let mut record = EpisodeRecord::new("a", None, None);
    compare_and_set(&mut record, None, "https://x/y.png").unwrap();
    assert_eq!(record.thumbnail_image.as_deref(), Some("https://x/y.png"));
  }

  #[test]
  fn unnumbered_records_sort_last() {
    let numbered = EpisodeRecord::new("z", Some(3), None);
    let unnumbered = EpisodeRecord::new("a", None, None);
    assert!(record_order(&numbered) < record_order(&unnumbered));
  }
}

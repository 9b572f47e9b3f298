use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{EpisodeStore, StoreError, compare_and_set, record_order};
use crate::models::EpisodeRecord;
use crate::selection::EpisodeInclusion;

/// Mutex-guarded store used for tests and for callers that already hold records in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
  records: Mutex<BTreeMap<String, EpisodeRecord>>,
}

impl MemoryStore {
  /// Build a store from records, keyed by identifier.
  pub fn new(records: impl IntoIterator<Item = EpisodeRecord>) -> Self {
    let records = records
      .into_iter()
      .map(|record| (record.id.as_str().to_string(), record))
      .collect();
    Self {
      records: Mutex::new(records),
    }
  }

  /// Current copy of record `id`.
  pub fn get(&self, id: &str) -> Option<EpisodeRecord> {
    self.lock().get(id).cloned()
  }

  fn lock(&self) -> MutexGuard<'_, BTreeMap<String, EpisodeRecord>> {
    // Records are only mutated through `compare_and_set`, which cannot leave them half-written.
    self.records.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

impl EpisodeStore for MemoryStore {
  fn find(&self, selection: &dyn EpisodeInclusion) -> Result<Vec<EpisodeRecord>, StoreError> {
    let mut found: Vec<EpisodeRecord> = self
      .lock()
      .values()
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
        .values()
        .find(|record| record.episode_number == Some(episode_number))
        .cloned(),
    )
  }

  fn save_thumbnail(&self, id: &str, expected: Option<&str>, next: &str) -> Result<(), StoreError> {
    let mut records = self.lock();
    let record = records
      .get_mut(id)
      .ok_or_else(|| StoreError::NotFound { id: id.to_string() })?;
    compare_and_set(record, expected, next)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::EpisodeCategory;
  use crate::selection::EpisodeSelection;

  fn store() -> MemoryStore {
    MemoryStore::new([
      EpisodeRecord::new("b", Some(2), Some(EpisodeCategory::Past)),
      EpisodeRecord::new("a", Some(1), Some(EpisodeCategory::Upcoming)),
      EpisodeRecord::new("c", None, Some(EpisodeCategory::Past)),
    ])
  }

  #[test]
  fn find_orders_by_episode_number() {
    let found = store().find(&EpisodeSelection::default()).unwrap();
    let ids: Vec<&str> = found.iter().map(|record| record.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
  }

  #[test]
  fn find_applies_selection() {
    let selection = EpisodeSelection::default().with_categories([EpisodeCategory::Past]);
    let found = store().find(&selection).unwrap();
    assert_eq!(found.len(), 2);
  }

  #[test]
  fn looks_up_by_episode_number() {
    let store = store();
    assert_eq!(store.find_by_number(2).unwrap().unwrap().id.as_str(), "b");
    assert!(store.find_by_number(99).unwrap().is_none());
  }

  #[test]
  fn save_reports_missing_records() {
    let err = store().save_thumbnail("nope", None, "").unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));
  }

  #[test]
  fn save_updates_thumbnail() {
    let store = store();
    store.save_thumbnail("a", None, "https://x/y.png").unwrap();
    assert_eq!(
      store.get("a").unwrap().thumbnail_image.as_deref(),
      Some("https://x/y.png")
    );
  }
}

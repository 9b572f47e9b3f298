//! Filters deciding which episode records a repair run touches.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::models::{EpisodeCategory, EpisodeRecord};

/// Trait describing selection filters for repair runs.
pub trait EpisodeInclusion {
  /// Returns `true` when the record should be examined.
  fn is_included(&self, record: &EpisodeRecord) -> bool;
}

/// Selection file looked up next to the configuration when `selectionFile` is not set.
pub const DEFAULT_SELECTION_FILE: &str = "episodes.selection.json";

/// On-disk layout of a selection file.
#[derive(Debug, Default, Deserialize)]
struct EpisodeSelectionFile {
  #[serde(default)]
  categories: Vec<EpisodeCategory>,
  #[serde(default)]
  include: Vec<u32>,
  #[serde(default)]
  exclude: Vec<u32>,
}

/// Selection by listing category and episode number.
///
/// Exclusions always win. An empty category or include list means "no restriction".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EpisodeSelection {
  categories: Option<BTreeSet<EpisodeCategory>>,
  include: Option<BTreeSet<u32>>,
  exclude: BTreeSet<u32>,
}

/// Errors that can occur while loading a selection file.
#[derive(Debug)]
pub enum EpisodeSelectionError {
  /// Failed to read the selection file from disk.
  Io {
    /// Path that caused the error.
    path: PathBuf,
    /// Source I/O error.
    source: std::io::Error,
  },
  /// Failed to parse the JSON selection file.
  Parse {
    /// Path that caused the error.
    path: PathBuf,
    /// Source parse error.
    source: serde_json::Error,
  },
}

impl EpisodeSelection {
  /// Load a selection file if present; a missing file selects everything.
  pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, EpisodeSelectionError> {
    let path = path.as_ref();
    let contents = match fs::read_to_string(path) {
      Ok(contents) => contents,
      Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
        return Ok(Self::default());
      }
      Err(err) => {
        return Err(EpisodeSelectionError::Io {
          path: path.to_path_buf(),
          source: err,
        });
      }
    };

    let file: EpisodeSelectionFile =
      serde_json::from_str(&contents).map_err(|err| EpisodeSelectionError::Parse {
        path: path.to_path_buf(),
        source: err,
      })?;
    Ok(Self::from(file))
  }

  /// Restrict to the given categories, in addition to any already set.
  pub fn with_categories(mut self, categories: impl IntoIterator<Item = EpisodeCategory>) -> Self {
    let set = self.categories.get_or_insert_with(BTreeSet::new);
    set.extend(categories);
    if set.is_empty() {
      self.categories = None;
    }
    self
  }

  /// Restrict to the given episode numbers, in addition to any already set.
  pub fn with_episodes(mut self, episodes: impl IntoIterator<Item = u32>) -> Self {
    let set = self.include.get_or_insert_with(BTreeSet::new);
    set.extend(episodes);
    if set.is_empty() {
      self.include = None;
    }
    self
  }

  /// Never select the given episode numbers.
  pub fn excluding(mut self, episodes: impl IntoIterator<Item = u32>) -> Self {
    self.exclude.extend(episodes);
    self
  }

  /// Determine whether a record falls inside the selection.
  pub fn is_included(&self, record: &EpisodeRecord) -> bool {
    if record
      .episode_number
      .is_some_and(|number| self.exclude.contains(&number))
    {
      return false;
    }

    if let Some(categories) = &self.categories {
      if !record
        .category
        .is_some_and(|category| categories.contains(&category))
      {
        return false;
      }
    }

    match &self.include {
      Some(include) => record
        .episode_number
        .is_some_and(|number| include.contains(&number)),
      None => true,
    }
  }

  /// Returns true when no filtering rules are active.
  pub fn is_unfiltered(&self) -> bool {
    self.categories.is_none() && self.include.is_none() && self.exclude.is_empty()
  }
}

impl EpisodeInclusion for EpisodeSelection {
  fn is_included(&self, record: &EpisodeRecord) -> bool {
    EpisodeSelection::is_included(self, record)
  }
}

impl From<EpisodeSelectionFile> for EpisodeSelection {
  fn from(file: EpisodeSelectionFile) -> Self {
    Self::default()
      .with_categories(file.categories)
      .with_episodes(file.include)
      .excluding(file.exclude)
  }
}

impl std::fmt::Display for EpisodeSelectionError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Io { path, source } => {
        write!(f, "failed to read {}: {}", path.display(), source)
      }
      Self::Parse { path, source } => {
        write!(f, "failed to parse {}: {}", path.display(), source)
      }
    }
  }
}

impl std::error::Error for EpisodeSelectionError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      Self::Io { source, .. } => Some(source),
      Self::Parse { source, .. } => Some(source),
    }
  }
}

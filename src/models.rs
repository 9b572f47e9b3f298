//! Data structures shared by the store, the repair job and the CLI reports.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Identifier of a persisted episode, either a plain string or an exported ObjectId.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum RecordId {
  /// `"_id": "..."`
  Plain(String),
  /// `"_id": {"$oid": "..."}` as written by `mongoexport`.
  ObjectId {
    /// Hex object id.
    #[serde(rename = "$oid")]
    oid: String,
  },
}

impl RecordId {
  /// Identifier text regardless of the exported shape.
  pub fn as_str(&self) -> &str {
    match self {
      Self::Plain(value) => value,
      Self::ObjectId { oid } => oid,
    }
  }
}

impl From<&str> for RecordId {
  fn from(value: &str) -> Self {
    Self::Plain(value.to_string())
  }
}

impl fmt::Display for RecordId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Listing an episode belongs to on the site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EpisodeCategory {
  /// Announced but not yet recorded.
  Upcoming,
  /// Published episode.
  Past,
}

impl EpisodeCategory {
  /// Lowercase label as stored in the database.
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Upcoming => "upcoming",
      Self::Past => "past",
    }
  }
}

impl fmt::Display for EpisodeCategory {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Persisted podcast episode with the fields the image policy cares about.
///
/// Any other document fields are carried in `extra` so rewriting a record never drops data.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeRecord {
  /// Stable record identifier.
  #[serde(rename = "_id", alias = "id")]
  pub id: RecordId,
  /// Episode number shown on the site.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub episode_number: Option<u32>,
  /// Episode title.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub title: Option<String>,
  /// Listing the episode appears in.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub category: Option<EpisodeCategory>,
  /// Primary promotional image.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub thumbnail_image: Option<String>,
  /// Guest portrait used as the fallback image.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub guest_image: Option<String>,
  /// Episode video link.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub youtube_url: Option<String>,
  /// Remaining document fields, preserved verbatim.
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

impl EpisodeRecord {
  /// Minimal record used by tests and in-memory stores.
  pub fn new(id: &str, episode_number: Option<u32>, category: Option<EpisodeCategory>) -> Self {
    Self {
      id: RecordId::from(id),
      episode_number,
      title: None,
      category,
      thumbnail_image: None,
      guest_image: None,
      youtube_url: None,
      extra: Map::new(),
    }
  }

  /// Builder-style setter for both image fields.
  pub fn with_images(mut self, thumbnail: Option<&str>, guest: Option<&str>) -> Self {
    self.thumbnail_image = thumbnail.map(str::to_string);
    self.guest_image = guest.map(str::to_string);
    self
  }
}

/// What the repair job did, or would do in a dry run, for one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RepairOutcome {
  /// Thumbnail was already displayable.
  AlreadyValid,
  /// Guest image copied into the thumbnail.
  CopiedSecondary,
  /// A local upload file was re-encoded into the thumbnail as a data URI.
  Inlined,
  /// Dangling local thumbnail path cleared.
  Cleared,
  /// Nothing displayable and nothing to change; a placeholder will be shown.
  Unresolved,
}

impl RepairOutcome {
  /// Stable kebab-case label used in CLI output.
  pub fn as_str(self) -> &'static str {
    match self {
      Self::AlreadyValid => "already-valid",
      Self::CopiedSecondary => "copied-secondary",
      Self::Inlined => "inlined",
      Self::Cleared => "cleared",
      Self::Unresolved => "unresolved",
    }
  }
}

/// Record whose repair could not be persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedRepair {
  /// Identifier of the record.
  pub record_id: String,
  /// Underlying error message.
  pub error: String,
}

/// Totals produced by a batch repair.
///
/// `repaired + inlined + cleared + already_valid + unresolved + failed.len()` always
/// equals `scanned`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepairSummary {
  /// Records examined.
  pub scanned: usize,
  /// Records whose thumbnail was replaced by the guest image.
  pub repaired: usize,
  /// Records whose thumbnail was replaced by an inlined upload.
  pub inlined: usize,
  /// Records whose dangling thumbnail was cleared.
  pub cleared: usize,
  /// Records that needed no change.
  pub already_valid: usize,
  /// Records with no displayable image and nothing to change.
  pub unresolved: usize,
  /// Records whose repair failed, with the reason.
  pub failed: Vec<FailedRepair>,
  /// Whether the run skipped all writes.
  pub dry_run: bool,
}

impl RepairSummary {
  /// Count one completed record.
  pub fn record(&mut self, outcome: RepairOutcome) {
    self.scanned += 1;
    match outcome {
      RepairOutcome::AlreadyValid => self.already_valid += 1,
      RepairOutcome::CopiedSecondary => self.repaired += 1,
      RepairOutcome::Inlined => self.inlined += 1,
      RepairOutcome::Cleared => self.cleared += 1,
      RepairOutcome::Unresolved => self.unresolved += 1,
    }
  }

  /// Count one failed record.
  pub fn record_failure(&mut self, record_id: impl Into<String>, error: impl fmt::Display) {
    self.scanned += 1;
    self.failed.push(FailedRepair {
      record_id: record_id.into(),
      error: error.to_string(),
    });
  }

  /// Sum of every outcome bucket; equal to `scanned` by construction.
  pub fn accounted(&self) -> usize {
    self.repaired
      + self.inlined
      + self.cleared
      + self.already_valid
      + self.unresolved
      + self.failed.len()
  }

  /// `true` when no record failed.
  pub fn is_clean(&self) -> bool {
    self.failed.is_empty()
  }
}

//! Batch repair of episode thumbnails.
//!
//! Each record is an independent read-decide-write unit: a failed write is recorded against the
//! record and the batch moves on. Every record ends up in exactly one bucket of the
//! [`RepairSummary`].

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::models::{EpisodeRecord, RepairOutcome, RepairSummary};
use crate::reference::{
  ImageSource, RepairAction, inline_upload, is_displayable, resolve_display_reference,
};
use crate::report::preview;
use crate::selection::EpisodeInclusion;
use crate::store::{EpisodeStore, StoreError};

/// The two image fields of one record, as read before deciding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepairCandidate<'a> {
  /// Identifier reported in the summary and passed to the save callback.
  pub record_id: &'a str,
  /// Current thumbnail.
  pub primary: Option<&'a str>,
  /// Current guest image.
  pub secondary: Option<&'a str>,
}

impl<'a> From<&'a EpisodeRecord> for RepairCandidate<'a> {
  fn from(record: &'a EpisodeRecord) -> Self {
    Self {
      record_id: record.id.as_str(),
      primary: record.thumbnail_image.as_deref(),
      secondary: record.guest_image.as_deref(),
    }
  }
}

/// Decision for one record: the outcome and the thumbnail to persist, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepairPlan {
  /// Bucket the record falls into.
  pub outcome: RepairOutcome,
  /// New thumbnail value; `None` when the record stays untouched.
  pub thumbnail: Option<String>,
}

/// Knobs for a repair run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepairOptions {
  /// Decide and report without writing anything.
  pub dry_run: bool,
  /// Static asset root used to inline existing `/uploads/...` files. `None` disables inlining.
  pub inline_root: Option<PathBuf>,
}

/// Decide what should happen to one record's thumbnail.
///
/// With an inline root, an existing local thumbnail file is re-encoded first; a local guest
/// image file is only inlined when no displayable guest image exists. An unreadable thumbnail
/// file is only an error when there is no displayable guest image to fall back on. Everything
/// else is decided by [`resolve_display_reference`].
pub fn plan_repair(
  primary: Option<&str>,
  secondary: Option<&str>,
  inline_root: Option<&Path>,
) -> io::Result<RepairPlan> {
  if let Some(root) = inline_root {
    if !is_displayable(primary) {
      match inline_candidate(primary, root) {
        Ok(Some(uri)) => return Ok(inlined(uri)),
        Ok(None) => {}
        Err(err) if is_displayable(secondary) => {
          warn!("cannot inline {}: {}; using guest image", preview(primary), err);
        }
        Err(err) => return Err(err),
      }
      if !is_displayable(secondary) {
        if let Some(uri) = inline_candidate(secondary, root)? {
          return Ok(inlined(uri));
        }
      }
    }
  }

  let resolution = resolve_display_reference(primary, secondary);
  let outcome = match (resolution.action, resolution.source) {
    (RepairAction::None, ImageSource::Primary) => RepairOutcome::AlreadyValid,
    (RepairAction::None, _) => RepairOutcome::Unresolved,
    (RepairAction::CopySecondaryToPrimary, _) => RepairOutcome::CopiedSecondary,
    (RepairAction::ClearPrimary, _) => RepairOutcome::Cleared,
  };

  Ok(RepairPlan {
    outcome,
    thumbnail: resolution.repaired_primary().map(str::to_string),
  })
}

fn inline_candidate(value: Option<&str>, root: &Path) -> io::Result<Option<String>> {
  match value {
    Some(value) => inline_upload(value, root),
    None => Ok(None),
  }
}

fn inlined(uri: String) -> RepairPlan {
  RepairPlan {
    outcome: RepairOutcome::Inlined,
    thumbnail: Some(uri),
  }
}

/// Repair a batch of records through a caller-supplied save callback.
///
/// `save(record_id, new_thumbnail)` is invoked once per record that needs a change. Failed saves
/// are listed in [`RepairSummary::failed`] and never stop the batch.
pub fn repair_records<'a, I, F, E>(records: I, mut save: F) -> RepairSummary
where
  I: IntoIterator<Item = RepairCandidate<'a>>,
  F: FnMut(&str, &str) -> Result<(), E>,
  E: fmt::Display,
{
  apply_repairs(records, &RepairOptions::default(), |candidate, next| {
    save(candidate.record_id, next)
  })
}

/// [`repair_records`] with options and a save callback that also sees the value read.
pub fn apply_repairs<'a, I, F, E>(records: I, options: &RepairOptions, mut save: F) -> RepairSummary
where
  I: IntoIterator<Item = RepairCandidate<'a>>,
  F: FnMut(&RepairCandidate<'a>, &str) -> Result<(), E>,
  E: fmt::Display,
{
  let mut summary = RepairSummary {
    dry_run: options.dry_run,
    ..RepairSummary::default()
  };

  for candidate in records {
    let plan = match plan_repair(
      candidate.primary,
      candidate.secondary,
      options.inline_root.as_deref(),
    ) {
      Ok(plan) => plan,
      Err(err) => {
        warn!("{}: failed to inline upload: {}", candidate.record_id, err);
        summary.record_failure(candidate.record_id, format!("failed to inline upload: {err}"));
        continue;
      }
    };

    if let Some(next) = plan.thumbnail.as_deref() {
      if !options.dry_run {
        if let Err(err) = save(&candidate, next) {
          warn!("{}: failed to save thumbnail: {}", candidate.record_id, err);
          summary.record_failure(candidate.record_id, err);
          continue;
        }
      }
    }

    log_outcome(&candidate, &plan, options.dry_run);
    summary.record(plan.outcome);
  }

  summary
}

fn log_outcome(candidate: &RepairCandidate<'_>, plan: &RepairPlan, dry_run: bool) {
  let prefix = if dry_run { "[dry run] " } else { "" };
  let id = candidate.record_id;
  match plan.outcome {
    RepairOutcome::AlreadyValid => debug!("{id}: thumbnail already displayable"),
    RepairOutcome::CopiedSecondary => info!(
      "{prefix}{id}: copied guest image {} into thumbnail",
      preview(candidate.secondary)
    ),
    RepairOutcome::Inlined => info!("{prefix}{id}: inlined local upload into thumbnail"),
    RepairOutcome::Cleared => info!(
      "{prefix}{id}: cleared dangling thumbnail {}",
      preview(candidate.primary)
    ),
    RepairOutcome::Unresolved => warn!("{id}: no displayable image; placeholder will be shown"),
  }
}

/// Result of repairing a single episode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeRepair {
  /// Identifier of the repaired record.
  pub record_id: String,
  /// What happened.
  pub outcome: RepairOutcome,
  /// Thumbnail before the repair.
  pub previous: Option<String>,
  /// Thumbnail after the repair, or the planned value in a dry run.
  pub thumbnail: Option<String>,
  /// Whether writes were skipped.
  pub dry_run: bool,
}

/// Errors from [`RepairJob::repair_episode`].
#[derive(Debug)]
pub enum RepairError {
  /// No record carries the episode number.
  MissingRecord(u32),
  /// The store failed while looking the record up.
  Lookup(StoreError),
  /// A local upload exists but could not be read.
  Inline {
    /// Identifier of the record.
    record_id: String,
    /// Source I/O error.
    source: io::Error,
  },
  /// The repaired thumbnail could not be persisted.
  Persistence {
    /// Identifier of the record.
    record_id: String,
    /// Source store error.
    source: StoreError,
  },
}

impl fmt::Display for RepairError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::MissingRecord(number) => write!(f, "episode {number} not found"),
      Self::Lookup(source) => write!(f, "failed to look up episode: {source}"),
      Self::Inline { record_id, source } => {
        write!(f, "failed to inline upload for {record_id}: {source}")
      }
      Self::Persistence { record_id, source } => {
        write!(f, "failed to save thumbnail for {record_id}: {source}")
      }
    }
  }
}

impl std::error::Error for RepairError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      Self::MissingRecord(_) => None,
      Self::Lookup(source) => Some(source),
      Self::Inline { source, .. } => Some(source),
      Self::Persistence { source, .. } => Some(source),
    }
  }
}

/// Store-backed repair runner.
pub struct RepairJob<'a, S: EpisodeStore + ?Sized> {
  store: &'a S,
  options: RepairOptions,
}

impl<'a, S: EpisodeStore + ?Sized> RepairJob<'a, S> {
  /// Create a job over `store`.
  pub fn new(store: &'a S, options: RepairOptions) -> Self {
    Self { store, options }
  }

  /// Repair every selected record.
  ///
  /// Only the initial read can fail the whole run; write failures land in the summary.
  pub fn run(&self, selection: &dyn EpisodeInclusion) -> Result<RepairSummary, StoreError> {
    let records = self.store.find(selection)?;
    info!("examining {} episode records", records.len());

    let summary = apply_repairs(
      records.iter().map(RepairCandidate::from),
      &self.options,
      |candidate, next| {
        self
          .store
          .save_thumbnail(candidate.record_id, candidate.primary, next)
      },
    );

    info!(
      "scanned {}, repaired {}, inlined {}, cleared {}, already valid {}, unresolved {}, failed {}",
      summary.scanned,
      summary.repaired,
      summary.inlined,
      summary.cleared,
      summary.already_valid,
      summary.unresolved,
      summary.failed.len()
    );
    Ok(summary)
  }

  /// Repair a single episode by number.
  pub fn repair_episode(&self, episode_number: u32) -> Result<EpisodeRepair, RepairError> {
    let record = self
      .store
      .find_by_number(episode_number)
      .map_err(RepairError::Lookup)?
      .ok_or(RepairError::MissingRecord(episode_number))?;
    let candidate = RepairCandidate::from(&record);

    let plan = plan_repair(
      candidate.primary,
      candidate.secondary,
      self.options.inline_root.as_deref(),
    )
    .map_err(|source| RepairError::Inline {
      record_id: candidate.record_id.to_string(),
      source,
    })?;

    if let Some(next) = plan.thumbnail.as_deref() {
      if !self.options.dry_run {
        self
          .store
          .save_thumbnail(candidate.record_id, candidate.primary, next)
          .map_err(|source| RepairError::Persistence {
            record_id: candidate.record_id.to_string(),
            source,
          })?;
      }
    }
    log_outcome(&candidate, &plan, self.options.dry_run);

    Ok(EpisodeRepair {
      record_id: candidate.record_id.to_string(),
      outcome: plan.outcome,
      previous: record.thumbnail_image.clone(),
      thumbnail: plan.thumbnail.or_else(|| record.thumbnail_image.clone()),
      dry_run: self.options.dry_run,
    })
  }
}

#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod config;
pub mod models;
pub mod reference;
pub mod repair;
pub mod report;
pub mod selection;
pub mod store;

pub use config::RepairConfig;
pub use models::{EpisodeCategory, EpisodeRecord, RepairOutcome, RepairSummary};
pub use repair::{RepairError, RepairJob, RepairOptions, repair_records};
pub use selection::{EpisodeInclusion, EpisodeSelection};
pub use store::{EpisodeStore, JsonFileStore, MemoryStore, StoreError};

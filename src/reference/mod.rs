//! Classification, fallback and render-time helpers for episode image references.
//!
//! The decision logic is pure: nothing in here touches storage. Batch repairs in
//! [`crate::repair`] and the CLI inspection both go through [`resolve_display_reference`],
//! so the copy-guest-image-into-thumbnail policy lives in exactly one place.

mod inline;
mod kind;
mod render;
mod resolve;
mod youtube;

pub use inline::{encode_data_uri, inline_upload, upload_file_path};
pub use kind::{ImageKind, classify, is_displayable};
pub use render::{
    DEFAULT_PLACEHOLDER_PATTERN, PlaceholderFilter, episode_artwork, render_source,
    to_renderable_url,
};
pub use resolve::{DisplayResolution, ImageSource, RepairAction, resolve_display_reference};
pub use youtube::{ThumbnailQuality, extract_youtube_id, youtube_thumbnail};

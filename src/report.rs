//! Read-only diagnostics describing an episode's image state.

use serde::Serialize;

use crate::models::{EpisodeCategory, EpisodeRecord};
use crate::reference::{
    ImageKind, ImageSource, PlaceholderFilter, RepairAction, classify, episode_artwork,
    extract_youtube_id, resolve_display_reference,
};

const PREVIEW_CHARS: usize = 50;

/// Shorten a reference for display; data URIs are often hundreds of kilobytes.
pub fn preview(value: Option<&str>) -> String {
    match value {
        None => "(empty)".to_string(),
        Some(value) if value.trim().is_empty() => "(empty)".to_string(),
        Some(value) if value.chars().count() > PREVIEW_CHARS => {
            let head: String = value.chars().take(PREVIEW_CHARS).collect();
            format!("{head}...")
        }
        Some(value) => value.to_string(),
    }
}

/// State of one image field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageFieldReport {
    /// Classification of the stored value.
    pub kind: ImageKind,
    /// Whether the value can be used as an image source as-is.
    pub displayable: bool,
    /// Truncated value.
    pub preview: String,
}

impl ImageFieldReport {
    fn new(value: Option<&str>) -> Self {
        let kind = classify(value);
        Self {
            kind,
            displayable: kind.is_displayable(),
            preview: preview(value),
        }
    }
}

/// Image diagnostics for one episode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeImageReport {
    /// Record identifier.
    pub record_id: String,
    /// Episode number, when set.
    pub episode_number: Option<u32>,
    /// Episode title, when set.
    pub title: Option<String>,
    /// Listing the episode appears in.
    pub category: Option<EpisodeCategory>,
    /// Thumbnail field.
    pub thumbnail_image: ImageFieldReport,
    /// Guest image field.
    pub guest_image: ImageFieldReport,
    /// Video id parsed from the YouTube link.
    pub youtube_id: Option<String>,
    /// Field the site would display.
    pub display_source: ImageSource,
    /// Repair the batch job would apply.
    pub planned_action: RepairAction,
    /// Image source the episode card renders, shortened.
    pub artwork: String,
}

/// Describe a record's image fields and the decisions taken for it.
pub fn inspect(
    record: &EpisodeRecord,
    filter: &PlaceholderFilter,
    placeholder: &str,
) -> EpisodeImageReport {
    let thumbnail = record.thumbnail_image.as_deref();
    let guest = record.guest_image.as_deref();
    let youtube_url = record.youtube_url.as_deref();
    let resolution = resolve_display_reference(thumbnail, guest);
    let artwork = episode_artwork(filter, thumbnail, guest, youtube_url, placeholder);

    EpisodeImageReport {
        record_id: record.id.as_str().to_string(),
        episode_number: record.episode_number,
        title: record.title.clone(),
        category: record.category,
        thumbnail_image: ImageFieldReport::new(thumbnail),
        guest_image: ImageFieldReport::new(guest),
        youtube_id: youtube_url
            .and_then(extract_youtube_id)
            .map(str::to_string),
        display_source: resolution.source,
        planned_action: resolution.action,
        artwork: preview(Some(artwork.as_str())),
    }
}

impl std::fmt::Display for EpisodeImageReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.episode_number {
            Some(number) => writeln!(f, "Episode {} ({})", number, self.record_id)?,
            None => writeln!(f, "Record {}", self.record_id)?,
        }
        if let Some(title) = &self.title {
            writeln!(f, "  title:          {title}")?;
        }
        if let Some(category) = self.category {
            writeln!(f, "  category:       {category}")?;
        }
        let fields = [
            ("thumbnailImage", &self.thumbnail_image),
            ("guestImage", &self.guest_image),
        ];
        for (label, field) in fields {
            writeln!(
                f,
                "  {:<15} {} [{}{}]",
                format!("{label}:"),
                field.preview,
                field.kind,
                if field.displayable { ", displayable" } else { "" }
            )?;
        }
        writeln!(
            f,
            "  youtube id:     {}",
            self.youtube_id.as_deref().unwrap_or("(none)")
        )?;
        writeln!(f, "  displays:       {}", self.artwork)?;
        write!(f, "  planned repair: {}", self.planned_action.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn previews_truncate_long_values() {
        let long = format!("data:image/png;base64,{}", "A".repeat(200));
        let shown = preview(Some(long.as_str()));
        assert_eq!(shown.chars().count(), PREVIEW_CHARS + 3);
        assert!(shown.ends_with("..."));

        assert_eq!(preview(Some("/uploads/a.jpg")), "/uploads/a.jpg");
        assert_eq!(preview(Some("  ")), "(empty)");
        assert_eq!(preview(None), "(empty)");
    }

    #[test]
    fn previews_respect_char_boundaries() {
        let value = "é".repeat(60);
        assert_eq!(preview(Some(value.as_str())), format!("{}...", "é".repeat(50)));
    }

    #[test]
    fn inspects_dangling_thumbnail() {
        let mut record = EpisodeRecord::new("abc", Some(285), Some(EpisodeCategory::Upcoming))
            .with_images(Some("/uploads/285.jpg"), Some(""));
        record.youtube_url = Some("https://youtu.be/dQw4w9WgXcQ".into());

        let report = inspect(&record, &PlaceholderFilter::default(), "/logo.jpg");
        assert_eq!(report.thumbnail_image.kind, ImageKind::LocalUploadPath);
        assert!(!report.thumbnail_image.displayable);
        assert_eq!(report.guest_image.kind, ImageKind::Empty);
        assert_eq!(report.youtube_id.as_deref(), Some("dQw4w9WgXcQ"));
        assert_eq!(report.display_source, ImageSource::None);
        assert_eq!(report.planned_action, RepairAction::ClearPrimary);
        assert_eq!(report.artwork, "/uploads/285.jpg");

        let text = report.to_string();
        assert!(text.starts_with("Episode 285 (abc)"));
        assert!(text.contains("planned repair: clear-primary"));
    }

    #[test]
    fn serialises_report() {
        let record =
            EpisodeRecord::new("abc", None, None).with_images(None, Some("https://g/1.jpg"));
        let report = inspect(&record, &PlaceholderFilter::default(), "/logo.jpg");
        let value = serde_json::to_value(report).unwrap();
        assert_eq!(value["recordId"], "abc");
        assert_eq!(value["guestImage"]["kind"], "http-url");
        assert_eq!(value["plannedAction"], "copy-secondary-to-primary");
        assert_eq!(value["displaySource"], "secondary");
    }
}

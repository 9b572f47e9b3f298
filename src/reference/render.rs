use std::sync::OnceLock;

use regex::Regex;

use super::kind::{ImageKind, classify};
use super::youtube::{ThumbnailQuality, extract_youtube_id, youtube_thumbnail};

/// Pattern matched by the built-in placeholder filter.
pub const DEFAULT_PLACEHOLDER_PATTERN: &str = "default-avatar";

/// Set of patterns identifying placeholder references that must never be fetched.
#[derive(Debug, Clone)]
pub struct PlaceholderFilter {
    patterns: Vec<Regex>,
}

impl PlaceholderFilter {
    /// Compile a filter from regular expressions.
    pub fn new<I, S>(patterns: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|pattern| Regex::new(pattern.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// Whether the value is one of the known placeholder sentinels.
    pub fn is_placeholder(&self, value: &str) -> bool {
        self.patterns.iter().any(|pattern| pattern.is_match(value))
    }

    /// Convert a stored reference into an image source, or `None` to show a placeholder.
    ///
    /// Data URIs, URLs and local upload paths pass through unchanged. Local paths resolve
    /// against the site's own static root and may 404, so renderers still need an
    /// error fallback for them.
    pub fn renderable_url<'a>(&self, raw: Option<&'a str>) -> Option<&'a str> {
        let value = raw?;
        if self.is_placeholder(value) {
            return None;
        }

        match classify(Some(value)) {
            ImageKind::Base64DataUri | ImageKind::HttpUrl | ImageKind::LocalUploadPath => {
                Some(value)
            }
            ImageKind::Unknown | ImageKind::Empty => None,
        }
    }
}

impl Default for PlaceholderFilter {
    fn default() -> Self {
        default_filter().clone()
    }
}

fn default_filter() -> &'static PlaceholderFilter {
    static FILTER: OnceLock<PlaceholderFilter> = OnceLock::new();
    FILTER.get_or_init(|| PlaceholderFilter {
        patterns: vec![Regex::new(DEFAULT_PLACEHOLDER_PATTERN).expect("invalid placeholder regex")],
    })
}

/// [`PlaceholderFilter::renderable_url`] using the built-in placeholder patterns.
pub fn to_renderable_url(raw: Option<&str>) -> Option<&str> {
    default_filter().renderable_url(raw)
}

/// Image source for a single reference, falling back to `placeholder`. Never fails.
pub fn render_source<'a>(raw: Option<&'a str>, placeholder: &'a str) -> &'a str {
    to_renderable_url(raw).unwrap_or(placeholder)
}

/// Pick the card artwork for an episode.
///
/// Priority is the thumbnail, then the guest image, then the YouTube thumbnail of the
/// episode video, then the placeholder.
pub fn episode_artwork(
    filter: &PlaceholderFilter,
    thumbnail: Option<&str>,
    guest_image: Option<&str>,
    youtube_url: Option<&str>,
    placeholder: &str,
) -> String {
    if let Some(url) = filter
        .renderable_url(thumbnail)
        .or_else(|| filter.renderable_url(guest_image))
    {
        return url.to_string();
    }

    match youtube_url.and_then(extract_youtube_id) {
        Some(id) => youtube_thumbnail(id, ThumbnailQuality::default()),
        None => placeholder.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_and_placeholder_values_render_nothing() {
        assert_eq!(to_renderable_url(None), None);
        assert_eq!(to_renderable_url(Some("")), None);
        assert_eq!(to_renderable_url(Some("   ")), None);
        assert_eq!(to_renderable_url(Some("/default-avatar.png")), None);
        assert_eq!(
            to_renderable_url(Some("https://cdn.example.com/default-avatar.svg")),
            None
        );
    }

    #[test]
    fn passes_supported_kinds_through_unchanged() {
        let data = "data:image/png;base64,AAA";
        assert_eq!(to_renderable_url(Some(data)), Some(data));
        assert_eq!(
            to_renderable_url(Some("http://example.com/a.jpg")),
            Some("http://example.com/a.jpg")
        );
        assert_eq!(
            to_renderable_url(Some("/uploads/abc.jpg")),
            Some("/uploads/abc.jpg")
        );
    }

    #[test]
    fn unknown_values_render_nothing() {
        assert_eq!(to_renderable_url(Some("guest.jpg")), None);
        assert_eq!(to_renderable_url(Some("HTTP://example.com")), None);
    }

    #[test]
    fn render_source_uses_placeholder() {
        assert_eq!(render_source(Some("foo-bar"), "/logo.jpg"), "/logo.jpg");
        assert_eq!(render_source(None, "/logo.jpg"), "/logo.jpg");
        assert_eq!(
            render_source(Some("https://x/y.png"), "/logo.jpg"),
            "https://x/y.png"
        );
    }

    #[test]
    fn custom_patterns_replace_defaults() {
        let filter = PlaceholderFilter::new(["placeholder", r"^/img/blank\.png$"]).unwrap();
        assert!(filter.is_placeholder("https://x/placeholder.jpg"));
        assert!(filter.is_placeholder("/img/blank.png"));
        assert!(!filter.is_placeholder("/default-avatar.png"));
        assert_eq!(
            filter.renderable_url(Some("/uploads/default-avatar.png")),
            Some("/uploads/default-avatar.png")
        );
    }

    #[test]
    fn rejects_invalid_patterns() {
        assert!(PlaceholderFilter::new(["("]).is_err());
    }

    #[test]
    fn artwork_prefers_thumbnail_then_guest_then_video() {
        let filter = PlaceholderFilter::default();
        let video = Some("https://www.youtube.com/watch?v=dQw4w9WgXcQ");

        let thumbnail = Some("https://t/1.jpg");
        assert_eq!(
            episode_artwork(&filter, thumbnail, Some("https://g/1.jpg"), video, "/logo.jpg"),
            "https://t/1.jpg"
        );
        assert_eq!(
            episode_artwork(&filter, Some(""), Some("https://g/1.jpg"), video, "/logo.jpg"),
            "https://g/1.jpg"
        );
        assert_eq!(
            episode_artwork(&filter, None, Some("/default-avatar.png"), video, "/logo.jpg"),
            "https://img.youtube.com/vi/dQw4w9WgXcQ/maxresdefault.jpg"
        );
        assert_eq!(
            episode_artwork(&filter, None, None, Some("not a video"), "/logo.jpg"),
            "/logo.jpg"
        );
    }
}

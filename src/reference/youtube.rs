use std::sync::OnceLock;

use regex::Regex;

fn video_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"(?:youtu\.be/|youtube\.com(?:/embed/|/v/|/watch\?v=|/watch\?.+&v=))([\w-]{11})",
        )
        .expect("invalid youtube regex")
    })
}

/// Extract the 11 character video id from a YouTube watch, embed or short link.
pub fn extract_youtube_id(url: &str) -> Option<&str> {
    video_id_pattern()
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|id| id.as_str())
}

/// Resolution of a generated YouTube thumbnail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThumbnailQuality {
    /// 120x90.
    Default,
    /// 320x180.
    Medium,
    /// 480x360.
    High,
    /// 640x480.
    Standard,
    /// Largest available.
    #[default]
    MaxRes,
}

impl ThumbnailQuality {
    fn file_stem(self) -> &'static str {
        match self {
            ThumbnailQuality::Default => "default",
            ThumbnailQuality::Medium => "mqdefault",
            ThumbnailQuality::High => "hqdefault",
            ThumbnailQuality::Standard => "sddefault",
            ThumbnailQuality::MaxRes => "maxresdefault",
        }
    }
}

/// Thumbnail URL YouTube serves for a video id.
pub fn youtube_thumbnail(video_id: &str, quality: ThumbnailQuality) -> String {
    format!(
        "https://img.youtube.com/vi/{}/{}.jpg",
        video_id,
        quality.file_stem()
    )
}

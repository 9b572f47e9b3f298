use std::fmt;

use serde::Serialize;

const DATA_URI_PREFIX: &str = "data:image";
const HTTP_PREFIX: &str = "http";
const LOCAL_UPLOAD_PREFIX: &str = "/uploads";

/// Classification of a stored image reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImageKind {
    /// Self-contained `data:image...` value that needs no further fetch.
    Base64DataUri,
    /// Hosted image reachable over `http://` or `https://`.
    HttpUrl,
    /// File under `/uploads` on whichever host wrote the record.
    LocalUploadPath,
    /// Non-empty value matching none of the known prefixes.
    Unknown,
    /// Missing, empty or whitespace-only value.
    Empty,
}

impl ImageKind {
    /// Every kind, in classification order.
    pub const ALL: [ImageKind; 5] = [
        ImageKind::Base64DataUri,
        ImageKind::HttpUrl,
        ImageKind::LocalUploadPath,
        ImageKind::Unknown,
        ImageKind::Empty,
    ];

    /// Whether values of this kind can be used directly as an image source.
    pub fn is_displayable(self) -> bool {
        matches!(self, ImageKind::Base64DataUri | ImageKind::HttpUrl)
    }

    /// Stable kebab-case label used in reports and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            ImageKind::Base64DataUri => "base64-data-uri",
            ImageKind::HttpUrl => "http-url",
            ImageKind::LocalUploadPath => "local-upload-path",
            ImageKind::Unknown => "unknown",
            ImageKind::Empty => "empty",
        }
    }
}

impl fmt::Display for ImageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a raw image reference.
///
/// Prefix checks are case-sensitive and run against the untrimmed value in a fixed order:
/// `data:image`, then `http`, then `/uploads`. Blank input is always [`ImageKind::Empty`].
pub fn classify(raw: Option<&str>) -> ImageKind {
    let Some(value) = raw else {
        return ImageKind::Empty;
    };

    if value.trim().is_empty() {
        ImageKind::Empty
    } else if value.starts_with(DATA_URI_PREFIX) {
        ImageKind::Base64DataUri
    } else if value.starts_with(HTTP_PREFIX) {
        ImageKind::HttpUrl
    } else if value.starts_with(LOCAL_UPLOAD_PREFIX) {
        ImageKind::LocalUploadPath
    } else {
        ImageKind::Unknown
    }
}

/// Returns `true` when the reference is a data URI or an http(s) URL.
pub fn is_displayable(raw: Option<&str>) -> bool {
    classify(raw).is_displayable()
}

use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Component, Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use super::kind::{ImageKind, classify};

fn mime_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase());
    match extension.as_deref() {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        Some("avif") => "image/avif",
        _ => "image/jpeg",
    }
}

/// Map a `/uploads/...` reference onto the static asset root that serves it.
///
/// Returns `None` for references that are not local upload paths or that try to leave
/// the root through `..` segments.
pub fn upload_file_path(raw: &str, static_root: &Path) -> Option<PathBuf> {
    if classify(Some(raw)) != ImageKind::LocalUploadPath {
        return None;
    }

    let relative = Path::new(raw.trim_start_matches('/'));
    if relative
        .components()
        .any(|component| !matches!(component, Component::Normal(_)))
    {
        return None;
    }

    Some(static_root.join(relative))
}

/// Encode image bytes as a `data:` URI.
pub fn encode_data_uri(bytes: &[u8], mime: &str) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

/// Re-encode a local upload as a self-contained data URI.
///
/// `Ok(None)` means there is nothing to inline: the reference is not a local upload path
/// or the file is absent from `static_root`. Read failures other than a missing file are
/// returned as errors.
pub fn inline_upload(raw: &str, static_root: &Path) -> io::Result<Option<String>> {
    let Some(path) = upload_file_path(raw, static_root) else {
        return Ok(None);
    };

    match fs::read(&path) {
        Ok(bytes) => Ok(Some(encode_data_uri(&bytes, mime_for(&path)))),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn maps_upload_paths_under_root() {
        let root = Path::new("/srv/public");
        assert_eq!(
            upload_file_path("/uploads/a.png", root),
            Some(PathBuf::from("/srv/public/uploads/a.png"))
        );
        assert_eq!(upload_file_path("https://x/a.png", root), None);
        assert_eq!(upload_file_path("/uploads/../secrets.txt", root), None);
    }

    #[test]
    fn inlines_existing_files() -> io::Result<()> {
        let temp = tempdir()?;
        fs::create_dir_all(temp.path().join("uploads"))?;
        fs::write(temp.path().join("uploads/guest.png"), b"png-bytes")?;

        let inlined = inline_upload("/uploads/guest.png", temp.path())?;
        assert_eq!(
            inlined.as_deref(),
            Some("data:image/png;base64,cG5nLWJ5dGVz")
        );
        Ok(())
    }

    #[test]
    fn defaults_to_jpeg_mime() -> io::Result<()> {
        let temp = tempdir()?;
        fs::create_dir_all(temp.path().join("uploads"))?;
        fs::write(temp.path().join("uploads/photo.JPG"), b"x")?;

        let inlined = inline_upload("/uploads/photo.JPG", temp.path())?.unwrap();
        assert!(inlined.starts_with("data:image/jpeg;base64,"));
        Ok(())
    }

    #[test]
    fn missing_files_and_other_kinds_are_skipped() -> io::Result<()> {
        let temp = tempdir()?;
        assert_eq!(inline_upload("/uploads/missing.png", temp.path())?, None);
        assert_eq!(inline_upload("https://x/y.png", temp.path())?, None);
        assert_eq!(inline_upload("", temp.path())?, None);
        Ok(())
    }
}

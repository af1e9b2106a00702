//! Upload validation and filename handling for media files.

use crate::error::CoreError;
use crate::slug;

/// File extensions accepted for media uploads.
pub const ACCEPTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// Extensions the resize pipeline can decode. Gifs are stored as-is to
/// avoid flattening animations.
pub const RESIZABLE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

/// Maximum accepted upload size (5 MiB).
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Split a filename into (stem, extension), both lowercased.
pub fn split_file_name(file_name: &str) -> (String, String) {
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem.to_lowercase(), ext.to_lowercase()),
        _ => (file_name.to_lowercase(), String::new()),
    }
}

/// Validate an upload by filename extension and size.
pub fn validate_upload(file_name: &str, len: usize) -> Result<(), CoreError> {
    let (_, ext) = split_file_name(file_name);
    if !ACCEPTED_EXTENSIONS.contains(&ext.as_str()) {
        return Err(CoreError::Validation(format!(
            "File type '{ext}' is not supported. Accepted: {ACCEPTED_EXTENSIONS:?}"
        )));
    }
    if len == 0 {
        return Err(CoreError::Validation("Uploaded file is empty".into()));
    }
    if len > MAX_UPLOAD_BYTES {
        return Err(CoreError::Validation(format!(
            "Uploaded file exceeds the {MAX_UPLOAD_BYTES} byte limit"
        )));
    }
    Ok(())
}

/// Whether the pipeline should attempt to decode and resize this file.
pub fn is_resizable(file_name: &str) -> bool {
    let (_, ext) = split_file_name(file_name);
    RESIZABLE_EXTENSIONS.contains(&ext.as_str())
}

/// Sanitize a client-supplied filename into a URL-safe stored name.
///
/// The stem goes through slug normalization (with the same random
/// fallback), the extension is lowercased and kept.
pub fn sanitize_file_name(file_name: &str) -> String {
    let (stem, ext) = split_file_name(file_name);
    let stem = slug::slugify(&stem);
    if ext.is_empty() {
        stem
    } else {
        format!("{stem}.{ext}")
    }
}

/// Append a numeric probe suffix before the extension:
/// `"cat.jpg"` + 2 -> `"cat-2.jpg"`.
pub fn file_name_with_suffix(file_name: &str, n: u32) -> String {
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{stem}-{n}.{ext}"),
        _ => format!("{file_name}-{n}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validates_extension_and_size() {
        assert!(validate_upload("cat.jpg", 100).is_ok());
        assert!(validate_upload("cat.webp", 100).is_ok());
        assert!(validate_upload("cat.exe", 100).is_err());
        assert!(validate_upload("cat.jpg", 0).is_err());
        assert!(validate_upload("cat.jpg", MAX_UPLOAD_BYTES + 1).is_err());
    }

    #[test]
    fn sanitizes_messy_names() {
        assert_eq!(sanitize_file_name("My Cat Photo.JPG"), "my-cat-photo.jpg");
        assert_eq!(sanitize_file_name("noext"), "noext");
    }

    #[test]
    fn suffix_goes_before_extension() {
        assert_eq!(file_name_with_suffix("cat.jpg", 2), "cat-2.jpg");
        assert_eq!(file_name_with_suffix("noext", 3), "noext-3");
    }

    #[test]
    fn gif_accepted_but_not_resizable() {
        assert!(validate_upload("anim.gif", 10).is_ok());
        assert!(!is_resizable("anim.gif"));
        assert!(is_resizable("photo.jpeg"));
    }
}

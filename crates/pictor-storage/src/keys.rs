//! Shared key generation for storage backends.
//!
//! Originals live under `uploads/`, transform outputs under `transformed/`.
//! Both prefix the file name with the epoch milliseconds at creation time.

use chrono::Utc;

pub const UPLOADS_PREFIX: &str = "uploads";
pub const TRANSFORMED_PREFIX: &str = "transformed";

/// Output format used when a key carries no usable extension.
pub const DEFAULT_FORMAT: &str = "jpeg";

/// Reduce a client supplied file name to a single safe path segment.
pub fn sanitize_filename(filename: &str) -> String {
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    let cleaned: String = base
        .chars()
        .map(|c| if c.is_control() { '_' } else { c })
        .collect();
    match cleaned.as_str() {
        "" | "." | ".." => "upload".to_string(),
        _ => cleaned,
    }
}

/// Last path segment of a storage key.
pub fn basename(storage_key: &str) -> &str {
    storage_key.rsplit('/').next().unwrap_or(storage_key)
}

/// `uploads/{millis}_{filename}` using the current time.
pub fn upload_key(filename: &str) -> String {
    upload_key_at(Utc::now().timestamp_millis(), filename)
}

pub fn upload_key_at(millis: i64, filename: &str) -> String {
    format!("{}/{}_{}", UPLOADS_PREFIX, millis, sanitize_filename(filename))
}

/// `transformed/{millis}_{basename(source_key)}` using the current time.
pub fn transformed_key(source_key: &str) -> String {
    transformed_key_at(Utc::now().timestamp_millis(), source_key)
}

pub fn transformed_key_at(millis: i64, source_key: &str) -> String {
    format!("{}/{}_{}", TRANSFORMED_PREFIX, millis, basename(source_key))
}

/// Format name implied by the key's extension, lowercased, `jpeg` if absent.
pub fn format_from_key(storage_key: &str) -> String {
    let name = basename(storage_key);
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => ext.to_lowercase(),
        _ => DEFAULT_FORMAT.to_string(),
    }
}

/// Content type for an object, derived from its key: `image/{format}`.
pub fn content_type_for_key(storage_key: &str) -> String {
    format!("image/{}", format_from_key(storage_key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_key_layout() {
        assert_eq!(upload_key_at(1700000000000, "cat.png"), "uploads/1700000000000_cat.png");
    }

    #[test]
    fn test_upload_key_strips_directories() {
        assert_eq!(
            upload_key_at(1, "../../etc/passwd"),
            "uploads/1_passwd"
        );
        assert_eq!(upload_key_at(1, "C:\\photos\\dog.jpg"), "uploads/1_dog.jpg");
        assert_eq!(upload_key_at(1, ".."), "uploads/1_upload");
    }

    #[test]
    fn test_transformed_key_uses_source_basename() {
        assert_eq!(
            transformed_key_at(42, "uploads/1700000000000_cat.png"),
            "transformed/42_1700000000000_cat.png"
        );
        assert!(transformed_key("uploads/1_a.webp").starts_with("transformed/"));
    }

    #[test]
    fn test_format_from_key() {
        assert_eq!(format_from_key("uploads/1_cat.PNG"), "png");
        assert_eq!(format_from_key("uploads/1_cat.tar.gz"), "gz");
        assert_eq!(format_from_key("uploads/1_cat"), "jpeg");
        assert_eq!(format_from_key("uploads/.hidden"), "jpeg");
    }

    #[test]
    fn test_content_type_for_key() {
        assert_eq!(content_type_for_key("transformed/1_a.webp"), "image/webp");
        assert_eq!(content_type_for_key("transformed/1_a"), "image/jpeg");
    }
}

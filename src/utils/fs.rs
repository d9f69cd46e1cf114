use std::path::Path;
use bytes::Bytes;
use tokio::fs;
use crate::core::SourceFile;

/// Media type used when neither the caller nor the extension says anything.
pub const FALLBACK_MEDIA_TYPE: &str = "application/octet-stream";

/// Source file name without its final extension; never empty.
pub fn base_name(file_name: &str) -> String {
    let file_name = extract_filename(file_name);
    let stem = Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .trim();

    if stem.is_empty() {
        "file".to_string()
    } else {
        stem.to_string()
    }
}

/// Builds `{base}-{suffix}.{ext}` for an artifact produced from `source_name`.
pub fn output_file_name(source_name: &str, suffix: &str, ext: &str) -> String {
    let base = base_name(source_name);
    let ext = if ext.is_empty() { "bin" } else { ext };
    if suffix.is_empty() {
        format!("{base}.{ext}")
    } else {
        format!("{base}-{suffix}.{ext}")
    }
}

/// Extract just the filename from a path, with either separator.
pub fn extract_filename(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// Reduces a file name to characters safe for use inside an identifier.
pub fn sanitize_for_id(file_name: &str) -> String {
    let cleaned: String = extract_filename(file_name)
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '_' { c } else { '_' })
        .collect();
    if cleaned.is_empty() { "file".to_string() } else { cleaned }
}

/// Reads a file from disk into a [`SourceFile`], guessing its media type from the extension.
pub async fn read_source_file(path: impl AsRef<Path>) -> std::io::Result<SourceFile> {
    let path = path.as_ref();
    let bytes = fs::read(path).await?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let media_type = mime_guess::from_path(path)
        .first_raw()
        .unwrap_or(FALLBACK_MEDIA_TYPE);

    Ok(SourceFile::new(name, media_type, Bytes::from(bytes)))
}

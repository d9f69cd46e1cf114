use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use crate::utils::UnknownFormat;

/// Output formats the conversion service can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetFormat {
    Png,
    Jpg,
    Webp,
    Gif,
    Bmp,
    Tiff,
    Pdf,
    Svg,
    Ico,
}

impl TargetFormat {
    pub const ALL: [TargetFormat; 9] = [
        Self::Png,
        Self::Jpg,
        Self::Webp,
        Self::Gif,
        Self::Bmp,
        Self::Tiff,
        Self::Pdf,
        Self::Svg,
        Self::Ico,
    ];

    /// Get file extensions associated with this format
    pub fn extensions(&self) -> &[&'static str] {
        match self {
            Self::Png => &["png"],
            Self::Jpg => &["jpg", "jpeg"],
            Self::Webp => &["webp"],
            Self::Gif => &["gif"],
            Self::Bmp => &["bmp"],
            Self::Tiff => &["tiff", "tif"],
            Self::Pdf => &["pdf"],
            Self::Svg => &["svg"],
            Self::Ico => &["ico"],
        }
    }

    /// Get the primary extension for this format
    pub fn primary_extension(&self) -> &'static str {
        self.extensions()[0]
    }

    /// Media type of an artifact in this format
    pub fn media_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpg => "image/jpeg",
            Self::Webp => "image/webp",
            Self::Gif => "image/gif",
            Self::Bmp => "image/bmp",
            Self::Tiff => "image/tiff",
            Self::Pdf => "application/pdf",
            Self::Svg => "image/svg+xml",
            Self::Ico => "image/x-icon",
        }
    }

    /// Check if the extension matches this format
    pub fn matches_extension(&self, ext: &str) -> bool {
        let ext = ext.to_lowercase();
        self.extensions().contains(&ext.as_str())
    }
}

impl FromStr for TargetFormat {
    type Err = UnknownFormat;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let name = name.trim().trim_start_matches('.');
        Self::ALL
            .into_iter()
            .find(|f| f.matches_extension(name))
            .ok_or_else(|| UnknownFormat(name.to_string()))
    }
}

impl fmt::Display for TargetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.primary_extension())
    }
}

/// Lowercased extension of a file name, without the dot.
pub fn extension_of(file_name: &str) -> Option<String> {
    std::path::Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
        .map(|e| e.to_lowercase())
}

/// Best-effort extension for a media type, used when a file name carries none.
pub fn extension_for_media_type(media_type: &str) -> Option<&'static str> {
    let media_type = media_type.to_lowercase();
    if let Some(format) = TargetFormat::ALL
        .into_iter()
        .find(|f| f.media_type() == media_type)
    {
        return Some(format.primary_extension());
    }
    match media_type.as_str() {
        "image/jpg" | "image/pjpeg" => Some("jpg"),
        "image/vnd.microsoft.icon" => Some("ico"),
        "image/heic" => Some("heic"),
        _ => None,
    }
}

/// Whether a declared media type names an image
pub fn is_image_media_type(media_type: &str) -> bool {
    media_type.to_lowercase().starts_with("image/")
}

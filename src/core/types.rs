//! Core types shared by strategies, the coordinator and the export adapter.

use std::fmt;
use std::str::FromStr;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Transformation applied uniformly to every entry of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransformMode {
    /// Local downscale + lossy re-encode
    Compress,
    /// Remote format conversion
    Convert,
    /// Remote background matting
    RemoveBackground,
}

impl TransformMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Compress => "compress",
            Self::Convert => "convert",
            Self::RemoveBackground => "remove-background",
        }
    }

    /// Suffix appended to the source base name of every artifact in this mode
    pub fn file_suffix(&self) -> &'static str {
        match self {
            Self::Compress => "compressed",
            Self::Convert => "converted",
            Self::RemoveBackground => "no-bg",
        }
    }
}

impl fmt::Display for TransformMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransformMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "compress" => Ok(Self::Compress),
            "convert" => Ok(Self::Convert),
            "remove-background" | "remove-bg" | "removebg" => Ok(Self::RemoveBackground),
            other => Err(format!("Unknown mode: {other}")),
        }
    }
}

/// Output of a successful transformation, ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformedArtifact {
    /// Encoded output
    #[serde(skip)]
    pub bytes: Bytes,
    /// Suggested name for the saved file
    pub file_name: String,
    /// Media type of `bytes`
    pub media_type: String,
    /// Source size in bytes
    pub original_size: u64,
    /// Output size in bytes
    pub size: u64,
    /// Raster dimensions of the output, when known
    pub dimensions: Option<(u32, u32)>,
}

impl TransformedArtifact {
    pub fn new(
        bytes: Bytes,
        file_name: impl Into<String>,
        media_type: impl Into<String>,
        original_size: u64,
    ) -> Self {
        let size = bytes.len() as u64;
        Self {
            bytes,
            file_name: file_name.into(),
            media_type: media_type.into(),
            original_size,
            size,
            dimensions: None,
        }
    }

    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.dimensions = Some((width, height));
        self
    }

    /// Bytes saved (can be negative if the file grew)
    pub fn saved_bytes(&self) -> i64 {
        self.original_size as i64 - self.size as i64
    }

    /// Size reduction as a percentage of the original
    pub fn compression_ratio(&self) -> f64 {
        if self.original_size > 0 {
            self.saved_bytes() as f64 / self.original_size as f64 * 100.0
        } else {
            0.0
        }
    }
}

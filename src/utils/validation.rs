use serde::{Deserialize, Serialize};
use crate::core::{SourceFile, TransformMode};
use crate::utils::{RejectionReason, extension_of};

const MIB: u64 = 1024 * 1024;

/// Which files a mode accepts.
///
/// A file passes the type check when either its declared media type or its
/// extension is listed; browsers misreport media types often enough that one
/// of the two is sufficient. A policy listing neither accepts every type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcceptPolicy {
    /// Largest accepted file, in bytes
    pub max_bytes: u64,
    /// Media type patterns; `image/*` matches any image subtype
    pub media_types: Vec<String>,
    /// Extensions without the leading dot
    pub extensions: Vec<String>,
}

impl Default for AcceptPolicy {
    fn default() -> Self {
        Self::any(50 * MIB)
    }
}

impl AcceptPolicy {
    /// Accept every type up to `max_bytes`.
    pub fn any(max_bytes: u64) -> Self {
        Self {
            max_bytes,
            media_types: Vec::new(),
            extensions: Vec::new(),
        }
    }

    pub fn new(max_bytes: u64, media_types: &[&str], extensions: &[&str]) -> Self {
        Self {
            max_bytes,
            media_types: media_types.iter().map(|s| s.to_string()).collect(),
            extensions: extensions.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Default policy for each mode.
    pub fn for_mode(mode: TransformMode) -> Self {
        match mode {
            // Non-images are let through and classified by the compressor itself
            TransformMode::Compress => Self::any(50 * MIB),
            TransformMode::Convert => Self::new(
                50 * MIB,
                &["image/*", "application/pdf"],
                &["png", "jpg", "jpeg", "webp", "gif", "bmp", "tif", "tiff", "pdf", "svg", "ico", "heic"],
            ),
            TransformMode::RemoveBackground => Self::new(
                12 * MIB,
                &["image/png", "image/jpeg", "image/webp"],
                &["png", "jpg", "jpeg", "webp"],
            ),
        }
    }

    fn accepts_any_type(&self) -> bool {
        self.media_types.is_empty() && self.extensions.is_empty()
    }

    fn matches_media_type(&self, media_type: &str) -> bool {
        let media_type = media_type.trim().to_lowercase();
        if media_type.is_empty() {
            return false;
        }
        self.media_types.iter().any(|pattern| {
            let pattern = pattern.to_lowercase();
            match pattern.strip_suffix("/*") {
                Some(prefix) => media_type
                    .split_once('/')
                    .is_some_and(|(kind, _)| kind == prefix),
                None => pattern == media_type,
            }
        })
    }

    fn matches_extension(&self, ext: Option<&str>) -> bool {
        let Some(ext) = ext else {
            return false;
        };
        self.extensions
            .iter()
            .any(|allowed| allowed.trim_start_matches('.').eq_ignore_ascii_case(ext))
    }
}

/// Pure, synchronous admission check run before a file becomes an entry.
#[derive(Debug, Clone)]
pub struct Validator {
    policy: AcceptPolicy,
}

impl Validator {
    pub fn new(policy: AcceptPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &AcceptPolicy {
        &self.policy
    }

    /// Validates a candidate file against the policy
    pub fn validate(&self, file: &SourceFile) -> Result<(), RejectionReason> {
        if file.name.trim().is_empty() {
            return Err(RejectionReason::Unnamed);
        }

        let size = file.size();
        if size == 0 {
            return Err(RejectionReason::Empty);
        }

        if size > self.policy.max_bytes {
            return Err(RejectionReason::TooLarge {
                size,
                max: self.policy.max_bytes,
            });
        }

        if self.policy.accepts_any_type() {
            return Ok(());
        }

        let extension = extension_of(&file.name);
        if self.policy.matches_media_type(&file.media_type)
            || self.policy.matches_extension(extension.as_deref())
        {
            return Ok(());
        }

        Err(RejectionReason::UnsupportedType {
            media_type: file.media_type.clone(),
            extension: extension.unwrap_or_default(),
        })
    }
}

/// One validator per mode.
#[derive(Debug, Clone)]
pub struct ValidatorSet {
    compress: Validator,
    convert: Validator,
    remove_background: Validator,
}

impl ValidatorSet {
    pub fn new(compress: AcceptPolicy, convert: AcceptPolicy, remove_background: AcceptPolicy) -> Self {
        Self {
            compress: Validator::new(compress),
            convert: Validator::new(convert),
            remove_background: Validator::new(remove_background),
        }
    }

    pub fn for_mode(&self, mode: TransformMode) -> &Validator {
        match mode {
            TransformMode::Compress => &self.compress,
            TransformMode::Convert => &self.convert,
            TransformMode::RemoveBackground => &self.remove_background,
        }
    }
}

impl Default for ValidatorSet {
    fn default() -> Self {
        Self::new(
            AcceptPolicy::for_mode(TransformMode::Compress),
            AcceptPolicy::for_mode(TransformMode::Convert),
            AcceptPolicy::for_mode(TransformMode::RemoveBackground),
        )
    }
}

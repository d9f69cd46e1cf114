//! One file tracked through the pipeline and its lifecycle.
//!
//! ```text
//! Pending ──begin_processing()──> Processing ──complete(Ok)──> Success
//!    ^                                       └──complete(Err)─> Failed
//!    └──────────────────────retry()──────────────────────────────┘
//! ```
//!
//! The result and the error live inside [`EntryState`], so an entry can never
//! carry an artifact while failed, or an error while successful.

use std::fmt;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::TransformedArtifact;
use crate::utils::{BatchError, FailureKind, TargetFormat, TransformError, sanitize_for_id};

/// Stable identity of an entry within a batch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(String);

impl EntryId {
    /// Builds an id from the arrival sequence number plus name and size.
    ///
    /// `seq` is never reused within a batch, which keeps same-named files apart.
    pub fn new(seq: u64, file_name: &str, size: u64) -> Self {
        Self(format!("{seq}-{}-{size}", sanitize_for_id(file_name)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntryId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Binary payload plus the metadata the client declared for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub name: String,
    pub media_type: String,
    pub bytes: Bytes,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            bytes: bytes.into(),
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Classified failure stored on a failed entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryError {
    pub kind: FailureKind,
    pub message: String,
}

impl From<&TransformError> for EntryError {
    fn from(err: &TransformError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Lifecycle state of an entry; terminal states carry their outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryState {
    Pending,
    Processing,
    Success(TransformedArtifact),
    Failed(EntryError),
}

impl EntryState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Success(_) => "success",
            Self::Failed(_) => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success(_) | Self::Failed(_))
    }
}

#[derive(Debug, Clone)]
pub struct FileEntry {
    id: EntryId,
    source: SourceFile,
    target_format: Option<TargetFormat>,
    state: EntryState,
}

impl FileEntry {
    pub fn new(id: EntryId, source: SourceFile, target_format: Option<TargetFormat>) -> Self {
        Self {
            id,
            source,
            target_format,
            state: EntryState::Pending,
        }
    }

    pub fn id(&self) -> &EntryId {
        &self.id
    }

    pub fn source(&self) -> &SourceFile {
        &self.source
    }

    pub fn target_format(&self) -> Option<TargetFormat> {
        self.target_format
    }

    pub fn state(&self) -> &EntryState {
        &self.state
    }

    pub fn artifact(&self) -> Option<&TransformedArtifact> {
        match &self.state {
            EntryState::Success(artifact) => Some(artifact),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&EntryError> {
        match &self.state {
            EntryState::Failed(error) => Some(error),
            _ => None,
        }
    }

    /// Pending → Processing
    pub fn begin_processing(&mut self) -> Result<(), BatchError> {
        self.expect_state("pending")?;
        self.state = EntryState::Processing;
        debug!("{} → processing", self.id);
        Ok(())
    }

    /// Processing → Success | Failed
    pub fn complete(&mut self, outcome: Result<TransformedArtifact, TransformError>) -> Result<(), BatchError> {
        self.expect_state("processing")?;
        self.state = match outcome {
            Ok(artifact) => {
                debug!("{} → success ({} bytes)", self.id, artifact.size);
                EntryState::Success(artifact)
            }
            Err(err) => {
                debug!("{} → failed: {}", self.id, err);
                EntryState::Failed(EntryError::from(&err))
            }
        };
        Ok(())
    }

    /// Failed → Pending, dropping the previous error
    pub fn retry(&mut self) -> Result<(), BatchError> {
        self.expect_state("failed")?;
        self.state = EntryState::Pending;
        debug!("{} → pending (retry)", self.id);
        Ok(())
    }

    /// Changes the conversion target while the entry has not started or has failed.
    pub fn set_target_format(&mut self, format: TargetFormat) -> Result<(), BatchError> {
        match self.state {
            EntryState::Pending | EntryState::Failed(_) => {
                self.target_format = Some(format);
                Ok(())
            }
            _ => Err(BatchError::invalid_state(&self.id, self.state.name(), "pending or failed")),
        }
    }

    fn expect_state(&self, expected: &str) -> Result<(), BatchError> {
        if self.state.name() == expected {
            Ok(())
        } else {
            Err(BatchError::invalid_state(&self.id, self.state.name(), expected))
        }
    }
}

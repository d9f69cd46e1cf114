//! The uniform contract every transformation implements.

use std::sync::Arc;
use async_trait::async_trait;

use crate::core::{EntryId, FileEntry, SourceFile, TransformMode, TransformedArtifact};
use crate::utils::{TargetFormat, TransformResult};

/// Owned copy of what a strategy needs from an entry.
///
/// Strategies never see the batch; they receive a job and return an outcome
/// that the coordinator applies.
#[derive(Debug, Clone)]
pub struct TransformJob {
    pub id: EntryId,
    pub source: SourceFile,
    pub target_format: Option<TargetFormat>,
}

impl From<&FileEntry> for TransformJob {
    fn from(entry: &FileEntry) -> Self {
        Self {
            id: entry.id().clone(),
            source: entry.source().clone(),
            target_format: entry.target_format(),
        }
    }
}

/// One transformation capability.
#[async_trait]
pub trait TransformStrategy: Send + Sync {
    /// The mode this strategy serves
    fn mode(&self) -> TransformMode;

    /// Transforms one file.
    ///
    /// # Errors
    /// Returns the classified failure; callers store it on the entry.
    async fn execute(&self, job: &TransformJob) -> TransformResult<TransformedArtifact>;
}

/// One strategy per mode, resolved by the batch's active mode.
#[derive(Clone)]
pub struct StrategySet {
    compress: Arc<dyn TransformStrategy>,
    convert: Arc<dyn TransformStrategy>,
    remove_background: Arc<dyn TransformStrategy>,
}

impl StrategySet {
    pub fn new(
        compress: Arc<dyn TransformStrategy>,
        convert: Arc<dyn TransformStrategy>,
        remove_background: Arc<dyn TransformStrategy>,
    ) -> Self {
        Self {
            compress,
            convert,
            remove_background,
        }
    }

    pub fn resolve(&self, mode: TransformMode) -> Arc<dyn TransformStrategy> {
        match mode {
            TransformMode::Compress => Arc::clone(&self.compress),
            TransformMode::Convert => Arc::clone(&self.convert),
            TransformMode::RemoveBackground => Arc::clone(&self.remove_background),
        }
    }
}

use serde::Serialize;
use crate::core::{EntryError, EntryId, EntryState, FileEntry, TransformMode, TransformedArtifact};
use crate::utils::TargetFormat;

/// Aggregate progress of a batch, always recomputed from entry states.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchProgress {
    pub pending: usize,
    pub processing: usize,
    pub success: usize,
    pub failed: usize,
    /// Number of entries in the batch
    pub total: usize,
    /// Terminal entries as a percentage of the total (0-100)
    pub progress_percentage: usize,
}

impl BatchProgress {
    pub fn from_states<'a>(states: impl IntoIterator<Item = &'a EntryState>) -> Self {
        let mut progress = Self::default();
        for state in states {
            match state {
                EntryState::Pending => progress.pending += 1,
                EntryState::Processing => progress.processing += 1,
                EntryState::Success(_) => progress.success += 1,
                EntryState::Failed(_) => progress.failed += 1,
            }
            progress.total += 1;
        }
        progress.progress_percentage = if progress.total > 0 {
            (progress.completed() * 100) / progress.total
        } else {
            0
        };
        progress
    }

    /// Entries in a terminal state
    pub fn completed(&self) -> usize {
        self.success + self.failed
    }

    pub fn is_idle(&self) -> bool {
        self.processing == 0
    }
}

/// Read-only copy of one entry for rendering and export.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryView {
    pub id: EntryId,
    pub file_name: String,
    pub media_type: String,
    pub size: u64,
    pub target_format: Option<TargetFormat>,
    /// `pending`, `processing`, `success` or `failed`
    pub state: &'static str,
    pub result: Option<TransformedArtifact>,
    pub error: Option<EntryError>,
}

impl From<&FileEntry> for EntryView {
    fn from(entry: &FileEntry) -> Self {
        let source = entry.source();
        Self {
            id: entry.id().clone(),
            file_name: source.name.clone(),
            media_type: source.media_type.clone(),
            size: source.size(),
            target_format: entry.target_format(),
            state: entry.state().name(),
            result: entry.artifact().cloned(),
            error: entry.error().cloned(),
        }
    }
}

impl EntryView {
    pub fn is_success(&self) -> bool {
        self.result.is_some()
    }
}

/// Stable view of the whole batch at one instant.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSnapshot {
    pub mode: TransformMode,
    pub entries: Vec<EntryView>,
    pub progress: BatchProgress,
}

impl BatchSnapshot {
    pub fn entry(&self, id: &EntryId) -> Option<&EntryView> {
        self.entries.iter().find(|e| &e.id == id)
    }

    pub fn successes(&self) -> impl Iterator<Item = &EntryView> {
        self.entries.iter().filter(|e| e.is_success())
    }
}

/// Outcome counts for one `run_all` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    /// Entries moved to processing by this call
    pub started: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Results that arrived for entries removed meanwhile
    pub discarded: usize,
}

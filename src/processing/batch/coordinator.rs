//! Owner of the batch and driver of its per-entry state machines.
//!
//! Every pending entry gets its own tokio task when [`BatchCoordinator::run_all`]
//! is called. Tasks only hold their own [`TransformJob`] and the strategy; the
//! outcome flows back through the `JoinSet` and is applied here, keyed by id, so
//! one entry's failure never touches another entry.

use std::collections::HashMap;
use parking_lot::RwLock;
use serde::Serialize;
use tokio::task::{self, AbortHandle, JoinSet};
use tracing::{debug, info, warn};

use crate::core::{
    BatchProgress, BatchSnapshot, EntryId, EntryView, FileEntry, RunSummary, SourceFile,
    TransformMode, TransformedArtifact,
};
use crate::processing::strategy::{StrategySet, TransformJob};
use crate::utils::{BatchError, RejectionReason, TargetFormat, TransformError, ValidatorSet};

/// A file that did not make it into the batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Rejection {
    pub file_name: String,
    pub reason: RejectionReason,
}

/// Result of [`BatchCoordinator::add_files`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddReport {
    pub added: Vec<EntryId>,
    pub rejected: Vec<Rejection>,
}

/// How a finished task was applied.
enum Applied {
    Succeeded,
    Failed,
    Discarded,
}

struct Batch {
    mode: TransformMode,
    entries: Vec<FileEntry>,
    /// Arrival counter; never reset so ids stay unique across batches
    next_seq: u64,
    in_flight: HashMap<EntryId, AbortHandle>,
}

impl Batch {
    fn entry_mut(&mut self, id: &EntryId) -> Result<&mut FileEntry, BatchError> {
        self.entries
            .iter_mut()
            .find(|e| e.id() == id)
            .ok_or_else(|| BatchError::EntryNotFound(id.clone()))
    }

    fn abort_all(&mut self) {
        for (id, handle) in self.in_flight.drain() {
            debug!("Aborting in-flight task for {id}");
            handle.abort();
        }
    }
}

/// Fails the entries of a `run_all` call whose future was dropped before they finished.
struct RunGuard<'a> {
    coordinator: &'a BatchCoordinator,
    tasks: HashMap<task::Id, EntryId>,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        if self.tasks.is_empty() {
            return;
        }
        let mut batch = self.coordinator.batch.write();
        for (_, id) in self.tasks.drain() {
            if let Some(handle) = batch.in_flight.remove(&id) {
                handle.abort();
            }
            let Ok(entry) = batch.entry_mut(&id) else {
                continue;
            };
            if entry.state().is_terminal() {
                continue;
            }
            warn!("Run dropped while {id} was processing");
            let _ = entry.complete(Err(TransformError::Internal(
                "Run was cancelled before this entry finished".to_string(),
            )));
        }
    }
}

pub struct BatchCoordinator {
    strategies: StrategySet,
    validators: ValidatorSet,
    // Write locks are never held across an await point
    batch: RwLock<Batch>,
}

impl BatchCoordinator {
    pub fn new(mode: TransformMode, strategies: StrategySet, validators: ValidatorSet) -> Self {
        Self {
            strategies,
            validators,
            batch: RwLock::new(Batch {
                mode,
                entries: Vec::new(),
                next_seq: 0,
                in_flight: HashMap::new(),
            }),
        }
    }

    pub fn mode(&self) -> TransformMode {
        self.batch.read().mode
    }

    /// Validates `files` and appends the accepted ones as pending entries.
    pub fn add_files(&self, files: impl IntoIterator<Item = SourceFile>) -> AddReport {
        self.add_files_with_target(files, None)
    }

    /// Like [`add_files`](Self::add_files), giving every new entry the same conversion target.
    pub fn add_files_with_target(
        &self,
        files: impl IntoIterator<Item = SourceFile>,
        target_format: Option<TargetFormat>,
    ) -> AddReport {
        let mut batch = self.batch.write();
        let validator = self.validators.for_mode(batch.mode);
        let mut report = AddReport::default();

        for file in files {
            if let Err(reason) = validator.validate(&file) {
                warn!("Rejected '{}': {}", file.name, reason);
                report.rejected.push(Rejection {
                    file_name: file.name,
                    reason,
                });
                continue;
            }

            let id = EntryId::new(batch.next_seq, &file.name, file.size());
            batch.next_seq += 1;
            debug!("Added {id} ({} bytes, {})", file.size(), file.media_type);
            batch.entries.push(FileEntry::new(id.clone(), file, target_format));
            report.added.push(id);
        }

        report
    }

    /// Removes an entry whatever its state. An in-flight task for it is aborted,
    /// and anything it still produces is discarded.
    pub fn remove_file(&self, id: &EntryId) -> Result<(), BatchError> {
        let mut batch = self.batch.write();
        let index = batch
            .entries
            .iter()
            .position(|e| e.id() == id)
            .ok_or_else(|| BatchError::EntryNotFound(id.clone()))?;
        batch.entries.remove(index);

        if let Some(handle) = batch.in_flight.remove(id) {
            debug!("Aborting in-flight task for removed {id}");
            handle.abort();
        }
        Ok(())
    }

    /// Failed → pending. Anything else is rejected.
    pub fn retry(&self, id: &EntryId) -> Result<(), BatchError> {
        self.batch.write().entry_mut(id)?.retry()
    }

    pub fn set_target_format(&self, id: &EntryId, format: TargetFormat) -> Result<(), BatchError> {
        self.batch.write().entry_mut(id)?.set_target_format(format)
    }

    /// Replaces the whole collection with an empty batch bound to `mode`.
    pub fn start_new_batch(&self, mode: TransformMode) {
        let mut batch = self.batch.write();
        batch.abort_all();
        batch.entries.clear();
        batch.mode = mode;
        info!("Started new {mode} batch");
    }

    pub fn snapshot(&self) -> BatchSnapshot {
        let batch = self.batch.read();
        BatchSnapshot {
            mode: batch.mode,
            entries: batch.entries.iter().map(EntryView::from).collect(),
            progress: BatchProgress::from_states(batch.entries.iter().map(FileEntry::state)),
        }
    }

    pub fn progress(&self) -> BatchProgress {
        let batch = self.batch.read();
        BatchProgress::from_states(batch.entries.iter().map(FileEntry::state))
    }

    /// Artifact of a successful entry
    pub fn artifact(&self, id: &EntryId) -> Option<TransformedArtifact> {
        let batch = self.batch.read();
        batch
            .entries
            .iter()
            .find(|e| e.id() == id)
            .and_then(|e| e.artifact().cloned())
    }

    /// Runs the active strategy for every pending entry, concurrently.
    ///
    /// Resolves once every entry started by this call has reached a terminal
    /// state or left the batch. Per-entry failures are stored on the entries;
    /// this never fails as a whole. Dropping the future early aborts its tasks
    /// and marks their entries failed with [`TransformError::Internal`].
    pub async fn run_all(&self) -> RunSummary {
        let mut join_set = JoinSet::new();
        let mut guard = RunGuard {
            coordinator: self,
            tasks: HashMap::new(),
        };
        let mut summary = RunSummary::default();

        {
            let mut batch = self.batch.write();
            let mode = batch.mode;
            let strategy = self.strategies.resolve(mode);
            let mut started = Vec::new();

            for entry in batch.entries.iter_mut() {
                if entry.begin_processing().is_err() {
                    continue;
                }
                let job = TransformJob::from(&*entry);
                let strategy = strategy.clone();
                let handle = join_set.spawn(async move { strategy.execute(&job).await });
                guard.tasks.insert(handle.id(), entry.id().clone());
                started.push((entry.id().clone(), handle));
            }

            summary.started = started.len();
            batch.in_flight.extend(started);
            info!("Running {} entries in {mode} mode", summary.started);
        }

        while let Some(joined) = join_set.join_next_with_id().await {
            let (task_id, outcome) = match joined {
                Ok((task_id, outcome)) => (task_id, outcome),
                Err(err) if err.is_cancelled() => {
                    if let Some(id) = guard.tasks.remove(&err.id()) {
                        debug!("Task for {id} was aborted");
                    }
                    summary.discarded += 1;
                    continue;
                }
                Err(err) => (
                    err.id(),
                    Err(TransformError::Internal(format!("Strategy task panicked: {err}"))),
                ),
            };

            let Some(id) = guard.tasks.remove(&task_id) else {
                continue;
            };
            match self.apply(&id, outcome) {
                Applied::Succeeded => summary.succeeded += 1,
                Applied::Failed => summary.failed += 1,
                Applied::Discarded => summary.discarded += 1,
            }
        }

        if summary.failed > 0 {
            warn!(
                "Batch run completed with {} failed entries out of {}",
                summary.failed, summary.started
            );
        } else {
            info!("Batch run completed: {} entries succeeded", summary.succeeded);
        }
        summary
    }

    fn apply(&self, id: &EntryId, outcome: Result<TransformedArtifact, TransformError>) -> Applied {
        let mut batch = self.batch.write();
        batch.in_flight.remove(id);

        let Ok(entry) = batch.entry_mut(id) else {
            debug!("Discarding late result for removed {id}");
            return Applied::Discarded;
        };

        if let Err(err) = &outcome {
            warn!("{id} failed: {err}");
        }
        let succeeded = outcome.is_ok();
        match entry.complete(outcome) {
            Ok(()) if succeeded => Applied::Succeeded,
            Ok(()) => Applied::Failed,
            Err(err) => {
                debug!("Discarding result for {id}: {err}");
                Applied::Discarded
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use async_trait::async_trait;
    use bytes::Bytes;
    use crate::processing::strategy::TransformStrategy;
    use crate::utils::{AcceptPolicy, FailureKind, TransformResult};

    /// Succeeds unless the file name starts with `bad`; panics on `panic`, never finishes on `hang`.
    struct ScriptedStrategy;

    #[async_trait]
    impl TransformStrategy for ScriptedStrategy {
        fn mode(&self) -> TransformMode {
            TransformMode::Compress
        }

        async fn execute(&self, job: &TransformJob) -> TransformResult<TransformedArtifact> {
            let name = &job.source.name;
            if name.starts_with("panic") {
                panic!("strategy blew up");
            }
            if name.starts_with("hang") {
                std::future::pending::<()>().await;
            }
            if name.starts_with("bad") {
                return Err(TransformError::decode(format!("{name} is malformed")));
            }
            tokio::task::yield_now().await;
            Ok(TransformedArtifact::new(job.source.bytes.clone(), format!("{name}.out"), "image/jpeg", job.source.size()))
        }
    }

    fn coordinator() -> BatchCoordinator {
        let scripted: Arc<dyn TransformStrategy> = Arc::new(ScriptedStrategy);
        let strategies = StrategySet::new(scripted.clone(), scripted.clone(), scripted);
        let validators = ValidatorSet::new(
            AcceptPolicy::any(1024),
            AcceptPolicy::new(1024, &["image/*"], &["png"]),
            AcceptPolicy::any(1024),
        );
        BatchCoordinator::new(TransformMode::Compress, strategies, validators)
    }

    fn file(name: &str) -> SourceFile {
        SourceFile::new(name, "image/png", Bytes::from(name.as_bytes().to_vec()))
    }

    #[test]
    fn add_files_reports_rejections_without_mutating() {
        let coordinator = coordinator();
        let huge = SourceFile::new("huge.png", "image/png", vec![0u8; 2048]);
        let report = coordinator.add_files([file("a.png"), huge, file("b.png")]);

        assert_eq!(report.added.len(), 2);
        assert_eq!(
            report.rejected,
            vec![Rejection {
                file_name: "huge.png".into(),
                reason: RejectionReason::TooLarge { size: 2048, max: 1024 },
            }]
        );

        let snapshot = coordinator.snapshot();
        assert_eq!(snapshot.progress.pending, 2);
        assert!(snapshot.entries.iter().all(|e| e.state == "pending"));
        assert_eq!(snapshot.entries[0].file_name, "a.png");
    }

    #[test]
    fn same_named_files_get_distinct_ids() {
        let coordinator = coordinator();
        let report = coordinator.add_files([file("a.png"), file("a.png")]);
        assert_ne!(report.added[0], report.added[1]);
    }

    #[tokio::test]
    async fn run_all_leaves_nothing_processing() {
        let coordinator = coordinator();
        coordinator.add_files([file("a.png"), file("bad.png"), file("c.png")]);

        let summary = coordinator.run_all().await;
        assert_eq!(summary, RunSummary { started: 3, succeeded: 2, failed: 1, discarded: 0 });

        let progress = coordinator.progress();
        assert_eq!(progress.processing, 0);
        assert_eq!(progress.pending, 0);
        assert_eq!(progress.progress_percentage, 100);
    }

    #[tokio::test]
    async fn failure_does_not_touch_siblings() {
        let coordinator = coordinator();
        coordinator.add_files([file("a.png"), file("bad.png"), file("c.png"), file("d.png")]);
        coordinator.run_all().await;

        let snapshot = coordinator.snapshot();
        let states: Vec<_> = snapshot.entries.iter().map(|e| e.state).collect();
        assert_eq!(states, vec!["success", "failed", "success", "success"]);

        let failed = &snapshot.entries[1];
        assert_eq!(failed.error.as_ref().map(|e| e.kind), Some(FailureKind::DecodeError));
        assert!(failed.result.is_none());
    }

    #[tokio::test]
    async fn run_all_only_touches_pending_entries() {
        let coordinator = coordinator();
        coordinator.add_files([file("a.png")]);
        coordinator.run_all().await;

        coordinator.add_files([file("b.png")]);
        let summary = coordinator.run_all().await;
        assert_eq!(summary.started, 1);
        assert_eq!(coordinator.progress().success, 2);
    }

    #[tokio::test]
    async fn retry_resets_failed_entry_only() {
        let coordinator = coordinator();
        let report = coordinator.add_files([file("a.png"), file("bad.png")]);
        coordinator.run_all().await;

        let (good, bad) = (&report.added[0], &report.added[1]);
        assert!(matches!(coordinator.retry(good), Err(BatchError::InvalidState { .. })));

        coordinator.retry(bad).unwrap();
        let snapshot = coordinator.snapshot();
        let view = snapshot.entry(bad).unwrap();
        assert_eq!(view.state, "pending");
        assert!(view.error.is_none());
        assert_eq!(snapshot.entry(good).unwrap().state, "success");
    }

    #[tokio::test]
    async fn panicking_strategy_fails_only_its_entry() {
        let coordinator = coordinator();
        coordinator.add_files([file("panic.png"), file("a.png")]);
        let summary = coordinator.run_all().await;
        assert_eq!((summary.succeeded, summary.failed), (1, 1));

        let snapshot = coordinator.snapshot();
        assert_eq!(snapshot.entries[0].error.as_ref().map(|e| e.kind), Some(FailureKind::Internal));
    }

    #[tokio::test]
    async fn dropped_run_fails_unfinished_entries() {
        let coordinator = coordinator();
        let report = coordinator.add_files([file("hang.png"), file("a.png")]);

        let run = tokio::time::timeout(std::time::Duration::from_millis(100), coordinator.run_all()).await;
        assert!(run.is_err());

        let snapshot = coordinator.snapshot();
        assert!(snapshot.progress.is_idle());
        let stuck = snapshot.entry(&report.added[0]).unwrap();
        assert_eq!(stuck.state, "failed");
        assert_eq!(stuck.error.as_ref().map(|e| e.kind), Some(FailureKind::Internal));
        assert_eq!(snapshot.entry(&report.added[1]).unwrap().state, "success");
        assert!(coordinator.batch.read().in_flight.is_empty());
    }

    #[test]
    fn unknown_ids_are_reported() {
        let coordinator = coordinator();
        let missing = EntryId::from("nope");
        assert_eq!(coordinator.remove_file(&missing), Err(BatchError::EntryNotFound(missing.clone())));
        assert!(coordinator.retry(&missing).is_err());
    }

    #[test]
    fn new_batch_replaces_collection_and_validator() {
        let coordinator = coordinator();
        coordinator.add_files([file("a.png")]);

        coordinator.start_new_batch(TransformMode::Convert);
        assert!(coordinator.snapshot().entries.is_empty());
        assert_eq!(coordinator.mode(), TransformMode::Convert);

        let report = coordinator.add_files([SourceFile::new("notes.txt", "text/plain", vec![1u8])]);
        assert_eq!(report.rejected.len(), 1);
    }
}

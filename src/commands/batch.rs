//! Command handlers that drive one batch end to end.

use std::path::PathBuf;
use std::sync::Arc;
use anyhow::Context;
use serde::Serialize;
use tracing::{debug, warn};

use crate::core::{AppState, BatchSnapshot, SourceFile, TransformMode};
use crate::export::{DirectorySaver, DownloadAdapter, DownloadReport, FileSaver};
use crate::processing::Rejection;
use crate::utils::{TargetFormat, read_source_file};

/// What the user asked for: one mode, a set of files, a destination.
#[derive(Debug, Clone)]
pub struct BatchRequest {
    pub mode: TransformMode,
    pub inputs: Vec<PathBuf>,
    /// Conversion target for every file (convert mode only)
    pub target_format: Option<TargetFormat>,
    pub output_dir: PathBuf,
}

/// Everything a caller needs to report on a finished batch.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchOutcome {
    pub rejected: Vec<Rejection>,
    pub snapshot: BatchSnapshot,
    pub downloads: DownloadReport,
}

impl BatchOutcome {
    pub fn any_succeeded(&self) -> bool {
        self.snapshot.progress.success > 0
    }
}

/// Reads `request.inputs`, runs them through a fresh batch and saves every success.
pub async fn transform_files(state: &AppState, request: BatchRequest) -> anyhow::Result<BatchOutcome> {
    let mut files = Vec::with_capacity(request.inputs.len());
    for path in &request.inputs {
        let file = read_source_file(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        files.push(file);
    }

    let saver = Arc::new(DirectorySaver::new(&request.output_dir));
    transform_sources(state, request.mode, files, request.target_format, saver).await
}

/// Runs already-loaded files through a fresh batch and hands successes to `saver`.
pub async fn transform_sources(
    state: &AppState,
    mode: TransformMode,
    files: Vec<SourceFile>,
    target_format: Option<TargetFormat>,
    saver: Arc<dyn FileSaver>,
) -> anyhow::Result<BatchOutcome> {
    if target_format.is_some() && mode != TransformMode::Convert {
        warn!("Target format is ignored in {mode} mode");
    }
    let target_format = target_format.filter(|_| mode == TransformMode::Convert);

    let coordinator = state.create_coordinator(mode);
    let report = coordinator.add_files_with_target(files, target_format);
    debug!("{} files accepted, {} rejected", report.added.len(), report.rejected.len());

    coordinator.run_all().await;
    let snapshot = coordinator.snapshot();
    if !snapshot.progress.is_idle() {
        warn!("{} entries still processing after the run", snapshot.progress.processing);
    }

    let downloads = DownloadAdapter::new(saver)
        .download_all(&snapshot)
        .await
        .context("Failed to save results")?;

    Ok(BatchOutcome {
        rejected: report.rejected,
        snapshot,
        downloads,
    })
}

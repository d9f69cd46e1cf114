use std::path::PathBuf;
use std::sync::Arc;
use serde::Serialize;
use tracing::{debug, info};

use crate::core::{BatchSnapshot, EntryId, EntryView};
use crate::export::FileSaver;
use crate::utils::ExportError;

/// Result of a bulk download.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadReport {
    /// Saved entries in batch order
    pub saved: Vec<(EntryId, PathBuf)>,
    /// Entries not in `success`, left alone
    pub skipped: Vec<EntryId>,
}

/// Turns successful entries into saved files.
#[derive(Clone)]
pub struct DownloadAdapter {
    saver: Arc<dyn FileSaver>,
}

impl DownloadAdapter {
    pub fn new(saver: Arc<dyn FileSaver>) -> Self {
        Self { saver }
    }

    /// Saves one entry's artifact under its suggested name.
    ///
    /// # Errors
    /// [`ExportError::NotDownloadable`] when the entry has not succeeded.
    pub async fn download_one(&self, entry: &EntryView) -> Result<PathBuf, ExportError> {
        let artifact = entry.result.as_ref().ok_or_else(|| ExportError::NotDownloadable {
            id: entry.id.clone(),
            state: entry.state.to_string(),
        })?;

        let path = self
            .saver
            .save(artifact.bytes.clone(), &artifact.file_name)
            .await?;
        debug!("Downloaded {} → {}", entry.id, path.display());
        Ok(path)
    }

    /// Saves every successful entry in batch order; the rest are skipped, not queued.
    pub async fn download_all(&self, snapshot: &BatchSnapshot) -> Result<DownloadReport, ExportError> {
        let mut report = DownloadReport::default();
        for entry in &snapshot.entries {
            if !entry.is_success() {
                report.skipped.push(entry.id.clone());
                continue;
            }
            let path = self.download_one(entry).await?;
            report.saved.push((entry.id.clone(), path));
        }
        info!(
            "Downloaded {} files ({} skipped)",
            report.saved.len(),
            report.skipped.len()
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use crate::core::{BatchProgress, TransformMode, TransformedArtifact};
    use crate::export::MemorySaver;

    fn view(id: &str, result: Option<TransformedArtifact>) -> EntryView {
        EntryView {
            id: EntryId::from(id),
            file_name: format!("{id}.png"),
            media_type: "image/png".into(),
            size: 3,
            target_format: None,
            state: if result.is_some() { "success" } else { "processing" },
            result,
            error: None,
        }
    }

    fn artifact(name: &str) -> TransformedArtifact {
        TransformedArtifact::new(Bytes::from_static(b"out"), name, "image/png", 3)
    }

    #[tokio::test]
    async fn download_one_refuses_unfinished_entries() {
        let adapter = DownloadAdapter::new(Arc::new(MemorySaver::new()));
        let err = adapter.download_one(&view("a", None)).await.unwrap_err();
        assert!(matches!(err, ExportError::NotDownloadable { ref state, .. } if state == "processing"));
    }

    #[tokio::test]
    async fn download_all_saves_successes_in_order() {
        let saver = MemorySaver::new();
        let adapter = DownloadAdapter::new(Arc::new(saver.clone()));
        let snapshot = BatchSnapshot {
            mode: TransformMode::RemoveBackground,
            entries: vec![
                view("a", Some(artifact("a-no-bg.png"))),
                view("b", None),
                view("c", Some(artifact("c-no-bg.png"))),
            ],
            progress: BatchProgress::default(),
        };

        let report = adapter.download_all(&snapshot).await.unwrap();
        assert_eq!(saver.saved_names(), vec!["a-no-bg.png", "c-no-bg.png"]);
        assert_eq!(report.skipped, vec![EntryId::from("b")]);
        assert_eq!(report.saved.len(), 2);
    }
}

//! Where artifacts end up once the user downloads them.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use tokio::fs;
use tracing::debug;

use crate::utils::{ExportError, extract_filename};

/// Delivers one file; `save(bytes, name)` in browser terms.
#[async_trait]
pub trait FileSaver: Send + Sync {
    /// Saves `bytes` under a name derived from `file_name`, returning where it went.
    async fn save(&self, bytes: Bytes, file_name: &str) -> Result<PathBuf, ExportError>;
}

/// Saves into a directory, numbering repeated names like browsers do: `a.png`, `a (1).png`.
#[derive(Debug, Clone)]
pub struct DirectorySaver {
    dir: PathBuf,
}

impl DirectorySaver {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn free_path(&self, file_name: &str) -> PathBuf {
        let candidate = self.dir.join(file_name);
        if !fs::try_exists(&candidate).await.unwrap_or(false) {
            return candidate;
        }

        let path = Path::new(file_name);
        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or(file_name);
        let ext = path.extension().and_then(|e| e.to_str());
        let mut n = 1u32;
        loop {
            let name = match ext {
                Some(ext) => format!("{stem} ({n}).{ext}"),
                None => format!("{stem} ({n})"),
            };
            let candidate = self.dir.join(name);
            if !fs::try_exists(&candidate).await.unwrap_or(false) {
                return candidate;
            }
            n += 1;
        }
    }
}

#[async_trait]
impl FileSaver for DirectorySaver {
    async fn save(&self, bytes: Bytes, file_name: &str) -> Result<PathBuf, ExportError> {
        fs::create_dir_all(&self.dir).await?;
        // Never let a suggested name escape the output directory
        let path = self.free_path(extract_filename(file_name)).await;
        fs::write(&path, &bytes).await?;
        debug!("Saved {} ({} bytes)", path.display(), bytes.len());
        Ok(path)
    }
}

/// Keeps saved files in memory; handy for tests and previews.
#[derive(Debug, Clone, Default)]
pub struct MemorySaver {
    saved: Arc<Mutex<Vec<(String, Bytes)>>>,
}

impl MemorySaver {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(file name, bytes)` for every save, in order
    pub fn saved(&self) -> Vec<(String, Bytes)> {
        self.saved.lock().clone()
    }

    pub fn saved_names(&self) -> Vec<String> {
        self.saved.lock().iter().map(|(name, _)| name.clone()).collect()
    }
}

#[async_trait]
impl FileSaver for MemorySaver {
    async fn save(&self, bytes: Bytes, file_name: &str) -> Result<PathBuf, ExportError> {
        self.saved.lock().push((file_name.to_string(), bytes));
        Ok(PathBuf::from(file_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn numbers_repeated_names() {
        let dir = tempfile::tempdir().unwrap();
        let saver = DirectorySaver::new(dir.path().join("out"));

        let first = saver.save(Bytes::from_static(b"1"), "a-no-bg.png").await.unwrap();
        let second = saver.save(Bytes::from_static(b"2"), "a-no-bg.png").await.unwrap();
        let third = saver.save(Bytes::from_static(b"3"), "a-no-bg.png").await.unwrap();

        assert_eq!(first.file_name().unwrap(), "a-no-bg.png");
        assert_eq!(second.file_name().unwrap(), "a-no-bg (1).png");
        assert_eq!(third.file_name().unwrap(), "a-no-bg (2).png");
        assert_eq!(std::fs::read(&second).unwrap(), b"2");
    }

    #[tokio::test]
    async fn strips_directories_from_suggested_names() {
        let dir = tempfile::tempdir().unwrap();
        let saver = DirectorySaver::new(dir.path());
        let path = saver.save(Bytes::from_static(b"x"), "../../evil.png").await.unwrap();
        assert_eq!(path, dir.path().join("evil.png"));
    }
}

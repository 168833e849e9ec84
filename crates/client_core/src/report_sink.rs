use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tracing::info;

use crate::error::SinkError;

/// Destination for downloaded report documents (the client-side "save as").
#[async_trait]
pub trait ReportSink: Send + Sync {
    async fn save(&self, file_name: &str, document: &[u8]) -> Result<PathBuf, SinkError>;
}

pub struct DirectoryReportSink {
    dir: PathBuf,
}

impl DirectoryReportSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

fn is_plain_file_name(file_name: &str) -> bool {
    let mut components = Path::new(file_name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

#[async_trait]
impl ReportSink for DirectoryReportSink {
    async fn save(&self, file_name: &str, document: &[u8]) -> Result<PathBuf, SinkError> {
        if !is_plain_file_name(file_name) {
            return Err(SinkError::InvalidFileName(file_name.to_string()));
        }

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| SinkError::Io {
                path: self.dir.clone(),
                source,
            })?;

        let path = self.dir.join(file_name);
        tokio::fs::write(&path, document)
            .await
            .map_err(|source| SinkError::Io {
                path: path.clone(),
                source,
            })?;

        info!(path = %path.display(), size_bytes = document.len(), "report saved");
        Ok(path)
    }
}

//! Temporary on-disk PDFs, one per request.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::{PdfGenError, Result};

/// A uniquely named `.pdf` path the browser writes into and the handler
/// reads back once. The file may not exist yet (or ever, if the render fails).
#[derive(Debug)]
pub struct TempArtifact {
    path: PathBuf,
}

impl TempArtifact {
    pub fn allocate(dir: &Path) -> Self {
        Self {
            path: dir.join(format!("{}.pdf", Uuid::new_v4())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn read(&self) -> Result<Vec<u8>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                Err(PdfGenError::ArtifactMissing(self.path.clone()))
            }
            Err(err) => Err(PdfGenError::Io(err)),
        }
    }

    /// Delete the file. A file that was never written counts as deleted.
    pub async fn remove(self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => {
                tracing::error!(
                    path = %self.path.display(),
                    error = %source,
                    "Could not delete file"
                );
                Err(PdfGenError::Delete {
                    path: self.path,
                    source,
                })
            }
        }
    }
}

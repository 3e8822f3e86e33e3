//! Transient uploaded files.
//!
//! An [`UploadedFile`] lives for one request. The gateway removes it
//! explicitly after the model call; any other exit path removes it when the
//! value is dropped.

use std::path::{Path, PathBuf};

use tempfile::TempPath;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors raised while spooling an upload to disk.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Upload directory unavailable: {0}")]
    Directory(std::io::Error),

    #[error("Failed to write upload: {0}")]
    Write(std::io::Error),
}

/// A file received with a chat message, spooled to the upload directory.
#[derive(Debug)]
pub struct UploadedFile {
    path: TempPath,
    file_name: String,
    mime_type: String,
}

impl UploadedFile {
    /// Write `bytes` to a fresh randomly named file under `dir`.
    pub async fn spool(
        dir: &Path,
        file_name: &str,
        mime_type: &str,
        bytes: &[u8],
    ) -> Result<Self, UploadError> {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(UploadError::Directory)?;

        let path = tempfile::Builder::new()
            .prefix("upload-")
            .tempfile_in(dir)
            .map_err(UploadError::Directory)?
            .into_temp_path();

        tokio::fs::write(&path, bytes)
            .await
            .map_err(UploadError::Write)?;

        debug!(path = %path.display(), file_name, mime_type, size = bytes.len(), "spooled upload");

        Ok(Self {
            path,
            file_name: file_name.to_string(),
            mime_type: mime_type.to_string(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Read the spooled bytes back.
    pub async fn read(&self) -> std::io::Result<Vec<u8>> {
        tokio::fs::read(&self.path).await
    }

    /// Delete the file now. A failure is logged, never returned.
    pub fn discard(self) {
        let path: PathBuf = self.path.to_path_buf();
        if let Err(e) = self.path.close() {
            warn!(path = %path.display(), "failed to remove upload: {e}");
        } else {
            debug!(path = %path.display(), "removed upload");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn spool_read_and_discard() {
        let dir = tempfile::tempdir().unwrap();
        let upload = UploadedFile::spool(dir.path(), "cat.png", "image/png", b"\x89PNG")
            .await
            .unwrap();

        let path = upload.path().to_path_buf();
        assert!(path.starts_with(dir.path()));
        assert_eq!(upload.file_name(), "cat.png");
        assert_eq!(upload.mime_type(), "image/png");
        assert_eq!(upload.read().await.unwrap(), b"\x89PNG");

        upload.discard();
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn drop_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let upload = UploadedFile::spool(dir.path(), "a.txt", "text/plain", b"hi")
            .await
            .unwrap();
        let path = upload.path().to_path_buf();
        drop(upload);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn spool_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("uploads");
        let upload = UploadedFile::spool(&nested, "a.txt", "text/plain", b"")
            .await
            .unwrap();
        assert!(upload.path().starts_with(&nested));
    }
}

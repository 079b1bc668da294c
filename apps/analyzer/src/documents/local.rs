use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{artifact_key, DocumentStore, StoreError, UploadedDocument};

/// Stores uploads as files under a single directory on local disk.
pub struct LocalDocumentStore {
    root: PathBuf,
}

impl LocalDocumentStore {
    /// Creates the directory if needed.
    pub async fn new(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root).await.map_err(|e| {
            StoreError::StorageFailure(format!("cannot create {}: {e}", root.display()))
        })?;
        Ok(Self { root })
    }
}

/// Removes a half-written upload. Failure leaves an orphan behind, so it is logged.
async fn discard_partial(path: &Path) {
    if let Err(e) = fs::remove_file(path).await {
        if e.kind() != IoErrorKind::NotFound {
            warn!("Failed to remove partial upload {}: {e}", path.display());
        }
    }
}

#[async_trait]
impl DocumentStore for LocalDocumentStore {
    async fn store(&self, data: Bytes, original_name: &str) -> Result<UploadedDocument, StoreError> {
        let id = Uuid::new_v4();
        let path = self.root.join(artifact_key(id, original_name));

        // create_new: a name clash is a bug, never an overwrite.
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| StoreError::StorageFailure(format!("open {}: {e}", path.display())))?;

        let written = async {
            file.write_all(&data).await?;
            file.flush().await
        }
        .await;

        if let Err(e) = written {
            discard_partial(&path).await;
            return Err(StoreError::StorageFailure(format!(
                "write {}: {e}",
                path.display()
            )));
        }

        debug!("Stored upload {} ({} bytes) at {}", id, data.len(), path.display());

        Ok(UploadedDocument {
            id,
            storage_path: path.to_string_lossy().into_owned(),
            original_name: original_name.to_string(),
            size_bytes: data.len() as u64,
            created_at: Utc::now(),
        })
    }

    async fn read(&self, doc: &UploadedDocument) -> Result<Bytes, StoreError> {
        match fs::read(&doc.storage_path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == IoErrorKind::NotFound => {
                Err(StoreError::NotFound(doc.storage_path.clone()))
            }
            Err(e) => Err(StoreError::StorageFailure(format!(
                "read {}: {e}",
                doc.storage_path
            ))),
        }
    }

    async fn release(&self, doc: UploadedDocument) -> Result<(), StoreError> {
        match fs::remove_file(&doc.storage_path).await {
            Ok(()) => {
                debug!("Released upload {}", doc.id);
                Ok(())
            }
            Err(e) if e.kind() == IoErrorKind::NotFound => Err(StoreError::NotFound(doc.storage_path)),
            Err(e) => Err(StoreError::StorageFailure(format!(
                "remove {}: {e}",
                doc.storage_path
            ))),
        }
    }
}

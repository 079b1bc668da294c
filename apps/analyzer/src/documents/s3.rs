use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use bytes::Bytes;
use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use super::{artifact_key, DocumentStore, StoreError, UploadedDocument};

const KEY_PREFIX: &str = "uploads";

/// Stores uploads as objects in an S3-compatible bucket (AWS or MinIO).
pub struct S3DocumentStore {
    client: S3Client,
    bucket: String,
}

impl S3DocumentStore {
    pub fn new(client: S3Client, bucket: String) -> Self {
        Self { client, bucket }
    }
}

fn object_key(id: Uuid, original_name: &str) -> String {
    format!("{KEY_PREFIX}/{}", artifact_key(id, original_name))
}

#[async_trait]
impl DocumentStore for S3DocumentStore {
    async fn store(&self, data: Bytes, original_name: &str) -> Result<UploadedDocument, StoreError> {
        let id = Uuid::new_v4();
        let key = object_key(id, original_name);
        let size_bytes = data.len() as u64;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .content_type("application/pdf")
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| {
                StoreError::StorageFailure(format!(
                    "put s3://{}/{key}: {}",
                    self.bucket,
                    DisplayErrorContext(&e)
                ))
            })?;

        debug!("Stored upload {} ({} bytes) at s3://{}/{}", id, size_bytes, self.bucket, key);

        Ok(UploadedDocument {
            id,
            storage_path: key,
            original_name: original_name.to_string(),
            size_bytes,
            created_at: Utc::now(),
        })
    }

    async fn read(&self, doc: &UploadedDocument) -> Result<Bytes, StoreError> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&doc.storage_path)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error().is_some_and(|se| se.is_no_such_key()) {
                    StoreError::NotFound(doc.storage_path.clone())
                } else {
                    StoreError::StorageFailure(format!(
                        "get s3://{}/{}: {}",
                        self.bucket,
                        doc.storage_path,
                        DisplayErrorContext(&e)
                    ))
                }
            })?;

        let body = output.body.collect().await.map_err(|e| {
            StoreError::StorageFailure(format!("read body of {}: {e}", doc.storage_path))
        })?;

        Ok(body.into_bytes())
    }

    async fn release(&self, doc: UploadedDocument) -> Result<(), StoreError> {
        // DeleteObject succeeds on missing keys, so check first to report double releases.
        self.client
            .head_object()
            .bucket(&self.bucket)
            .key(&doc.storage_path)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error().is_some_and(|se| se.is_not_found()) {
                    StoreError::NotFound(doc.storage_path.clone())
                } else {
                    StoreError::StorageFailure(format!(
                        "head s3://{}/{}: {}",
                        self.bucket,
                        doc.storage_path,
                        DisplayErrorContext(&e)
                    ))
                }
            })?;

        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(&doc.storage_path)
            .send()
            .await
            .map_err(|e| {
                StoreError::StorageFailure(format!(
                    "delete s3://{}/{}: {}",
                    self.bucket,
                    doc.storage_path,
                    DisplayErrorContext(&e)
                ))
            })?;

        debug!("Released upload {}", doc.id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_keys_live_under_prefix_and_are_unique() {
        let a = object_key(Uuid::new_v4(), "resume.pdf");
        let b = object_key(Uuid::new_v4(), "resume.pdf");
        assert!(a.starts_with("uploads/"));
        assert!(a.ends_with("-resume.pdf"));
        assert_ne!(a, b);
    }
}

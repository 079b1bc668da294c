//! Document Store: scoped, ephemeral storage for one uploaded resume per request.
//!
//! Every artifact gets a random UUID key, so concurrent uploads that share a
//! file name and arrive in the same clock tick never overwrite each other.
//! `release` consumes the handle: once released, a document cannot be released
//! again through the same handle.

pub mod local;
pub mod s3;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::errors::ErrorKind;

pub use local::LocalDocumentStore;
pub use s3::S3DocumentStore;

/// Longest file-name suffix kept in a storage key.
const MAX_NAME_SUFFIX_LEN: usize = 64;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage failure: {0}")]
    StorageFailure(String),

    #[error("artifact not found: {0}")]
    NotFound(String),
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::StorageFailure(_) => ErrorKind::StorageFailure,
            StoreError::NotFound(_) => ErrorKind::NotFound,
        }
    }
}

/// Handle to one stored upload. Owned by a single pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedDocument {
    pub id: Uuid,
    /// Backend-specific location (file path or object key).
    pub storage_path: String,
    pub original_name: String,
    pub size_bytes: u64,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn store(&self, data: Bytes, original_name: &str) -> Result<UploadedDocument, StoreError>;

    async fn read(&self, doc: &UploadedDocument) -> Result<Bytes, StoreError>;

    async fn release(&self, doc: UploadedDocument) -> Result<(), StoreError>;
}

/// Builds a collision-free storage key: `<uuid>-<sanitized name>`.
///
/// The name suffix is cosmetic; uniqueness comes from the UUID alone.
pub fn artifact_key(id: Uuid, original_name: &str) -> String {
    let suffix: String = original_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .take(MAX_NAME_SUFFIX_LEN)
        .collect();

    if suffix.is_empty() {
        id.to_string()
    } else {
        format!("{id}-{suffix}")
    }
}

//! Record store abstraction trait
//!
//! This module defines the `RecordStore` port every state backend implements.

use async_trait::async_trait;
use clipforge_core::ClientError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Read failed: {0}")]
    ReadFailed(String),

    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Invalid record key: {0}")]
    InvalidKey(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for ClientError {
    fn from(err: StorageError) -> Self {
        ClientError::Storage(err.to_string())
    }
}

/// Persistence port for a single client-side record.
///
/// Implementations hold at most one value of `T`. A record that cannot be
/// decoded (written by another client version, hand-edited) loads as `None`
/// rather than failing: these records carry no compatibility guarantees.
#[async_trait]
pub trait RecordStore<T>: Send + Sync
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    /// Load the stored record, if any
    async fn load(&self) -> StorageResult<Option<T>>;

    /// Replace the stored record
    async fn save(&self, record: &T) -> StorageResult<()>;

    /// Remove the stored record. Clearing an empty store is not an error.
    async fn clear(&self) -> StorageResult<()>;

    /// Backend identifier, for logging
    fn backend_name(&self) -> &'static str;
}

#[cfg(feature = "state-file")]
use crate::JsonFileStore;
#[cfg(feature = "state-memory")]
use crate::MemoryStore;
use crate::{RecordStore, StateBackend, StorageResult, OUTPUT_SETTINGS_KEY, UPLOAD_SESSION_KEY};
#[cfg(not(all(feature = "state-file", feature = "state-memory")))]
use crate::StorageError;
use clipforge_core::models::{OutputSettings, UploadSession};
use clipforge_core::ClientConfig;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

/// Create a record store for `key` based on configuration
pub async fn create_store<T>(
    config: &ClientConfig,
    key: &str,
) -> StorageResult<Arc<dyn RecordStore<T>>>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    match config.state_backend {
        #[cfg(feature = "state-file")]
        StateBackend::File => {
            let store = JsonFileStore::<T>::new(config.state_dir.clone(), key).await?;
            tracing::debug!(path = %store.path().display(), "Using file state store");
            Ok(Arc::new(store))
        }

        #[cfg(not(feature = "state-file"))]
        StateBackend::File => Err(StorageError::ConfigError(
            "File state backend not available (state-file feature not enabled)".to_string(),
        )),

        #[cfg(feature = "state-memory")]
        StateBackend::Memory => Ok(Arc::new(MemoryStore::<T>::new())),

        #[cfg(not(feature = "state-memory"))]
        StateBackend::Memory => Err(StorageError::ConfigError(
            "Memory state backend not available (state-memory feature not enabled)".to_string(),
        )),
    }
}

/// The records the client persists between runs.
#[derive(Clone)]
pub struct StateStores {
    pub session: Arc<dyn RecordStore<UploadSession>>,
    pub settings: Arc<dyn RecordStore<OutputSettings>>,
}

impl StateStores {
    pub async fn from_config(config: &ClientConfig) -> StorageResult<Self> {
        Ok(Self {
            session: create_store(config, UPLOAD_SESSION_KEY).await?,
            settings: create_store(config, OUTPUT_SETTINGS_KEY).await?,
        })
    }
}

#[cfg(all(test, feature = "state-file", feature = "state-memory"))]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_file_backend_from_config() {
        let dir = tempdir().unwrap();
        let config = ClientConfig {
            state_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        let stores = StateStores::from_config(&config).await.unwrap();
        assert_eq!(stores.session.backend_name(), "file");

        stores
            .session
            .save(&UploadSession {
                job_id: Some(9),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(dir.path().join("upload_session.json").exists());
    }

    #[tokio::test]
    async fn test_memory_backend_from_config() {
        let config = ClientConfig {
            state_backend: StateBackend::Memory,
            ..Default::default()
        };
        let stores = StateStores::from_config(&config).await.unwrap();
        assert_eq!(stores.settings.backend_name(), "memory");
        assert!(stores.settings.load().await.unwrap().is_none());
    }
}

//! Clipforge Storage Library
//!
//! Client-local persistence for the records the client keeps between runs:
//! the upload session resume record and the output settings. Every backend
//! implements the same `RecordStore` port (`load`/`save`/`clear`), so the upload
//! controller can be driven against an in-memory fake in tests and a JSON file
//! store in the CLI.
//!
//! # Record keys
//!
//! Each record lives under a fixed key (`upload_session`, `output_settings`).
//! The file backend stores a record as `{state_dir}/{key}.json`. Keys must not
//! contain path separators or `..`.

pub mod factory;
pub(crate) mod keys;
#[cfg(feature = "state-file")]
pub mod local;
#[cfg(feature = "state-memory")]
pub mod memory;
pub mod traits;

// Re-export commonly used types
pub use clipforge_core::StateBackend;
pub use factory::{create_store, StateStores};
pub use keys::{OUTPUT_SETTINGS_KEY, UPLOAD_SESSION_KEY};
#[cfg(feature = "state-file")]
pub use local::JsonFileStore;
#[cfg(feature = "state-memory")]
pub use memory::MemoryStore;
pub use traits::{RecordStore, StorageError, StorageResult};

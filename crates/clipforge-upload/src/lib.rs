//! Clipforge upload lifecycle
//!
//! `UploadSessionController` takes a local file through presign, the presigned
//! storage PUT, registration and job polling, persisting a resumable session
//! through a `RecordStore` once the job exists.

pub mod backend;
pub mod controller;
pub mod failure;
pub mod polling;
pub mod progress;
pub mod state;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use backend::UploadBackend;
pub use controller::UploadSessionController;
pub use failure::{Stage, UploadFailure, CORS_REMEDIATION};
pub use polling::{Backoff, JOB_TIMEOUT};
pub use state::{SelectedFile, UploadSnapshot, UploadState};

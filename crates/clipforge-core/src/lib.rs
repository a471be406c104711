//! Clipforge Core Library
//!
//! This crate provides the domain models, error types, configuration and input
//! validation shared by the Clipforge client crates (API client, upload
//! controller, CLI).

pub mod config;
pub mod decode;
pub mod error;
pub mod models;
pub mod state_types;
pub mod text;
pub mod validation;

// Re-export commonly used types
pub use config::ClientConfig;
pub use error::{looks_like_cors_failure, ClientError, ClientResult, ErrorMetadata, LogLevel};
pub use state_types::StateBackend;
pub use text::truncate_string;

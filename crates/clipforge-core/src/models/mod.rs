//! Data models for the client
//!
//! Wire types for the REST endpoints the client consumes, plus the records the
//! client persists locally (upload session, output settings).

mod account;
mod clip;
mod job;
mod session;
mod settings;
pub mod upload;

// Re-export all models for convenient imports
pub use account::*;
pub use clip::*;
pub use job::*;
pub use session::*;
pub use settings::*;
pub use upload::*;

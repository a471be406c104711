use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Backends for client-persisted state (upload session, output settings).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateBackend {
    /// One JSON file per record under the state directory.
    File,
    /// Process memory only; nothing survives a restart.
    Memory,
}

impl FromStr for StateBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "file" | "local" => Ok(StateBackend::File),
            "memory" => Ok(StateBackend::Memory),
            _ => Err(anyhow::anyhow!("Invalid state backend: {}", s)),
        }
    }
}

impl Display for StateBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            StateBackend::File => write!(f, "file"),
            StateBackend::Memory => write!(f, "memory"),
        }
    }
}

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use super::account::Plan;
use crate::error::ClientError;

/// Output frame for generated clips.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum AspectRatio {
    #[serde(rename = "9:16")]
    Portrait,
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "4:3")]
    Landscape,
}

impl Display for AspectRatio {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            AspectRatio::Portrait => write!(f, "9:16"),
            AspectRatio::Square => write!(f, "1:1"),
            AspectRatio::Landscape => write!(f, "4:3"),
        }
    }
}

impl FromStr for AspectRatio {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "9:16" => Ok(AspectRatio::Portrait),
            "1:1" => Ok(AspectRatio::Square),
            "4:3" => Ok(AspectRatio::Landscape),
            _ => Err(anyhow::anyhow!(
                "Invalid aspect ratio: {} (expected 9:16, 1:1 or 4:3)",
                s
            )),
        }
    }
}

/// Output settings chosen by the user, persisted client-side.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OutputSettings {
    #[serde(default)]
    pub aspect_ratio: Option<AspectRatio>,
    #[serde(default = "default_true")]
    pub captions_enabled: bool,
    #[serde(default)]
    pub watermark_enabled: bool,
    #[serde(default)]
    pub caption_style: Option<String>,
}

fn default_true() -> bool {
    true
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            aspect_ratio: None,
            captions_enabled: true,
            watermark_enabled: false,
            caption_style: None,
        }
    }
}

/// Settings as sent to `/uploads/register`, after plan rules are applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOutputSettings {
    pub aspect_ratio: AspectRatio,
    pub captions_enabled: bool,
    pub watermark_enabled: bool,
    pub caption_style: Option<String>,
}

impl OutputSettings {
    /// Apply plan rules. The free-plan watermark is a client convenience check;
    /// the backend stays the authority.
    pub fn resolve(&self, plan: &Plan) -> Result<ResolvedOutputSettings, ClientError> {
        let aspect_ratio = self.aspect_ratio.ok_or_else(|| {
            ClientError::Validation("Select an aspect ratio before uploading".to_string())
        })?;

        let caption_style = if self.captions_enabled {
            self.caption_style
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
        } else {
            None
        };

        Ok(ResolvedOutputSettings {
            aspect_ratio,
            captions_enabled: self.captions_enabled,
            watermark_enabled: self.watermark_enabled || plan.is_free(),
            caption_style,
        })
    }
}

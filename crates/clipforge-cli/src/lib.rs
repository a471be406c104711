use anyhow::Context;
use clap::Args;
use clipforge_core::config::LogFormat;
use clipforge_core::models::{AspectRatio, OutputSettings};
use clipforge_upload::{UploadSnapshot, UploadState};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing for the CLI. Logs go to stderr so stdout stays parseable.
pub fn init_tracing(format: LogFormat) {
    let registry = tracing_subscriber::registry().with(
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    );

    match format {
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}

pub fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

/// Output settings given on the command line; unset flags keep the stored value.
#[derive(Args, Debug, Clone, Default)]
pub struct SettingsOverrides {
    /// Output frame: 9:16, 1:1 or 4:3
    #[arg(long)]
    pub aspect_ratio: Option<AspectRatio>,
    /// Burn captions into the clips (true/false)
    #[arg(long)]
    pub captions: Option<bool>,
    /// Add the watermark (always on for the free plan)
    #[arg(long)]
    pub watermark: Option<bool>,
    /// Caption style preset; an empty value clears it
    #[arg(long)]
    pub caption_style: Option<String>,
}

impl SettingsOverrides {
    pub fn is_empty(&self) -> bool {
        self.aspect_ratio.is_none()
            && self.captions.is_none()
            && self.watermark.is_none()
            && self.caption_style.is_none()
    }

    pub fn apply(&self, mut settings: OutputSettings) -> OutputSettings {
        if let Some(aspect_ratio) = self.aspect_ratio {
            settings.aspect_ratio = Some(aspect_ratio);
        }
        if let Some(captions) = self.captions {
            settings.captions_enabled = captions;
        }
        if let Some(watermark) = self.watermark {
            settings.watermark_enabled = watermark;
        }
        if let Some(style) = &self.caption_style {
            let style = style.trim();
            settings.caption_style = (!style.is_empty()).then(|| style.to_string());
        }
        settings
    }
}

/// One status line for an upload snapshot.
pub fn progress_line(snapshot: &UploadSnapshot) -> String {
    let subject = snapshot
        .file
        .as_ref()
        .map(|f| f.name.clone())
        .or_else(|| snapshot.session.as_ref().and_then(|s| s.file_name.clone()))
        .unwrap_or_default();

    let mut line = format!("{:<10} {:>3}%", snapshot.state, snapshot.progress);
    if !subject.is_empty() {
        line.push_str("  ");
        line.push_str(&subject);
    }
    if let Some(job) = &snapshot.job {
        if snapshot.state == UploadState::Processing {
            line.push_str(&format!("  (job {} {})", job.id, job.status));
        }
    }
    if let Some(failure) = &snapshot.failure {
        line.push_str(&format!("  {}", failure));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use clipforge_core::models::{Job, JobStatus, UploadSession};
    use clipforge_upload::UploadFailure;

    #[test]
    fn test_overrides_keep_unset_values() {
        let stored = OutputSettings {
            aspect_ratio: Some(AspectRatio::Square),
            captions_enabled: true,
            watermark_enabled: false,
            caption_style: Some("bold".to_string()),
        };
        let overrides = SettingsOverrides {
            watermark: Some(true),
            ..Default::default()
        };
        let applied = overrides.apply(stored.clone());
        assert_eq!(applied.aspect_ratio, Some(AspectRatio::Square));
        assert!(applied.watermark_enabled);
        assert_eq!(applied.caption_style.as_deref(), Some("bold"));
        assert!(SettingsOverrides::default().is_empty());
    }

    #[test]
    fn test_overrides_clear_caption_style() {
        let stored = OutputSettings {
            caption_style: Some("bold".to_string()),
            ..Default::default()
        };
        let overrides = SettingsOverrides {
            aspect_ratio: Some(AspectRatio::Portrait),
            caption_style: Some("  ".to_string()),
            ..Default::default()
        };
        let applied = overrides.apply(stored);
        assert_eq!(applied.aspect_ratio, Some(AspectRatio::Portrait));
        assert!(applied.caption_style.is_none());
    }

    #[test]
    fn test_progress_line() {
        let snapshot = UploadSnapshot {
            state: UploadState::Processing,
            progress: 92,
            session: Some(UploadSession {
                file_name: Some("podcast.mp4".to_string()),
                ..Default::default()
            }),
            job: Some(Job {
                id: 77,
                upload_id: 42,
                status: JobStatus::Running,
                error: None,
                created_at: None,
                updated_at: None,
            }),
            ..Default::default()
        };
        assert_eq!(
            progress_line(&snapshot),
            "processing  92%  podcast.mp4  (job 77 running)"
        );

        let failed = UploadSnapshot {
            state: UploadState::Error,
            failure: Some(UploadFailure::new("Upload failed (HTTP 403)", "AccessDenied")),
            ..Default::default()
        };
        assert_eq!(
            progress_line(&failed),
            "error        0%  Upload failed (HTTP 403): AccessDenied"
        );
    }
}

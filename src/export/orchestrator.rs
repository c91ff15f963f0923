use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::assets::decode::LoadedFont;
use crate::encode::budget::encode_within_budget;
use crate::encode::gif::GifAnimationEncoder;
use crate::encode::webp_mux::WebpAnimationEncoder;
use crate::encode::{AnimationEncoder, OutputFormat};
use crate::foundation::error::{FlipreelError, FlipreelResult};
use crate::model::frame::SourceFrame;
use crate::model::settings::AnimationSettings;
use crate::timeline::expand::{RenderThreading, render_timeline};

#[derive(Clone, Debug)]
/// Knobs for [`export_animation`] that are not part of the animation itself.
pub struct ExportOpts {
    pub format: OutputFormat,
    pub threading: RenderThreading,
}

impl Default for ExportOpts {
    fn default() -> Self {
        Self {
            format: OutputFormat::Webp,
            threading: RenderThreading::default(),
        }
    }
}

#[derive(Clone, Debug)]
/// Finished animated file.
pub struct ExportArtifact {
    pub bytes: Vec<u8>,
    pub format: OutputFormat,
    pub width: u32,
    pub height: u32,
    /// Quality of the last encode attempt, used in the filename.
    pub final_quality: u8,
    pub attempts: u32,
    pub budget_met: bool,
}

impl ExportArtifact {
    /// `Anim-{width}x{height}-{quality}.{ext}`.
    pub fn filename(&self) -> String {
        format!(
            "Anim-{}x{}-{}.{}",
            self.width,
            self.height,
            self.final_quality,
            self.format.extension()
        )
    }

    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    /// Write the artifact into `dir` under [`ExportArtifact::filename`].
    pub fn write_to_dir(&self, dir: &Path) -> FlipreelResult<PathBuf> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("create output directory '{}'", dir.display()))?;
        let path = dir.join(self.filename());
        std::fs::write(&path, &self.bytes)
            .with_context(|| format!("write artifact '{}'", path.display()))?;
        Ok(path)
    }
}

/// Render the timeline and encode it in the requested format.
pub fn export_animation(
    frames: &[SourceFrame],
    settings: &AnimationSettings,
    font: Option<&LoadedFont>,
    opts: &ExportOpts,
) -> FlipreelResult<ExportArtifact> {
    match opts.format {
        OutputFormat::Webp => {
            let encoder = WebpAnimationEncoder::default()
                .with_parallel(opts.threading.parallel)
                .with_threads(opts.threading.threads);
            export_with_encoder(frames, settings, font, &encoder, &opts.threading)
        }
        OutputFormat::Gif => export_with_encoder(
            frames,
            settings,
            font,
            &GifAnimationEncoder::default(),
            &opts.threading,
        ),
    }
}

/// [`export_animation`] with a caller-supplied encoder.
#[tracing::instrument(skip_all, fields(frames = frames.len(), format = ?encoder.format()))]
pub fn export_with_encoder(
    frames: &[SourceFrame],
    settings: &AnimationSettings,
    font: Option<&LoadedFont>,
    encoder: &dyn AnimationEncoder,
    threading: &RenderThreading,
) -> FlipreelResult<ExportArtifact> {
    if frames.is_empty() {
        return Err(FlipreelError::validation("export needs at least one frame"));
    }
    settings.validate()?;

    let instants = render_timeline(frames, settings, font, threading)?;
    tracing::info!(instants = instants.len(), "timeline rendered; encoding");

    let outcome = encode_within_budget(encoder, &instants, settings)?;
    tracing::info!(
        bytes = outcome.bytes.len(),
        quality = outcome.quality,
        attempts = outcome.attempts,
        budget_met = outcome.budget_met,
        "export finished"
    );

    Ok(ExportArtifact {
        bytes: outcome.bytes,
        format: outcome.format,
        width: settings.width,
        height: settings.height,
        final_quality: outcome.quality,
        attempts: outcome.attempts,
        budget_met: outcome.budget_met,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/export/orchestrator.rs"]
mod tests;

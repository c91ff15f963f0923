use crate::encode::{AnimationEncoder, EncodeParams, OutputFormat};
use crate::foundation::error::FlipreelResult;
use crate::model::settings::AnimationSettings;
use crate::timeline::expand::RenderedInstant;

/// Upper bound on encode attempts under a byte budget.
pub const MAX_ATTEMPTS: u32 = 10;

/// Highest starting quality for WebP under a byte budget.
pub const WEBP_BUDGET_QUALITY_CAP: u8 = 90;

#[derive(Clone, Debug)]
/// Result of the size-constrained encode loop.
pub struct EncodeOutcome {
    pub bytes: Vec<u8>,
    pub format: OutputFormat,
    /// Quality the returned bytes were encoded at.
    pub quality: u8,
    pub attempts: u32,
    /// `false` when a budget was set and the returned artifact still exceeds it.
    pub budget_met: bool,
}

/// Quality points to drop for an output `ratio` times over budget.
pub fn quality_drop(ratio: f64) -> u8 {
    if ratio > 4.0 {
        40
    } else if ratio > 3.0 {
        30
    } else if ratio > 2.0 {
        20
    } else if ratio > 1.3 {
        10
    } else {
        5
    }
}

/// Encode `instants`, lowering quality until the result fits `settings.max_file_size`.
///
/// Without a budget the encoder runs exactly once. Encoder errors abort immediately.
#[tracing::instrument(
    skip_all,
    fields(format = ?encoder.format(), budget = settings.max_file_size, instants = instants.len())
)]
pub fn encode_within_budget(
    encoder: &dyn AnimationEncoder,
    instants: &[RenderedInstant],
    settings: &AnimationSettings,
) -> FlipreelResult<EncodeOutcome> {
    let params = EncodeParams::from_settings(settings)?;
    let format = encoder.format();
    let max = settings.max_file_size;

    if max == 0 {
        let bytes = encoder.encode(instants, settings.quality, &params)?;
        return Ok(EncodeOutcome {
            bytes,
            format,
            quality: settings.quality,
            attempts: 1,
            budget_met: true,
        });
    }

    let mut quality = settings.quality.clamp(1, 100);
    if format == OutputFormat::Webp {
        quality = quality.min(WEBP_BUDGET_QUALITY_CAP);
    }

    let mut attempts = 0;
    loop {
        attempts += 1;
        let bytes = encoder.encode(instants, quality, &params)?;
        let size = bytes.len() as u64;
        if size <= max {
            tracing::debug!(attempt = attempts, quality, size, "artifact within budget");
            return Ok(EncodeOutcome {
                bytes,
                format,
                quality,
                attempts,
                budget_met: true,
            });
        }

        if quality <= 1 || attempts >= MAX_ATTEMPTS {
            tracing::warn!(
                attempts,
                quality,
                size,
                max,
                "size budget not met; returning the last artifact"
            );
            return Ok(EncodeOutcome {
                bytes,
                format,
                quality,
                attempts,
                budget_met: false,
            });
        }

        let ratio = size as f64 / max as f64;
        let drop = quality_drop(ratio);
        tracing::debug!(
            attempt = attempts,
            quality,
            size,
            ratio,
            drop,
            "over budget; lowering quality"
        );
        quality = quality.saturating_sub(drop).max(1);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/budget.rs"]
mod tests;

use anyhow::Context;

use crate::foundation::error::{FlipreelError, FlipreelResult};

/// Single-image codec service: straight RGBA8 plus a quality fraction in, one encoded file out.
pub trait StillImageEncoder: Send + Sync {
    /// `quality` is a fraction in `(0, 1]`.
    fn encode_rgba(
        &self,
        rgba: &[u8],
        width: u32,
        height: u32,
        quality: f32,
    ) -> FlipreelResult<Vec<u8>>;
}

#[derive(Clone, Copy, Debug, Default)]
/// WebP still encoder built on the `image` crate's VP8L writer.
///
/// Quality below `1.0` discretizes channel precision before the lossless pass, so lower quality
/// reliably yields smaller bitstreams.
pub struct LosslessWebpEncoder;

impl StillImageEncoder for LosslessWebpEncoder {
    fn encode_rgba(
        &self,
        rgba: &[u8],
        width: u32,
        height: u32,
        quality: f32,
    ) -> FlipreelResult<Vec<u8>> {
        let expected = (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(4);
        if rgba.len() != expected {
            return Err(FlipreelError::encode(format!(
                "still encoder expects {expected} bytes for {width}x{height}, got {}",
                rgba.len()
            )));
        }
        if !quality.is_finite() || quality <= 0.0 || quality > 1.0 {
            return Err(FlipreelError::encode(format!(
                "still encoder quality must be in (0,1], got {quality}"
            )));
        }

        let bits = discretize_bits(quality);
        let pixels = if bits == 0 {
            std::borrow::Cow::Borrowed(rgba)
        } else {
            let mut owned = rgba.to_vec();
            for v in &mut owned {
                *v = find_closest_discretized(*v, bits);
            }
            std::borrow::Cow::Owned(owned)
        };

        let mut out = Vec::new();
        image::codecs::webp::WebPEncoder::new_lossless(&mut out)
            .encode(&pixels, width, height, image::ExtendedColorType::Rgba8)
            .context("encode webp still")
            .map_err(|e| FlipreelError::encode(format!("{e:#}")))?;
        Ok(out)
    }
}

/// Low bits dropped per channel: `5 - q/20` for `q = quality * 100`, `0` at full quality.
pub(crate) fn discretize_bits(quality: f32) -> u8 {
    let q = (quality.clamp(0.0, 1.0) * 100.0).round() as u8;
    if q >= 100 { 0 } else { 5 - q / 20 }
}

/// Nearest multiple of `1 << bits`, ties to even, clamped to 255.
pub(crate) fn find_closest_discretized(a: u8, bits: u8) -> u8 {
    let a = u32::from(a);
    let mask = (1u32 << bits) - 1;
    let biased = a + (mask >> 1) + ((a >> bits) & 1);
    if biased > 0xff {
        0xff
    } else {
        (biased & !mask) as u8
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/still.rs"]
mod tests;

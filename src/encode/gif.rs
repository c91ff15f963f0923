//! Indexed-color GIF assembly with quality-driven palette sizes.

use std::borrow::Cow;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use color_quant::NeuQuant;

use crate::encode::{AnimationEncoder, EncodeParams, OutputFormat};
use crate::foundation::error::{FlipreelError, FlipreelResult};
use crate::timeline::expand::RenderedInstant;

/// Palette size for a quality: `round((q/100)^2 * 256)` clamped to `2..=256`.
pub fn gif_color_count(quality: u8) -> usize {
    let q = (f64::from(quality) / 100.0).clamp(0.01, 1.0);
    ((q * q * 256.0).round() as usize).clamp(2, 256)
}

/// GIF delay in centiseconds for a duration in milliseconds.
pub fn gif_delay_cs(duration_ms: f64) -> u16 {
    (duration_ms / 10.0).round().clamp(1.0, f64::from(u16::MAX)) as u16
}

struct Indexed {
    palette: Vec<u8>,
    indices: Vec<u8>,
}

/// Map straight RGBA8 pixels onto at most `colors` palette entries.
///
/// Frames that already fit use an exact palette; the rest go through NeuQuant.
fn quantize(rgba: &[u8], colors: usize, sample_factor: i32) -> Indexed {
    let mut exact = BTreeSet::<[u8; 3]>::new();
    for px in rgba.chunks_exact(4) {
        exact.insert([px[0], px[1], px[2]]);
        if exact.len() > colors {
            break;
        }
    }

    if exact.len() <= colors {
        let lookup: HashMap<[u8; 3], u8> = exact
            .iter()
            .enumerate()
            .map(|(i, c)| (*c, i as u8))
            .collect();
        let palette = exact.iter().flat_map(|c| c.iter().copied()).collect();
        let indices = rgba
            .chunks_exact(4)
            .map(|px| lookup.get(&[px[0], px[1], px[2]]).copied().unwrap_or(0))
            .collect();
        return Indexed { palette, indices };
    }

    let nq = NeuQuant::new(sample_factor, colors, rgba);
    let indices = rgba.chunks_exact(4).map(|px| nq.index_of(px) as u8).collect();
    Indexed {
        palette: nq.color_map_rgb(),
        indices,
    }
}

#[derive(Clone, Copy, Debug)]
/// Animated GIF encoder.
pub struct GifAnimationEncoder {
    /// NeuQuant sampling factor, `1` (best) to `30` (fastest).
    pub sample_factor: i32,
}

impl Default for GifAnimationEncoder {
    fn default() -> Self {
        Self { sample_factor: 10 }
    }
}

impl AnimationEncoder for GifAnimationEncoder {
    fn format(&self) -> OutputFormat {
        OutputFormat::Gif
    }

    fn encode(
        &self,
        instants: &[RenderedInstant],
        quality: u8,
        params: &EncodeParams,
    ) -> FlipreelResult<Vec<u8>> {
        encode_gif(
            instants,
            params.width,
            params.height,
            params.loop_forever,
            quality,
            self.sample_factor,
        )
    }
}

/// Write every instant as one full-canvas GIF frame.
pub fn encode_gif(
    instants: &[RenderedInstant],
    width: u32,
    height: u32,
    loop_forever: bool,
    quality: u8,
    sample_factor: i32,
) -> FlipreelResult<Vec<u8>> {
    if instants.is_empty() {
        return Err(FlipreelError::encode("gif needs at least one frame"));
    }
    let w: u16 = width
        .try_into()
        .map_err(|_| FlipreelError::encode("gif width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| FlipreelError::encode("gif height exceeds u16"))?;
    if !(1..=30).contains(&sample_factor) {
        return Err(FlipreelError::validation(
            "gif sample_factor must be within 1..=30",
        ));
    }
    let colors = gif_color_count(quality);

    let mut buf = Vec::new();
    {
        let mut encoder = gif::Encoder::new(&mut buf, w, h, &[])
            .map_err(|e| FlipreelError::encode(format!("gif header: {e}")))?;
        if loop_forever {
            encoder
                .set_repeat(gif::Repeat::Infinite)
                .map_err(|e| FlipreelError::encode(format!("gif loop extension: {e}")))?;
        }

        let mut cache = HashMap::<*const Vec<u8>, Arc<Indexed>>::new();
        for inst in instants {
            if inst.width != width || inst.height != height {
                return Err(FlipreelError::encode(format!(
                    "instant is {}x{}, expected {width}x{height}",
                    inst.width, inst.height
                )));
            }
            let indexed = cache
                .entry(Arc::as_ptr(&inst.rgba))
                .or_insert_with(|| Arc::new(quantize(&inst.rgba, colors, sample_factor)))
                .clone();

            let frame = gif::Frame {
                width: w,
                height: h,
                delay: gif_delay_cs(inst.duration_ms),
                dispose: gif::DisposalMethod::Keep,
                transparent: None,
                palette: Some(indexed.palette.clone()),
                buffer: Cow::Borrowed(&indexed.indices[..]),
                ..gif::Frame::default()
            };
            encoder
                .write_frame(&frame)
                .map_err(|e| FlipreelError::encode(format!("gif frame: {e}")))?;
        }
    }
    Ok(buf)
}

#[cfg(test)]
#[path = "../../tests/unit/encode/gif.rs"]
mod tests;

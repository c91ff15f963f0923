//! Animated WebP container assembly from single-image WebP files.

use std::collections::HashMap;
use std::sync::Arc;

use rayon::prelude::*;

use crate::encode::still::{LosslessWebpEncoder, StillImageEncoder};
use crate::encode::{AnimationEncoder, EncodeParams, OutputFormat};
use crate::foundation::error::{FlipreelError, FlipreelResult};
use crate::timeline::expand::{RenderedInstant, build_thread_pool};

const VP8X_FLAG_ANIMATION: u8 = 1 << 1;
const VP8X_FLAG_ALPHA: u8 = 1 << 4;
const ANIM_BACKGROUND: u32 = 0xFFFF_FFFF;
const MAX_U24: u32 = 0xFF_FFFF;

#[derive(Clone, Debug)]
/// One encoded single-image WebP file and its display time.
pub struct WebPFrame {
    pub bytes: Arc<Vec<u8>>,
    pub duration_ms: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// Raw codec bitstream found inside a WebP file.
pub struct Bitstream<'a> {
    /// `b"VP8 "` or `b"VP8L"`.
    pub fourcc: [u8; 4],
    pub data: &'a [u8],
}

/// Payload of the first `VP8 ` or `VP8L` chunk after the RIFF header.
pub fn extract_bitstream(webp: &[u8]) -> FlipreelResult<Bitstream<'_>> {
    if webp.len() < 12 || &webp[0..4] != b"RIFF" || &webp[8..12] != b"WEBP" {
        return Err(FlipreelError::encode("still image is not a RIFF/WEBP file"));
    }
    let mut offset = 12usize;
    while offset + 8 <= webp.len() {
        let fourcc: [u8; 4] = [
            webp[offset],
            webp[offset + 1],
            webp[offset + 2],
            webp[offset + 3],
        ];
        let size = u32::from_le_bytes([
            webp[offset + 4],
            webp[offset + 5],
            webp[offset + 6],
            webp[offset + 7],
        ]) as usize;
        let start = offset + 8;
        let end = start
            .checked_add(size)
            .filter(|&e| e <= webp.len())
            .ok_or_else(|| {
                FlipreelError::encode(format!(
                    "chunk '{}' overruns the file",
                    String::from_utf8_lossy(&fourcc)
                ))
            })?;
        if &fourcc == b"VP8 " || &fourcc == b"VP8L" {
            return Ok(Bitstream {
                fourcc,
                data: &webp[start..end],
            });
        }
        offset = end + (size % 2);
    }
    Err(FlipreelError::encode("no VP8/VP8L chunk in still image"))
}

trait ChunkWriter {
    fn write_u16_le(&mut self, v: u16);
    fn write_u24_le(&mut self, v: u32);
    fn write_u32_le(&mut self, v: u32);
}

impl ChunkWriter for Vec<u8> {
    fn write_u16_le(&mut self, v: u16) {
        self.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u24_le(&mut self, v: u32) {
        self.extend_from_slice(&v.to_le_bytes()[..3]);
    }

    fn write_u32_le(&mut self, v: u32) {
        self.extend_from_slice(&v.to_le_bytes());
    }
}

fn u24(v: u32, what: &str) -> FlipreelResult<u32> {
    if v > MAX_U24 {
        return Err(FlipreelError::encode(format!("{what} {v} exceeds 24 bits")));
    }
    Ok(v)
}

fn u32_len(len: usize) -> FlipreelResult<u32> {
    u32::try_from(len).map_err(|_| FlipreelError::encode("animated webp exceeds 4 GiB"))
}

/// Assemble single-image WebP files into one animated container, in order.
///
/// ANMF offsets are written as raw zero and every frame spans the full canvas.
pub fn mux_animated(
    frames: &[WebPFrame],
    width: u32,
    height: u32,
    loop_forever: bool,
) -> FlipreelResult<Vec<u8>> {
    if frames.is_empty() {
        return Err(FlipreelError::encode("animated webp needs at least one frame"));
    }
    if width == 0 || height == 0 {
        return Err(FlipreelError::encode("animated webp canvas must be non-empty"));
    }
    let w1 = u24(width - 1, "canvas width")?;
    let h1 = u24(height - 1, "canvas height")?;

    let bitstreams = frames
        .iter()
        .map(|f| extract_bitstream(&f.bytes))
        .collect::<FlipreelResult<Vec<_>>>()?;

    let mut total = 12usize + 18 + 14;
    for b in &bitstreams {
        let payload = 16 + 8 + b.data.len();
        total += 8 + payload + (payload % 2);
    }

    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(b"RIFF");
    out.write_u32_le(u32_len(total - 8)?);
    out.extend_from_slice(b"WEBP");

    out.extend_from_slice(b"VP8X");
    out.write_u32_le(10);
    out.push(VP8X_FLAG_ANIMATION | VP8X_FLAG_ALPHA);
    out.extend_from_slice(&[0; 3]);
    out.write_u24_le(w1);
    out.write_u24_le(h1);

    out.extend_from_slice(b"ANIM");
    out.write_u32_le(6);
    out.write_u32_le(ANIM_BACKGROUND);
    out.write_u16_le(if loop_forever { 0 } else { 1 });

    for (frame, b) in frames.iter().zip(&bitstreams) {
        let payload = 16 + 8 + b.data.len();
        let duration = u24(frame.duration_ms.round().max(0.0) as u32, "frame duration")?;

        out.extend_from_slice(b"ANMF");
        out.write_u32_le(u32_len(payload)?);
        out.write_u24_le(0);
        out.write_u24_le(0);
        out.write_u24_le(w1);
        out.write_u24_le(h1);
        out.write_u24_le(duration);
        out.push(0);
        out.extend_from_slice(&b.fourcc);
        out.write_u32_le(u32_len(b.data.len())?);
        out.extend_from_slice(b.data);
        if payload % 2 == 1 {
            out.push(0);
        }
    }

    debug_assert_eq!(out.len(), total);
    Ok(out)
}

/// Animated WebP: every instant through a [`StillImageEncoder`], then [`mux_animated`].
pub struct WebpAnimationEncoder<E = LosslessWebpEncoder> {
    still: E,
    parallel: bool,
    threads: Option<usize>,
}

impl Default for WebpAnimationEncoder<LosslessWebpEncoder> {
    fn default() -> Self {
        Self::new(LosslessWebpEncoder)
    }
}

impl<E: StillImageEncoder> WebpAnimationEncoder<E> {
    pub fn new(still: E) -> Self {
        Self {
            still,
            parallel: false,
            threads: None,
        }
    }

    /// Encode distinct instants on a rayon pool.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Worker count for the parallel encode pool; `None` lets rayon decide.
    pub fn with_threads(mut self, threads: Option<usize>) -> Self {
        self.threads = threads;
        self
    }
}

/// WebP quality fraction for an integer quality, capped at `0.9` under a byte budget.
pub fn webp_quality_fraction(quality: u8, budget_active: bool) -> f32 {
    let mut q = f32::from(quality) / 100.0;
    if budget_active {
        q = q.min(0.9);
    }
    q.clamp(0.01, 1.0)
}

impl<E: StillImageEncoder> AnimationEncoder for WebpAnimationEncoder<E> {
    fn format(&self) -> OutputFormat {
        OutputFormat::Webp
    }

    fn encode(
        &self,
        instants: &[RenderedInstant],
        quality: u8,
        params: &EncodeParams,
    ) -> FlipreelResult<Vec<u8>> {
        let fraction = webp_quality_fraction(quality, params.budget_active);

        // Elided instants share one pixel buffer; encode each buffer once.
        let mut slot_of = HashMap::<*const Vec<u8>, usize>::new();
        let mut unique = Vec::<&RenderedInstant>::new();
        let slots: Vec<usize> = instants
            .iter()
            .map(|inst| {
                *slot_of.entry(Arc::as_ptr(&inst.rgba)).or_insert_with(|| {
                    unique.push(inst);
                    unique.len() - 1
                })
            })
            .collect();

        let encode_one = |inst: &&RenderedInstant| -> FlipreelResult<Arc<Vec<u8>>> {
            if inst.width != params.width || inst.height != params.height {
                return Err(FlipreelError::encode(format!(
                    "instant is {}x{}, expected {}x{}",
                    inst.width, inst.height, params.width, params.height
                )));
            }
            self.still
                .encode_rgba(&inst.rgba, inst.width, inst.height, fraction)
                .map(Arc::new)
        };
        let encoded: Vec<FlipreelResult<Arc<Vec<u8>>>> = if self.parallel {
            let pool = build_thread_pool(self.threads)?;
            pool.install(|| unique.par_iter().map(encode_one).collect())
        } else {
            unique.iter().map(encode_one).collect()
        };
        let encoded = encoded.into_iter().collect::<FlipreelResult<Vec<_>>>()?;

        let frames: Vec<WebPFrame> = instants
            .iter()
            .zip(slots)
            .map(|(inst, slot)| WebPFrame {
                bytes: Arc::clone(&encoded[slot]),
                duration_ms: inst.duration_ms,
            })
            .collect();
        mux_animated(&frames, params.width, params.height, params.loop_forever)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/webp_mux.rs"]
mod tests;

use std::sync::Arc;

use crate::foundation::error::{FlipreelError, FlipreelResult};
use crate::foundation::math::premultiply_rgba8_in_place;
use crate::geometry::crop::{CropBox, resolve_crop};

/// Smallest accepted per-frame duration multiplier.
pub const MIN_DURATION_MULTIPLIER: f64 = 0.1;

#[derive(Clone, Debug, PartialEq, Eq)]
/// Decoded source image in premultiplied RGBA8 form.
pub struct SourceImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel bytes in row-major premultiplied RGBA8.
    pub rgba8_premul: Arc<Vec<u8>>,
}

impl SourceImage {
    /// Wrap straight-alpha RGBA8 pixels, premultiplying them.
    pub fn from_straight_rgba(width: u32, height: u32, mut rgba: Vec<u8>) -> FlipreelResult<Self> {
        if width == 0 || height == 0 {
            return Err(FlipreelError::validation("source image must be non-empty"));
        }
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(4))
            .ok_or_else(|| FlipreelError::validation("source image size overflow"))?;
        if rgba.len() != expected {
            return Err(FlipreelError::validation(format!(
                "source image expects {expected} bytes for {width}x{height}, got {}",
                rgba.len()
            )));
        }
        premultiply_rgba8_in_place(&mut rgba);
        Ok(Self {
            width,
            height,
            rgba8_premul: Arc::new(rgba),
        })
    }

    /// Single-color image; handy for placeholders and tests.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> FlipreelResult<Self> {
        let px = (width as usize).saturating_mul(height as usize);
        Self::from_straight_rgba(width, height, rgba.repeat(px))
    }
}

#[derive(Clone, Debug)]
/// One still of the animation with its crop and timing.
pub struct SourceFrame {
    /// Stable identifier within a frame list.
    pub id: String,
    pub image: Arc<SourceImage>,
    pub crop: CropBox,
    /// Scales the base frame duration; at least [`MIN_DURATION_MULTIPLIER`].
    pub duration_multiplier: f64,
}

impl SourceFrame {
    /// Frame showing the full image at the base duration.
    pub fn new(id: impl Into<String>, image: Arc<SourceImage>) -> Self {
        let crop = CropBox::full(image.width, image.height);
        Self {
            id: id.into(),
            image,
            crop,
            duration_multiplier: 1.0,
        }
    }

    pub fn with_crop(mut self, crop: CropBox) -> Self {
        self.crop = crop;
        self
    }

    pub fn with_duration_multiplier(mut self, multiplier: f64) -> Self {
        self.duration_multiplier = multiplier;
        self
    }

    /// Re-derive the crop from an aspect-ratio token unless it was set by hand.
    pub fn apply_aspect_ratio(&mut self, token: &str) {
        if !self.crop.is_custom {
            self.crop = resolve_crop(self.image.width, self.image.height, token);
        }
    }

    pub fn validate(&self) -> FlipreelResult<()> {
        if !self.duration_multiplier.is_finite()
            || self.duration_multiplier < MIN_DURATION_MULTIPLIER
        {
            return Err(FlipreelError::validation(format!(
                "frame '{}' duration multiplier must be >= {MIN_DURATION_MULTIPLIER}",
                self.id
            )));
        }
        self.crop
            .validate()
            .map_err(|e| FlipreelError::validation(format!("frame '{}': {e}", self.id)))
    }
}

/// Reverse playback order in place.
pub fn reverse_frames(frames: &mut [SourceFrame]) {
    frames.reverse();
}

/// Insert a copy of frame `id` right after it; returns the copy's index.
pub fn duplicate_frame(frames: &mut Vec<SourceFrame>, id: &str) -> Option<usize> {
    let index = frames.iter().position(|f| f.id == id)?;
    let mut copy = frames[index].clone();
    let mut n = 1usize;
    copy.id = loop {
        let candidate = format!("{id}-{n}");
        if !frames.iter().any(|f| f.id == candidate) {
            break candidate;
        }
        n += 1;
    };
    frames.insert(index + 1, copy);
    Some(index + 1)
}

/// Remove frame `id`; returns whether anything was removed.
pub fn remove_frame(frames: &mut Vec<SourceFrame>, id: &str) -> bool {
    let before = frames.len();
    frames.retain(|f| f.id != id);
    frames.len() != before
}

#[cfg(test)]
#[path = "../../tests/unit/model/frame.rs"]
mod tests;

//! Crop boxes and output sizing.
//!
//! Everything here is pure arithmetic on source dimensions. Malformed aspect-ratio tokens are not
//! errors: they fall back to the full, uncropped frame.

use crate::foundation::core::Canvas;
use crate::foundation::error::{FlipreelError, FlipreelResult};

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Source-space rectangle selecting the visible part of a frame image.
pub struct CropBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// `true` when set by hand rather than derived from an aspect-ratio token.
    #[serde(default)]
    pub is_custom: bool,
}

impl CropBox {
    /// The whole image, not marked custom.
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: f64::from(width),
            height: f64::from(height),
            is_custom: false,
        }
    }

    pub fn validate(&self) -> FlipreelResult<()> {
        if !(self.width.is_finite() && self.height.is_finite()) {
            return Err(FlipreelError::validation("crop width/height must be finite"));
        }
        if self.width <= 0.0 || self.height <= 0.0 {
            return Err(FlipreelError::validation("crop width/height must be > 0"));
        }
        if !(self.x.is_finite() && self.y.is_finite()) {
            return Err(FlipreelError::validation("crop x/y must be finite"));
        }
        Ok(())
    }
}

/// Parse a `"W:H"` token into a ratio; `None` for `original`, `free` and anything degenerate.
pub fn parse_aspect_ratio(token: &str) -> Option<f64> {
    let token = token.trim();
    if token.eq_ignore_ascii_case("original") || token.eq_ignore_ascii_case("free") {
        return None;
    }
    let (w, h) = token.split_once(':')?;
    let w: f64 = w.trim().parse().ok()?;
    let h: f64 = h.trim().parse().ok()?;
    if !w.is_finite() || !h.is_finite() || h == 0.0 {
        return None;
    }
    let ratio = w / h;
    (ratio.is_finite() && ratio > 0.0).then_some(ratio)
}

/// Centered crop of a `source_width × source_height` image for an aspect-ratio token.
pub fn resolve_crop(source_width: u32, source_height: u32, token: &str) -> CropBox {
    let full = CropBox::full(source_width, source_height);
    let Some(ratio) = parse_aspect_ratio(token) else {
        return full;
    };
    if source_width == 0 || source_height == 0 {
        return full;
    }

    let sw = f64::from(source_width);
    let sh = f64::from(source_height);
    if sw / sh > ratio {
        let target_w = sh * ratio;
        CropBox {
            x: (sw - target_w) / 2.0,
            width: target_w,
            ..full
        }
    } else {
        let target_h = sw / ratio;
        CropBox {
            y: (sh - target_h) / 2.0,
            height: target_h,
            ..full
        }
    }
}

/// Output size for a crop scaled to fit `max_width × max_height`; a `0` limit leaves that axis
/// unconstrained.
pub fn fit_output_size(crop: &CropBox, max_width: u32, max_height: u32) -> FlipreelResult<Canvas> {
    crop.validate()?;
    let scale_w = if max_width > 0 {
        f64::from(max_width) / crop.width
    } else {
        1.0
    };
    let scale_h = if max_height > 0 {
        f64::from(max_height) / crop.height
    } else {
        1.0
    };
    let scale = scale_w.min(scale_h);
    let w = (crop.width * scale).round().max(1.0);
    let h = (crop.height * scale).round().max(1.0);
    Canvas::new(w as u32, h as u32)
}

/// Carry a crop made on one image over to another image by relative center and relative size.
pub fn propagate_crop(
    crop: &CropBox,
    from: (u32, u32),
    to: (u32, u32),
) -> FlipreelResult<CropBox> {
    crop.validate()?;
    if from.0 == 0 || from.1 == 0 {
        return Err(FlipreelError::validation(
            "crop source image must have non-zero size",
        ));
    }
    let (fw, fh) = (f64::from(from.0), f64::from(from.1));
    let (tw, th) = (f64::from(to.0), f64::from(to.1));

    let center_x = (crop.x + crop.width / 2.0) / fw;
    let center_y = (crop.y + crop.height / 2.0) / fh;
    let width = crop.width / fw * tw;
    let height = crop.height / fh * th;

    let out = CropBox {
        x: center_x * tw - width / 2.0,
        y: center_y * th - height / 2.0,
        width,
        height,
        is_custom: true,
    };
    out.validate()?;
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/crop.rs"]
mod tests;

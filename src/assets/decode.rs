use std::path::Path;
use std::sync::Arc;

use anyhow::Context;

use crate::foundation::error::{FlipreelError, FlipreelResult};
use crate::model::frame::SourceImage;

/// Decode encoded image bytes (PNG, JPEG, WebP, GIF, ...) into a premultiplied [`SourceImage`].
pub fn decode_image(bytes: &[u8]) -> FlipreelResult<SourceImage> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    SourceImage::from_straight_rgba(width, height, rgba.into_raw())
}

/// Read and decode an image file.
pub fn load_image(path: &Path) -> FlipreelResult<SourceImage> {
    let bytes = std::fs::read(path).map_err(|e| {
        FlipreelError::validation(format!("failed to read image '{}': {e}", path.display()))
    })?;
    decode_image(&bytes)
        .map_err(|e| FlipreelError::validation(format!("image '{}': {e}", path.display())))
}

#[derive(Clone, Debug)]
/// Raw font file bytes plus the family name the settings asked for.
pub struct LoadedFont {
    /// Requested family name (informational; glyphs come from `bytes`).
    pub family: String,
    /// TrueType/OpenType file contents.
    pub bytes: Arc<Vec<u8>>,
}

impl LoadedFont {
    pub fn from_bytes(family: impl Into<String>, bytes: Vec<u8>) -> FlipreelResult<Self> {
        if bytes.is_empty() {
            return Err(FlipreelError::validation("font bytes must be non-empty"));
        }
        Ok(Self {
            family: family.into(),
            bytes: Arc::new(bytes),
        })
    }

    pub fn load(family: impl Into<String>, path: &Path) -> FlipreelResult<Self> {
        let bytes = std::fs::read(path).map_err(|e| {
            FlipreelError::validation(format!("failed to read font '{}': {e}", path.display()))
        })?;
        Self::from_bytes(family, bytes)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;

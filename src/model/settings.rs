use crate::foundation::core::{Canvas, Rgba8};
use crate::foundation::error::{FlipreelError, FlipreelResult};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
/// How consecutive frames hand over to each other.
pub enum TransitionKind {
    /// Hard cut.
    #[default]
    None,
    /// Opacity fade into the next frame on a 50 ms grid.
    Crossfade,
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
/// Transition configuration shared by every frame boundary.
pub struct TransitionSettings {
    /// Transition type.
    pub kind: TransitionKind,
    /// Transition length in milliseconds (ignored for [`TransitionKind::None`]).
    pub duration_ms: u32,
}

impl Default for TransitionSettings {
    fn default() -> Self {
        Self {
            kind: TransitionKind::None,
            duration_ms: 500,
        }
    }
}

impl TransitionSettings {
    /// Effective transition length: zero unless the transition is a crossfade.
    pub fn effective_duration_ms(&self) -> f64 {
        match self.kind {
            TransitionKind::Crossfade => f64::from(self.duration_ms),
            TransitionKind::None => 0.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
/// Stroke drawn around glyphs before the fill.
pub struct TextOutline {
    pub enabled: bool,
    pub color: Rgba8,
    /// Stroke width in pixels.
    pub width: f32,
}

impl Default for TextOutline {
    fn default() -> Self {
        Self {
            enabled: true,
            color: Rgba8::BLACK,
            width: 2.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
/// Blurred drop shadow under the text block.
pub struct TextShadow {
    pub enabled: bool,
    pub color: Rgba8,
    /// Multiplier applied to the shadow color alpha, `[0,1]`.
    pub opacity: f32,
    /// Blur amount in pixels (canvas `shadowBlur` semantics: sigma = blur / 2).
    pub blur: f32,
    pub offset_x: f32,
    pub offset_y: f32,
}

impl Default for TextShadow {
    fn default() -> Self {
        Self {
            enabled: true,
            color: Rgba8::BLACK,
            opacity: 0.5,
            blur: 5.0,
            offset_x: 5.0,
            offset_y: 5.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
/// Caption drawn on top of a range of frames.
pub struct TextOverlay {
    pub enabled: bool,
    /// Text content; `\n` separates lines.
    pub content: String,
    /// Font family name. The glyph source itself is supplied separately as font bytes.
    pub font: String,
    pub color: Rgba8,
    /// Font size in pixels.
    pub font_size: f32,
    /// Extra spacing between glyphs in pixels.
    pub letter_spacing: f32,
    /// Line advance as a multiple of `font_size`.
    pub line_height: f32,
    /// Normalized horizontal center, `[0,1]`.
    pub x: f32,
    /// Normalized vertical center, `[0,1]`.
    pub y: f32,
    /// First frame showing the text (1-based, inclusive).
    pub start_frame: u32,
    /// Last frame showing the text (1-based, inclusive).
    pub end_frame: u32,
    pub outline: TextOutline,
    pub shadow: TextShadow,
}

impl Default for TextOverlay {
    fn default() -> Self {
        Self {
            enabled: false,
            content: "Sample Text".to_string(),
            font: "Impact".to_string(),
            color: Rgba8::WHITE,
            font_size: 48.0,
            letter_spacing: 0.0,
            line_height: 1.2,
            x: 0.5,
            y: 0.5,
            start_frame: 1,
            end_frame: 100,
            outline: TextOutline::default(),
            shadow: TextShadow::default(),
        }
    }
}

impl TextOverlay {
    /// Whether anything would be drawn at all, regardless of frame range.
    pub fn is_active(&self) -> bool {
        self.enabled && !self.content.is_empty()
    }

    /// Whether the overlay is visible on the 0-based frame `index`.
    pub fn covers_frame(&self, index: usize) -> bool {
        let start = self.start_frame.saturating_sub(1) as usize;
        let end = self.end_frame.saturating_sub(1) as usize;
        index >= start && index <= end
    }

    /// Grow `end_frame` so the range reaches `frame_count` frames.
    pub fn extend_range_to(&mut self, frame_count: usize) {
        let count = u32::try_from(frame_count).unwrap_or(u32::MAX);
        if count > self.end_frame {
            self.end_frame = count;
        }
    }

    fn validate(&self) -> FlipreelResult<()> {
        if self.start_frame == 0 {
            return Err(FlipreelError::validation(
                "text overlay start_frame is 1-based and must be >= 1",
            ));
        }
        if self.start_frame > self.end_frame {
            return Err(FlipreelError::validation(
                "text overlay start_frame must be <= end_frame",
            ));
        }
        if !self.font_size.is_finite() || self.font_size <= 0.0 {
            return Err(FlipreelError::validation(
                "text overlay font_size must be finite and > 0",
            ));
        }
        if !self.line_height.is_finite() || self.line_height <= 0.0 {
            return Err(FlipreelError::validation(
                "text overlay line_height must be finite and > 0",
            ));
        }
        if !(0.0..=1.0).contains(&self.x) || !(0.0..=1.0).contains(&self.y) {
            return Err(FlipreelError::validation(
                "text overlay x/y must be normalized to [0,1]",
            ));
        }
        if !self.letter_spacing.is_finite() {
            return Err(FlipreelError::validation(
                "text overlay letter_spacing must be finite",
            ));
        }
        if self.outline.enabled && (!self.outline.width.is_finite() || self.outline.width < 0.0) {
            return Err(FlipreelError::validation(
                "text outline width must be finite and >= 0",
            ));
        }
        if self.shadow.enabled && (!self.shadow.blur.is_finite() || self.shadow.blur < 0.0) {
            return Err(FlipreelError::validation(
                "text shadow blur must be finite and >= 0",
            ));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
/// Global, read-only export configuration.
///
/// Passed by reference into every component; nothing in the crate keeps a shared copy.
pub struct AnimationSettings {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Base display time of one frame in milliseconds, scaled per frame by its multiplier.
    pub frame_duration_ms: u32,
    pub transition: TransitionSettings,
    /// Encoder quality, `1..=100`.
    pub quality: u8,
    /// Byte budget for the artifact; `0` means unlimited.
    pub max_file_size: u64,
    /// Loop forever when `true`, play once otherwise.
    #[serde(rename = "loop")]
    pub loop_forever: bool,
    pub background: Rgba8,
    pub text_overlay: TextOverlay,
}

impl Default for AnimationSettings {
    fn default() -> Self {
        Self {
            width: 600,
            height: 600,
            frame_duration_ms: 1300,
            transition: TransitionSettings::default(),
            quality: 85,
            max_file_size: 0,
            loop_forever: true,
            background: Rgba8::BLACK,
            text_overlay: TextOverlay::default(),
        }
    }
}

impl AnimationSettings {
    /// Output canvas; fails on zero or oversized dimensions.
    pub fn canvas(&self) -> FlipreelResult<Canvas> {
        Canvas::new(self.width, self.height)
    }

    pub fn validate(&self) -> FlipreelResult<()> {
        self.canvas()?;
        if self.frame_duration_ms == 0 {
            return Err(FlipreelError::validation("frame_duration_ms must be > 0"));
        }
        if !(1..=100).contains(&self.quality) {
            return Err(FlipreelError::validation("quality must be within 1..=100"));
        }
        self.text_overlay.validate()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/model/settings.rs"]
mod tests;

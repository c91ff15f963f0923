//! Animated artifact encoders and the size-budget loop that drives them.

use crate::foundation::error::FlipreelResult;
use crate::model::settings::AnimationSettings;
use crate::timeline::expand::RenderedInstant;

pub mod budget;
pub mod gif;
pub mod still;
pub mod webp_mux;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
/// Container format of the exported animation.
pub enum OutputFormat {
    Webp,
    Gif,
}

impl OutputFormat {
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Webp => "image/webp",
            Self::Gif => "image/gif",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Webp => "webp",
            Self::Gif => "gif",
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "webp" => Ok(Self::Webp),
            "gif" => Ok(Self::Gif),
            other => Err(format!("unknown output format '{other}' (expected webp or gif)")),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// Per-export parameters every encode attempt shares.
pub struct EncodeParams {
    pub width: u32,
    pub height: u32,
    pub loop_forever: bool,
    /// A byte budget is active, so the encoder must take a size-reducible path.
    pub budget_active: bool,
}

impl EncodeParams {
    pub fn from_settings(settings: &AnimationSettings) -> FlipreelResult<Self> {
        let canvas = settings.canvas()?;
        Ok(Self {
            width: canvas.width,
            height: canvas.height,
            loop_forever: settings.loop_forever,
            budget_active: settings.max_file_size > 0,
        })
    }
}

/// Turns the full ordered instant list into one animated file at a trial quality.
pub trait AnimationEncoder: Send + Sync {
    fn format(&self) -> OutputFormat;

    /// Encode every instant at `quality` (`1..=100`).
    fn encode(
        &self,
        instants: &[RenderedInstant],
        quality: u8,
        params: &EncodeParams,
    ) -> FlipreelResult<Vec<u8>>;
}

pub use self::budget::{EncodeOutcome, encode_within_budget};
pub use self::gif::GifAnimationEncoder;
pub use self::still::{LosslessWebpEncoder, StillImageEncoder};
pub use self::webp_mux::WebpAnimationEncoder;

#[cfg(test)]
#[path = "../../tests/unit/encode/mod.rs"]
mod tests;

//! Flipreel turns an ordered list of still images into an animated WebP or GIF.
//!
//! The pipeline is a straight line:
//!
//! - Describe the animation with [`SourceFrame`]s and [`AnimationSettings`] (or load a
//!   [`Project`] file)
//! - Expand it into timed instants with [`plan_timeline`] / [`render_timeline`]
//! - Encode the instants with an [`AnimationEncoder`], optionally under a byte budget
//!
//! [`export_animation`] runs all of it and returns an [`ExportArtifact`].
#![forbid(unsafe_code)]

mod foundation;

/// Image decoding and font loading.
pub mod assets;
/// Animated WebP/GIF encoders and the size-budget loop.
pub mod encode;
/// One-call export.
pub mod export;
/// Crop boxes and output sizing.
pub mod geometry;
pub mod model;
/// JSON project files.
pub mod project;
pub mod render;
/// Timeline planning and rendering.
pub mod timeline;

pub use crate::foundation::core::{Affine, Canvas, Rgba8};
pub use crate::foundation::error::{FlipreelError, FlipreelResult};

pub use crate::assets::decode::{LoadedFont, decode_image, load_image};
pub use crate::encode::{
    AnimationEncoder, EncodeOutcome, EncodeParams, GifAnimationEncoder, LosslessWebpEncoder,
    OutputFormat, StillImageEncoder, WebpAnimationEncoder, encode_within_budget,
};
pub use crate::export::orchestrator::{
    ExportArtifact, ExportOpts, export_animation, export_with_encoder,
};
pub use crate::geometry::crop::{CropBox, fit_output_size, propagate_crop, resolve_crop};
pub use crate::model::frame::{
    SourceFrame, SourceImage, duplicate_frame, remove_frame, reverse_frames,
};
pub use crate::model::settings::{
    AnimationSettings, TextOutline, TextOverlay, TextShadow, TransitionKind, TransitionSettings,
};
pub use crate::project::{LoadedProject, Project, ProjectDef};
pub use crate::render::compositor::{Blend, FrameCompositor, RenderSurface};
pub use crate::timeline::expand::{
    InstantPlan, RenderStats, RenderThreading, RenderedInstant, plan_timeline, render_timeline,
};

//! JSON project files: a frame list plus [`AnimationSettings`], resolved against the file's
//! directory.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::assets::decode::{LoadedFont, load_image};
use crate::foundation::error::{FlipreelError, FlipreelResult};
use crate::geometry::crop::{CropBox, fit_output_size, propagate_crop};
use crate::model::frame::{SourceFrame, SourceImage, reverse_frames};
use crate::model::settings::AnimationSettings;

fn default_aspect_ratio() -> String {
    "original".to_string()
}

fn default_multiplier() -> f64 {
    1.0
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
/// One frame entry of a project file.
pub struct FrameDef {
    /// Image path relative to the project file.
    pub image: String,
    /// Stable id; defaults to `frame-{n}` (1-based).
    #[serde(default)]
    pub id: Option<String>,
    /// Hand-made crop; overrides the aspect-ratio token.
    #[serde(default)]
    pub crop: Option<CropBox>,
    #[serde(default = "default_multiplier")]
    pub duration_multiplier: f64,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
/// JSON-facing project definition.
pub struct ProjectDef {
    pub frames: Vec<FrameDef>,
    #[serde(default)]
    pub settings: AnimationSettings,
    /// `original`, `free` or `"W:H"`.
    #[serde(default = "default_aspect_ratio")]
    pub aspect_ratio: String,
    /// When set (with `max_height`), the output size is derived from the first frame's crop.
    #[serde(default)]
    pub max_width: Option<u32>,
    #[serde(default)]
    pub max_height: Option<u32>,
    /// Copy this frame's crop (0-based index) onto every frame by relative position and size.
    #[serde(default)]
    pub apply_crop_from: Option<usize>,
    /// Play the frame list backwards.
    #[serde(default)]
    pub reverse: bool,
    /// Font file for the text overlay, relative to the project file.
    #[serde(default)]
    pub font: Option<String>,
}

/// Everything an export needs, loaded from disk.
#[derive(Clone, Debug)]
pub struct LoadedProject {
    pub frames: Vec<SourceFrame>,
    pub settings: AnimationSettings,
    pub font: Option<LoadedFont>,
}

#[derive(Clone, Debug)]
/// Parsed project file plus the directory its relative paths resolve against.
pub struct Project {
    def: ProjectDef,
    root: PathBuf,
}

impl Project {
    pub fn from_reader<R: std::io::Read>(r: R, root: impl Into<PathBuf>) -> FlipreelResult<Self> {
        let def: ProjectDef = serde_json::from_reader(r)
            .map_err(|e| FlipreelError::serde(format!("parse project JSON: {e}")))?;
        Ok(Self {
            def,
            root: root.into(),
        })
    }

    pub fn from_path(path: impl AsRef<Path>) -> FlipreelResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            FlipreelError::validation(format!("open project JSON '{}': {e}", path.display()))
        })?;
        let root = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Self::from_reader(BufReader::new(f), root)
    }

    pub fn def(&self) -> &ProjectDef {
        &self.def
    }

    /// Structural checks that need no file access.
    pub fn validate(&self) -> FlipreelResult<()> {
        if self.def.frames.is_empty() {
            return Err(FlipreelError::validation(
                "project must list at least one frame",
            ));
        }
        for f in &self.def.frames {
            normalize_rel_path(&f.image)?;
        }
        if let Some(font) = &self.def.font {
            normalize_rel_path(font)?;
        }
        if let Some(i) = self.def.apply_crop_from
            && i >= self.def.frames.len()
        {
            return Err(FlipreelError::validation(format!(
                "apply_crop_from index {i} out of range ({} frames)",
                self.def.frames.len()
            )));
        }
        Ok(())
    }

    /// Decode images and the font, resolve crops, derive the output size.
    #[tracing::instrument(skip_all, fields(root = %self.root.display(), frames = self.def.frames.len()))]
    pub fn load(&self) -> FlipreelResult<LoadedProject> {
        self.validate()?;
        let def = &self.def;

        let mut images = HashMap::<String, Arc<SourceImage>>::new();
        let mut frames = Vec::with_capacity(def.frames.len());
        for (i, f) in def.frames.iter().enumerate() {
            let rel = normalize_rel_path(&f.image)?;
            let image = match images.get(&rel) {
                Some(img) => Arc::clone(img),
                None => {
                    let img = Arc::new(load_image(&self.root.join(&rel))?);
                    images.insert(rel.clone(), Arc::clone(&img));
                    img
                }
            };
            let id = f.id.clone().unwrap_or_else(|| format!("frame-{}", i + 1));
            let mut frame = SourceFrame::new(id, image).with_duration_multiplier(f.duration_multiplier);
            match f.crop {
                Some(crop) => {
                    frame.crop = CropBox {
                        is_custom: true,
                        ..crop
                    }
                }
                None => frame.apply_aspect_ratio(&def.aspect_ratio),
            }
            frame.validate()?;
            frames.push(frame);
        }

        if let Some(src) = def.apply_crop_from {
            let master = &frames[src];
            let crop = master.crop;
            let from = (master.image.width, master.image.height);
            for frame in &mut frames {
                frame.crop = propagate_crop(&crop, from, (frame.image.width, frame.image.height))?;
            }
        }
        if def.reverse {
            reverse_frames(&mut frames);
        }

        let mut settings = def.settings.clone();
        if def.max_width.is_some() || def.max_height.is_some() {
            let canvas = fit_output_size(
                &frames[0].crop,
                def.max_width.unwrap_or(0),
                def.max_height.unwrap_or(0),
            )?;
            settings.width = canvas.width;
            settings.height = canvas.height;
        }
        settings.text_overlay.extend_range_to(frames.len());
        settings.validate()?;

        let font = match &def.font {
            Some(rel) => Some(LoadedFont::load(
                settings.text_overlay.font.clone(),
                &self.root.join(normalize_rel_path(rel)?),
            )?),
            None => None,
        };

        tracing::debug!(
            width = settings.width,
            height = settings.height,
            unique_images = images.len(),
            "project loaded"
        );
        Ok(LoadedProject {
            frames,
            settings,
            font,
        })
    }
}

/// Normalize and validate project-relative paths.
///
/// The result uses `/` separators and drops `.` segments; absolute paths and `..` are rejected.
pub(crate) fn normalize_rel_path(source: &str) -> FlipreelResult<String> {
    let s = source.replace('\\', "/");
    if s.starts_with('/') {
        return Err(FlipreelError::validation("project paths must be relative"));
    }
    if s.is_empty() {
        return Err(FlipreelError::validation("project path must be non-empty"));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(FlipreelError::validation(
                "project paths must not contain '..'",
            ));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(FlipreelError::validation(
            "project path must contain a file name",
        ));
    }

    Ok(out.join("/"))
}

#[cfg(test)]
#[path = "../../tests/unit/project/mod.rs"]
mod tests;

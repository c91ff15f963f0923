use std::sync::Arc;

use crate::assets::decode::LoadedFont;
use crate::foundation::core::{Affine, Canvas, Rgba8};
use crate::foundation::error::{FlipreelError, FlipreelResult};
use crate::foundation::math::unpremultiply_rgba8_in_place;
use crate::geometry::crop::CropBox;
use crate::model::frame::SourceFrame;
use crate::model::settings::{AnimationSettings, TextOverlay};
use crate::render::blend::{is_opaque, lerp_in_place, over_in_place};
use crate::render::surface::{affine_to_cpu, canvas_dims_u16, pixmap_from_premul_bytes};
use crate::render::text::rasterize_overlay;

#[derive(Clone, Copy, Debug, PartialEq)]
/// Second frame of a crossfade instant and how far the fade has progressed, in `(0,1]`.
pub struct Blend {
    pub next: usize,
    pub alpha: f32,
}

#[derive(Clone)]
struct FramePaint {
    paint: vello_cpu::Image,
    width: f64,
    height: f64,
    transform: vello_cpu::kurbo::Affine,
    opaque: bool,
}

struct TextLayer {
    overlay: TextOverlay,
    rgba8_premul: Vec<u8>,
}

/// Per-worker scratch: a rasterizer context and the pixmap it renders into.
///
/// Overwritten by every render call.
pub struct RenderSurface {
    ctx: vello_cpu::RenderContext,
    pixmap: vello_cpu::Pixmap,
}

impl RenderSurface {
    pub fn new(canvas: Canvas) -> FlipreelResult<Self> {
        let (w, h) = canvas_dims_u16(canvas)?;
        Ok(Self {
            ctx: vello_cpu::RenderContext::new(w, h),
            pixmap: vello_cpu::Pixmap::new(w, h),
        })
    }
}

/// Renders single playback instants of one frame list at the output size.
///
/// Immutable after construction, so one compositor can be shared by every render worker; each
/// worker brings its own [`RenderSurface`].
pub struct FrameCompositor {
    canvas: Canvas,
    background: Rgba8,
    frames: Vec<FramePaint>,
    text: Option<TextLayer>,
}

impl FrameCompositor {
    /// Prepare image paints for `frames` and rasterize the text overlay once.
    ///
    /// `font` is required when the overlay is active.
    pub fn new(
        frames: &[SourceFrame],
        settings: &AnimationSettings,
        font: Option<&LoadedFont>,
    ) -> FlipreelResult<Self> {
        let canvas = settings.canvas()?;
        let frames = frames
            .iter()
            .map(|f| prepare_frame(f, canvas))
            .collect::<FlipreelResult<Vec<_>>>()?;

        let overlay = &settings.text_overlay;
        let text = if overlay.is_active() {
            let font = font.ok_or_else(|| {
                FlipreelError::validation(format!(
                    "text overlay is enabled but no font was supplied for '{}'",
                    overlay.font
                ))
            })?;
            Some(TextLayer {
                overlay: overlay.clone(),
                rgba8_premul: rasterize_overlay(overlay, canvas, font)?,
            })
        } else {
            None
        };

        Ok(Self {
            canvas,
            background: settings.background,
            frames,
            text,
        })
    }

    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Render frame `current`, optionally fading towards `blend.next`, as straight RGBA8.
    pub fn render(
        &self,
        surface: &mut RenderSurface,
        current: usize,
        blend: Option<Blend>,
    ) -> FlipreelResult<Vec<u8>> {
        let cur = self.frame(current)?;
        let mut out = match blend {
            None => self.draw(surface, cur, None)?,
            Some(b) => {
                let next = self.frame(b.next)?;
                if !b.alpha.is_finite() || b.alpha <= 0.0 {
                    return Err(FlipreelError::render(format!(
                        "blend alpha must be in (0,1], got {}",
                        b.alpha
                    )));
                }
                if b.alpha >= 1.0 {
                    self.draw(surface, next, None)?
                } else if cur.opaque && next.opaque {
                    self.draw(surface, cur, Some((next, b.alpha)))?
                } else {
                    // Sequential overlay only reads as a crossfade over opaque frames.
                    let mut a = self.draw(surface, cur, None)?;
                    let bb = self.draw(surface, next, None)?;
                    lerp_in_place(&mut a, &bb, b.alpha)?;
                    a
                }
            }
        };

        if let Some(text) = &self.text {
            let effective = match blend {
                Some(b) if b.alpha > 0.5 => b.next,
                _ => current,
            };
            if text.overlay.covers_frame(effective) {
                over_in_place(&mut out, &text.rgba8_premul, 1.0)?;
            }
        }

        unpremultiply_rgba8_in_place(&mut out);
        Ok(out)
    }

    fn frame(&self, index: usize) -> FlipreelResult<&FramePaint> {
        self.frames.get(index).ok_or_else(|| {
            FlipreelError::render(format!(
                "frame index {index} out of range ({} frames)",
                self.frames.len()
            ))
        })
    }

    /// Background, then `base`, then optionally `over` at the given opacity. Returns premultiplied bytes.
    fn draw(
        &self,
        surface: &mut RenderSurface,
        base: &FramePaint,
        over: Option<(&FramePaint, f32)>,
    ) -> FlipreelResult<Vec<u8>> {
        let ctx = &mut surface.ctx;
        ctx.reset();

        let bg = self.background;
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(bg.r, bg.g, bg.b, bg.a));
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(self.canvas.width),
            f64::from(self.canvas.height),
        ));

        draw_frame(ctx, base, 1.0);
        if let Some((f, opacity)) = over {
            draw_frame(ctx, f, opacity);
        }

        ctx.flush();
        ctx.render_to_pixmap(&mut surface.pixmap);
        let bytes = surface.pixmap.data_as_u8_slice();
        if bytes.len() != self.canvas.rgba_len() {
            return Err(FlipreelError::render("render surface size mismatch"));
        }
        Ok(bytes.to_vec())
    }
}

fn draw_frame(ctx: &mut vello_cpu::RenderContext, f: &FramePaint, opacity: f32) {
    ctx.set_transform(f.transform);
    ctx.set_paint(f.paint.clone());
    if opacity < 1.0 {
        ctx.push_opacity_layer(opacity);
    }
    // The whole image is drawn; source pixels outside the crop show wherever they land.
    ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, f.width, f.height));
    if opacity < 1.0 {
        ctx.pop_layer();
    }
}

fn prepare_frame(frame: &SourceFrame, canvas: Canvas) -> FlipreelResult<FramePaint> {
    frame.validate()?;
    let img = &frame.image;
    let pixmap = pixmap_from_premul_bytes(&img.rgba8_premul, img.width, img.height)?;
    let paint = vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    };
    Ok(FramePaint {
        paint,
        width: f64::from(img.width),
        height: f64::from(img.height),
        transform: affine_to_cpu(fit_transform(&frame.crop, canvas)),
        opaque: is_opaque(&img.rgba8_premul),
    })
}

/// Image-space to surface transform that aspect-fits the crop box and centers it.
pub(crate) fn fit_transform(crop: &CropBox, canvas: Canvas) -> Affine {
    let out_w = f64::from(canvas.width);
    let out_h = f64::from(canvas.height);
    let scale = (out_w / crop.width).min(out_h / crop.height);
    let dx = (out_w - crop.width * scale) / 2.0 - crop.x * scale;
    let dy = (out_h - crop.height * scale) / 2.0 - crop.y * scale;
    Affine::translate((dx, dy)) * Affine::scale(scale)
}

#[cfg(test)]
#[path = "../../tests/unit/render/compositor.rs"]
mod tests;

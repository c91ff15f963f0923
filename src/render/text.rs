//! Caption rasterization: parley shapes each line, `vello_cpu` draws the glyphs.
//!
//! The overlay never changes during one export, so it is rasterized once into a
//! premultiplied layer that the compositor lays over every covered instant.

use std::borrow::Cow;

use crate::assets::decode::LoadedFont;
use crate::foundation::core::{Canvas, Rgba8};
use crate::foundation::error::{FlipreelError, FlipreelResult};
use crate::foundation::math::mul_div255_u8;
use crate::model::settings::{TextOutline, TextOverlay, TextShadow};
use crate::render::blend::over_in_place;
use crate::render::blur::gaussian_blur_in_place;
use crate::render::surface::canvas_dims_u16;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// RGBA8 brush color used by parley text layout.
pub(crate) struct TextBrushRgba8 {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
    pub(crate) a: u8,
}

impl From<Rgba8> for TextBrushRgba8 {
    fn from(c: Rgba8) -> Self {
        Self {
            r: c.r,
            g: c.g,
            b: c.b,
            a: c.a,
        }
    }
}

/// Parley contexts bound to one registered font.
pub(crate) struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
    family: String,
    font: vello_cpu::peniko::FontData,
}

impl TextLayoutEngine {
    pub(crate) fn new(font: &LoadedFont) -> FlipreelResult<Self> {
        let mut font_ctx = parley::FontContext::default();
        let families = font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(font.bytes.to_vec()), None);
        let family_id = families.first().map(|(id, _)| *id).ok_or_else(|| {
            FlipreelError::validation("no font families registered from font bytes")
        })?;
        let family = font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| FlipreelError::validation("registered font family has no name"))?
            .to_string();
        if !family.eq_ignore_ascii_case(&font.family) {
            tracing::debug!(
                requested = %font.family,
                registered = %family,
                "text overlay uses the family found in the font bytes"
            );
        }

        let data =
            vello_cpu::peniko::FontData::new(vello_cpu::peniko::Blob::from(font.bytes.to_vec()), 0);
        Ok(Self {
            font_ctx,
            layout_ctx: parley::LayoutContext::new(),
            family,
            font: data,
        })
    }

    /// Shape one unwrapped line.
    pub(crate) fn layout_line(
        &mut self,
        text: &str,
        size_px: f32,
        letter_spacing: f32,
        brush: TextBrushRgba8,
    ) -> parley::Layout<TextBrushRgba8> {
        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(Cow::Owned(self.family.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontWeight(
            parley::style::FontWeight::BOLD,
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::LetterSpacing(letter_spacing));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
        layout.break_all_lines(None);
        layout
    }
}

/// Rasterize the overlay (shadow included) into a premultiplied RGBA8 layer of `canvas` size.
#[tracing::instrument(skip_all, fields(lines = overlay.content.split('\n').count()))]
pub(crate) fn rasterize_overlay(
    overlay: &TextOverlay,
    canvas: Canvas,
    font: &LoadedFont,
) -> FlipreelResult<Vec<u8>> {
    let (w16, h16) = canvas_dims_u16(canvas)?;
    let mut engine = TextLayoutEngine::new(font)?;
    let brush = TextBrushRgba8::from(overlay.color);

    let lines: Vec<_> = overlay
        .content
        .split('\n')
        .map(|line| engine.layout_line(line, overlay.font_size, overlay.letter_spacing, brush))
        .collect();

    let line_h = f64::from(overlay.font_size) * f64::from(overlay.line_height);
    let block_h = line_h * lines.len() as f64;
    let cx = f64::from(overlay.x) * f64::from(canvas.width);
    let cy = f64::from(overlay.y) * f64::from(canvas.height);
    let first_center = cy - block_h / 2.0 + line_h / 2.0;

    let mut ctx = vello_cpu::RenderContext::new(w16, h16);
    for (i, layout) in lines.iter().enumerate() {
        let line_center = first_center + i as f64 * line_h;
        let ox = cx - f64::from(layout.width()) / 2.0;
        let oy = line_center - f64::from(layout.height()) / 2.0;
        ctx.set_transform(vello_cpu::kurbo::Affine::translate((ox, oy)));
        draw_layout(&mut ctx, layout, &engine.font, overlay.outline);
    }

    let mut pixmap = vello_cpu::Pixmap::new(w16, h16);
    ctx.flush();
    ctx.render_to_pixmap(&mut pixmap);
    let glyphs = pixmap.data_as_u8_slice().to_vec();

    if !overlay.shadow.enabled {
        return Ok(glyphs);
    }
    let mut layer = shadow_layer(&glyphs, canvas, &overlay.shadow)?;
    over_in_place(&mut layer, &glyphs, 1.0)?;
    Ok(layer)
}

fn draw_layout(
    ctx: &mut vello_cpu::RenderContext,
    layout: &parley::Layout<TextBrushRgba8>,
    font: &vello_cpu::peniko::FontData,
    outline: TextOutline,
) {
    let stroke_width = f64::from(outline.width);
    for line in layout.lines() {
        for item in line.items() {
            let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                continue;
            };
            let glyphs: Vec<vello_cpu::Glyph> = run
                .positioned_glyphs()
                .map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                })
                .collect();
            let font_size = run.run().font_size();
            // Variable fonts pick up the bold weight through their variation axes.
            let coords = run.run().normalized_coords();

            if outline.enabled && stroke_width > 0.0 {
                let c = outline.color;
                ctx.set_stroke(
                    vello_cpu::kurbo::Stroke::new(stroke_width)
                        .with_join(vello_cpu::kurbo::Join::Round),
                );
                ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a));
                ctx.glyph_run(font)
                    .font_size(font_size)
                    .normalized_coords(coords)
                    .stroke_glyphs(glyphs.iter().copied());
            }

            let brush = run.style().brush;
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                brush.r, brush.g, brush.b, brush.a,
            ));
            ctx.glyph_run(font)
                .font_size(font_size)
                .normalized_coords(coords)
                .fill_glyphs(glyphs.into_iter());
        }
    }
}

/// Tint the glyph coverage with the shadow color, offset it and blur it.
fn shadow_layer(glyphs: &[u8], canvas: Canvas, shadow: &TextShadow) -> FlipreelResult<Vec<u8>> {
    let tint = shadow.color.with_opacity(shadow.opacity).to_premul();
    let w = i64::from(canvas.width);
    let h = i64::from(canvas.height);
    let dx = shadow.offset_x.round() as i64;
    let dy = shadow.offset_y.round() as i64;

    let mut out = vec![0u8; glyphs.len()];
    for y in 0..h {
        let sy = y - dy;
        if sy < 0 || sy >= h {
            continue;
        }
        for x in 0..w {
            let sx = x - dx;
            if sx < 0 || sx >= w {
                continue;
            }
            let coverage = glyphs[((sy * w + sx) as usize) * 4 + 3];
            if coverage == 0 {
                continue;
            }
            let dst = ((y * w + x) as usize) * 4;
            for c in 0..4 {
                out[dst + c] = mul_div255_u8(u16::from(tint[c]), u16::from(coverage));
            }
        }
    }

    // Canvas shadowBlur is twice the Gaussian standard deviation.
    gaussian_blur_in_place(&mut out, canvas.width, canvas.height, shadow.blur / 2.0)?;
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/render/text.rs"]
mod tests;

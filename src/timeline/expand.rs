use std::collections::HashMap;
use std::sync::Arc;

use rayon::prelude::*;

use crate::assets::decode::LoadedFont;
use crate::foundation::error::{FlipreelError, FlipreelResult};
use crate::model::frame::SourceFrame;
use crate::model::settings::{AnimationSettings, TransitionKind};
use crate::render::compositor::{Blend, FrameCompositor, RenderSurface};

/// Time grid of crossfade instants in milliseconds.
pub const TRANSITION_STEP_MS: f64 = 50.0;

#[derive(Clone, Copy, Debug, PartialEq)]
/// One renderable playback instant before rasterization.
pub struct InstantPlan {
    /// Frame drawn at full opacity.
    pub frame: usize,
    /// Crossfade partner and progress, for transition instants.
    pub blend: Option<Blend>,
    /// Display time in milliseconds.
    pub duration_ms: f64,
}

#[derive(Clone, Debug)]
/// Rasterized instant: straight-alpha RGBA8 at the output size plus its display time.
pub struct RenderedInstant {
    /// Pixels, row-major `width * height * 4`. Shared between identical instants.
    pub rgba: Arc<Vec<u8>>,
    pub width: u32,
    pub height: u32,
    pub duration_ms: f64,
}

#[derive(Clone, Debug)]
/// Threading controls for timeline rendering.
pub struct RenderThreading {
    /// Render instants on a rayon pool when `true`.
    pub parallel: bool,
    /// Optional explicit worker thread count, for rendering and the parallel WebP encode.
    pub threads: Option<usize>,
    /// Render pixel-identical instants once and share the buffer.
    pub static_frame_elision: bool,
}

impl Default for RenderThreading {
    fn default() -> Self {
        Self {
            parallel: false,
            threads: None,
            static_frame_elision: true,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// Aggregated rendering counters.
pub struct RenderStats {
    /// Planned instants.
    pub instants_total: u64,
    /// Instants that were actually rasterized.
    pub instants_rendered: u64,
    /// Instants reused via elision.
    pub instants_elided: u64,
}

/// Expand frames and transition settings into ordered playback instants.
pub fn plan_timeline(
    frames: &[SourceFrame],
    settings: &AnimationSettings,
) -> FlipreelResult<Vec<InstantPlan>> {
    if frames.is_empty() {
        return Err(FlipreelError::validation("timeline needs at least one frame"));
    }
    let n = frames.len();
    let base = f64::from(settings.frame_duration_ms);
    let crossfade = settings.transition.kind == TransitionKind::Crossfade;
    let trans = settings.transition.effective_duration_ms();

    let mut out = Vec::with_capacity(n);
    for (i, frame) in frames.iter().enumerate() {
        let eff = (base * frame.duration_multiplier).max(1.0);
        let next = (i + 1) % n;
        let should_transition = crossfade && n > 1 && (i + 1 != n || settings.loop_forever);

        if !should_transition {
            out.push(InstantPlan {
                frame: i,
                blend: None,
                duration_ms: eff,
            });
            continue;
        }

        let static_portion = (eff - trans).max(0.0);
        if static_portion > 0.0 {
            out.push(InstantPlan {
                frame: i,
                blend: None,
                duration_ms: static_portion,
            });
        }
        let steps = (eff.min(trans) / TRANSITION_STEP_MS).floor() as usize;
        for s in 1..=steps {
            out.push(InstantPlan {
                frame: i,
                blend: Some(Blend {
                    next,
                    alpha: s as f32 / steps as f32,
                }),
                duration_ms: TRANSITION_STEP_MS,
            });
        }
    }
    Ok(out)
}

/// Plan and rasterize the whole timeline in playback order.
#[tracing::instrument(skip_all, fields(frames = frames.len(), parallel = threading.parallel))]
pub fn render_timeline(
    frames: &[SourceFrame],
    settings: &AnimationSettings,
    font: Option<&LoadedFont>,
    threading: &RenderThreading,
) -> FlipreelResult<Vec<RenderedInstant>> {
    settings.validate()?;
    let plan = plan_timeline(frames, settings)?;
    let compositor = FrameCompositor::new(frames, settings, font)?;
    let (instants, stats) = render_plan(&compositor, &plan, threading)?;
    tracing::debug!(
        total = stats.instants_total,
        rendered = stats.instants_rendered,
        elided = stats.instants_elided,
        "timeline rendered"
    );
    Ok(instants)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct RenderKey {
    frame: usize,
    next: Option<(usize, u32)>,
}

impl RenderKey {
    fn of(plan: &InstantPlan) -> Self {
        match plan.blend {
            // A finished fade draws only the next frame, text included.
            Some(b) if b.alpha >= 1.0 => Self {
                frame: b.next,
                next: None,
            },
            Some(b) => Self {
                frame: plan.frame,
                next: Some((b.next, b.alpha.to_bits())),
            },
            None => Self {
                frame: plan.frame,
                next: None,
            },
        }
    }
}

/// Rasterize planned instants with `compositor`, preserving plan order.
pub fn render_plan(
    compositor: &FrameCompositor,
    plan: &[InstantPlan],
    threading: &RenderThreading,
) -> FlipreelResult<(Vec<RenderedInstant>, RenderStats)> {
    let mut unique = Vec::<&InstantPlan>::new();
    let mut plan_to_unique = Vec::<usize>::with_capacity(plan.len());
    if threading.static_frame_elision {
        let mut first = HashMap::<RenderKey, usize>::new();
        for p in plan {
            let slot = *first.entry(RenderKey::of(p)).or_insert_with(|| {
                unique.push(p);
                unique.len() - 1
            });
            plan_to_unique.push(slot);
        }
    } else {
        for (i, p) in plan.iter().enumerate() {
            unique.push(p);
            plan_to_unique.push(i);
        }
    }

    let canvas = compositor.canvas();
    let rendered: Vec<FlipreelResult<Vec<u8>>> = if threading.parallel {
        let pool = build_thread_pool(threading.threads)?;
        pool.install(|| {
            unique
                .par_iter()
                .map_init(
                    || RenderSurface::new(canvas),
                    |surface, p| -> FlipreelResult<Vec<u8>> {
                        let surface = surface
                            .as_mut()
                            .map_err(|e| FlipreelError::render(e.to_string()))?;
                        compositor.render(surface, p.frame, p.blend)
                    },
                )
                .collect()
        })
    } else {
        let mut surface = RenderSurface::new(canvas)?;
        unique
            .iter()
            .map(|p| compositor.render(&mut surface, p.frame, p.blend))
            .collect()
    };

    let mut buffers = Vec::<Arc<Vec<u8>>>::with_capacity(rendered.len());
    for item in rendered {
        buffers.push(Arc::new(item?));
    }

    let instants = plan
        .iter()
        .zip(plan_to_unique)
        .map(|(p, slot)| RenderedInstant {
            rgba: Arc::clone(&buffers[slot]),
            width: canvas.width,
            height: canvas.height,
            duration_ms: p.duration_ms,
        })
        .collect();

    let total = plan.len() as u64;
    let rendered_count = buffers.len() as u64;
    Ok((
        instants,
        RenderStats {
            instants_total: total,
            instants_rendered: rendered_count,
            instants_elided: total.saturating_sub(rendered_count),
        },
    ))
}

pub(crate) fn build_thread_pool(threads: Option<usize>) -> FlipreelResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(FlipreelError::validation(
            "'threads' must be >= 1 when set",
        ));
    }
    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| FlipreelError::render(format!("failed to build rayon thread pool: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/expand.rs"]
mod tests;

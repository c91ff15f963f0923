use super::*;
use crate::model::frame::SourceImage;
use crate::model::settings::TransitionSettings;

fn frames(n: usize) -> Vec<SourceFrame> {
    let colors = [[255, 0, 0, 255], [0, 255, 0, 255], [0, 0, 255, 255]];
    (0..n)
        .map(|i| {
            let img = SourceImage::solid(4, 4, colors[i % colors.len()]).unwrap();
            SourceFrame::new(format!("f{i}"), Arc::new(img))
        })
        .collect()
}

fn crossfade(frame_ms: u32, trans_ms: u32, loop_forever: bool) -> AnimationSettings {
    AnimationSettings {
        width: 4,
        height: 4,
        frame_duration_ms: frame_ms,
        transition: TransitionSettings {
            kind: TransitionKind::Crossfade,
            duration_ms: trans_ms,
        },
        loop_forever,
        ..AnimationSettings::default()
    }
}

#[test]
fn no_transition_emits_one_instant_per_frame() {
    let mut fs = frames(3);
    fs[1].duration_multiplier = 2.5;
    let s = AnimationSettings {
        frame_duration_ms: 400,
        ..AnimationSettings::default()
    };
    let plan = plan_timeline(&fs, &s).unwrap();
    assert_eq!(plan.len(), 3);
    let durations: Vec<f64> = plan.iter().map(|p| p.duration_ms).collect();
    assert_eq!(durations, vec![400.0, 1000.0, 400.0]);
    assert!(plan.iter().enumerate().all(|(i, p)| p.frame == i && p.blend.is_none()));
}

#[test]
fn looping_crossfade_emits_static_plus_ten_steps_per_frame() {
    let plan = plan_timeline(&frames(3), &crossfade(1000, 500, true)).unwrap();
    assert_eq!(plan.len(), 33);
    for (i, chunk) in plan.chunks(11).enumerate() {
        assert_eq!(chunk[0].frame, i);
        assert_eq!(chunk[0].blend, None);
        assert_eq!(chunk[0].duration_ms, 500.0);
        for (s, p) in chunk[1..].iter().enumerate() {
            let b = p.blend.unwrap();
            assert_eq!(p.frame, i);
            assert_eq!(b.next, (i + 1) % 3);
            assert!((b.alpha - (s + 1) as f32 / 10.0).abs() < 1e-6);
            assert_eq!(p.duration_ms, 50.0);
        }
        let total: f64 = chunk.iter().map(|p| p.duration_ms).sum();
        assert_eq!(total, 1000.0);
    }
}

#[test]
fn last_frame_does_not_fade_without_loop() {
    let plan = plan_timeline(&frames(3), &crossfade(1000, 500, false)).unwrap();
    assert_eq!(plan.len(), 11 + 11 + 1);
    let last = plan.last().unwrap();
    assert_eq!(last.frame, 2);
    assert_eq!(last.blend, None);
    assert_eq!(last.duration_ms, 1000.0);
}

#[test]
fn single_frame_never_transitions() {
    let plan = plan_timeline(&frames(1), &crossfade(1000, 500, true)).unwrap();
    assert_eq!(plan.len(), 1);
}

#[test]
fn transition_longer_than_frame_has_no_static_instant() {
    let plan = plan_timeline(&frames(2), &crossfade(300, 500, true)).unwrap();
    // floor(300 / 50) = 6 steps, no static remainder.
    assert_eq!(plan.len(), 12);
    assert!(plan.iter().all(|p| p.blend.is_some()));
}

#[test]
fn very_short_transition_has_no_visible_fade() {
    let plan = plan_timeline(&frames(2), &crossfade(1000, 40, true)).unwrap();
    assert_eq!(plan.len(), 2);
    assert!(plan.iter().all(|p| p.blend.is_none()));
    assert_eq!(plan[0].duration_ms, 960.0);
}

#[test]
fn durations_are_floored_at_one_ms() {
    let mut fs = frames(1);
    fs[0].duration_multiplier = 0.1;
    let s = AnimationSettings {
        frame_duration_ms: 5,
        ..AnimationSettings::default()
    };
    let plan = plan_timeline(&fs, &s).unwrap();
    assert_eq!(plan[0].duration_ms, 1.0);
}

#[test]
fn empty_frame_list_is_rejected() {
    assert!(plan_timeline(&[], &AnimationSettings::default()).is_err());
}

#[test]
fn render_preserves_order_and_elides_duplicates() {
    let fs = frames(3);
    let s = crossfade(1000, 500, true);
    let sequential = render_timeline(&fs, &s, None, &RenderThreading::default()).unwrap();
    assert_eq!(sequential.len(), 33);
    assert!(sequential.iter().all(|r| r.rgba.len() == 4 * 4 * 4));

    // alpha = 1.0 into frame 1 looks exactly like frame 1's static instant.
    assert!(Arc::ptr_eq(&sequential[10].rgba, &sequential[11].rgba));
    let first = &sequential[0].rgba[..4];
    assert!(first[0] >= 254 && first[1] <= 1 && first[3] == 255, "{first:?}");

    let parallel = render_timeline(
        &fs,
        &s,
        None,
        &RenderThreading {
            parallel: true,
            threads: Some(2),
            static_frame_elision: false,
        },
    )
    .unwrap();
    assert_eq!(parallel.len(), sequential.len());
    for (a, b) in sequential.iter().zip(&parallel) {
        assert_eq!(a.rgba, b.rgba);
        assert_eq!(a.duration_ms, b.duration_ms);
    }
}

#[test]
fn render_stats_count_elided_instants() {
    let fs = frames(2);
    let s = crossfade(1000, 500, true);
    let plan = plan_timeline(&fs, &s).unwrap();
    let comp = FrameCompositor::new(&fs, &s, None).unwrap();
    let (_, stats) = render_plan(&comp, &plan, &RenderThreading::default()).unwrap();
    assert_eq!(stats.instants_total, 22);
    // Both alpha = 1.0 instants reuse a static render.
    assert_eq!(stats.instants_elided, 2);
    assert_eq!(stats.instants_rendered, 20);
}

#[test]
fn zero_threads_is_rejected() {
    assert!(build_thread_pool(Some(0)).is_err());
    assert!(build_thread_pool(Some(1)).is_ok());
}

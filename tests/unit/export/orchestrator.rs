use std::sync::Arc;

use super::*;
use crate::model::frame::SourceImage;

fn frames() -> Vec<SourceFrame> {
    [[255, 0, 0, 255], [0, 0, 255, 255]]
        .into_iter()
        .enumerate()
        .map(|(i, c)| {
            SourceFrame::new(
                format!("f{i}"),
                Arc::new(SourceImage::solid(8, 8, c).unwrap()),
            )
        })
        .collect()
}

fn small() -> AnimationSettings {
    AnimationSettings {
        width: 8,
        height: 8,
        frame_duration_ms: 200,
        ..AnimationSettings::default()
    }
}

#[test]
fn filename_follows_convention() {
    let a = ExportArtifact {
        bytes: vec![],
        format: OutputFormat::Gif,
        width: 600,
        height: 400,
        final_quality: 55,
        attempts: 3,
        budget_met: true,
    };
    assert_eq!(a.filename(), "Anim-600x400-55.gif");
    assert_eq!(a.mime_type(), "image/gif");
}

#[test]
fn empty_frames_are_rejected() {
    assert!(export_animation(&[], &small(), None, &ExportOpts::default()).is_err());
}

#[test]
fn webp_and_gif_exports_produce_their_containers() {
    let webp = export_animation(&frames(), &small(), None, &ExportOpts::default()).unwrap();
    assert_eq!(&webp.bytes[0..4], b"RIFF");
    assert_eq!(webp.filename(), "Anim-8x8-85.webp");

    let gif = export_animation(
        &frames(),
        &small(),
        None,
        &ExportOpts {
            format: OutputFormat::Gif,
            ..ExportOpts::default()
        },
    )
    .unwrap();
    assert_eq!(&gif.bytes[0..6], b"GIF89a");
    assert_eq!(gif.attempts, 1);
}

#[test]
fn write_to_dir_uses_the_filename() {
    let dir = std::env::temp_dir().join(format!("flipreel-export-{}", std::process::id()));
    let artifact = export_animation(&frames(), &small(), None, &ExportOpts::default()).unwrap();
    let path = artifact.write_to_dir(&dir).unwrap();
    assert_eq!(path.file_name().unwrap(), "Anim-8x8-85.webp");
    assert_eq!(std::fs::read(&path).unwrap(), artifact.bytes);
    let _ = std::fs::remove_dir_all(&dir);
}

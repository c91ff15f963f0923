use super::*;

fn frame(id: &str) -> SourceFrame {
    let img = Arc::new(SourceImage::solid(4, 2, [255, 0, 0, 255]).unwrap());
    SourceFrame::new(id, img)
}

#[test]
fn source_image_checks_length_and_premultiplies() {
    assert!(SourceImage::from_straight_rgba(2, 2, vec![0; 15]).is_err());
    assert!(SourceImage::from_straight_rgba(0, 2, vec![]).is_err());

    let img = SourceImage::from_straight_rgba(1, 1, vec![200, 100, 50, 128]).unwrap();
    assert_eq!(img.rgba8_premul.as_slice(), &[100, 50, 25, 128]);
}

#[test]
fn new_frame_shows_full_image() {
    let f = frame("a");
    assert_eq!(f.crop, CropBox::full(4, 2));
    assert_eq!(f.duration_multiplier, 1.0);
    f.validate().unwrap();
}

#[test]
fn multiplier_below_floor_is_rejected() {
    let f = frame("a").with_duration_multiplier(0.05);
    assert!(f.validate().is_err());
    let f = frame("a").with_duration_multiplier(0.1);
    f.validate().unwrap();
}

#[test]
fn aspect_ratio_only_touches_auto_crops() {
    let mut f = frame("a");
    f.apply_aspect_ratio("1:1");
    assert_eq!(f.crop.width, 2.0);
    assert_eq!(f.crop.x, 1.0);

    let custom = CropBox {
        x: 0.0,
        y: 0.0,
        width: 1.0,
        height: 1.0,
        is_custom: true,
    };
    let mut f = frame("b").with_crop(custom);
    f.apply_aspect_ratio("1:1");
    assert_eq!(f.crop, custom);
}

#[test]
fn list_operations() {
    let mut frames = vec![frame("a"), frame("b"), frame("c")];

    let idx = duplicate_frame(&mut frames, "b").unwrap();
    assert_eq!(idx, 2);
    assert_eq!(frames[2].id, "b-1");
    let idx = duplicate_frame(&mut frames, "b").unwrap();
    assert_eq!(frames[idx].id, "b-2");
    assert!(duplicate_frame(&mut frames, "zzz").is_none());

    assert!(remove_frame(&mut frames, "b-1"));
    assert!(!remove_frame(&mut frames, "b-1"));

    reverse_frames(&mut frames);
    let ids: Vec<_> = frames.iter().map(|f| f.id.as_str()).collect();
    assert_eq!(ids, ["c", "b-2", "b", "a"]);
}

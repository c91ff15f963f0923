use super::*;

struct TempDir(PathBuf);

impl TempDir {
    fn new(tag: &str) -> Self {
        let dir = std::env::temp_dir().join(format!("flipreel-project-{tag}-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        Self(dir)
    }

    fn png(&self, name: &str, w: u32, h: u32, px: [u8; 4]) {
        let img = image::RgbaImage::from_pixel(w, h, image::Rgba(px));
        let path = self.0.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        img.save(path).unwrap();
    }

    fn project(&self, json: &str) -> PathBuf {
        let path = self.0.join("project.json");
        std::fs::write(&path, json).unwrap();
        path
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.0);
    }
}

#[test]
fn normalize_rel_path_rules() {
    assert_eq!(normalize_rel_path("./a/b.png").unwrap(), "a/b.png");
    assert_eq!(normalize_rel_path("a\\b.png").unwrap(), "a/b.png");
    assert!(normalize_rel_path("/etc/passwd").is_err());
    assert!(normalize_rel_path("../x.png").is_err());
    assert!(normalize_rel_path("").is_err());
    assert!(normalize_rel_path("./").is_err());
}

#[test]
fn malformed_json_is_a_serde_error() {
    let err = Project::from_reader("{ not json".as_bytes(), ".").unwrap_err();
    assert!(matches!(err, FlipreelError::Serde(_)));
}

#[test]
fn unknown_fields_are_rejected() {
    let json = r#"{ "frames": [{ "image": "a.png" }], "colour": "red" }"#;
    assert!(Project::from_reader(json.as_bytes(), ".").is_err());
}

#[test]
fn validate_catches_structural_problems() {
    let empty = Project::from_reader(r#"{ "frames": [] }"#.as_bytes(), ".").unwrap();
    assert!(empty.validate().is_err());

    let escape = Project::from_reader(r#"{ "frames": [{ "image": "../a.png" }] }"#.as_bytes(), ".")
        .unwrap();
    assert!(escape.validate().is_err());

    let bad_index = Project::from_reader(
        r#"{ "frames": [{ "image": "a.png" }], "apply_crop_from": 3 }"#.as_bytes(),
        ".",
    )
    .unwrap();
    assert!(bad_index.validate().is_err());
}

#[test]
fn defaults_apply_when_fields_are_omitted() {
    let p = Project::from_reader(r#"{ "frames": [{ "image": "a.png" }] }"#.as_bytes(), ".").unwrap();
    let def = p.def();
    assert_eq!(def.aspect_ratio, "original");
    assert_eq!(def.settings, AnimationSettings::default());
    assert_eq!(def.frames[0].duration_multiplier, 1.0);
    assert!(def.max_width.is_none() && !def.reverse);
}

#[test]
fn load_resolves_images_ids_and_aspect_crops() {
    let dir = TempDir::new("load");
    dir.png("img/wide.png", 40, 20, [255, 0, 0, 255]);
    dir.png("tall.png", 20, 40, [0, 0, 255, 255]);
    let path = dir.project(
        r#"{
            "frames": [
                { "image": "img/wide.png" },
                { "image": "tall.png", "id": "cover", "duration_multiplier": 2.0 },
                { "image": "./img/wide.png" }
            ],
            "aspect_ratio": "1:1",
            "settings": { "width": 32, "height": 32 }
        }"#,
    );
    let loaded = Project::from_path(&path).unwrap().load().unwrap();
    assert_eq!(loaded.frames.len(), 3);
    assert_eq!(loaded.frames[0].id, "frame-1");
    assert_eq!(loaded.frames[1].id, "cover");
    assert_eq!(loaded.frames[1].duration_multiplier, 2.0);

    let c0 = loaded.frames[0].crop;
    assert_eq!((c0.x, c0.y, c0.width, c0.height), (10.0, 0.0, 20.0, 20.0));
    assert!(!c0.is_custom);
    let c1 = loaded.frames[1].crop;
    assert_eq!((c1.x, c1.y, c1.width, c1.height), (0.0, 10.0, 20.0, 20.0));

    // Same path after normalization shares one decoded image.
    assert!(Arc::ptr_eq(&loaded.frames[0].image, &loaded.frames[2].image));
    assert_eq!((loaded.settings.width, loaded.settings.height), (32, 32));
    assert!(loaded.font.is_none());
}

#[test]
fn explicit_crops_are_custom_and_max_size_derives_the_canvas() {
    let dir = TempDir::new("crop");
    dir.png("a.png", 100, 50, [10, 20, 30, 255]);
    let path = dir.project(
        r#"{
            "frames": [
                { "image": "a.png", "crop": { "x": 0, "y": 0, "width": 80, "height": 40 } }
            ],
            "max_width": 20,
            "max_height": 20
        }"#,
    );
    let loaded = Project::from_path(&path).unwrap().load().unwrap();
    assert!(loaded.frames[0].crop.is_custom);
    assert_eq!((loaded.settings.width, loaded.settings.height), (20, 10));
}

#[test]
fn apply_crop_from_and_reverse() {
    let dir = TempDir::new("propagate");
    dir.png("small.png", 10, 10, [0, 255, 0, 255]);
    dir.png("big.png", 20, 20, [0, 0, 0, 255]);
    let path = dir.project(
        r#"{
            "frames": [
                { "image": "small.png", "crop": { "x": 0, "y": 0, "width": 5, "height": 5 } },
                { "image": "big.png" }
            ],
            "apply_crop_from": 0,
            "reverse": true
        }"#,
    );
    let loaded = Project::from_path(&path).unwrap().load().unwrap();
    // Reversed: big.png first.
    assert_eq!(loaded.frames[0].id, "frame-2");
    let c = loaded.frames[0].crop;
    assert_eq!((c.x, c.y, c.width, c.height), (0.0, 0.0, 10.0, 10.0));
    assert!(c.is_custom);
}

#[test]
fn text_overlay_range_extends_to_frame_count() {
    let dir = TempDir::new("overlay");
    dir.png("a.png", 4, 4, [1, 2, 3, 255]);
    let path = dir.project(
        r#"{
            "frames": [{ "image": "a.png" }, { "image": "a.png" }, { "image": "a.png" }],
            "settings": { "text_overlay": { "start_frame": 1, "end_frame": 1 } }
        }"#,
    );
    let loaded = Project::from_path(&path).unwrap().load().unwrap();
    assert_eq!(loaded.settings.text_overlay.end_frame, 3);
}

#[test]
fn missing_image_names_the_file() {
    let dir = TempDir::new("missing");
    let path = dir.project(r#"{ "frames": [{ "image": "nope.png" }] }"#);
    let err = Project::from_path(&path).unwrap().load().unwrap_err();
    assert!(err.to_string().contains("nope.png"));
}

#[test]
fn font_is_loaded_relative_to_the_project() {
    let dir = TempDir::new("font");
    dir.png("a.png", 4, 4, [1, 2, 3, 255]);
    std::fs::write(dir.0.join("title.ttf"), b"font bytes").unwrap();
    let path = dir.project(r#"{ "frames": [{ "image": "a.png" }], "font": "title.ttf" }"#);
    let loaded = Project::from_path(&path).unwrap().load().unwrap();
    let font = loaded.font.unwrap();
    assert_eq!(font.bytes.as_slice(), b"font bytes");
    assert_eq!(font.family, loaded.settings.text_overlay.font);
}

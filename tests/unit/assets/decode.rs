use super::*;

fn png_bytes(rgba: image::RgbaImage) -> Vec<u8> {
    let mut out = Vec::new();
    image::DynamicImage::ImageRgba8(rgba)
        .write_to(&mut std::io::Cursor::new(&mut out), image::ImageFormat::Png)
        .unwrap();
    out
}

#[test]
fn decode_png_premultiplies() {
    let img = image::RgbaImage::from_raw(1, 1, vec![200, 100, 50, 128]).unwrap();
    let prepared = decode_image(&png_bytes(img)).unwrap();
    assert_eq!((prepared.width, prepared.height), (1, 1));
    assert_eq!(prepared.rgba8_premul.as_slice(), &[100, 50, 25, 128]);
}

#[test]
fn decode_garbage_fails() {
    assert!(decode_image(b"not an image").is_err());
}

#[test]
fn load_missing_file_names_the_path() {
    let err = load_image(Path::new("definitely/missing.png")).unwrap_err();
    assert!(err.to_string().contains("missing.png"));
}

#[test]
fn empty_font_is_rejected() {
    assert!(LoadedFont::from_bytes("Impact", Vec::new()).is_err());
    let f = LoadedFont::from_bytes("Impact", vec![0, 1, 0, 0]).unwrap();
    assert_eq!(f.family, "Impact");
}

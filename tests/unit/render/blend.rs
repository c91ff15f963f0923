use super::*;

#[test]
fn over_endpoints() {
    let dst = [0, 0, 255, 255];
    let src = [255, 0, 0, 255];
    assert_eq!(over(dst, src, 0.0), dst);
    assert_eq!(over(dst, src, 1.0), src);
    assert_eq!(over(dst, [0, 0, 0, 0], 1.0), dst);
}

#[test]
fn over_half_opacity_on_opaque_reads_as_mix() {
    let out = over([0, 0, 255, 255], [255, 0, 0, 255], 0.5);
    assert_eq!(out[3], 255);
    assert!((i32::from(out[0]) - 128).abs() <= 1);
    assert!((i32::from(out[2]) - 127).abs() <= 1);
}

#[test]
fn lerp_endpoints_and_midpoint() {
    let a = [10, 20, 30, 255];
    let b = [210, 220, 230, 255];
    assert_eq!(lerp(a, b, 0.0), a);
    assert_eq!(lerp(a, b, 1.0), b);
    let mid = lerp(a, b, 0.5);
    assert!((i32::from(mid[0]) - 110).abs() <= 1);
}

#[test]
fn in_place_variants_check_lengths() {
    let mut dst = vec![0u8; 8];
    assert!(over_in_place(&mut dst, &[0u8; 4], 1.0).is_err());
    assert!(lerp_in_place(&mut dst, &[0u8; 7], 1.0).is_err());

    let src = vec![1, 2, 3, 255, 4, 5, 6, 255];
    over_in_place(&mut dst, &src, 1.0).unwrap();
    assert_eq!(dst, src);
    assert!(is_opaque(&dst));
    assert!(!is_opaque(&[0, 0, 0, 10]));
}

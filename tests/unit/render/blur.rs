use super::*;

#[test]
fn kernel_sums_to_one() {
    let k = gaussian_kernel_q16(6, 2.0).unwrap();
    assert_eq!(k.len(), 13);
    assert_eq!(k.iter().map(|&v| u64::from(v)).sum::<u64>(), 65536);
}

#[test]
fn zero_sigma_is_identity() {
    let mut px = vec![0, 0, 0, 0, 255, 255, 255, 255, 0, 0, 0, 0];
    let before = px.clone();
    gaussian_blur_in_place(&mut px, 3, 1, 0.0).unwrap();
    assert_eq!(px, before);
}

#[test]
fn constant_image_is_unchanged() {
    let mut px = [10u8, 20, 30, 40].repeat(25);
    let before = px.clone();
    gaussian_blur_in_place(&mut px, 5, 5, 1.5).unwrap();
    assert_eq!(px, before);
}

#[test]
fn blur_spreads_a_single_pixel() {
    let mut px = vec![0u8; 5 * 5 * 4];
    let center = (2 * 5 + 2) * 4;
    px[center..center + 4].copy_from_slice(&[255, 255, 255, 255]);
    gaussian_blur_in_place(&mut px, 5, 5, 1.0).unwrap();
    assert!(px[center + 3] < 255);
    assert!(px[(2 * 5 + 3) * 4 + 3] > 0);
}

#[test]
fn size_mismatch_is_an_error() {
    let mut px = vec![0u8; 12];
    assert!(gaussian_blur_in_place(&mut px, 2, 2, 1.0).is_err());
}

use super::*;

#[test]
fn dims_reject_oversized_canvas() {
    let canvas = Canvas {
        width: 70_000,
        height: 10,
    };
    assert!(canvas_dims_u16(canvas).is_err());
    assert_eq!(
        canvas_dims_u16(Canvas {
            width: 640,
            height: 480
        })
        .unwrap(),
        (640, 480)
    );
}

#[test]
fn pixmap_keeps_premul_bytes() {
    let bytes = vec![10, 20, 30, 255, 0, 0, 0, 0];
    let pm = pixmap_from_premul_bytes(&bytes, 2, 1).unwrap();
    assert_eq!(pm.width(), 2);
    assert_eq!(pm.height(), 1);
    assert_eq!(pm.data_as_u8_slice(), bytes.as_slice());
}

#[test]
fn pixmap_len_mismatch_is_an_error() {
    assert!(pixmap_from_premul_bytes(&[0u8; 7], 2, 1).is_err());
}

#[test]
fn affine_conversion_keeps_coefficients() {
    let a = Affine::translate((3.0, -2.0)) * Affine::scale(0.5);
    assert_eq!(affine_to_cpu(a).as_coeffs(), a.as_coeffs());
}

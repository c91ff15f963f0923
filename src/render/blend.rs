//! Premultiplied RGBA8 blend kernels.

use crate::foundation::error::{FlipreelError, FlipreelResult};
use crate::foundation::math::{mul_div255_u8, unit_to_u8};

pub type PremulRgba8 = [u8; 4];

/// Source-over with an extra opacity multiplier on `src`.
pub fn over(dst: PremulRgba8, src: PremulRgba8, opacity: f32) -> PremulRgba8 {
    let op = unit_to_u8(opacity);
    if op == 0 || src[3] == 0 {
        return dst;
    }

    let sa = mul_div255_u8(u16::from(src[3]), op);
    if sa == 0 {
        return dst;
    }
    let inv = 255u16 - u16::from(sa);

    let mut out = [0u8; 4];
    out[3] = sa.saturating_add(mul_div255_u8(u16::from(dst[3]), inv));
    for i in 0..3 {
        let sc = mul_div255_u8(u16::from(src[i]), op);
        let dc = mul_div255_u8(u16::from(dst[i]), inv);
        out[i] = sc.saturating_add(dc);
    }
    out
}

/// Component-wise linear interpolation `a*(1-t) + b*t`.
pub fn lerp(a: PremulRgba8, b: PremulRgba8, t: f32) -> PremulRgba8 {
    let tt = unit_to_u8(t);
    let it = 255u16 - tt;

    let mut out = [0u8; 4];
    for i in 0..4 {
        let av = mul_div255_u8(u16::from(a[i]), it);
        let bv = mul_div255_u8(u16::from(b[i]), tt);
        out[i] = av.saturating_add(bv);
    }
    out
}

pub fn over_in_place(dst: &mut [u8], src: &[u8], opacity: f32) -> FlipreelResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(FlipreelError::render(
            "over_in_place expects equal-length rgba8 buffers",
        ));
    }
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let out = over([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]], opacity);
        d.copy_from_slice(&out);
    }
    Ok(())
}

/// Replace `dst` (holding endpoint `a`) with the interpolation towards `b` at `t`.
pub fn lerp_in_place(dst: &mut [u8], b: &[u8], t: f32) -> FlipreelResult<()> {
    if dst.len() != b.len() || !dst.len().is_multiple_of(4) {
        return Err(FlipreelError::render(
            "lerp_in_place expects equal-length rgba8 buffers",
        ));
    }
    for (d, s) in dst.chunks_exact_mut(4).zip(b.chunks_exact(4)) {
        let out = lerp([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]], t);
        d.copy_from_slice(&out);
    }
    Ok(())
}

pub fn is_opaque(rgba: &[u8]) -> bool {
    rgba.chunks_exact(4).all(|px| px[3] == 255)
}

#[cfg(test)]
#[path = "../../tests/unit/render/blend.rs"]
mod tests;

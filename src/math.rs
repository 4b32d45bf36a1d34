//! Small numeric helpers shared by the face processor, scanline rasterizer,
//! and wireframe renderer: the fast reciprocal square root used to
//! normalize face normals, and fixed-point conversions at [`crate::F_SHIFT`].

use crate::F_SHIFT;

/// Approximate `1 / sqrt(x)` using the classic bit-cast Newton iteration
/// over a magic-constant seed.
///
/// With the `micromath` feature enabled, this defers to
/// [`micromath_::F32Ext::invsqrt`] instead, which uses the same technique
/// behind a `#![no_std]`-friendly crate boundary; both are accurate to
/// within about half a percent, which is ample for Lambertian shading.
#[inline]
pub fn rsqrt(x: f32) -> f32 {
    #[cfg(feature = "micromath")]
    {
        use micromath_::F32Ext;
        x.invsqrt()
    }
    #[cfg(not(feature = "micromath"))]
    {
        let x2 = x * 0.5;
        let i = x.to_bits();
        let i = 0x5f3759df_u32.wrapping_sub(i >> 1);
        let y = f32::from_bits(i);
        y * (1.5 - x2 * y * y)
    }
}

/// Convert a floating point value into `F_SHIFT`-fixed-point.
#[inline(always)]
pub fn to_fixed(v: f32) -> i64 {
    (v * (1i64 << F_SHIFT) as f32) as i64
}

/// Convert an `F_SHIFT`-fixed-point value back to floating point.
#[inline(always)]
pub fn from_fixed(v: i64) -> f32 {
    v as f32 / (1i64 << F_SHIFT) as f32
}

/// Ceil-divide a fixed-point coordinate down to the first whole pixel it
/// covers — the top-left fill convention that keeps pixel counts from
/// drifting by an edge's length.
#[inline(always)]
pub fn fixed_ceil_to_pixel(v: i64) -> i64 {
    (v + (1i64 << F_SHIFT) - 1) >> F_SHIFT
}

//! Scanline rasterizer: per-tile face walk, sub-pixel point punting, and
//! the sorted-Y half-triangle scan conversion with an integrated depth
//! test.
//!
//! The span filler is scalar and intensity-interpolating; a SIMD fast
//! path is left as a future optional addition that would need to match
//! this one bit-for-bit.

use crate::buffer::PixelBuffer;
use crate::math::{fixed_ceil_to_pixel, to_fixed};
use crate::tile::{Tile, TileBounds};

/// Decompose a packed `0xFF000000 | b<<16 | g<<8 | r` color into its three
/// channels.
#[inline]
fn unpack_rgb(color: u32) -> (u8, u8, u8) {
    (color as u8, (color >> 8) as u8, (color >> 16) as u8)
}

#[inline]
fn pack_rgb(r: u8, g: u8, b: u8) -> u32 {
    0xFF00_0000 | ((b as u32) << 16) | ((g as u32) << 8) | r as u32
}

/// One edge's fixed-point x/z and floating-point intensity, stepped one
/// scanline at a time.
#[derive(Clone, Copy)]
struct Edge {
    x: i64,
    dx: i64,
    z: i64,
    dz: i64,
    i: f32,
    di: f32,
}

impl Edge {
    /// Build a stepper that walks from `top` to `bot` (screen vertex plus
    /// intensity at each end), starting at integer scanline `y_start`.
    fn new(top: [f32; 4], i_top: f32, bot: [f32; 4], i_bot: f32, y_start: i32) -> Self {
        let dy = bot[1] - top[1];
        if dy.abs() < 1e-6 {
            return Edge { x: to_fixed(top[0]), dx: 0, z: to_fixed(top[2]), dz: 0, i: i_top, di: 0.0 };
        }
        let dx_per_y = (bot[0] - top[0]) / dy;
        let dz_per_y = (bot[2] - top[2]) / dy;
        let di_per_y = (i_bot - i_top) / dy;
        let t = y_start as f32 - top[1];
        Edge {
            x: to_fixed(top[0] + dx_per_y * t),
            dx: to_fixed(dx_per_y),
            z: to_fixed(top[2] + dz_per_y * t),
            dz: to_fixed(dz_per_y),
            i: i_top + di_per_y * t,
            di: di_per_y,
        }
    }

    #[inline]
    fn step(&mut self) {
        self.x += self.dx;
        self.z += self.dz;
        self.i += self.di;
    }
}

/// Fill one scanline between two fixed-point edge positions, testing and
/// updating depth per pixel and modulating `(r, g, b)` by the
/// per-pixel-interpolated intensity.
#[allow(clippy::too_many_arguments)]
fn fill_span(pixels: &mut PixelBuffer, y: u32, left: Edge, right: Edge, rgb: (u8, u8, u8), bounds: TileBounds) {
    let (mut left, mut right) = (left, right);
    if left.x > right.x {
        std::mem::swap(&mut left, &mut right);
    }

    let x_start = fixed_ceil_to_pixel(left.x).max(bounds.min_x as i64);
    let x_end = fixed_ceil_to_pixel(right.x).min(bounds.max_x as i64);
    if x_start >= x_end {
        return;
    }

    let n = (x_end - x_start).max(1);
    let dz = (right.z - left.z) / n;
    let di = (right.i - left.i) as f64 / n as f64;

    // Pre-step from the edge's exact sub-pixel position to the first
    // whole pixel, using the same fixed-point fraction the ceil rule
    // derived `x_start` from.
    let frac = (x_start << crate::F_SHIFT) - left.x;
    let mut z = left.z + ((dz * frac) >> crate::F_SHIFT);
    let mut intensity = left.i as f64 + di * (frac as f64 / (1i64 << crate::F_SHIFT) as f64);

    let (r, g, b) = rgb;
    for x in x_start..x_end {
        let zf = crate::math::from_fixed(z);
        if zf > pixels.depth(x as u32, y) {
            let t = intensity.clamp(0.0, 4.0) as f32;
            let color = pack_rgb(
                (r as f32 * t).clamp(0.0, 255.0) as u8,
                (g as f32 * t).clamp(0.0, 255.0) as u8,
                (b as f32 * t).clamp(0.0, 255.0) as u8,
            );
            pixels.write(x as u32, y, zf, color);
        }
        z += dz;
        intensity += di;
    }
}

/// Rasterize every face bound to `tile` into `pixels`, clipped to
/// `bounds`.
///
/// `base_rgb` is the solid-mode surface color; when `face_color` carries
/// a per-face debug color (normal/UV visualization) that color is used
/// per-face instead.
#[allow(clippy::too_many_arguments)]
pub fn render_tile(
    tile: &Tile,
    bounds: TileBounds,
    screen: &[[f32; 4]],
    indices: &[[u32; 3]],
    face_intensity: &[f32],
    face_color: &[u32],
    base_rgb: (u8, u8, u8),
    use_face_color: bool,
    pixels: &mut PixelBuffer,
) {
    for &face_id in &tile.indices {
        let [i0, i1, i2] = indices[face_id as usize];
        let mut verts = [screen[i0 as usize], screen[i1 as usize], screen[i2 as usize]];
        let intens = face_intensity[face_id as usize];
        let rgb = if use_face_color { unpack_rgb(face_color[face_id as usize]) } else { base_rgb };

        let min_x = verts[0][0].min(verts[1][0]).min(verts[2][0]);
        let max_x = verts[0][0].max(verts[1][0]).max(verts[2][0]);
        let min_y = verts[0][1].min(verts[1][1]).min(verts[2][1]);
        let max_y = verts[0][1].max(verts[1][1]).max(verts[2][1]);

        if max_x - min_x < 1.0 && max_y - min_y < 1.0 {
            let (px, py) = (verts[0][0].floor() as i64, verts[0][1].floor() as i64);
            if px >= bounds.min_x as i64 && px < bounds.max_x as i64 && py >= bounds.min_y as i64 && py < bounds.max_y as i64 {
                let z0 = verts[0][2];
                if z0 > pixels.depth(px as u32, py as u32) {
                    let t = intens.clamp(0.0, 4.0);
                    let color = pack_rgb(
                        (rgb.0 as f32 * t).clamp(0.0, 255.0) as u8,
                        (rgb.1 as f32 * t).clamp(0.0, 255.0) as u8,
                        (rgb.2 as f32 * t).clamp(0.0, 255.0) as u8,
                    );
                    pixels.write(px as u32, py as u32, z0, color);
                }
            }
            continue;
        }

        // Sort the three vertices by ascending Y. Intensity is per-face
        // (flat shading), so it needs no reordering of its own.
        let mut order = [0usize, 1, 2];
        order.sort_by(|&a, &b| verts[a][1].partial_cmp(&verts[b][1]).unwrap());
        verts = [verts[order[0]], verts[order[1]], verts[order[2]]];

        let y_top = verts[0][1].round() as i32;
        let y_mid = verts[1][1].round() as i32;
        let y_bot = verts[2][1].round() as i32;
        if y_top == y_bot {
            continue;
        }

        // Both ends of the long edge carry the same per-face intensity,
        // so interpolation degenerates to a constant across the whole
        // triangle; the edge steppers still track it to keep the span
        // filler's contract (left/right intensity) uniform with a
        // hypothetical per-vertex-lit variant.
        let y_from_top = y_top.max(bounds.min_y as i32);
        let y_to_mid = y_mid.min(bounds.max_y as i32);
        if y_from_top < y_to_mid {
            let mut long = Edge::new(verts[0], intens, verts[2], intens, y_from_top);
            let mut short = Edge::new(verts[0], intens, verts[1], intens, y_from_top);
            for y in y_from_top..y_to_mid {
                fill_span(pixels, y as u32, long, short, rgb, bounds);
                long.step();
                short.step();
            }
        }

        let y_from_mid = y_mid.max(bounds.min_y as i32);
        let y_to_bot = y_bot.min(bounds.max_y as i32);
        if y_from_mid < y_to_bot {
            let mut long = Edge::new(verts[0], intens, verts[2], intens, y_from_mid);
            let mut short = Edge::new(verts[1], intens, verts[2], intens, y_from_mid);
            for y in y_from_mid..y_to_bot {
                fill_span(pixels, y as u32, long, short, rgb, bounds);
                long.step();
                short.step();
            }
        }
    }
}

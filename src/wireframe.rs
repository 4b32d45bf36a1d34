//! Wireframe renderer: bypasses the tile binner and span filler, drawing
//! each face's three edges as Bresenham-stepped, depth-tested, optionally
//! dashed lines.

use crate::buffer::PixelBuffer;

/// Dash period, in pixels, shared by every wireframe edge.
const DASH_PERIOD: i32 = 16;

/// Slight forward bias so wire edges stay visible drawn over the solid
/// surface of the same mesh.
const DEPTH_BIAS: f32 = 0.01;

/// Draw one Bresenham-stepped line from `(x0, y0, z0)` to `(x1, y1, z1)`,
/// testing/updating depth per pixel and skipping pixels the dash pattern
/// excludes.
///
/// `density` in `[0, 1]` controls what fraction of each 16-pixel dash
/// period is drawn; a pixel at step `i` is kept iff `i mod 16 <
/// floor(16 * density)`.
#[allow(clippy::too_many_arguments)]
fn draw_edge(pixels: &mut PixelBuffer, x0: i32, y0: i32, z0: f32, x1: i32, y1: i32, z1: f32, color: u32, density: f32, bounds_w: u32, bounds_h: u32) {
    let dash_on = (DASH_PERIOD as f32 * density).floor() as i32;

    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    let (mut x, mut y) = (x0, y0);
    let steps = dx.max(-dy).max(1);
    let mut step = 0i32;

    loop {
        if step % DASH_PERIOD < dash_on && x >= 0 && y >= 0 && (x as u32) < bounds_w && (y as u32) < bounds_h {
            let t = step as f32 / steps as f32;
            let z = z0 + (z1 - z0) * t;
            if z >= pixels.depth(x as u32, y as u32) - DEPTH_BIAS {
                pixels.write(x as u32, y as u32, z, color);
            }
        }
        if x == x1 && y == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
        step += 1;
    }
}

/// Draw every face in `sorted_face_ids[..valid_count]` as three dashed,
/// depth-tested edges.
#[allow(clippy::too_many_arguments)]
pub fn render_wireframe(
    pixels: &mut PixelBuffer,
    screen: &[[f32; 4]],
    indices: &[[u32; 3]],
    sorted_face_ids: &[u32],
    valid_count: u32,
    color: u32,
    density: f32,
    width: u32,
    height: u32,
) {
    for &face_id in &sorted_face_ids[..valid_count as usize] {
        let [i0, i1, i2] = indices[face_id as usize];
        let v = [screen[i0 as usize], screen[i1 as usize], screen[i2 as usize]];
        for &(a, b) in &[(0, 1), (1, 2), (2, 0)] {
            let (p0, p1) = (v[a], v[b]);
            draw_edge(
                pixels,
                p0[0].round() as i32,
                p0[1].round() as i32,
                p0[2],
                p1[0].round() as i32,
                p1[1].round() as i32,
                p1[2],
                color,
                density,
                width,
                height,
            );
        }
    }
}

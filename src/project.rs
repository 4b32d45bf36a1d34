//! Projector: perspective divide and viewport mapping, flagging
//! behind-camera vertices.

use crate::NEAR_EPSILON;

/// Project `homog` (world/clip-space vertices from the transformer) into
/// screen space, writing `[sx, sy, 1/(-z), validity]` into `screen`.
///
/// `validity` is `1.0` for vertices in front of the near plane and `-1.0`
/// for vertices at or behind it (`z > -ε`); downstream stages treat a
/// negative fourth component as "do not use this vertex". The Y axis is
/// flipped to the screen-down convention used by the rest of the
/// pipeline.
pub fn project_vertices(screen: &mut [[f32; 4]], homog: &[[f32; 4]], width: u32, height: u32, fov: f32) {
    debug_assert_eq!(screen.len(), homog.len());
    let cx = width as f32 * 0.5;
    let cy = height as f32 * 0.5;

    for (dst, src) in screen.iter_mut().zip(homog.iter()) {
        let [x, y, z, _w] = *src;
        if z > -NEAR_EPSILON {
            *dst = [0.0, 0.0, 0.0, -1.0];
            continue;
        }
        let inv = 1.0 / -z;
        let scale = fov * inv;
        *dst = [x * scale + cx, -y * scale + cy, inv, 1.0];
    }
}

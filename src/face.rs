//! Face processor: per-triangle frustum reject, backface cull, face
//! normal + directional lighting intensity, depth key, and the compact
//! valid-face index list.

use crate::math::rsqrt;
use crate::sort::SortOrder;

/// Visibility/debug mode flags passed in by the host for a draw call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FaceMode {
    /// Wireframe mode retains back-facing triangles instead of culling
    /// them.
    pub wireframe: bool,
    /// Store a debug color derived from the face normal instead of
    /// leaving `face_color` untouched. Covers both a UV-debug and a
    /// normal-debug visualization mode under one flag, since both mean
    /// "store the normal debug color" at this layer.
    pub visualize_normals: bool,
}

/// Faces beyond this count are walked with `stride = 4`; see
/// `adaptive_stride`. A deliberate lossy LOD for very large meshes.
const STRIDE_4_THRESHOLD: usize = 200_000;
/// Faces beyond this count (and at or below [`STRIDE_4_THRESHOLD`]) are
/// walked with `stride = 2`.
const STRIDE_2_THRESHOLD: usize = 50_000;

fn adaptive_stride(face_count: usize) -> usize {
    if face_count > STRIDE_4_THRESHOLD {
        4
    } else if face_count > STRIDE_2_THRESHOLD {
        2
    } else {
        1
    }
}

fn cross3(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [a[1] * b[2] - a[2] * b[1], a[2] * b[0] - a[0] * b[2], a[0] * b[1] - a[1] * b[0]]
}

fn sub3(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn dot3(a: [f32; 3], b: [f32; 3]) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

/// Pack a signed, roughly unit-length normal component into `[0, 255.9)`.
fn pack_normal_channel(n: f32) -> u32 {
    ((n * 0.5 + 0.5) * 255.9).clamp(0.0, 255.9) as u32
}

/// Process every face in `indices`, writing valid face ids + depth keys
/// into `valid_ids`/`depths` (cleared first) and per-face intensity/debug
/// color into the full per-ordinal `face_intensity`/`face_color` slices.
/// Returns `valid_count`.
///
/// `screen` holds post-projection vertices (validity flag in the fourth
/// component); `world` holds the pre-projection transformer output used
/// for normals and the depth key. `light` is a pre-normalized directional
/// light vector.
#[allow(clippy::too_many_arguments)]
pub fn process_faces(
    indices: &[[u32; 3]],
    screen: &[[f32; 4]],
    world: &[[f32; 4]],
    light: [f32; 3],
    mode: FaceMode,
    valid_ids: &mut Vec<u32>,
    depths: &mut Vec<f32>,
    face_intensity: &mut [f32],
    face_color: &mut [u32],
) -> u32 {
    valid_ids.clear();
    depths.clear();

    let stride = adaptive_stride(indices.len());
    let mut face_id = 0usize;
    while face_id < indices.len() {
        let [i0, i1, i2] = indices[face_id];
        let (s0, s1, s2) = (screen[i0 as usize], screen[i1 as usize], screen[i2 as usize]);

        // Step 1: frustum reject.
        if s0[3] < 0.0 || s1[3] < 0.0 || s2[3] < 0.0 {
            face_id += stride;
            continue;
        }

        // Step 2: signed screen-space area / backface cull (positive area
        // is back-facing).
        let area = (s1[0] - s0[0]) * (s2[1] - s0[1]) - (s1[1] - s0[1]) * (s2[0] - s0[0]);
        if !mode.wireframe && area >= 0.0 {
            face_id += stride;
            continue;
        }

        // Step 3: world-space face normal.
        let (w0, w1, w2) = (world[i0 as usize], world[i1 as usize], world[i2 as usize]);
        let (w0, w1, w2) = ([w0[0], w0[1], w0[2]], [w1[0], w1[1], w1[2]], [w2[0], w2[1], w2[2]]);
        let edge1 = sub3(w1, w0);
        let edge2 = sub3(w2, w0);
        let mut normal = cross3(edge1, edge2);
        let len_sq = dot3(normal, normal);
        if len_sq > 0.0 {
            let inv_len = rsqrt(len_sq);
            normal = [normal[0] * inv_len, normal[1] * inv_len, normal[2] * inv_len];
        }

        // Step 4: Lambertian intensity with an ambient floor.
        let intensity = (dot3(normal, light) * 0.8 + 0.2).max(0.2);

        // Step 5: optional debug normal color.
        if mode.visualize_normals {
            let r = pack_normal_channel(normal[0]);
            let g = pack_normal_channel(normal[1]);
            let b = pack_normal_channel(normal[2]);
            face_color[face_id] = 0xFF00_0000 | (b << 16) | (g << 8) | r;
        }
        face_intensity[face_id] = intensity;

        // Step 6: mean world-space depth key.
        let depth_key = (w0[2] + w1[2] + w2[2]) / 3.0;

        // Step 7: append to the compact valid-face arrays.
        valid_ids.push(face_id as u32);
        depths.push(depth_key);

        face_id += stride;
    }

    valid_ids.len() as u32
}

/// Solid mode wants back-to-front so the scanline rasterizer's `z >
/// pixel.depth` overwrite paints nearer surfaces last.
pub fn default_sort_order(mode: FaceMode) -> SortOrder {
    if mode.wireframe {
        SortOrder::FrontToBack
    } else {
        SortOrder::BackToFront
    }
}

//! Vertex transformer: multiplies raw object-space vertices by a 4×4
//! matrix into world/clip-space homogeneous coordinates.

use vek::{Mat4, Vec4};

/// Transform `raw` vertices by `matrix`, writing `M·(x, y, z, 1)` into
/// `out` for each.
///
/// `vek::Vec4`'s arithmetic already broadcasts each lane independently, so
/// `matrix * Vec4::new(x, y, z, 1.0)` broadcasts x, y, z against the
/// matrix's columns and adds the translation column in one step — the
/// four lanes of the output vector are computed together rather than one
/// scalar dot product at a time.
///
/// Reads and writes are independent between input indices, so this is
/// trivially parallelizable across `out`/`raw` sub-ranges; see
/// [`transform_range`] for the chunked entry point the `par` feature uses.
pub fn transform_vertices(out: &mut [[f32; 4]], raw: &[[f32; 3]], matrix: &Mat4<f32>) {
    debug_assert_eq!(out.len(), raw.len());
    transform_range(out, raw, matrix, 0, raw.len());
}

/// Transform only `raw[start..end]` into `out[start..end]`. Exposed so a
/// host (or this crate's own tile-parallel renderer) can fan the
/// embarrassingly-parallel vertex stage out across worker threads without
/// needing ownership of the whole buffer.
pub fn transform_range(out: &mut [[f32; 4]], raw: &[[f32; 3]], matrix: &Mat4<f32>, start: usize, end: usize) {
    for i in start..end {
        let [x, y, z] = raw[i];
        let v = *matrix * Vec4::new(x, y, z, 1.0);
        out[i] = v.into_array();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_matrix_is_a_no_op_in_xyz() {
        let raw = [[1.0, 2.0, 3.0], [-1.0, 0.0, 5.0]];
        let mut out = [[0.0; 4]; 2];
        transform_vertices(&mut out, &raw, &Mat4::identity());
        assert_eq!(out[0], [1.0, 2.0, 3.0, 1.0]);
        assert_eq!(out[1], [-1.0, 0.0, 5.0, 1.0]);
    }

    #[test]
    fn translation_matrix_shifts_xyz() {
        let matrix = Mat4::translation_3d(vek::Vec3::new(10.0, 0.0, 0.0));
        let raw = [[0.0, 0.0, 0.0]];
        let mut out = [[0.0; 4]];
        transform_vertices(&mut out, &raw, &matrix);
        assert_eq!(out[0], [10.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn range_transform_only_touches_requested_indices() {
        let raw = [[1.0, 1.0, 1.0]; 4];
        let mut out = [[9.0; 4]; 4];
        transform_range(&mut out, &raw, &Mat4::identity(), 1, 3);
        assert_eq!(out[0], [9.0; 4]);
        assert_eq!(out[1], [1.0, 1.0, 1.0, 1.0]);
        assert_eq!(out[2], [1.0, 1.0, 1.0, 1.0]);
        assert_eq!(out[3], [9.0; 4]);
    }
}

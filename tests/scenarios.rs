//! The six concrete end-to-end scenarios.

use raskel::{BufferPoolConfig, FaceMode, Pipeline};
use vek::Mat4;

fn small_pipeline() -> Pipeline {
    let config = BufferPoolConfig { max_width: 100, max_height: 100, max_vertices: 16, max_faces: 16, tile_size: 128, max_faces_per_tile: 64 };
    Pipeline::new(config).unwrap()
}

#[test]
fn scenario_1_single_unit_triangle_at_origin() {
    let mut pipeline = small_pipeline();
    pipeline.upload_mesh(&[[0.0, 0.0, -1.0], [1.0, 0.0, -1.0], [0.0, 1.0, -1.0]], &[[0, 1, 2]]);
    let mut out = vec![0u32; 100 * 100];
    let valid = pipeline.render_frame(100, 100, Mat4::identity(), [0.0, 0.0, 1.0], 50.0, (255, 0, 0), FaceMode::default(), &mut out);

    assert_eq!(valid, 1);
    assert_eq!(out[50 * 100 + 50] & 0x00FF_FFFF, 0x0000_00FF, "center pixel should be red");
    assert_eq!(out[0], 0, "origin pixel should be untouched");
}

#[test]
fn scenario_2_backface_cull() {
    let mut pipeline = small_pipeline();
    pipeline.upload_mesh(&[[0.0, 0.0, -1.0], [0.0, 1.0, -1.0], [1.0, 0.0, -1.0]], &[[0, 1, 2]]);
    let mut out = vec![0u32; 100 * 100];
    let valid = pipeline.render_frame(100, 100, Mat4::identity(), [0.0, 0.0, 1.0], 50.0, (255, 0, 0), FaceMode::default(), &mut out);

    assert_eq!(valid, 0);
    assert!(out.iter().all(|&c| c == 0), "a fully backface-culled mesh should write no pixels");
}

#[test]
fn scenario_3_two_overlapping_triangles_depth_sorted() {
    let mut pipeline = small_pipeline();
    let mut out = vec![0u32; 100 * 100];

    // A big red triangle at z=-2 clears the viewport and draws first;
    // the big blue one at z=-1 draws into the same buffers without an
    // intervening clear, so the nearer (z=-1) blue triangle should win
    // the depth test at the center.
    pipeline.clear(100, 100);
    pipeline.upload_mesh(&[[-5.0, -5.0, -2.0], [5.0, -5.0, -2.0], [-5.0, 5.0, -2.0]], &[[0, 1, 2]]);
    pipeline.draw_solid(100, 100, Mat4::identity(), [0.0, 0.0, 1.0], 10.0, (255, 0, 0), FaceMode::default());

    pipeline.upload_mesh(&[[-5.0, -5.0, -1.0], [5.0, -5.0, -1.0], [-5.0, 5.0, -1.0]], &[[0, 1, 2]]);
    pipeline.draw_solid(100, 100, Mat4::identity(), [0.0, 0.0, 1.0], 10.0, (0, 0, 255), FaceMode::default());

    pipeline.extract(&mut out, 100, 100);

    assert_eq!(out[50 * 100 + 50] & 0x00FF_FFFF, 0x00FF_0000, "nearer blue triangle should win the depth test at the center");
}

#[test]
fn scenario_4_sub_pixel_triangle() {
    let mut pipeline = small_pipeline();
    // Reverse-project isn't needed: drive the low-level rasterizer
    // directly with a screen-space sub-pixel triangle, matching the
    // scenario's framing exactly ("all three vertices within a
    // 0.5-pixel box at (10.2, 10.2, -1)").
    let screen = [[10.2, 10.2, 1.0, 1.0], [10.4, 10.2, 1.0, 1.0], [10.2, 10.4, 1.0, 1.0]];
    let indices = [[0u32, 1, 2]];
    let tile = raskel::tile::Tile { indices: vec![0] };
    let bounds = raskel::tile::tile_bounds(0, 0, 128, 100, 100);
    pipeline.clear(100, 100);
    let pool = pipeline.pool_mut();
    raskel::raster::render_tile(&tile, bounds, &screen, &indices, &[1.0], &[0], (0, 255, 0), false, pool.pixels_mut());

    let mut lit = Vec::new();
    for y in 0..100u32 {
        for x in 0..100u32 {
            if pool.pixels().color(x, y) != 0 {
                lit.push((x, y));
            }
        }
    }
    assert_eq!(lit, vec![(10, 10)]);
}

#[test]
fn scenario_5_wireframe_dash() {
    let mut pipeline = small_pipeline();
    pipeline.clear(100, 100);
    let pool = pipeline.pool_mut();
    let screen = [[0.0, 0.0, 1.0, 1.0], [31.0, 0.0, 1.0, 1.0], [0.0, 10.0, 1.0, 1.0]];
    let indices = [[0u32, 1, 2]];
    let sorted = [0u32];
    raskel::wireframe::render_wireframe(pool.pixels_mut(), &screen, &indices, &sorted, 1, 0xFFFFFFFF, 0.5, 100, 100);

    for x in 0..8u32 {
        assert_ne!(pool.pixels().color(x, 0), 0);
    }
    for x in 8..16u32 {
        assert_eq!(pool.pixels().color(x, 0), 0);
    }
    for x in 16..24u32 {
        assert_ne!(pool.pixels().color(x, 0), 0);
    }
    for x in 24..32u32 {
        assert_eq!(pool.pixels().color(x, 0), 0);
    }
}

#[test]
fn scenario_6_radix_sort_sign() {
    let mut indices: Vec<u32> = (0..5).collect();
    let mut depths = vec![-1.0f32, 2.0, -2.0, 1.0, 0.0];
    let mut aux_idx = vec![0u32; 5];
    let mut aux_dep = vec![0.0f32; 5];
    let mut histogram = [0u32; 256];
    raskel::sort::radix_sort_by_depth(&mut indices, &mut depths, 5, &mut aux_idx, &mut aux_dep, &mut histogram, raskel::SortOrder::BackToFront);

    assert_eq!(depths, vec![-2.0, -1.0, 0.0, 1.0, 2.0]);
    assert_eq!(indices, vec![2, 0, 4, 3, 1]);
}

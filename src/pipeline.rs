//! The pipeline: owns a [`BufferPool`] and drives it through clear,
//! transform, project, cull/light, sort, bin, rasterize, and extract for
//! one frame at a time.
//!
//! The per-tile scanline rasterizer is the primary parallelism target:
//! tiles own disjoint pixel ranges and disjoint face lists, so a pool of
//! workers can rasterize them concurrently with no synchronization beyond
//! the join at the end, via an `AtomicUsize` work cursor claimed by a
//! fixed pool of `thread::scope` workers.

use crate::buffer::{BufferPool, BufferPoolConfig};
use crate::error::PipelineError;
use crate::face::{default_sort_order, process_faces, FaceMode};
use crate::pixel::extract_colors;
use crate::project::project_vertices;
use crate::raster::render_tile;
use crate::tile::{bin_faces, tile_bounds, tile_count};
use crate::transform::transform_vertices;
use crate::wireframe::render_wireframe;
use vek::Mat4;

/// Orchestrates one frame's worth of the transform → project → cull →
/// sort → bin → rasterize → extract pipeline over an owned [`BufferPool`].
pub struct Pipeline {
    pool: BufferPool,
}

impl Pipeline {
    pub fn new(config: BufferPoolConfig) -> Result<Self, PipelineError> {
        Ok(Self { pool: BufferPool::new(config)? })
    }

    pub fn pool(&self) -> &BufferPool {
        &self.pool
    }

    pub fn pool_mut(&mut self) -> &mut BufferPool {
        &mut self.pool
    }

    /// Replace the mesh data for the next frame. See
    /// [`BufferPool::upload_vertices`]/[`BufferPool::upload_faces`].
    pub fn upload_mesh(&mut self, vertices: &[[f32; 3]], faces: &[[u32; 3]]) {
        self.pool.upload_vertices(vertices);
        self.pool.upload_faces(faces);
    }

    /// Clear the active viewport. A host driving the granular stages
    /// itself — e.g. to composite several draws into one depth buffer
    /// without an intervening clear — calls this once up front instead of
    /// through [`Pipeline::render_frame`].
    pub fn clear(&mut self, width: u32, height: u32) {
        self.pool.clear_viewport(width, height);
    }

    /// Stages 2-4 (transform, project, cull/light), shared by solid and
    /// wireframe draws. Returns the valid face count.
    fn prepare_faces(&mut self, width: u32, height: u32, matrix: Mat4<f32>, light: [f32; 3], mode: FaceMode, fov: f32) -> u32 {
        self.pool.set_matrix(matrix);

        let (raw, world, m) = self.pool.transform_io();
        transform_vertices(world, raw, m);

        let (world, screen) = self.pool.project_io();
        project_vertices(screen, world, width, height, fov);

        let (indices, screen, world, valid_ids, depths, face_intensity, face_color) = self.pool.face_processing_io();
        process_faces(indices, screen, world, light, mode, valid_ids, depths, face_intensity, face_color)
    }

    /// Transform through per-tile rasterize for a solid-shaded draw,
    /// without clearing or extracting. Exposed so a host can
    /// draw several meshes, each with its own color, into one frame
    /// before a single [`Pipeline::extract`] call — [`Pipeline::render_frame`]
    /// is the common case of calling this once between a clear and an
    /// extract.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_solid(&mut self, width: u32, height: u32, matrix: Mat4<f32>, light: [f32; 3], fov: f32, base_rgb: (u8, u8, u8), mode: FaceMode) -> u32 {
        let valid_count = self.prepare_faces(width, height, matrix, light, mode, fov);
        self.pool.sort_valid_faces(default_sort_order(mode));

        let tile_size = self.pool.config().tile_size;
        let max_per_tile = self.pool.config().max_faces_per_tile;
        // `stride_x` is the preallocated grid width (sized from
        // `max_width`); `tiles_x`/`tiles_y` are this frame's active
        // subgrid, derived from the active viewport rather than the
        // pool's compile-time maxima, so a viewport smaller than
        // `max_width`/`max_height` only bins and rasterizes the tiles it
        // actually needs.
        let stride_x = self.pool.tiles_x();
        let tiles_x = tile_count(width as usize, tile_size).min(stride_x);
        let tiles_y = tile_count(height as usize, tile_size).min(self.pool.tiles_y());
        let (tiles, screen, indices, valid_ids) = self.pool.tiling_io();
        bin_faces(tiles, stride_x, tiles_x, tiles_y, tile_size, max_per_tile, screen, indices, valid_ids, valid_count, width, height);

        rasterize_tiles(&mut self.pool, stride_x, tiles_x, tiles_y, tile_size, width, height, base_rgb, mode.visualize_normals);
        valid_count
    }

    /// Transform through per-edge draw for a wireframe pass, bypassing
    /// the tile binner and span filler entirely, without clearing or
    /// extracting.
    pub fn draw_wireframe(&mut self, width: u32, height: u32, matrix: Mat4<f32>, light: [f32; 3], fov: f32, color: u32, density: f32) -> u32 {
        let mode = FaceMode { wireframe: true, visualize_normals: false };
        let valid_count = self.prepare_faces(width, height, matrix, light, mode, fov);
        self.pool.sort_valid_faces(default_sort_order(mode));

        let (pixels, screen, indices, valid_ids) = self.pool.wireframe_io();
        render_wireframe(pixels, screen, indices, valid_ids, valid_count, color, density, width, height);
        valid_count
    }

    /// Copy the color buffer out into a tightly packed, row-major image.
    pub fn extract(&self, out: &mut [u32], width: u32, height: u32) {
        extract_colors(self.pool.pixels(), out, width, height);
    }

    /// Render one solid-shaded frame: clear, [`Pipeline::draw_solid`], extract.
    #[allow(clippy::too_many_arguments)]
    pub fn render_frame(&mut self, width: u32, height: u32, matrix: Mat4<f32>, light: [f32; 3], fov: f32, base_rgb: (u8, u8, u8), mode: FaceMode, out: &mut [u32]) -> u32 {
        self.clear(width, height);
        let valid_count = self.draw_solid(width, height, matrix, light, fov, base_rgb, mode);
        self.extract(out, width, height);
        valid_count
    }

    /// Render one wireframe frame: clear, [`Pipeline::draw_wireframe`], extract.
    #[allow(clippy::too_many_arguments)]
    pub fn render_frame_wireframe(&mut self, width: u32, height: u32, matrix: Mat4<f32>, light: [f32; 3], fov: f32, color: u32, density: f32, out: &mut [u32]) -> u32 {
        self.clear(width, height);
        let valid_count = self.draw_wireframe(width, height, matrix, light, fov, color, density);
        self.extract(out, width, height);
        valid_count
    }
}

#[cfg(not(feature = "par"))]
#[allow(clippy::too_many_arguments)]
fn rasterize_tiles(pool: &mut BufferPool, stride_x: usize, tiles_x: usize, tiles_y: usize, tile_size: usize, width: u32, height: u32, base_rgb: (u8, u8, u8), use_face_color: bool) {
    let (tiles, screen, indices, face_intensity, face_color, pixels) = pool.render_io();
    for ty in 0..tiles_y {
        for tx in 0..tiles_x {
            let bounds = tile_bounds(tx, ty, tile_size, width, height);
            let tile = &tiles[ty * stride_x + tx];
            render_tile(tile, bounds, screen, indices, face_intensity, face_color, base_rgb, use_face_color, pixels);
        }
    }
}

/// A raw pointer wrapper asserting it's safe to share `&mut PixelBuffer`
/// across the worker threads below. Sound because every worker only ever
/// touches the pixel range owned by the tile it claimed, and tiles' pixel
/// ranges are disjoint by construction.
#[cfg(feature = "par")]
struct SharedPixels(*mut crate::buffer::PixelBuffer);
#[cfg(feature = "par")]
unsafe impl Send for SharedPixels {}
#[cfg(feature = "par")]
unsafe impl Sync for SharedPixels {}

#[cfg(feature = "par")]
#[allow(clippy::too_many_arguments)]
fn rasterize_tiles(pool: &mut BufferPool, stride_x: usize, tiles_x: usize, tiles_y: usize, tile_size: usize, width: u32, height: u32, base_rgb: (u8, u8, u8), use_face_color: bool) {
    use std::sync::atomic::{AtomicUsize, Ordering};

    let (tiles, screen, indices, face_intensity, face_color, pixels) = pool.render_io();
    let shared = SharedPixels(pixels as *mut crate::buffer::PixelBuffer);
    let cursor = AtomicUsize::new(0);
    let total = tiles_x * tiles_y;
    let threads = num_cpus::get().min(total.max(1));

    std::thread::scope(|s| {
        for _ in 0..threads {
            let shared = &shared;
            let cursor = &cursor;
            s.spawn(move || loop {
                let t = cursor.fetch_add(1, Ordering::Relaxed);
                if t >= total {
                    break;
                }
                let (tx, ty) = (t % tiles_x, t / tiles_x);
                let bounds = tile_bounds(tx, ty, tile_size, width, height);
                let tile = &tiles[ty * stride_x + tx];
                // Safety: `t` is unique per iteration, so no two workers
                // ever touch the same tile or the pixel range it owns.
                let pixels = unsafe { &mut *shared.0 };
                render_tile(tile, bounds, screen, indices, face_intensity, face_color, base_rgb, use_face_color, pixels);
            });
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use vek::Mat4;

    fn triangle_pipeline() -> Pipeline {
        let config = BufferPoolConfig { max_width: 64, max_height: 64, max_vertices: 16, max_faces: 16, tile_size: 32, max_faces_per_tile: 64 };
        let mut pipeline = Pipeline::new(config).unwrap();
        pipeline.upload_mesh(&[[0.0, 0.0, -2.0], [2.0, 0.0, -2.0], [0.0, 2.0, -2.0]], &[[0, 1, 2]]);
        pipeline
    }

    #[test]
    fn solid_frame_draws_a_visible_triangle() {
        let mut pipeline = triangle_pipeline();
        let mut out = vec![0u32; 64 * 64];
        let valid = pipeline.render_frame(64, 64, Mat4::identity(), [0.0, 0.0, 1.0], 20.0, (255, 255, 255), FaceMode::default(), &mut out);
        assert_eq!(valid, 1);
        assert!(out.iter().any(|&c| c != 0), "expected at least one lit pixel");
    }

    #[test]
    fn wireframe_frame_draws_edges_without_filling_the_interior() {
        let mut pipeline = triangle_pipeline();
        let mut out = vec![0u32; 64 * 64];
        let valid = pipeline.render_frame_wireframe(64, 64, Mat4::identity(), [0.0, 0.0, 1.0], 20.0, 0xFFFFFFFF, 1.0, &mut out);
        assert_eq!(valid, 1);
        let lit = out.iter().filter(|&&c| c != 0).count();
        assert!(lit > 0 && lit < 64 * 64 / 2, "expected sparse edge pixels, got {lit}");
    }

    #[test]
    fn clearing_between_frames_removes_previous_contents() {
        let mut pipeline = triangle_pipeline();
        let mut out = vec![0u32; 64 * 64];
        pipeline.render_frame(64, 64, Mat4::identity(), [0.0, 0.0, 1.0], 20.0, (255, 255, 255), FaceMode::default(), &mut out);

        pipeline.upload_mesh(&[], &[]);
        let mut out2 = vec![0u32; 64 * 64];
        let valid = pipeline.render_frame(64, 64, Mat4::identity(), [0.0, 0.0, 1.0], 20.0, (255, 255, 255), FaceMode::default(), &mut out2);
        assert_eq!(valid, 0);
        assert!(out2.iter().all(|&c| c == 0));
    }

    #[test]
    fn active_viewport_smaller_than_pool_capacity_still_renders() {
        // The pool is sized for a 256x256 viewport (an 8x8 tile grid at
        // tile_size=32), but every call below renders a 64x64 frame (a
        // 2x2 active subgrid) — only that smaller subgrid should be
        // binned and rasterized, and the result should look identical to
        // a pool sized exactly for 64x64.
        let config = BufferPoolConfig { max_width: 256, max_height: 256, max_vertices: 16, max_faces: 16, tile_size: 32, max_faces_per_tile: 64 };
        let mut pipeline = Pipeline::new(config).unwrap();
        pipeline.upload_mesh(&[[0.0, 0.0, -2.0], [2.0, 0.0, -2.0], [0.0, 2.0, -2.0]], &[[0, 1, 2]]);
        let mut out = vec![0u32; 64 * 64];
        let valid = pipeline.render_frame(64, 64, Mat4::identity(), [0.0, 0.0, 1.0], 20.0, (255, 255, 255), FaceMode::default(), &mut out);

        let mut reference_pipeline = triangle_pipeline();
        let mut reference_out = vec![0u32; 64 * 64];
        let reference_valid = reference_pipeline.render_frame(64, 64, Mat4::identity(), [0.0, 0.0, 1.0], 20.0, (255, 255, 255), FaceMode::default(), &mut reference_out);

        assert_eq!(valid, reference_valid);
        assert_eq!(out, reference_out);
    }
}

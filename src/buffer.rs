//! The buffer pool: fixed-capacity working memory for the whole pipeline.
//!
//! Everything the pipeline touches in a frame — vertex arrays, per-face
//! arrays, the tile grid, and the pixel buffer — is allocated once here
//! and reused every frame: a single context object that owns its buffers
//! rather than a set of static globals, with each buffer a flat `Vec`
//! behind a typed, sized handle instead of a bare pointer.

use crate::cluster::Cluster;
use crate::error::PipelineError;
use crate::tile::{tile_count, Tile};
use crate::DEPTH_SENTINEL;
use vek::Mat4;

/// Canonical compile-time maxima and the active tile geometry.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BufferPoolConfig {
    /// Maximum framebuffer width the pixel buffer is allocated for.
    pub max_width: usize,
    /// Maximum framebuffer height the pixel buffer is allocated for.
    pub max_height: usize,
    /// Maximum number of raw vertices the vertex arrays can hold.
    pub max_vertices: usize,
    /// Maximum number of faces the face arrays can hold.
    pub max_faces: usize,
    /// Edge length, in pixels, of a binning tile.
    pub tile_size: usize,
    /// Maximum number of face ids a single tile's list may hold before
    /// further appends are silently dropped.
    pub max_faces_per_tile: usize,
}

impl Default for BufferPoolConfig {
    fn default() -> Self {
        Self {
            max_width: 2560,
            max_height: 1600,
            max_vertices: 1_000_000,
            max_faces: 1_500_000,
            tile_size: 128,
            max_faces_per_tile: 16_384,
        }
    }
}

/// The framebuffer: a `(depth, color)` pair per pixel, indexed by a fixed
/// row stride equal to the pool's `max_width` even when the active
/// viewport is smaller.
#[derive(Clone)]
pub struct PixelBuffer {
    stride: usize,
    max_height: usize,
    depth: Vec<f32>,
    color: Vec<u32>,
}

impl PixelBuffer {
    pub(crate) fn new(max_width: usize, max_height: usize) -> Self {
        let len = max_width * max_height;
        Self {
            stride: max_width,
            max_height,
            depth: vec![DEPTH_SENTINEL; len],
            color: vec![0; len],
        }
    }

    /// Row stride (equal to the pool's `max_width`), in pixels.
    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    #[inline(always)]
    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.stride + x as usize
    }

    /// Read the depth at `(x, y)`. Panics if out of the allocated bounds.
    #[inline(always)]
    pub fn depth(&self, x: u32, y: u32) -> f32 {
        self.depth[self.index(x, y)]
    }

    /// Read the color at `(x, y)`. Panics if out of the allocated bounds.
    #[inline(always)]
    pub fn color(&self, x: u32, y: u32) -> u32 {
        self.color[self.index(x, y)]
    }

    /// Write depth and color at `(x, y)` without a depth test.
    #[inline(always)]
    pub fn write(&mut self, x: u32, y: u32, depth: f32, color: u32) {
        let idx = self.index(x, y);
        self.depth[idx] = depth;
        self.color[idx] = color;
    }

    /// Clear pixels within `[0, width) x [0, height)` back to color `0` and
    /// the depth sentinel. Rows beyond `height` and columns beyond `width`
    /// (but within `max_width`/`max_height`) are left untouched — only the
    /// active viewport is cleared.
    pub fn clear(&mut self, width: u32, height: u32) {
        let height = (height as usize).min(self.max_height);
        let width = width as usize;
        for y in 0..height {
            let row_start = y * self.stride;
            let row = &mut self.depth[row_start..row_start + width.min(self.stride)];
            row.fill(DEPTH_SENTINEL);
            let row = &mut self.color[row_start..row_start + width.min(self.stride)];
            row.fill(0);
        }
    }
}

/// Owns every working buffer the pipeline touches in a frame.
pub struct BufferPool {
    config: BufferPoolConfig,

    active_width: u32,
    active_height: u32,

    raw_vertices: Vec<[f32; 3]>,
    world_vertices: Vec<[f32; 4]>,
    screen_vertices: Vec<[f32; 4]>,

    indices: Vec<[u32; 3]>,
    face_intensity: Vec<f32>,
    face_color: Vec<u32>,

    valid_ids: Vec<u32>,
    depths: Vec<f32>,
    aux_ids: Vec<u32>,
    aux_depths: Vec<f32>,
    radix_histogram: [u32; 256],

    matrix: Mat4<f32>,

    tiles: Vec<Tile>,
    tiles_x: usize,
    tiles_y: usize,

    pixels: PixelBuffer,

    clusters: Vec<Cluster>,
}

impl BufferPool {
    /// Allocate a new buffer pool to the given compile-time maxima.
    pub fn new(config: BufferPoolConfig) -> Result<Self, PipelineError> {
        if config.max_width == 0 || config.max_height == 0 {
            return Err(PipelineError::InvalidGeometry { reason: "max_width and max_height must be non-zero" });
        }
        if config.tile_size == 0 {
            return Err(PipelineError::InvalidGeometry { reason: "tile_size must be non-zero" });
        }

        // Sized from the compile-time maxima, not any one frame's active
        // viewport — this is the flat `tiles` buffer's allocated capacity
        // and row stride, which the pipeline re-derives a smaller active
        // subgrid from per frame.
        let tiles_x = tile_count(config.max_width, config.tile_size);
        let tiles_y = tile_count(config.max_height, config.tile_size);

        Ok(Self {
            active_width: config.max_width as u32,
            active_height: config.max_height as u32,

            raw_vertices: Vec::with_capacity(config.max_vertices),
            world_vertices: Vec::with_capacity(config.max_vertices),
            screen_vertices: Vec::with_capacity(config.max_vertices),

            indices: Vec::with_capacity(config.max_faces),
            face_intensity: vec![0.0; config.max_faces],
            face_color: vec![0; config.max_faces],

            valid_ids: Vec::with_capacity(config.max_faces),
            depths: Vec::with_capacity(config.max_faces),
            aux_ids: vec![0; config.max_faces],
            aux_depths: vec![0.0; config.max_faces],
            radix_histogram: [0; 256],

            matrix: Mat4::identity(),

            tiles: vec![Tile::default(); tiles_x * tiles_y],
            tiles_x,
            tiles_y,

            pixels: PixelBuffer::new(config.max_width, config.max_height),

            clusters: Vec::new(),

            config,
        })
    }

    /// The configuration this pool was constructed with.
    pub fn config(&self) -> &BufferPoolConfig {
        &self.config
    }

    /// Active viewport, set by [`BufferPool::clear_viewport`].
    pub fn active_size(&self) -> (u32, u32) {
        (self.active_width, self.active_height)
    }

    /// Width, in tiles, of the preallocated tile grid (`max_width` /
    /// `tile_size`, rounded up) — the row stride the flat `tiles` buffer
    /// is laid out with, not the number of tiles actually binned or
    /// rasterized for the active viewport in a given frame.
    pub fn tiles_x(&self) -> usize {
        self.tiles_x
    }

    /// Height, in tiles, of the preallocated tile grid. See
    /// [`BufferPool::tiles_x`].
    pub fn tiles_y(&self) -> usize {
        self.tiles_y
    }

    /// Replace the raw object-space vertex list for this frame. The host
    /// uploads mesh data by calling this (and [`BufferPool::upload_faces`])
    /// before running the pipeline; replaces, rather than appends.
    pub fn upload_vertices(&mut self, vertices: &[[f32; 3]]) {
        self.raw_vertices.clear();
        self.raw_vertices.extend_from_slice(vertices);
        self.world_vertices.resize(self.raw_vertices.len(), [0.0; 4]);
        self.screen_vertices.resize(self.raw_vertices.len(), [0.0; 4]);
    }

    /// Replace the index-triplet face list for this frame.
    pub fn upload_faces(&mut self, faces: &[[u32; 3]]) {
        self.indices.clear();
        self.indices.extend_from_slice(faces);
        if self.face_intensity.len() < self.indices.len() {
            self.face_intensity.resize(self.indices.len(), 0.0);
            self.face_color.resize(self.indices.len(), 0);
        }
    }

    /// Upload the transform matrix used by [`crate::transform::transform_vertices`].
    pub fn set_matrix(&mut self, matrix: Mat4<f32>) {
        self.matrix = matrix;
    }

    pub fn matrix(&self) -> &Mat4<f32> {
        &self.matrix
    }

    /// Upload a cluster list: a coarse, optional grouping of faces for
    /// future visibility culling above the per-face level. Face ranges
    /// must be in-bounds and non-decreasing.
    pub fn upload_clusters(&mut self, clusters: &[Cluster]) -> Result<(), PipelineError> {
        let mut last_end = 0u32;
        for (i, c) in clusters.iter().enumerate() {
            let end = c.first_face.checked_add(c.face_count).ok_or(PipelineError::InvalidClusterRange { cluster_index: i })?;
            if c.first_face < last_end || end > self.indices.len() as u32 {
                return Err(PipelineError::InvalidClusterRange { cluster_index: i });
            }
            last_end = end;
        }
        self.clusters.clear();
        self.clusters.extend_from_slice(clusters);
        Ok(())
    }

    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    /// Clear the pixel buffer's active viewport (color 0, depth sentinel)
    /// and record the new active viewport size for subsequent stages.
    /// Idempotent: calling this twice in a row with the same size produces
    /// the same state as calling it once.
    pub fn clear_viewport(&mut self, width: u32, height: u32) {
        self.active_width = width;
        self.active_height = height;
        self.pixels.clear(width, height);
    }

    pub fn raw_vertices(&self) -> &[[f32; 3]] {
        &self.raw_vertices
    }

    pub fn world_vertices(&self) -> &[[f32; 4]] {
        &self.world_vertices
    }

    pub fn world_vertices_mut(&mut self) -> &mut [[f32; 4]] {
        &mut self.world_vertices
    }

    pub fn screen_vertices(&self) -> &[[f32; 4]] {
        &self.screen_vertices
    }

    pub fn screen_vertices_mut(&mut self) -> &mut [[f32; 4]] {
        &mut self.screen_vertices
    }

    pub fn indices(&self) -> &[[u32; 3]] {
        &self.indices
    }

    pub fn face_intensity(&self) -> &[f32] {
        &self.face_intensity
    }

    pub fn face_intensity_mut(&mut self) -> &mut [f32] {
        &mut self.face_intensity
    }

    pub fn face_color(&self) -> &[u32] {
        &self.face_color
    }

    pub fn face_color_mut(&mut self) -> &mut [u32] {
        &mut self.face_color
    }

    pub fn valid_ids_mut(&mut self) -> &mut Vec<u32> {
        &mut self.valid_ids
    }

    pub fn valid_ids(&self) -> &[u32] {
        &self.valid_ids
    }

    pub fn depths_mut(&mut self) -> &mut Vec<f32> {
        &mut self.depths
    }

    pub fn depths(&self) -> &[f32] {
        &self.depths
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn tiles_mut(&mut self) -> &mut [Tile] {
        &mut self.tiles
    }

    pub fn pixels(&self) -> &PixelBuffer {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut PixelBuffer {
        &mut self.pixels
    }

    /// Disjoint borrows for the vertex transform stage: raw vertices and
    /// the active matrix (read), world vertices (written).
    pub(crate) fn transform_io(&mut self) -> (&[[f32; 3]], &mut [[f32; 4]], &Mat4<f32>) {
        (&self.raw_vertices, &mut self.world_vertices, &self.matrix)
    }

    /// Disjoint borrows for the projector: world vertices (read), screen
    /// vertices (written).
    pub(crate) fn project_io(&mut self) -> (&[[f32; 4]], &mut [[f32; 4]]) {
        (&self.world_vertices, &mut self.screen_vertices)
    }

    /// Disjoint borrows for the tile binner: the tile grid (written),
    /// everything it reads to compute face AABBs.
    pub(crate) fn tiling_io(&mut self) -> (&mut [Tile], &[[f32; 4]], &[[u32; 3]], &[u32]) {
        (&mut self.tiles, &self.screen_vertices, &self.indices, &self.valid_ids)
    }

    /// Disjoint borrows for the wireframe renderer: the pixel buffer it
    /// writes into, plus everything it reads.
    pub(crate) fn wireframe_io(&mut self) -> (&mut PixelBuffer, &[[f32; 4]], &[[u32; 3]], &[u32]) {
        (&mut self.pixels, &self.screen_vertices, &self.indices, &self.valid_ids)
    }

    /// Disjoint borrows for the per-tile scanline rasterizer: everything
    /// it reads, plus the pixel buffer it writes into.
    pub(crate) fn render_io(&mut self) -> (&[Tile], &[[f32; 4]], &[[u32; 3]], &[f32], &[u32], &mut PixelBuffer) {
        (&self.tiles, &self.screen_vertices, &self.indices, &self.face_intensity, &self.face_color, &mut self.pixels)
    }

    /// Disjoint borrows of everything [`crate::face::process_faces`] reads
    /// and writes, split out of one `&mut self` so the pipeline doesn't
    /// need to clone buffers just to satisfy the borrow checker.
    pub(crate) fn face_processing_io(
        &mut self,
    ) -> (&[[u32; 3]], &[[f32; 4]], &[[f32; 4]], &mut Vec<u32>, &mut Vec<f32>, &mut [f32], &mut [u32]) {
        (
            &self.indices,
            &self.screen_vertices,
            &self.world_vertices,
            &mut self.valid_ids,
            &mut self.depths,
            &mut self.face_intensity,
            &mut self.face_color,
        )
    }

    /// Run the radix sort over `self.valid_ids`/`self.depths`, using the
    /// pool's auxiliary arrays and histogram as scratch space.
    pub fn sort_valid_faces(&mut self, order: crate::sort::SortOrder) {
        let count = self.valid_ids.len();
        crate::sort::radix_sort_by_depth(
            &mut self.valid_ids,
            &mut self.depths,
            count,
            &mut self.aux_ids,
            &mut self.aux_depths,
            &mut self.radix_histogram,
            order,
        );
    }
}

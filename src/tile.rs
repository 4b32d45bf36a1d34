//! Tile binner: partitions the framebuffer into fixed-size tiles and
//! distributes each valid face's index to every tile its screen-space
//! bounding box overlaps. Faces arrive pre-sorted by depth, and each
//! tile's list is capped rather than grown unboundedly.

/// A fixed square region of the framebuffer owning an append-only list of
/// the faces that overlap it.
#[derive(Clone, Debug, Default)]
pub struct Tile {
    /// Face ids (ordinals into the index/intensity/color arrays) whose
    /// screen-space AABB intersects this tile, in sorted-depth order.
    pub indices: Vec<u32>,
}

impl Tile {
    fn clear(&mut self) {
        self.indices.clear();
    }
}

/// Compute `ceil(dim / tile_size)`.
pub fn tile_count(dim: usize, tile_size: usize) -> usize {
    (dim + tile_size - 1) / tile_size
}

/// Zero every tile's face list within the active `tiles_x x tiles_y`
/// subgrid, then walk the sorted face-id list and append each face's id
/// to every tile its screen-space bounding box overlaps. Appends beyond
/// a tile's `max_faces_per_tile` capacity are silently dropped: an
/// accepted visual degradation under extreme load, never a panic or
/// memory corruption.
///
/// `tiles` is laid out with a fixed row `stride_x` (the pool's
/// preallocated tile-grid width, sized from `max_width`/`tile_size`),
/// which may be wider than the `tiles_x x tiles_y` subgrid actually
/// covering this frame's `width x height` active viewport. Only that
/// active subgrid is cleared, binned into, or otherwise touched; tiles
/// outside it are left exactly as they were.
#[allow(clippy::too_many_arguments)]
pub fn bin_faces(
    tiles: &mut [Tile],
    stride_x: usize,
    tiles_x: usize,
    tiles_y: usize,
    tile_size: usize,
    max_faces_per_tile: usize,
    screen: &[[f32; 4]],
    indices: &[[u32; 3]],
    sorted_face_ids: &[u32],
    valid_count: u32,
    width: u32,
    height: u32,
) {
    debug_assert!(tiles_x <= stride_x);
    debug_assert!(tiles.len() >= stride_x * tiles_y);
    for ty in 0..tiles_y {
        for tx in 0..tiles_x {
            tiles[ty * stride_x + tx].clear();
        }
    }

    let (width, height) = (width as f32, height as f32);
    for &face_id in &sorted_face_ids[..valid_count as usize] {
        let [i0, i1, i2] = indices[face_id as usize];
        let v0 = screen[i0 as usize];
        let v1 = screen[i1 as usize];
        let v2 = screen[i2 as usize];

        let min_x = v0[0].min(v1[0]).min(v2[0]).max(0.0).min(width);
        let max_x = v0[0].max(v1[0]).max(v2[0]).max(0.0).min(width);
        let min_y = v0[1].min(v1[1]).min(v2[1]).max(0.0).min(height);
        let max_y = v0[1].max(v1[1]).max(v2[1]).max(0.0).min(height);

        let tile_min_x = (min_x as usize / tile_size).min(tiles_x.saturating_sub(1));
        let tile_max_x = ((max_x as usize) / tile_size).min(tiles_x.saturating_sub(1));
        let tile_min_y = (min_y as usize / tile_size).min(tiles_y.saturating_sub(1));
        let tile_max_y = ((max_y as usize) / tile_size).min(tiles_y.saturating_sub(1));

        for ty in tile_min_y..=tile_max_y {
            for tx in tile_min_x..=tile_max_x {
                let tile = &mut tiles[ty * stride_x + tx];
                if tile.indices.len() < max_faces_per_tile {
                    tile.indices.push(face_id);
                }
            }
        }
    }
}

/// Bounds of a tile's pixel region within the framebuffer, `[min, max)`.
#[derive(Copy, Clone, Debug)]
pub struct TileBounds {
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
}

/// Compute the pixel-space bounds owned by tile `(tx, ty)`, clamped to the
/// active viewport.
pub fn tile_bounds(tx: usize, ty: usize, tile_size: usize, width: u32, height: u32) -> TileBounds {
    let min_x = (tx * tile_size) as u32;
    let min_y = (ty * tile_size) as u32;
    let max_x = ((tx + 1) * tile_size).min(width as usize) as u32;
    let max_y = ((ty + 1) * tile_size).min(height as usize) as u32;
    TileBounds { min_x, min_y, max_x, max_y }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn face_spanning_two_tiles_is_binned_to_both() {
        let tiles_x = 2;
        let tiles_y = 1;
        let mut tiles = vec![Tile::default(); tiles_x * tiles_y];
        let screen = [[10.0, 10.0, 1.0, 1.0], [140.0, 10.0, 1.0, 1.0], [10.0, 30.0, 1.0, 1.0]];
        let indices = [[0u32, 1, 2]];
        let sorted = [0u32];

        bin_faces(&mut tiles, tiles_x, tiles_x, tiles_y, 128, 16384, &screen, &indices, &sorted, 1, 256, 128);

        assert_eq!(tiles[0].indices, vec![0]);
        assert_eq!(tiles[1].indices, vec![0]);
    }

    #[test]
    fn full_tile_silently_drops_further_faces() {
        let mut tiles = vec![Tile::default()];
        let screen = [[1.0, 1.0, 1.0, 1.0], [2.0, 1.0, 1.0, 1.0], [1.0, 2.0, 1.0, 1.0]];
        let indices = [[0u32, 1, 2]];
        let sorted = [0u32, 0u32];

        bin_faces(&mut tiles, 1, 1, 1, 128, 1, &screen, &indices, &sorted, 2, 128, 128);

        assert_eq!(tiles[0].indices.len(), 1);
    }

    #[test]
    fn clearing_removes_previous_frame_contents() {
        let mut tiles = vec![Tile { indices: vec![7, 8, 9] }];
        let screen: [[f32; 4]; 0] = [];
        let indices: [[u32; 3]; 0] = [];
        let sorted: [u32; 0] = [];
        bin_faces(&mut tiles, 1, 1, 1, 128, 16384, &screen, &indices, &sorted, 0, 128, 128);
        assert!(tiles[0].indices.is_empty());
    }

    #[test]
    fn active_subgrid_narrower_than_stride_leaves_the_rest_of_the_row_untouched() {
        // A 4-wide allocated grid (stride_x = 4) but only a 2x2 active
        // subgrid this frame: tiles at tx >= 2 belong to a wider viewport
        // this call isn't using and must not be cleared or binned into.
        let stride_x = 4;
        let mut tiles = vec![Tile::default(); stride_x * 2];
        tiles[2] = Tile { indices: vec![99] };
        tiles[3] = Tile { indices: vec![99] };
        tiles[6] = Tile { indices: vec![99] };
        tiles[7] = Tile { indices: vec![99] };

        let screen = [[10.0, 10.0, 1.0, 1.0], [20.0, 10.0, 1.0, 1.0], [10.0, 20.0, 1.0, 1.0]];
        let indices = [[0u32, 1, 2]];
        let sorted = [0u32];
        bin_faces(&mut tiles, stride_x, 2, 2, 128, 16384, &screen, &indices, &sorted, 1, 256, 256);

        assert_eq!(tiles[0].indices, vec![0]);
        assert_eq!(tiles[2].indices, vec![99], "tile outside the active subgrid must be left alone");
        assert_eq!(tiles[3].indices, vec![99], "tile outside the active subgrid must be left alone");
        assert_eq!(tiles[6].indices, vec![99], "tile outside the active subgrid must be left alone");
        assert_eq!(tiles[7].indices, vec![99], "tile outside the active subgrid must be left alone");
    }
}

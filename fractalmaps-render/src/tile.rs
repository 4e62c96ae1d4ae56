/// Default tile edge in pixels. A 64×64 block of escape results stays in L1.
pub const TILE_SIZE: u32 = 64;

/// A rectangular region of the viewport plus the stride it is sampled at.
///
/// With `stride = 1` every pixel is computed. With `stride = N` only every
/// Nth pixel (relative to the tile's top-left corner) is computed and its
/// result fills the N×N block it anchors, clipped to the tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    /// Pixel x of the top-left corner.
    pub x: u32,
    /// Pixel y of the top-left corner.
    pub y: u32,
    /// Tile width in pixels (may be smaller at the right edge).
    pub width: u32,
    /// Tile height in pixels (may be smaller at the bottom edge).
    pub height: u32,
    pub stride: u32,
}

impl Tile {
    /// Number of pixels covered by this tile.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Number of points actually iterated at this tile's stride.
    pub fn sample_count(&self) -> usize {
        self.width.div_ceil(self.stride) as usize * self.height.div_ceil(self.stride) as usize
    }
}

/// Partition a viewport into `edge`×`edge` tiles, clipping the last
/// row and column. Row-major order.
///
/// Callers validate `edge > 0` and `stride > 0`.
pub fn build_tile_grid(width: u32, height: u32, edge: u32, stride: u32) -> Vec<Tile> {
    debug_assert!(edge > 0 && stride > 0);
    let mut tiles = Vec::with_capacity(width.div_ceil(edge) as usize * height.div_ceil(edge) as usize);
    let mut y = 0;
    while y < height {
        let th = edge.min(height - y);
        let mut x = 0;
        while x < width {
            let tw = edge.min(width - x);
            tiles.push(Tile {
                x,
                y,
                width: tw,
                height: th,
                stride,
            });
            x += tw;
        }
        y += th;
    }
    tiles
}

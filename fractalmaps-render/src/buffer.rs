use crate::tile::Tile;

/// An RGBA pixel buffer, 4 bytes per pixel, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl PixelBuffer {
    /// Create a buffer filled with opaque black.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: [0, 0, 0, 255].repeat(width as usize * height as usize),
        }
    }

    /// RGBA value at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = (y as usize * self.width as usize + x as usize) * 4;
        [
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ]
    }

    /// Copy a tile's RGBA block into its place in the buffer.
    pub fn blit_tile(&mut self, tile: &Tile, tile_pixels: &[u8]) {
        debug_assert_eq!(tile_pixels.len(), tile.pixel_count() * 4);
        let row_bytes = self.width as usize * 4;
        let tw4 = tile.width as usize * 4;
        for (row, src) in tile_pixels.chunks_exact(tw4).enumerate() {
            let dst = (tile.y as usize + row) * row_bytes + tile.x as usize * 4;
            self.pixels[dst..dst + tw4].copy_from_slice(src);
        }
    }

    /// Copy the RGBA block under `tile` out of the buffer.
    pub fn tile_pixels(&self, tile: &Tile) -> Vec<u8> {
        let row_bytes = self.width as usize * 4;
        let tw4 = tile.width as usize * 4;
        let mut out = Vec::with_capacity(tile.pixel_count() * 4);
        for row in 0..tile.height as usize {
            let src = (tile.y as usize + row) * row_bytes + tile.x as usize * 4;
            out.extend_from_slice(&self.pixels[src..src + tw4]);
        }
        out
    }
}

use fractalmaps_core::EscapeResult;

use crate::tile::Tile;

/// Per-pixel [`EscapeResult`]s for a full frame.
///
/// Kept alongside the coloured pixels so a colour-scheme change can
/// recolour the frame without iterating again.
#[derive(Debug, Clone, PartialEq)]
pub struct EscapeBuffer {
    pub width: u32,
    pub height: u32,
    pub data: Vec<EscapeResult>,
}

impl EscapeBuffer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![EscapeResult::Interior; width as usize * height as usize],
        }
    }

    pub fn get(&self, x: u32, y: u32) -> EscapeResult {
        self.data[y as usize * self.width as usize + x as usize]
    }

    /// Copy a tile's results into their place in the buffer.
    pub fn blit_tile(&mut self, tile: &Tile, tile_data: &[EscapeResult]) {
        debug_assert_eq!(tile_data.len(), tile.pixel_count());
        let tw = tile.width as usize;
        for (row, src) in tile_data.chunks_exact(tw).enumerate() {
            let dst = (tile.y as usize + row) * self.width as usize + tile.x as usize;
            self.data[dst..dst + tw].copy_from_slice(src);
        }
    }
}

pub mod buffer;
pub mod cancel;
pub mod colour;
pub mod error;
pub mod escape_buffer;
pub mod scheduler;
pub mod session;
pub mod tile;

pub use buffer::PixelBuffer;
pub use cancel::{GenerationCounter, PassToken};
pub use colour::{map_to_colour, ColourScheme, ColourStrategy, PaletteState, INTERIOR_COLOUR};
pub use error::RenderError;
pub use escape_buffer::EscapeBuffer;
pub use scheduler::{PassHandle, PassJob, TileBlock, TileScheduler};
pub use session::{RenderListener, RenderSession, SessionConfig, SessionState};
pub use tile::{build_tile_grid, Tile, TILE_SIZE};

/// Convenience result type for the render crate.
pub type Result<T> = std::result::Result<T, RenderError>;

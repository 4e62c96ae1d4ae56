use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use tracing::debug;

use fractalmaps_core::{escape, pixel_to_complex, EscapeResult, FractalParameters, ViewTransform};

use crate::cancel::PassToken;
use crate::colour::ColourStrategy;
use crate::error::RenderError;
use crate::tile::{build_tile_grid, Tile};

// ---------------------------------------------------------------------------
// Pass description and output
// ---------------------------------------------------------------------------

/// Everything a worker needs to compute one pass. Cheap to clone.
#[derive(Debug, Clone)]
pub struct PassJob {
    pub transform: ViewTransform,
    pub params: FractalParameters,
    pub stride: u32,
    pub colours: Arc<ColourStrategy>,
    pub token: PassToken,
}

/// A finished tile: escape results and RGBA pixels covering every pixel
/// of `tile` (strided samples already replicated).
#[derive(Debug, Clone)]
pub struct TileBlock {
    pub tile: Tile,
    pub generation: u64,
    pub escapes: Vec<EscapeResult>,
    pub pixels: Vec<u8>,
}

/// The receiving end of one dispatched pass.
///
/// Tiles arrive in completion order. Once every worker is done (or has
/// given up because the pass was cancelled) the channel disconnects.
/// Dropping the handle makes any worker still sending give up too.
#[derive(Debug)]
pub struct PassHandle {
    rx: Receiver<TileBlock>,
    tile_count: usize,
    stride: u32,
    token: PassToken,
    started: Instant,
}

impl PassHandle {
    /// Number of tiles the pass was split into.
    pub fn tile_count(&self) -> usize {
        self.tile_count
    }

    pub fn stride(&self) -> u32 {
        self.stride
    }

    pub fn token(&self) -> &PassToken {
        &self.token
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Block until the next tile is ready. `None` once no more will come.
    pub fn recv(&self) -> Option<TileBlock> {
        self.rx.recv().ok()
    }

    /// Take a ready tile without blocking.
    pub fn try_recv(&self) -> Result<TileBlock, TryRecvError> {
        self.rx.try_recv()
    }
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Splits passes into tiles and runs them on a dedicated worker pool.
pub struct TileScheduler {
    pool: rayon::ThreadPool,
    tile_edge: u32,
}

impl std::fmt::Debug for TileScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TileScheduler")
            .field("workers", &self.workers())
            .field("tile_edge", &self.tile_edge)
            .finish()
    }
}

impl TileScheduler {
    /// Build a pool of `workers` threads (`0` = one per hardware thread).
    pub fn new(workers: usize, tile_edge: u32) -> crate::Result<Self> {
        if tile_edge == 0 {
            return Err(RenderError::InvalidTileSize(tile_edge));
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("tile-worker-{i}"))
            .build()?;
        Ok(Self { pool, tile_edge })
    }

    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    pub fn tile_edge(&self) -> u32 {
        self.tile_edge
    }

    /// Dispatch a pass and return immediately.
    ///
    /// Finished tiles stream through a bounded queue; workers block when
    /// the consumer falls behind. Each worker checks the pass token between
    /// rows and abandons its tile once the token is dead, so only whole
    /// tiles are ever emitted.
    pub fn render_pass(&self, job: PassJob) -> crate::Result<PassHandle> {
        if job.stride == 0 {
            return Err(RenderError::InvalidStride(job.stride));
        }
        let tiles = build_tile_grid(
            job.transform.width,
            job.transform.height,
            self.tile_edge,
            job.stride,
        );
        let tile_count = tiles.len();
        let (tx, rx) = mpsc::sync_channel(self.workers().max(1) * 2);
        debug!(
            generation = job.token.generation(),
            stride = job.stride,
            tiles = tile_count,
            width = job.transform.width,
            height = job.transform.height,
            "Dispatching pass"
        );

        let handle = PassHandle {
            rx,
            tile_count,
            stride: job.stride,
            token: job.token.clone(),
            started: Instant::now(),
        };

        self.pool.spawn(move || {
            tiles.into_par_iter().for_each_with(tx, |tx, tile| {
                if !job.token.is_live() {
                    return;
                }
                if let Some(block) = render_tile(&job, tile) {
                    // A send error means the session moved on; drop the tile.
                    let _ = tx.send(block);
                }
            });
        });

        Ok(handle)
    }
}

// ---------------------------------------------------------------------------
// Per-tile rendering
// ---------------------------------------------------------------------------

/// Compute one tile at its stride. Returns `None` if the pass died midway.
fn render_tile(job: &PassJob, tile: Tile) -> Option<TileBlock> {
    let count = tile.pixel_count();
    let mut escapes = vec![EscapeResult::Interior; count];
    let mut pixels = vec![0u8; count * 4];
    let s = tile.stride;
    let tw = tile.width as usize;

    for sy in (0..tile.height).step_by(s as usize) {
        if !job.token.is_live() {
            return None;
        }
        let rows = sy as usize..(sy + s).min(tile.height) as usize;
        for sx in (0..tile.width).step_by(s as usize) {
            let point = pixel_to_complex(
                (tile.x + sx) as f64,
                (tile.y + sy) as f64,
                &job.transform,
            );
            let result = escape(point, &job.params);
            let colour = job.colours.map_to_colour(result);

            let cols = sx as usize..(sx + s).min(tile.width) as usize;
            for row in rows.clone() {
                let start = row * tw;
                escapes[start + cols.start..start + cols.end].fill(result);
                for px in pixels[(start + cols.start) * 4..(start + cols.end) * 4].chunks_exact_mut(4) {
                    px.copy_from_slice(&colour);
                }
            }
        }
    }

    Some(TileBlock {
        tile,
        generation: job.token.generation(),
        escapes,
        pixels,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::GenerationCounter;
    use crate::colour::ColourScheme;
    use fractalmaps_core::Complex;

    fn job(counter: &Arc<GenerationCounter>, stride: u32) -> PassJob {
        PassJob {
            transform: ViewTransform::from_center(Complex::new(-0.5, 0.0), 0.02, 150, 100).unwrap(),
            params: FractalParameters::mandelbrot(64).unwrap(),
            stride,
            colours: Arc::new(ColourStrategy::new(ColourScheme::MandelbrotDefault)),
            token: PassToken::issue(counter),
        }
    }

    fn drain(handle: &PassHandle) -> Vec<TileBlock> {
        std::iter::from_fn(|| handle.recv()).collect()
    }

    #[test]
    fn full_pass_emits_every_tile_once() {
        let scheduler = TileScheduler::new(4, 32).unwrap();
        let counter = Arc::new(GenerationCounter::new());
        let handle = scheduler.render_pass(job(&counter, 1)).unwrap();

        let mut blocks = drain(&handle);
        assert_eq!(blocks.len(), handle.tile_count());
        assert_eq!(handle.tile_count(), 5 * 4);
        blocks.sort_by_key(|b| (b.tile.y, b.tile.x));
        blocks.dedup_by_key(|b| (b.tile.y, b.tile.x));
        assert_eq!(blocks.len(), 20);
        for b in &blocks {
            assert_eq!(b.escapes.len(), b.tile.pixel_count());
            assert_eq!(b.pixels.len(), b.tile.pixel_count() * 4);
        }
    }

    #[test]
    fn strided_tile_replicates_samples() {
        let counter = Arc::new(GenerationCounter::new());
        let j = job(&counter, 4);
        let tile = Tile {
            x: 32,
            y: 32,
            width: 10,
            height: 7,
            stride: 4,
        };
        let block = render_tile(&j, tile).unwrap();
        for y in 0..7usize {
            for x in 0..10usize {
                let anchor = (y / 4 * 4) * 10 + x / 4 * 4;
                assert_eq!(block.escapes[y * 10 + x], block.escapes[anchor]);
                assert_eq!(
                    block.pixels[(y * 10 + x) * 4..(y * 10 + x) * 4 + 4],
                    block.pixels[anchor * 4..anchor * 4 + 4]
                );
            }
        }
    }

    #[test]
    fn full_resolution_tile_matches_direct_escape() {
        let counter = Arc::new(GenerationCounter::new());
        let j = job(&counter, 1);
        let tile = Tile {
            x: 64,
            y: 32,
            width: 16,
            height: 16,
            stride: 1,
        };
        let block = render_tile(&j, tile).unwrap();
        for y in 0..16u32 {
            for x in 0..16u32 {
                let p = pixel_to_complex((64 + x) as f64, (32 + y) as f64, &j.transform);
                assert_eq!(block.escapes[(y * 16 + x) as usize], escape(p, &j.params));
            }
        }
    }

    #[test]
    fn cancelled_pass_emits_nothing_new() {
        let scheduler = TileScheduler::new(2, 16).unwrap();
        let counter = Arc::new(GenerationCounter::new());
        let j = job(&counter, 1);
        j.token.cancel();
        let handle = scheduler.render_pass(j).unwrap();
        assert_eq!(drain(&handle).len(), 0);
    }

    #[test]
    fn superseded_tile_is_abandoned() {
        let counter = Arc::new(GenerationCounter::new());
        let j = job(&counter, 1);
        let _newer = PassToken::issue(&counter);
        let tile = Tile {
            x: 0,
            y: 0,
            width: 8,
            height: 8,
            stride: 1,
        };
        assert!(render_tile(&j, tile).is_none());
    }

    #[test]
    fn rejects_zero_sizes() {
        assert!(matches!(
            TileScheduler::new(1, 0),
            Err(RenderError::InvalidTileSize(0))
        ));
        let scheduler = TileScheduler::new(1, 16).unwrap();
        let counter = Arc::new(GenerationCounter::new());
        assert!(matches!(
            scheduler.render_pass(job(&counter, 0)),
            Err(RenderError::InvalidStride(0))
        ));
    }
}

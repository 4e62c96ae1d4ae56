use std::sync::mpsc::TryRecvError;
use std::sync::Arc;

use tracing::{debug, info, warn};

use fractalmaps_core::{
    Complex, CoordinateMapper, FractalParameters, ScaleBounds, ViewTransform,
};

use crate::buffer::PixelBuffer;
use crate::cancel::{GenerationCounter, PassToken};
use crate::colour::{ColourScheme, ColourStrategy};
use crate::error::RenderError;
use crate::escape_buffer::EscapeBuffer;
use crate::scheduler::{PassHandle, PassJob, TileBlock, TileScheduler};
use crate::tile::{Tile, TILE_SIZE};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Tunables for a [`RenderSession`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionConfig {
    /// Run a coarse pass before the full-resolution one.
    pub crude_first: bool,
    /// Sampling stride of the coarse pass.
    pub crude_stride: u32,
    /// Viewports with fewer pixels than this skip the coarse pass.
    pub crude_min_pixels: u64,
    /// Tile edge length in pixels.
    pub tile_edge: u32,
    /// Worker threads, `0` for one per hardware thread.
    pub workers: usize,
    pub scale_bounds: ScaleBounds,
    /// Log pass durations at `info` instead of `debug`.
    pub report_timings: bool,
}

impl SessionConfig {
    pub const DEFAULT_CRUDE_STRIDE: u32 = 4;

    fn validate(&self) -> crate::Result<()> {
        if self.crude_stride == 0 {
            return Err(RenderError::InvalidStride(self.crude_stride));
        }
        if self.tile_edge == 0 {
            return Err(RenderError::InvalidTileSize(self.tile_edge));
        }
        Ok(())
    }

    fn wants_crude(&self, transform: &ViewTransform) -> bool {
        self.crude_first
            && self.crude_stride > 1
            && transform.pixel_count() >= self.crude_min_pixels
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            crude_first: true,
            crude_stride: Self::DEFAULT_CRUDE_STRIDE,
            crude_min_pixels: 0,
            tile_edge: TILE_SIZE,
            workers: 0,
            scale_bounds: ScaleBounds::default(),
            report_timings: false,
        }
    }
}

// ---------------------------------------------------------------------------
// State and callbacks
// ---------------------------------------------------------------------------

/// Lifecycle of the most recent render request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    CrudeRunning,
    FineRunning,
    Done,
    Cancelled,
}

impl SessionState {
    pub fn is_running(self) -> bool {
        matches!(self, Self::CrudeRunning | Self::FineRunning)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::CrudeRunning => "Rendering\u{2026}",
            Self::FineRunning => "Refining\u{2026}",
            Self::Done => "Done",
            Self::Cancelled => "Cancelled",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PassStage {
    Crude,
    Fine,
}

/// Notifications from a session to the presentation layer.
///
/// Called on the thread driving the session, after the buffer is updated.
pub trait RenderListener: Send {
    /// A tile was merged. `tile.stride` tells crude from fine detail.
    fn on_partial(&mut self, _tile: &Tile, _generation: u64, _image: &PixelBuffer) {}

    /// The full-resolution pass finished.
    fn on_final(&mut self, _generation: u64, _image: &PixelBuffer) {}

    /// The image was recoloured from cached escape data.
    fn on_recoloured(&mut self, _generation: u64, _image: &PixelBuffer) {}
}

struct ActivePass {
    stage: PassStage,
    handle: PassHandle,
    merged: usize,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Owns one view's transform, parameters and image, and drives the
/// crude-then-fine pass sequence for each render request.
///
/// All methods run on the control thread. Workers only ever hand back
/// finished tiles; the buffers are written here, in [`merge`](Self::merge).
pub struct RenderSession {
    config: SessionConfig,
    mapper: CoordinateMapper,
    scheduler: TileScheduler,
    counter: Arc<GenerationCounter>,
    generation: u64,
    transform: ViewTransform,
    params: FractalParameters,
    colours: Arc<ColourStrategy>,
    pixels: PixelBuffer,
    escapes: EscapeBuffer,
    state: SessionState,
    active: Option<ActivePass>,
    listener: Option<Box<dyn RenderListener>>,
}

impl RenderSession {
    /// Create a session with its own worker pool.
    ///
    /// Each session needs a pool of its own: workers block on the bounded
    /// tile queue until this session drains it.
    pub fn new(
        config: SessionConfig,
        transform: ViewTransform,
        params: FractalParameters,
        scheme: ColourScheme,
    ) -> crate::Result<Self> {
        config.validate()?;
        let scheduler = TileScheduler::new(config.workers, config.tile_edge)?;
        Ok(Self {
            mapper: CoordinateMapper::new(config.scale_bounds),
            config,
            scheduler,
            counter: Arc::new(GenerationCounter::new()),
            generation: 0,
            transform,
            params,
            colours: Arc::new(ColourStrategy::new(scheme)),
            pixels: PixelBuffer::new(transform.width, transform.height),
            escapes: EscapeBuffer::new(transform.width, transform.height),
            state: SessionState::Idle,
            active: None,
            listener: None,
        })
    }

    pub fn set_listener(&mut self, listener: Box<dyn RenderListener>) {
        self.listener = Some(listener);
    }

    // -- Accessors --

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Stamp of the most recent request (`0` before the first).
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn transform(&self) -> &ViewTransform {
        &self.transform
    }

    pub fn params(&self) -> &FractalParameters {
        &self.params
    }

    pub fn colour_scheme(&self) -> ColourScheme {
        self.colours.scheme()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn mapper(&self) -> &CoordinateMapper {
        &self.mapper
    }

    pub fn pixels(&self) -> &PixelBuffer {
        &self.pixels
    }

    pub fn escapes(&self) -> &EscapeBuffer {
        &self.escapes
    }

    /// Tiles merged out of the running pass's total.
    pub fn progress(&self) -> (usize, usize) {
        if self.active.is_some() {
            self.counter.progress()
        } else {
            (0, 0)
        }
    }

    // -- Requests --

    /// Start rendering `transform` with `params`, superseding whatever was
    /// in flight. Never waits for the old workers.
    pub fn request_render(
        &mut self,
        transform: ViewTransform,
        params: FractalParameters,
    ) -> crate::Result<()> {
        self.drop_active_pass();

        if (transform.width, transform.height) != (self.transform.width, self.transform.height) {
            self.pixels = PixelBuffer::new(transform.width, transform.height);
            self.escapes = EscapeBuffer::new(transform.width, transform.height);
        }
        self.transform = transform;
        self.params = params;

        let token = PassToken::issue(&self.counter);
        self.generation = token.generation();
        debug!(
            generation = self.generation,
            scale = transform.scale,
            max_iter = params.max_iterations(),
            "Requesting render"
        );

        let stage = if self.config.wants_crude(&transform) {
            PassStage::Crude
        } else {
            PassStage::Fine
        };
        if let Err(e) = self.start_pass(stage, token) {
            self.state = SessionState::Cancelled;
            return Err(e);
        }
        Ok(())
    }

    /// Stop the running request without waiting for its workers.
    pub fn cancel(&mut self) {
        if !self.state.is_running() {
            return;
        }
        self.drop_active_pass();
        self.state = SessionState::Cancelled;
        info!(generation = self.generation, "Render cancelled");
    }

    /// Pan by a pixel displacement and re-render.
    pub fn pan_by(&mut self, dx: f64, dy: f64) -> crate::Result<()> {
        let transform = self.mapper.pan_by(&self.transform, dx, dy);
        self.request_render(transform, self.params)
    }

    /// Zoom about a focus pixel and re-render. A bad factor leaves the
    /// session untouched.
    pub fn zoom_about(&mut self, focus_x: f64, focus_y: f64, factor: f64) -> crate::Result<()> {
        let transform = self.mapper.zoom_about(&self.transform, focus_x, focus_y, factor)?;
        self.request_render(transform, self.params)
    }

    /// Adopt new viewport dimensions, keeping the visible centre.
    pub fn resize(&mut self, width: u32, height: u32) -> crate::Result<()> {
        let transform = self.transform.resized(width, height)?;
        self.request_render(transform, self.params)
    }

    /// Jump to a bookmarked or default view.
    pub fn reset_to(&mut self, transform: ViewTransform) -> crate::Result<()> {
        self.request_render(transform, self.params)
    }

    pub fn set_julia_seed(&mut self, seed: Complex) -> crate::Result<()> {
        self.request_render(self.transform, self.params.with_julia_seed(seed))
    }

    pub fn set_params(&mut self, params: FractalParameters) -> crate::Result<()> {
        self.request_render(self.transform, params)
    }

    /// Swap the colour scheme.
    ///
    /// While a request is running it is restarted so every tile uses the
    /// new scheme. Otherwise the image is recoloured from cached escape
    /// results without iterating again.
    pub fn set_colour_scheme(&mut self, scheme: ColourScheme) -> crate::Result<()> {
        if scheme == self.colours.scheme() {
            return Ok(());
        }
        self.colours = Arc::new(ColourStrategy::new(scheme));
        if self.state.is_running() {
            return self.request_render(self.transform, self.params);
        }
        if self.state != SessionState::Idle {
            self.pixels = self.colours.colourise(&self.escapes);
            debug!(generation = self.generation, %scheme, "Recoloured from cache");
            if let Some(listener) = self.listener.as_mut() {
                listener.on_recoloured(self.generation, &self.pixels);
            }
        }
        Ok(())
    }

    // -- Consuming tiles --

    /// Merge every tile that is already waiting. Never blocks.
    /// Returns the number of tiles merged.
    pub fn poll(&mut self) -> usize {
        let mut merged = 0;
        loop {
            let next = match &self.active {
                Some(pass) => pass.handle.try_recv(),
                None => break,
            };
            match next {
                Ok(block) => {
                    self.merge(block);
                    merged += 1;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.abandon_pass();
                    break;
                }
            }
        }
        merged
    }

    /// Block until one tile is merged. `false` when nothing is running.
    pub fn step(&mut self) -> bool {
        let next = match &self.active {
            Some(pass) => pass.handle.recv(),
            None => return false,
        };
        match next {
            Some(block) => {
                self.merge(block);
                true
            }
            None => {
                self.abandon_pass();
                false
            }
        }
    }

    /// Merge tiles until the request is done or cancelled.
    pub fn run_to_completion(&mut self) -> SessionState {
        while self.step() {}
        self.state
    }

    // -- Internals --

    fn start_pass(&mut self, stage: PassStage, token: PassToken) -> crate::Result<()> {
        let stride = match stage {
            PassStage::Crude => self.config.crude_stride,
            PassStage::Fine => 1,
        };
        let handle = self.scheduler.render_pass(PassJob {
            transform: self.transform,
            params: self.params,
            stride,
            colours: Arc::clone(&self.colours),
            token,
        })?;
        self.counter.reset_progress(handle.tile_count());
        self.state = match stage {
            PassStage::Crude => SessionState::CrudeRunning,
            PassStage::Fine => SessionState::FineRunning,
        };
        self.active = Some(ActivePass {
            stage,
            handle,
            merged: 0,
        });
        Ok(())
    }

    /// Write one finished tile into the buffers, dropping stale ones.
    ///
    /// Each pass has its own channel and a superseded pass's receiver is
    /// dropped, so blocks arriving here normally match; the generation
    /// check keeps a stale block from ever reaching the buffers.
    fn merge(&mut self, block: TileBlock) {
        let Some(pass) = self.active.as_mut() else {
            return;
        };
        if block.generation != self.generation {
            debug!(
                stale = block.generation,
                current = self.generation,
                "Dropping stale tile"
            );
            return;
        }

        self.pixels.blit_tile(&block.tile, &block.pixels);
        self.escapes.blit_tile(&block.tile, &block.escapes);
        pass.merged += 1;
        let stage_done = pass.merged == pass.handle.tile_count();
        self.counter.inc_progress();

        if let Some(listener) = self.listener.as_mut() {
            listener.on_partial(&block.tile, self.generation, &self.pixels);
        }
        if stage_done {
            self.finish_stage();
        }
    }

    fn finish_stage(&mut self) {
        let Some(pass) = self.active.take() else {
            return;
        };
        let elapsed_ms = pass.handle.elapsed().as_millis();
        let tiles = pass.handle.tile_count();
        let stride = pass.handle.stride();
        if self.config.report_timings {
            info!(generation = self.generation, stride, tiles, elapsed_ms, "Pass complete");
        } else {
            debug!(generation = self.generation, stride, tiles, elapsed_ms, "Pass complete");
        }

        match pass.stage {
            PassStage::Crude => {
                let token = pass.handle.token().clone();
                drop(pass);
                if let Err(e) = self.start_pass(PassStage::Fine, token) {
                    warn!("Could not start full-resolution pass: {e}");
                    self.state = SessionState::Cancelled;
                }
            }
            PassStage::Fine => {
                self.state = SessionState::Done;
                if let Some(listener) = self.listener.as_mut() {
                    listener.on_final(self.generation, &self.pixels);
                }
            }
        }
    }

    /// The pass's workers stopped before delivering every tile.
    fn abandon_pass(&mut self) {
        if let Some(pass) = self.active.take() {
            if pass.handle.token().is_live() {
                warn!(
                    generation = self.generation,
                    merged = pass.merged,
                    tiles = pass.handle.tile_count(),
                    "Workers stopped early; keeping partial image"
                );
            }
        }
        self.state = SessionState::Cancelled;
    }

    fn drop_active_pass(&mut self) {
        if let Some(pass) = self.active.take() {
            pass.handle.token().cancel();
        }
    }
}

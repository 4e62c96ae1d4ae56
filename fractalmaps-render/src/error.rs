use thiserror::Error;

/// Errors originating from the rendering pipeline.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("invalid tile size: {0}×{0} (must be > 0)")]
    InvalidTileSize(u32),

    #[error("invalid sampling stride: {0} (must be > 0)")]
    InvalidStride(u32),

    #[error("unknown colour scheme: {0:?}")]
    UnknownColourScheme(String),

    #[error("failed to start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error(transparent)]
    Core(#[from] fractalmaps_core::CoreError),
}

use thiserror::Error;

/// Errors originating from the core fractal engine.
#[derive(Debug, Error, PartialEq)]
pub enum CoreError {
    #[error("invalid max iterations: {0} (must be >= 1)")]
    InvalidMaxIterations(u32),

    #[error("invalid escape bound: {0} (must be positive and finite)")]
    InvalidEscapeBound(f64),

    #[error("invalid view transform: {reason}")]
    InvalidTransform { reason: String },

    #[error("invalid scale bounds: [{min}, {max}] (need 0 < min <= max, both finite)")]
    InvalidScaleBounds { min: f64, max: f64 },

    #[error("invalid zoom factor: {0} (must be positive and finite)")]
    InvalidZoomFactor(f64),
}

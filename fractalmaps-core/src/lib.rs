pub mod complex;
pub mod error;
pub mod escape;
pub mod fractal;
pub mod location;
pub mod mapper;
pub mod transform;

// Re-export primary types for convenience.
pub use complex::Complex;
pub use error::CoreError;
pub use escape::escape;
pub use fractal::{EscapeResult, FractalKind, FractalParameters};
pub use location::{SavedGraphArea, SavedJuliaGraph};
pub use mapper::{pixel_to_complex, CoordinateMapper, ScaleBounds};
pub use transform::ViewTransform;

/// Convenience result type for the core crate.
pub type Result<T> = std::result::Result<T, CoreError>;

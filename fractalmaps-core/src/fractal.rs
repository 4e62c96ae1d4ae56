use serde::{Deserialize, Serialize};

use crate::complex::Complex;
use crate::error::CoreError;

/// Which escape-time iteration to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FractalKind {
    /// `z₀ = 0`, `z ← z² + c` with `c` the pixel's point.
    #[default]
    Mandelbrot,
    /// `z₀` is the pixel's point, `z ← z² + seed`.
    Julia,
}

/// The outcome of iterating one point.
///
/// Independent of any colouring, so results can be cached and recoloured.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EscapeResult {
    /// The orbit left the escape bound after `iterations` steps.
    /// `smooth` is the renormalised, continuous escape count.
    Escaped { iterations: u32, smooth: f64 },

    /// Did not escape within the iteration cap (or the orbit degenerated).
    Interior,
}

impl EscapeResult {
    #[inline]
    pub fn is_interior(&self) -> bool {
        matches!(self, Self::Interior)
    }

    /// Escape count, or `None` for interior points.
    #[inline]
    pub fn iterations(&self) -> Option<u32> {
        match self {
            Self::Escaped { iterations, .. } => Some(*iterations),
            Self::Interior => None,
        }
    }
}

/// Parameters for one render request. Immutable while a pass runs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FractalParameters {
    pub kind: FractalKind,

    /// Only read when `kind` is [`FractalKind::Julia`].
    pub julia_seed: Complex,

    max_iterations: u32,

    /// Squared escape radius; the loop compares `|z|²` against it.
    escape_bound_sq: f64,
}

impl FractalParameters {
    pub const DEFAULT_MAX_ITERATIONS: u32 = 256;
    pub const DEFAULT_ESCAPE_BOUND_SQ: f64 = 4.0;

    pub fn new(
        kind: FractalKind,
        julia_seed: Complex,
        max_iterations: u32,
        escape_bound_sq: f64,
    ) -> crate::Result<Self> {
        if max_iterations < 1 {
            return Err(CoreError::InvalidMaxIterations(max_iterations));
        }
        if escape_bound_sq <= 0.0 || !escape_bound_sq.is_finite() {
            return Err(CoreError::InvalidEscapeBound(escape_bound_sq));
        }
        Ok(Self {
            kind,
            julia_seed,
            max_iterations,
            escape_bound_sq,
        })
    }

    /// Mandelbrot parameters with the default escape bound.
    pub fn mandelbrot(max_iterations: u32) -> crate::Result<Self> {
        Self::new(
            FractalKind::Mandelbrot,
            Complex::ZERO,
            max_iterations,
            Self::DEFAULT_ESCAPE_BOUND_SQ,
        )
    }

    /// Julia parameters with the default escape bound.
    pub fn julia(seed: Complex, max_iterations: u32) -> crate::Result<Self> {
        Self::new(
            FractalKind::Julia,
            seed,
            max_iterations,
            Self::DEFAULT_ESCAPE_BOUND_SQ,
        )
    }

    /// A visually interesting default seed: `-0.7 + 0.27015i`.
    pub fn default_julia_seed() -> Complex {
        Complex::new(-0.7, 0.27015)
    }

    #[inline]
    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    #[inline]
    pub fn escape_bound_sq(&self) -> f64 {
        self.escape_bound_sq
    }

    /// Return a copy using a different Julia seed.
    pub fn with_julia_seed(self, julia_seed: Complex) -> Self {
        Self { julia_seed, ..self }
    }

    /// Return a copy with a different iteration cap.
    pub fn with_max_iterations(self, max_iterations: u32) -> crate::Result<Self> {
        Self::new(self.kind, self.julia_seed, max_iterations, self.escape_bound_sq)
    }
}

impl Default for FractalParameters {
    fn default() -> Self {
        Self {
            kind: FractalKind::Mandelbrot,
            julia_seed: Self::default_julia_seed(),
            max_iterations: Self::DEFAULT_MAX_ITERATIONS,
            escape_bound_sq: Self::DEFAULT_ESCAPE_BOUND_SQ,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_parameters() {
        let p = FractalParameters::default();
        assert_eq!(p.kind, FractalKind::Mandelbrot);
        assert_eq!(p.max_iterations(), 256);
        assert_eq!(p.escape_bound_sq(), 4.0);
    }

    #[test]
    fn rejects_zero_iterations() {
        assert_eq!(
            FractalParameters::mandelbrot(0),
            Err(CoreError::InvalidMaxIterations(0))
        );
    }

    #[test]
    fn rejects_bad_escape_bound() {
        for bound in [0.0, -4.0, f64::NAN, f64::INFINITY] {
            assert!(
                FractalParameters::new(FractalKind::Julia, Complex::ZERO, 10, bound).is_err(),
                "bound {bound} should be rejected"
            );
        }
    }

    #[test]
    fn seed_swap_keeps_other_fields() {
        let p = FractalParameters::julia(Complex::new(0.1, 0.2), 500).unwrap();
        let q = p.with_julia_seed(Complex::new(-0.8, 0.156));
        assert_eq!(q.kind, FractalKind::Julia);
        assert_eq!(q.max_iterations(), 500);
        assert_eq!(q.julia_seed, Complex::new(-0.8, 0.156));
    }

    #[test]
    fn escape_result_accessors() {
        let e = EscapeResult::Escaped {
            iterations: 7,
            smooth: 7.4,
        };
        assert_eq!(e.iterations(), Some(7));
        assert!(!e.is_interior());
        assert_eq!(EscapeResult::Interior.iterations(), None);
    }
}

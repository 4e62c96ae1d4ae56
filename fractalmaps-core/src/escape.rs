use crate::complex::Complex;
use crate::fractal::{EscapeResult, FractalKind, FractalParameters};

/// Orbits closer than this to their Brent checkpoint are treated as cycles.
const CYCLE_EPSILON: f64 = 1e-13;

/// Iterations before periodicity checking starts.
const CYCLE_WARMUP: u32 = 32;

/// Iterate one point and classify it.
///
/// Mandelbrot: `z₀ = 0`, `z ← z² + point`. Julia: `z₀ = point`,
/// `z ← z² + seed`. Stops when `|z|²` exceeds the escape bound or the
/// iteration cap is reached. Degenerate orbits (NaN) are reported as
/// [`EscapeResult::Interior`].
#[inline]
pub fn escape(point: Complex, params: &FractalParameters) -> EscapeResult {
    match params.kind {
        FractalKind::Mandelbrot => {
            // The bulbs only stay inside radius 2, so smaller bounds must iterate.
            if params.escape_bound_sq() >= 4.0
                && point.norm_sq() <= 4.0
                && (in_cardioid(point) || in_period2_bulb(point))
            {
                return EscapeResult::Interior;
            }
            iterate(Complex::ZERO, point, params)
        }
        FractalKind::Julia => iterate(point, params.julia_seed, params),
    }
}

/// Returns `true` if `c` lies inside the main cardioid.
#[inline]
fn in_cardioid(c: Complex) -> bool {
    let im2 = c.im * c.im;
    let q = (c.re - 0.25) * (c.re - 0.25) + im2;
    q * (q + (c.re - 0.25)) <= 0.25 * im2
}

/// Returns `true` if `c` lies inside the period-2 bulb.
#[inline]
fn in_period2_bulb(c: Complex) -> bool {
    (c.re + 1.0) * (c.re + 1.0) + c.im * c.im <= 0.0625
}

#[inline]
fn iterate(mut z: Complex, c: Complex, params: &FractalParameters) -> EscapeResult {
    let bound = params.escape_bound_sq();

    // Brent's cycle detection.
    let mut checkpoint = z;
    let mut period: u32 = 0;
    let mut check: u32 = 3;

    for n in 0..params.max_iterations() {
        z = z.square_add(c);

        let norm_sq = z.norm_sq();
        if norm_sq > bound {
            return EscapeResult::Escaped {
                iterations: n,
                smooth: smooth_value(n, norm_sq),
            };
        }
        if norm_sq.is_nan() {
            return EscapeResult::Interior;
        }

        if n >= CYCLE_WARMUP && n & 3 == 0 {
            if (z.re - checkpoint.re).abs() < CYCLE_EPSILON
                && (z.im - checkpoint.im).abs() < CYCLE_EPSILON
            {
                return EscapeResult::Interior;
            }
            period += 1;
            if period > check {
                checkpoint = z;
                period = 0;
                check = check.saturating_mul(2);
            }
        }
    }

    EscapeResult::Interior
}

/// Continuous escape count `ν = n + 1 − log₂(ln|zₙ|)`.
///
/// Falls back to the integer count when the formula is undefined (bound
/// below one) or overflows (`|z|` infinite after a huge first step).
#[inline]
fn smooth_value(iterations: u32, norm_sq: f64) -> f64 {
    let log_zn = norm_sq.ln() * 0.5;
    let nu = iterations as f64 + 1.0 - log_zn.ln() / std::f64::consts::LN_2;
    if log_zn > 0.0 && nu.is_finite() {
        nu
    } else {
        iterations as f64
    }
}

use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Sub};

/// A point on the complex plane, stored as two `f64` components.
///
/// `Copy` and allocation-free so it can live in registers inside the
/// escape-time loop.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Complex {
    pub re: f64,
    pub im: f64,
}

impl Complex {
    pub const ZERO: Self = Self { re: 0.0, im: 0.0 };

    #[inline]
    pub const fn new(re: f64, im: f64) -> Self {
        Self { re, im }
    }

    /// `re² + im²`, the quantity compared against the escape bound.
    #[inline]
    pub fn norm_sq(self) -> f64 {
        self.re * self.re + self.im * self.im
    }

    /// `z² + c` in a single step.
    #[inline]
    pub fn square_add(self, c: Self) -> Self {
        Self {
            re: self.re * self.re - self.im * self.im + c.re,
            im: 2.0 * self.re * self.im + c.im,
        }
    }

    /// Both components are finite (neither NaN nor infinite).
    #[inline]
    pub fn is_finite(self) -> bool {
        self.re.is_finite() && self.im.is_finite()
    }
}

impl Add for Complex {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.re + rhs.re, self.im + rhs.im)
    }
}

impl Sub for Complex {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.re - rhs.re, self.im - rhs.im)
    }
}

/// Scalar multiplication: `Complex * f64`.
impl Mul<f64> for Complex {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: f64) -> Self {
        Self::new(self.re * rhs, self.im * rhs)
    }
}

impl std::fmt::Display for Complex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.im.is_sign_negative() {
            write!(f, "{} - {}i", self.re, -self.im)
        } else {
            write!(f, "{} + {}i", self.re, self.im)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn square_add_matches_expansion() {
        // (1 + 2i)² + (0.5 - 1i) = (1 - 4 + 0.5) + (4 - 1)i
        let z = Complex::new(1.0, 2.0).square_add(Complex::new(0.5, -1.0));
        assert!((z.re - -2.5).abs() < 1e-12);
        assert!((z.im - 3.0).abs() < 1e-12);
    }

    #[test]
    fn norm_sq_of_three_four() {
        assert_eq!(Complex::new(3.0, 4.0).norm_sq(), 25.0);
    }

    #[test]
    fn arithmetic_operators() {
        let a = Complex::new(1.5, -2.0);
        let b = Complex::new(0.5, 1.0);
        assert_eq!(a + b, Complex::new(2.0, -1.0));
        assert_eq!(a - b, Complex::new(1.0, -3.0));
        assert_eq!(b * 4.0, Complex::new(2.0, 4.0));
    }

    #[test]
    fn finiteness() {
        assert!(Complex::new(1.0, -1.0).is_finite());
        assert!(!Complex::new(f64::NAN, 0.0).is_finite());
        assert!(!Complex::new(0.0, f64::INFINITY).is_finite());
    }

    #[test]
    fn display_sign() {
        assert_eq!(Complex::new(1.0, -0.5).to_string(), "1 - 0.5i");
        assert_eq!(Complex::new(-2.0, 3.0).to_string(), "-2 + 3i");
    }
}

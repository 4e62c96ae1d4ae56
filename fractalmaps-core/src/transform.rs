use crate::complex::Complex;
use crate::error::CoreError;

/// The visible region of the complex plane.
///
/// `origin` is the complex coordinate under pixel `(0, 0)` (the top-left
/// corner) and `scale` is the number of complex-plane units each pixel
/// spans. Pixel y grows downward while the imaginary axis grows upward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    /// Complex coordinate at pixel `(0, 0)`.
    pub origin: Complex,

    /// Complex-plane units per pixel. Always `> 0`.
    pub scale: f64,

    /// Viewport width in pixels. Always `> 0`.
    pub width: u32,

    /// Viewport height in pixels. Always `> 0`.
    pub height: u32,
}

impl ViewTransform {
    /// Create a transform with an explicit origin.
    pub fn new(origin: Complex, scale: f64, width: u32, height: u32) -> crate::Result<Self> {
        if width == 0 || height == 0 {
            return Err(CoreError::InvalidTransform {
                reason: format!("dimensions must be > 0, got {width}×{height}"),
            });
        }
        if scale <= 0.0 || !scale.is_finite() {
            return Err(CoreError::InvalidTransform {
                reason: format!("scale must be positive and finite, got {scale}"),
            });
        }
        if !origin.is_finite() {
            return Err(CoreError::InvalidTransform {
                reason: format!("origin must be finite, got {origin}"),
            });
        }
        Ok(Self {
            origin,
            scale,
            width,
            height,
        })
    }

    /// Create a transform whose viewport is centred on `center`.
    pub fn from_center(center: Complex, scale: f64, width: u32, height: u32) -> crate::Result<Self> {
        let origin = center + Complex::new(-(width as f64) / 2.0, height as f64 / 2.0) * scale;
        Self::new(origin, scale, width, height)
    }

    /// Default Mandelbrot view: the whole set visible, centred on `-0.75`.
    ///
    /// The set fits in roughly `[-2.0, 0.47] × [-1.12, 1.12]`; the spans
    /// below leave a small margin whatever the aspect ratio.
    pub fn default_mandelbrot(width: u32, height: u32) -> Self {
        Self::fit(Complex::new(-0.75, 0.0), 3.6, 2.6, width, height)
    }

    /// Default Julia view: `|z| < 2` visible, centred on the origin.
    pub fn default_julia(width: u32, height: u32) -> Self {
        Self::fit(Complex::ZERO, 4.2, 4.2, width, height)
    }

    fn fit(center: Complex, span_re: f64, span_im: f64, width: u32, height: u32) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let scale = (span_re / width as f64).max(span_im / height as f64);
        let origin = center + Complex::new(-(width as f64) / 2.0, height as f64 / 2.0) * scale;
        Self {
            origin,
            scale,
            width,
            height,
        }
    }

    /// Complex coordinate at the centre of the viewport.
    pub fn center(&self) -> Complex {
        self.origin + Complex::new(self.width as f64 / 2.0, -(self.height as f64) / 2.0) * self.scale
    }

    /// Same centre and scale, new pixel dimensions.
    pub fn resized(&self, width: u32, height: u32) -> crate::Result<Self> {
        Self::from_center(self.center(), self.scale, width, height)
    }

    /// Total pixels covered by the viewport.
    pub fn pixel_count(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Horizontal extent in complex-plane units.
    pub fn complex_width(&self) -> f64 {
        self.width as f64 * self.scale
    }

    /// Vertical extent in complex-plane units.
    pub fn complex_height(&self) -> f64 {
        self.height as f64 * self.scale
    }
}

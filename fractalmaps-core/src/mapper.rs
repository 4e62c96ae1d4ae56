use crate::complex::Complex;
use crate::error::CoreError;
use crate::transform::ViewTransform;

/// Allowed range for [`ViewTransform::scale`] after a zoom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleBounds {
    min: f64,
    max: f64,
}

impl ScaleBounds {
    /// Below this, neighbouring pixels collapse onto the same `f64`.
    pub const DEFAULT_MIN: f64 = 1e-15;
    pub const DEFAULT_MAX: f64 = 10.0;

    pub fn new(min: f64, max: f64) -> crate::Result<Self> {
        if !(min.is_finite() && max.is_finite()) || min <= 0.0 || min > max {
            return Err(CoreError::InvalidScaleBounds { min, max });
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    #[inline]
    fn clamp(&self, scale: f64) -> f64 {
        scale.clamp(self.min, self.max)
    }
}

impl Default for ScaleBounds {
    fn default() -> Self {
        Self {
            min: Self::DEFAULT_MIN,
            max: Self::DEFAULT_MAX,
        }
    }
}

/// Map a (possibly fractional) pixel position to the complex plane.
///
/// `origin + (px, -py) * scale`: the y-axis is flipped because pixel rows
/// grow downward.
#[inline]
pub fn pixel_to_complex(px: f64, py: f64, transform: &ViewTransform) -> Complex {
    Complex::new(
        transform.origin.re + px * transform.scale,
        transform.origin.im - py * transform.scale,
    )
}

/// Shift the view by a pixel displacement.
pub fn pan_by(transform: &ViewTransform, dx: f64, dy: f64) -> ViewTransform {
    ViewTransform {
        origin: transform.origin + Complex::new(dx, -dy) * transform.scale,
        ..*transform
    }
}

/// Pan and zoom in screen space, clamping the resulting scale.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CoordinateMapper {
    bounds: ScaleBounds,
}

impl CoordinateMapper {
    pub fn new(bounds: ScaleBounds) -> Self {
        Self { bounds }
    }

    pub fn bounds(&self) -> ScaleBounds {
        self.bounds
    }

    #[inline]
    pub fn pixel_to_complex(&self, px: f64, py: f64, transform: &ViewTransform) -> Complex {
        pixel_to_complex(px, py, transform)
    }

    pub fn pan_by(&self, transform: &ViewTransform, dx: f64, dy: f64) -> ViewTransform {
        pan_by(transform, dx, dy)
    }

    /// Zoom by `factor` (greater than one zooms in) keeping the complex
    /// point under `(focus_x, focus_y)` fixed on screen.
    ///
    /// The new scale is clamped to the configured bounds. A factor that is
    /// not positive and finite is rejected without touching the transform.
    pub fn zoom_about(
        &self,
        transform: &ViewTransform,
        focus_x: f64,
        focus_y: f64,
        factor: f64,
    ) -> crate::Result<ViewTransform> {
        if factor <= 0.0 || !factor.is_finite() {
            return Err(CoreError::InvalidZoomFactor(factor));
        }
        let anchor = pixel_to_complex(focus_x, focus_y, transform);
        let scale = self.bounds.clamp(transform.scale / factor);
        let origin = anchor - Complex::new(focus_x, -focus_y) * scale;
        Ok(ViewTransform {
            origin,
            scale,
            ..*transform
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-12;

    fn view() -> ViewTransform {
        ViewTransform::from_center(Complex::new(-0.5, 0.0), 0.005, 800, 600).unwrap()
    }

    fn assert_close(a: &ViewTransform, b: &ViewTransform) {
        assert!((a.origin.re - b.origin.re).abs() < EPSILON, "{a:?} vs {b:?}");
        assert!((a.origin.im - b.origin.im).abs() < EPSILON, "{a:?} vs {b:?}");
        assert!((a.scale - b.scale).abs() / b.scale < EPSILON, "{a:?} vs {b:?}");
        assert_eq!((a.width, a.height), (b.width, b.height));
    }

    #[test]
    fn top_left_pixel_is_origin() {
        let t = view();
        assert_eq!(pixel_to_complex(0.0, 0.0, &t), t.origin);
    }

    #[test]
    fn imaginary_axis_points_up() {
        let t = view();
        let above = pixel_to_complex(400.0, 100.0, &t);
        let below = pixel_to_complex(400.0, 500.0, &t);
        assert!(above.im > below.im);
    }

    #[test]
    fn centre_pixel_maps_to_centre() {
        let c = pixel_to_complex(400.0, 300.0, &view());
        assert!((c.re - -0.5).abs() < EPSILON);
        assert!(c.im.abs() < EPSILON);
    }

    #[test]
    fn pan_is_additive() {
        let t = view();
        let stepwise = pan_by(&pan_by(&t, 13.0, -7.5), -40.0, 22.0);
        let direct = pan_by(&t, 13.0 - 40.0, -7.5 + 22.0);
        assert_close(&stepwise, &direct);
    }

    #[test]
    fn pan_moves_origin_by_scaled_delta() {
        let t = view();
        let p = pan_by(&t, 10.0, 20.0);
        assert!((p.origin.re - (t.origin.re + 0.05)).abs() < EPSILON);
        assert!((p.origin.im - (t.origin.im - 0.1)).abs() < EPSILON);
        assert_eq!(p.scale, t.scale);
    }

    #[test]
    fn zoom_keeps_focus_point_fixed() {
        let mapper = CoordinateMapper::default();
        let t = view();
        let before = pixel_to_complex(123.0, 456.0, &t);
        let z = mapper.zoom_about(&t, 123.0, 456.0, 3.0).unwrap();
        let after = pixel_to_complex(123.0, 456.0, &z);
        assert!((before.re - after.re).abs() < EPSILON);
        assert!((before.im - after.im).abs() < EPSILON);
        assert!((z.scale - t.scale / 3.0).abs() < EPSILON);
    }

    #[test]
    fn zoom_round_trip() {
        let mapper = CoordinateMapper::default();
        let t = view();
        for &(px, py, f) in &[(0.0, 0.0, 2.0), (400.0, 300.0, 0.25), (799.0, 17.0, 1.7)] {
            let there = mapper.zoom_about(&t, px, py, f).unwrap();
            let back = mapper.zoom_about(&there, px, py, 1.0 / f).unwrap();
            assert_close(&back, &t);
        }
    }

    #[test]
    fn zoom_clamps_scale() {
        let mapper = CoordinateMapper::new(ScaleBounds::new(1e-4, 0.01).unwrap());
        let t = view();
        let deep = mapper.zoom_about(&t, 0.0, 0.0, 1e9).unwrap();
        assert_eq!(deep.scale, 1e-4);
        let wide = mapper.zoom_about(&t, 0.0, 0.0, 1e-9).unwrap();
        assert_eq!(wide.scale, 0.01);
    }

    #[test]
    fn zoom_rejects_bad_factor() {
        let mapper = CoordinateMapper::default();
        let t = view();
        assert_eq!(
            mapper.zoom_about(&t, 1.0, 1.0, 0.0),
            Err(CoreError::InvalidZoomFactor(0.0))
        );
        assert!(mapper.zoom_about(&t, 1.0, 1.0, -2.0).is_err());
        assert!(mapper.zoom_about(&t, 1.0, 1.0, f64::NAN).is_err());
    }

    #[test]
    fn scale_bounds_validation() {
        assert!(ScaleBounds::new(1e-10, 1.0).is_ok());
        assert!(ScaleBounds::new(0.0, 1.0).is_err());
        assert!(ScaleBounds::new(2.0, 1.0).is_err());
        assert!(ScaleBounds::new(1e-10, f64::INFINITY).is_err());
    }
}

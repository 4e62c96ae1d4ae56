//! Translates presentation-layer input into session calls.

use fractalmaps_core::{Complex, FractalKind, ViewTransform};
use fractalmaps_render::{ColourScheme, RenderSession};

/// Input from whatever is showing a graph.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    Resized { width: u32, height: u32 },
    /// Drag by a pixel displacement.
    Dragged { dx: f64, dy: f64 },
    /// Pinch or scroll zoom; `factor > 1` zooms in.
    Pinched { focus_x: f64, focus_y: f64, factor: f64 },
    /// Back to the default view for the graph's fractal.
    Reset,
    /// Jump to a bookmarked view.
    GoTo(ViewTransform),
    ColourSchemeChanged(String),
    JuliaSeedChanged(Complex),
    MaxIterationsChanged(u32),
    /// A tap choosing the Julia seed under the given pixel.
    SeedPicked { px: f64, py: f64 },
}

/// Apply `event` to `session`.
///
/// Returns the picked point for [`ViewEvent::SeedPicked`]; the caller
/// decides which graph receives it.
pub fn apply(session: &mut RenderSession, event: ViewEvent) -> fractalmaps_render::Result<Option<Complex>> {
    match event {
        ViewEvent::Resized { width, height } => session.resize(width, height)?,
        ViewEvent::Dragged { dx, dy } => session.pan_by(dx, dy)?,
        ViewEvent::Pinched {
            focus_x,
            focus_y,
            factor,
        } => session.zoom_about(focus_x, focus_y, factor)?,
        ViewEvent::Reset => {
            let t = session.transform();
            let home = match session.params().kind {
                FractalKind::Mandelbrot => ViewTransform::default_mandelbrot(t.width, t.height),
                FractalKind::Julia => ViewTransform::default_julia(t.width, t.height),
            };
            session.reset_to(home)?;
        }
        ViewEvent::GoTo(transform) => session.reset_to(transform)?,
        ViewEvent::ColourSchemeChanged(id) => {
            let scheme: ColourScheme = id.parse()?;
            session.set_colour_scheme(scheme)?;
        }
        ViewEvent::JuliaSeedChanged(seed) => session.set_julia_seed(seed)?,
        ViewEvent::MaxIterationsChanged(max_iterations) => {
            let params = session.params().with_max_iterations(max_iterations)?;
            session.set_params(params)?;
        }
        ViewEvent::SeedPicked { px, py } => {
            return Ok(Some(session.mapper().pixel_to_complex(px, py, session.transform())));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fractalmaps_core::FractalParameters;
    use fractalmaps_render::{RenderError, SessionConfig, SessionState};

    fn session() -> RenderSession {
        RenderSession::new(
            SessionConfig {
                workers: 1,
                tile_edge: 32,
                ..SessionConfig::default()
            },
            ViewTransform::default_mandelbrot(64, 48),
            FractalParameters::mandelbrot(32).unwrap(),
            ColourScheme::MandelbrotDefault,
        )
        .unwrap()
    }

    #[test]
    fn navigation_events_start_renders() {
        let mut s = session();
        apply(&mut s, ViewEvent::Dragged { dx: 4.0, dy: 0.0 }).unwrap();
        assert_eq!(s.generation(), 1);
        apply(
            &mut s,
            ViewEvent::Pinched {
                focus_x: 32.0,
                focus_y: 24.0,
                factor: 3.0,
            },
        )
        .unwrap();
        apply(&mut s, ViewEvent::Reset).unwrap();
        assert_eq!(*s.transform(), ViewTransform::default_mandelbrot(64, 48));
        assert_eq!(s.generation(), 3);
        assert_eq!(s.run_to_completion(), SessionState::Done);
    }

    #[test]
    fn unknown_colour_id_is_rejected() {
        let mut s = session();
        let err = apply(&mut s, ViewEvent::ColourSchemeChanged("Sepia".into())).unwrap_err();
        assert!(matches!(err, RenderError::UnknownColourScheme(_)));
        assert_eq!(s.colour_scheme(), ColourScheme::MandelbrotDefault);

        apply(&mut s, ViewEvent::ColourSchemeChanged("RGBWalk".into())).unwrap();
        assert_eq!(s.colour_scheme(), ColourScheme::RgbWalk);
    }

    #[test]
    fn seed_pick_maps_pixel_without_rendering() {
        let mut s = session();
        let picked = apply(&mut s, ViewEvent::SeedPicked { px: 32.0, py: 24.0 })
            .unwrap()
            .unwrap();
        let center = s.transform().center();
        assert!((picked.re - center.re).abs() < 1e-12);
        assert!((picked.im - center.im).abs() < 1e-12);
        assert_eq!(s.state(), SessionState::Idle);
    }

    #[test]
    fn iteration_cap_change_rerenders() {
        let mut s = session();
        apply(&mut s, ViewEvent::MaxIterationsChanged(500)).unwrap();
        assert_eq!(s.params().max_iterations(), 500);
        assert_eq!(s.generation(), 1);

        assert!(apply(&mut s, ViewEvent::MaxIterationsChanged(0)).is_err());
        assert_eq!(s.params().max_iterations(), 500);
        assert_eq!(s.generation(), 1);
    }

    #[test]
    fn bad_pinch_is_an_error() {
        let mut s = session();
        assert!(apply(
            &mut s,
            ViewEvent::Pinched {
                focus_x: 0.0,
                focus_y: 0.0,
                factor: 0.0
            }
        )
        .is_err());
        assert_eq!(s.generation(), 0);
    }
}

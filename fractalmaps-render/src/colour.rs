use std::fmt;
use std::str::FromStr;

use fractalmaps_core::EscapeResult;
use rayon::prelude::*;
use tracing::warn;

use crate::buffer::PixelBuffer;
use crate::error::RenderError;
use crate::escape_buffer::EscapeBuffer;

/// Colour given to points that never escaped, in every scheme.
pub const INTERIOR_COLOUR: [u8; 4] = [0, 0, 0, 255];

const GRADIENT_SIZE: usize = 256;
const BAND_COUNT: usize = 16;

/// Smooth-gradient period, in (smoothed) iterations.
const SMOOTH_CYCLE: f64 = 64.0;

// ---------------------------------------------------------------------------
// Scheme identifiers
// ---------------------------------------------------------------------------

/// The closed set of colouring schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ColourScheme {
    /// Warm bands keyed by raw iteration count.
    #[default]
    MandelbrotDefault,
    /// Cool bands keyed by raw iteration count.
    JuliaDefault,
    /// Gradient interpolated over the smoothed escape value.
    Smooth,
    /// Independent sine waves per channel over the iteration count.
    RgbWalk,
    /// High-frequency trig over the smoothed value. Bands on purpose.
    Psychedelic,
}

impl ColourScheme {
    pub const ALL: [Self; 5] = [
        Self::MandelbrotDefault,
        Self::JuliaDefault,
        Self::Smooth,
        Self::RgbWalk,
        Self::Psychedelic,
    ];

    /// Identifier used in settings files.
    pub fn id(self) -> &'static str {
        match self {
            Self::MandelbrotDefault => "MandelbrotDefault",
            Self::JuliaDefault => "JuliaDefault",
            Self::Smooth => "Smooth",
            Self::RgbWalk => "RGBWalk",
            Self::Psychedelic => "Psychadelic",
        }
    }

    /// Parse `id`, falling back to `fallback` (with a warning) when it is
    /// not a known identifier.
    pub fn from_id_or_default(id: &str, fallback: Self) -> Self {
        id.parse().unwrap_or_else(|e| {
            warn!("{e}; using {fallback}");
            fallback
        })
    }
}

impl FromStr for ColourScheme {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "MandelbrotDefault" => Ok(Self::MandelbrotDefault),
            "JuliaDefault" => Ok(Self::JuliaDefault),
            "Smooth" => Ok(Self::Smooth),
            "RGBWalk" => Ok(Self::RgbWalk),
            "Psychadelic" | "Psychedelic" => Ok(Self::Psychedelic),
            other => Err(RenderError::UnknownColourScheme(other.to_string())),
        }
    }
}

impl fmt::Display for ColourScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

// ---------------------------------------------------------------------------
// Palette state
// ---------------------------------------------------------------------------

/// Lookup tables a scheme reads from. Built once per scheme change.
#[derive(Debug, Clone)]
pub struct PaletteState {
    bands: Vec<[u8; 4]>,
    gradient: Vec<[u8; 4]>,
}

impl PaletteState {
    pub fn for_scheme(scheme: ColourScheme) -> Self {
        let band_stops: &[(f64, [u8; 3])] = match scheme {
            ColourScheme::JuliaDefault => &[
                (0.0, [0, 20, 60]),
                (0.3, [0, 80, 160]),
                (0.6, [0, 190, 220]),
                (0.8, [140, 240, 255]),
                (1.0, [0, 20, 60]),
            ],
            _ => &[
                (0.0, [60, 0, 10]),
                (0.25, [200, 40, 0]),
                (0.5, [255, 170, 0]),
                (0.75, [255, 250, 190]),
                (1.0, [60, 0, 10]),
            ],
        };
        let gradient_stops: &[(f64, [u8; 3])] = &[
            (0.0, [0, 7, 100]),
            (0.16, [32, 107, 203]),
            (0.42, [237, 255, 255]),
            (0.6425, [255, 170, 0]),
            (0.8575, [0, 2, 0]),
            (1.0, [0, 7, 100]),
        ];
        Self {
            bands: gradient_lut(band_stops, BAND_COUNT),
            gradient: gradient_lut(gradient_stops, GRADIENT_SIZE),
        }
    }

    /// Sample the gradient ring at fractional index `t`, interpolating
    /// between neighbouring entries.
    fn sample(&self, t: f64) -> [u8; 4] {
        let len = self.gradient.len();
        let idx = t.rem_euclid(len as f64);
        let lo = idx.floor() as usize % len;
        let hi = (lo + 1) % len;
        lerp_colour(self.gradient[lo], self.gradient[hi], idx - idx.floor())
    }
}

// ---------------------------------------------------------------------------
// Strategy
// ---------------------------------------------------------------------------

/// Map one escape result to RGBA under `scheme`.
#[inline]
pub fn map_to_colour(scheme: ColourScheme, result: EscapeResult, palette: &PaletteState) -> [u8; 4] {
    let (iterations, smooth) = match result {
        EscapeResult::Interior => return INTERIOR_COLOUR,
        EscapeResult::Escaped { iterations, smooth } => (iterations, smooth),
    };
    match scheme {
        ColourScheme::MandelbrotDefault | ColourScheme::JuliaDefault => {
            palette.bands[iterations as usize % palette.bands.len()]
        }
        ColourScheme::Smooth => {
            palette.sample(smooth / SMOOTH_CYCLE * palette.gradient.len() as f64)
        }
        ColourScheme::RgbWalk => {
            let n = iterations as f64;
            [wave(n * 0.31), wave(n * 0.17 + 2.1), wave(n * 0.07 + 4.2), 255]
        }
        ColourScheme::Psychedelic => [
            wave(smooth * 1.9),
            wave(smooth * 2.7 + 1.0),
            wave(smooth * 3.3 + 2.0),
            255,
        ],
    }
}

/// The active colouring: a scheme plus its prepared palette.
///
/// Shared read-only with the worker pool.
#[derive(Debug, Clone)]
pub struct ColourStrategy {
    scheme: ColourScheme,
    palette: PaletteState,
}

impl ColourStrategy {
    pub fn new(scheme: ColourScheme) -> Self {
        Self {
            scheme,
            palette: PaletteState::for_scheme(scheme),
        }
    }

    pub fn scheme(&self) -> ColourScheme {
        self.scheme
    }

    #[inline]
    pub fn map_to_colour(&self, result: EscapeResult) -> [u8; 4] {
        map_to_colour(self.scheme, result, &self.palette)
    }

    /// Colour a whole frame of cached escape results.
    pub fn colourise(&self, escapes: &EscapeBuffer) -> PixelBuffer {
        let mut pixels = vec![0u8; escapes.data.len() * 4];
        pixels
            .par_chunks_mut(4)
            .zip(escapes.data.par_iter())
            .for_each(|(pixel, &result)| {
                pixel.copy_from_slice(&self.map_to_colour(result));
            });
        PixelBuffer {
            width: escapes.width,
            height: escapes.height,
            pixels,
        }
    }
}

impl Default for ColourStrategy {
    fn default() -> Self {
        Self::new(ColourScheme::default())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

#[inline]
fn wave(t: f64) -> u8 {
    (127.5 * (1.0 + t.sin())) as u8
}

fn lerp_colour(a: [u8; 4], b: [u8; 4], t: f64) -> [u8; 4] {
    let inv = 1.0 - t;
    [
        (a[0] as f64 * inv + b[0] as f64 * t) as u8,
        (a[1] as f64 * inv + b[1] as f64 * t) as u8,
        (a[2] as f64 * inv + b[2] as f64 * t) as u8,
        255,
    ]
}

/// Build a ring of `size` colours by interpolating between stops.
fn gradient_lut(stops: &[(f64, [u8; 3])], size: usize) -> Vec<[u8; 4]> {
    (0..size)
        .map(|i| {
            let t = i as f64 / size as f64;
            let lo = stops.iter().rposition(|&(pos, _)| pos <= t).unwrap_or(0);
            let hi = (lo + 1).min(stops.len() - 1);
            let (lo_t, lo_c) = stops[lo];
            let (hi_t, hi_c) = stops[hi];
            let frac = if (hi_t - lo_t).abs() < 1e-10 {
                0.0
            } else {
                ((t - lo_t) / (hi_t - lo_t)).clamp(0.0, 1.0)
            };
            lerp_colour([lo_c[0], lo_c[1], lo_c[2], 255], [hi_c[0], hi_c[1], hi_c[2], 255], frac)
        })
        .collect()
}

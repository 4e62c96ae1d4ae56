//! Remembered views: flat, versionless snapshots of a [`ViewTransform`]
//! (plus the seed for Julia graphs) used for bookmarks and "last view".
//!
//! Loading never fails loudly. Missing keys, malformed JSON and
//! out-of-range numbers all read back as "no saved state".

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::complex::Complex;
use crate::transform::ViewTransform;

/// A saved view of the complex plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SavedGraphArea {
    pub origin_re: f64,
    pub origin_im: f64,
    pub scale: f64,
    pub width: u32,
    pub height: u32,
}

impl SavedGraphArea {
    pub fn from_transform(transform: &ViewTransform) -> Self {
        Self {
            origin_re: transform.origin.re,
            origin_im: transform.origin.im,
            scale: transform.scale,
            width: transform.width,
            height: transform.height,
        }
    }

    /// Rebuild the transform, or `None` if the stored numbers are not a
    /// valid view (non-finite, scale ≤ 0, zero-sized).
    pub fn to_transform(&self) -> Option<ViewTransform> {
        ViewTransform::new(
            Complex::new(self.origin_re, self.origin_im),
            self.scale,
            self.width,
            self.height,
        )
        .ok()
    }
}

/// A saved Julia graph: the view plus the seed that defines the set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SavedJuliaGraph {
    #[serde(flatten)]
    pub area: SavedGraphArea,
    pub seed_re: f64,
    pub seed_im: f64,
}

impl SavedJuliaGraph {
    pub fn new(transform: &ViewTransform, seed: Complex) -> Self {
        Self {
            area: SavedGraphArea::from_transform(transform),
            seed_re: seed.re,
            seed_im: seed.im,
        }
    }

    pub fn restore(&self) -> Option<(ViewTransform, Complex)> {
        let seed = Complex::new(self.seed_re, self.seed_im);
        if !seed.is_finite() {
            return None;
        }
        Some((self.area.to_transform()?, seed))
    }
}

/// Serialize a view.
pub fn save(transform: &ViewTransform) -> String {
    to_json(&SavedGraphArea::from_transform(transform))
}

/// Serialize a Julia view together with its seed.
pub fn save_julia(transform: &ViewTransform, seed: Complex) -> String {
    to_json(&SavedJuliaGraph::new(transform, seed))
}

/// Restore a view saved with [`save`] (or [`save_julia`]; the seed is ignored).
pub fn load(snapshot: &str) -> Option<ViewTransform> {
    from_json::<SavedGraphArea>(snapshot)?.to_transform()
}

/// Restore a Julia view and its seed saved with [`save_julia`].
pub fn load_julia(snapshot: &str) -> Option<(ViewTransform, Complex)> {
    from_json::<SavedJuliaGraph>(snapshot)?.restore()
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| {
        warn!("Failed to serialize location snapshot: {e}");
        String::new()
    })
}

fn from_json<T: for<'de> Deserialize<'de>>(snapshot: &str) -> Option<T> {
    if snapshot.trim().is_empty() {
        debug!("No saved location");
        return None;
    }
    match serde_json::from_str(snapshot) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Ignoring unreadable location snapshot: {e}");
            None
        }
    }
}

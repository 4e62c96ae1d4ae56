use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use fractalmaps_core::{FractalParameters, ScaleBounds};
use fractalmaps_render::{ColourScheme, SessionConfig, TILE_SIZE};

/// User settings, persisted as JSON in the per-user config directory.
///
/// Every field has its own serde default so a file written by an older
/// build (or edited by hand) only loses the keys it is missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Draw a coarse preview before the full-resolution image.
    #[serde(default = "default_true")]
    pub crude_first: bool,
    #[serde(default = "default_crude_stride")]
    pub crude_stride: u32,
    /// Log how long each pass took.
    #[serde(default)]
    pub show_times: bool,
    /// `0` uses every hardware thread.
    #[serde(default)]
    pub worker_threads: usize,
    #[serde(default = "default_tile_edge")]
    pub tile_edge: u32,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
    #[serde(default = "default_mandelbrot_colours")]
    pub mandelbrot_colours: String,
    #[serde(default = "default_julia_colours")]
    pub julia_colours: String,
    #[serde(default)]
    pub previous_main_graph_area: String,
    #[serde(default)]
    pub previous_little_graph_area: String,
    #[serde(default)]
    pub previous_julia_graph: String,
}

fn default_true() -> bool {
    true
}
fn default_crude_stride() -> u32 {
    SessionConfig::DEFAULT_CRUDE_STRIDE
}
fn default_tile_edge() -> u32 {
    TILE_SIZE
}
fn default_max_iterations() -> u32 {
    FractalParameters::DEFAULT_MAX_ITERATIONS
}
fn default_mandelbrot_colours() -> String {
    ColourScheme::MandelbrotDefault.id().to_string()
}
fn default_julia_colours() -> String {
    ColourScheme::JuliaDefault.id().to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            crude_first: true,
            crude_stride: default_crude_stride(),
            show_times: false,
            worker_threads: 0,
            tile_edge: default_tile_edge(),
            max_iterations: default_max_iterations(),
            mandelbrot_colours: default_mandelbrot_colours(),
            julia_colours: default_julia_colours(),
            previous_main_graph_area: String::new(),
            previous_little_graph_area: String::new(),
            previous_julia_graph: String::new(),
        }
    }
}

impl Settings {
    /// Load settings from the OS config directory, falling back to defaults.
    pub fn load() -> Self {
        Self::load_from(&config_path())
    }

    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            debug!("No settings file at {}", path.display());
            return Self::default();
        }
        match fs::read_to_string(path) {
            Ok(json) => match serde_json::from_str::<Settings>(&json) {
                Ok(settings) => {
                    info!("Loaded settings from {}", path.display());
                    settings
                }
                Err(e) => {
                    warn!("Failed to parse settings, using defaults: {e}");
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read settings file, using defaults: {e}");
                Self::default()
            }
        }
    }

    /// Persist settings to the OS config directory.
    pub fn save(&self) {
        self.save_to(&config_path());
    }

    pub fn save_to(&self, path: &Path) {
        if let Some(parent) = path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                error!("Failed to create config directory: {e}");
                return;
            }
        }
        match serde_json::to_string_pretty(self) {
            Ok(json) => {
                if let Err(e) = fs::write(path, &json) {
                    error!("Failed to write settings: {e}");
                } else {
                    debug!("Saved settings to {}", path.display());
                }
            }
            Err(e) => error!("Failed to serialize settings: {e}"),
        }
    }

    /// Session tunables derived from these settings.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            crude_first: self.crude_first,
            crude_stride: or_default("crude_stride", self.crude_stride, default_crude_stride()),
            tile_edge: or_default("tile_edge", self.tile_edge, default_tile_edge()),
            workers: self.worker_threads,
            scale_bounds: ScaleBounds::default(),
            report_timings: self.show_times,
            ..SessionConfig::default()
        }
    }

    pub fn mandelbrot_scheme(&self) -> ColourScheme {
        ColourScheme::from_id_or_default(&self.mandelbrot_colours, ColourScheme::MandelbrotDefault)
    }

    pub fn julia_scheme(&self) -> ColourScheme {
        ColourScheme::from_id_or_default(&self.julia_colours, ColourScheme::JuliaDefault)
    }

    /// Iteration cap, falling back to the default when the stored one is 0.
    pub fn max_iterations(&self) -> u32 {
        or_default("max_iterations", self.max_iterations, default_max_iterations())
    }
}

fn or_default(key: &str, stored: u32, default: u32) -> u32 {
    if stored == 0 {
        warn!("Stored {key} is 0; using {default}");
        default
    } else {
        stored
    }
}

fn config_path() -> PathBuf {
    directories::ProjectDirs::from("", "", "FractalMaps")
        .map(|d| d.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
        .join("settings.json")
}

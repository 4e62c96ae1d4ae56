//! Headless host for FractalMaps: persisted settings, the input adapter
//! and the two-graph scene.

pub mod adapter;
pub mod scene;
pub mod settings;

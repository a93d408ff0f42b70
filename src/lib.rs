//! Room visualizer engine.
//!
//! A scene is drawn four times: lit and unlit, each as a colour photograph
//! and as a greyscale luminosity mask. The engine recolours the wall and the
//! artwork surface of the current photograph toward user-chosen colours,
//! redraws at most once per display frame, and cross-fades when the lighting
//! flips.
//!
//! Pipeline: [`loader`] → [`classifier`] → [`compositor`], driven by a
//! [`visualizer::Visualizer`] and, in async hosts, by [`runtime::run`].

pub mod catalog;
pub mod classifier;
pub mod color;
pub mod compositor;
pub mod config;
pub mod curves;
pub mod error;
pub mod flood_fill;
pub mod loader;
pub mod pixel_buffer;
pub mod runtime;
pub mod scheduler;
pub mod state;
pub mod visualizer;

pub use classifier::{ClassifierStrategy, RegionClassifier, RegionMask};
pub use color::{hex_to_rgb, rgb_to_hex, ColorPreset, Rgb};
pub use compositor::composite;
pub use config::{ConfigPreset, VisualizerConfig};
pub use error::VizError;
pub use loader::{load_sources, ImageOrigin, SourceKey, SourceSet, SourceSpec};
pub use pixel_buffer::PixelBuffer;
pub use runtime::{launch, run, spawn_source_load, Command};
pub use state::VisualizerState;
pub use visualizer::{Presenter, SnapshotPresenter, Visualizer};

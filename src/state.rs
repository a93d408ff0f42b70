use crate::color::Rgb;
use crate::config::VisualizerConfig;

/// What the user has picked. Written only by the `Visualizer`, read by the
/// compositor at render time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisualizerState {
    pub wall_color: Rgb,
    pub surface_color: Rgb,
    pub light_on: bool,
    /// Set once a source set with at least one image is attached.
    pub ready: bool,
}

impl VisualizerState {
    pub fn from_config(config: &VisualizerConfig) -> Self {
        Self {
            wall_color: config.wall_color,
            surface_color: config.surface_color,
            light_on: false,
            ready: false,
        }
    }
}

impl Default for VisualizerState {
    fn default() -> Self {
        Self::from_config(&VisualizerConfig::default())
    }
}

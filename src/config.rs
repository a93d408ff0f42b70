use image::imageops::FilterType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::classifier::ClassifierStrategy;
use crate::color::{default_presets, hex, hex_to_rgb, ColorPreset, Rgb};
use crate::color::{DEFAULT_SURFACE_HEX, DEFAULT_WALL_HEX};
use crate::error::VizError;
use crate::loader::{ImageOrigin, SourceKey, SourceSpec};

#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ResizeFilter {
    Nearest,
    Triangle,
    CatmullRom,
    Gaussian,
    Lanczos3,
}

impl ResizeFilter {
    pub fn filter_type(self) -> FilterType {
        match self {
            Self::Nearest => FilterType::Nearest,
            Self::Triangle => FilterType::Triangle,
            Self::CatmullRom => FilterType::CatmullRom,
            Self::Gaussian => FilterType::Gaussian,
            Self::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlaceholderConfig {
    pub width: u32,
    pub height: u32,
    #[serde(with = "hex")]
    pub color: Rgb,
}

impl Default for PlaceholderConfig {
    fn default() -> Self {
        Self {
            width: 860,
            height: 860,
            color: Rgb::new(0x0a, 0x0a, 0x0a),
        }
    }
}

#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ConfigPreset {
    Draft,
    Standard,
    HighDetail,
}

/// Everything tunable about the visualizer. Loaded from JSON with every
/// field optional; missing fields take the `standard()` values.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VisualizerConfig {
    /// Longest side of the working canvas, in pixels.
    pub max_dimension: u32,
    pub resize_filter: ResizeFilter,
    pub strategy: ClassifierStrategy,
    /// Image file per source key, relative to the asset root.
    pub sources: BTreeMap<SourceKey, PathBuf>,
    /// Delay between hiding the canvas and swapping lighting state.
    pub fade_delay_ms: u64,
    pub frame_interval_ms: u64,
    pub placeholder: PlaceholderConfig,
    #[serde(with = "hex")]
    pub wall_color: Rgb,
    #[serde(with = "hex")]
    pub surface_color: Rgb,
    pub presets: Vec<ColorPreset>,
}

impl VisualizerConfig {
    /// Draft: small canvas for slow devices.
    pub fn draft() -> Self {
        Self {
            max_dimension: 800,
            resize_filter: ResizeFilter::Nearest,
            ..Self::standard()
        }
    }

    /// Standard: the canvas size the portfolio page ships with.
    pub fn standard() -> Self {
        Self {
            max_dimension: 1200,
            resize_filter: ResizeFilter::Triangle,
            strategy: ClassifierStrategy::default(),
            sources: default_sources(),
            fade_delay_ms: 280,
            frame_interval_ms: 16,
            placeholder: PlaceholderConfig::default(),
            wall_color: parse_builtin(DEFAULT_WALL_HEX),
            surface_color: parse_builtin(DEFAULT_SURFACE_HEX),
            presets: default_presets(),
        }
    }

    /// HighDetail: larger canvas, sharper resampling.
    pub fn high_detail() -> Self {
        Self {
            max_dimension: 1600,
            resize_filter: ResizeFilter::CatmullRom,
            ..Self::standard()
        }
    }

    pub fn from_preset(preset: ConfigPreset) -> Self {
        match preset {
            ConfigPreset::Draft => Self::draft(),
            ConfigPreset::Standard => Self::standard(),
            ConfigPreset::HighDetail => Self::high_detail(),
        }
    }

    pub fn from_json_str(raw: &str) -> Result<Self, VizError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, VizError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<(), VizError> {
        if self.max_dimension == 0 {
            return Err(VizError::InvalidConfig(
                "maxDimension must be at least 1".to_string(),
            ));
        }
        if self.frame_interval_ms == 0 {
            return Err(VizError::InvalidConfig(
                "frameIntervalMs must be at least 1".to_string(),
            ));
        }
        if self.placeholder.width == 0 || self.placeholder.height == 0 {
            return Err(VizError::InvalidConfig(
                "placeholder must not be empty".to_string(),
            ));
        }
        self.strategy.validate()
    }

    pub fn fade_delay(&self) -> Duration {
        Duration::from_millis(self.fade_delay_ms)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    /// Resolves the configured source paths against `asset_root`.
    pub fn source_specs(&self, asset_root: &Path) -> Vec<SourceSpec> {
        self.sources
            .iter()
            .map(|(key, path)| SourceSpec {
                key: *key,
                origin: ImageOrigin::Path(asset_root.join(path)),
            })
            .collect()
    }
}

impl Default for VisualizerConfig {
    fn default() -> Self {
        Self::standard()
    }
}

fn default_sources() -> BTreeMap<SourceKey, PathBuf> {
    BTreeMap::from([
        (SourceKey::OffColor, PathBuf::from("images/light-off-color.jpg")),
        (SourceKey::OnColor, PathBuf::from("images/light-on-color.jpg")),
        (SourceKey::OffMask, PathBuf::from("images/light-off-bw.jpg")),
        (SourceKey::OnMask, PathBuf::from("images/light-on-bw.jpg")),
    ])
}

fn parse_builtin(hex: &str) -> Rgb {
    hex_to_rgb(hex).unwrap_or(Rgb::new(255, 255, 255))
}

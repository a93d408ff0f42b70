//! Image loading for the visualizer.
//!
//! Every requested source is fetched and decoded concurrently, then the whole
//! batch is joined before anything is handed out: the caller either gets a
//! complete `SourceSet` (with `None` for the sources that failed) or
//! `VizError::NoSources`. There is no partial readiness.
//!
//! The first decoded source (in `SourceKey` order) fixes the working
//! resolution; everything else is resampled to it so later stages can index
//! all buffers with the same pixel offsets.

use image::imageops::FilterType;
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Instant;

use crate::config::VisualizerConfig;
use crate::error::VizError;
use crate::pixel_buffer::PixelBuffer;

const FINGERPRINT_VERSION: u8 = 1;

/// The fixed set of illustrations of one scene.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SourceKey {
    OffColor,
    OnColor,
    OffMask,
    OnMask,
}

impl SourceKey {
    pub const ALL: [SourceKey; 4] = [
        SourceKey::OffColor,
        SourceKey::OnColor,
        SourceKey::OffMask,
        SourceKey::OnMask,
    ];

    pub fn color_for(light_on: bool) -> Self {
        if light_on {
            Self::OnColor
        } else {
            Self::OffColor
        }
    }

    /// Greyscale luminosity mask matching `color_for(light_on)`.
    pub fn mask_for(light_on: bool) -> Self {
        if light_on {
            Self::OnMask
        } else {
            Self::OffMask
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::OffColor => "offColor",
            Self::OnColor => "onColor",
            Self::OffMask => "offMask",
            Self::OnMask => "onMask",
        }
    }
}

impl fmt::Display for SourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a source's encoded bytes come from.
#[derive(Debug, Clone)]
pub enum ImageOrigin {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

#[derive(Debug, Clone)]
pub struct SourceSpec {
    pub key: SourceKey,
    pub origin: ImageOrigin,
}

/// Same-resolution buffers for one scene. A requested key whose image failed
/// to load is present with `None`.
#[derive(Debug, Clone)]
pub struct SourceSet {
    width: u32,
    height: u32,
    buffers: BTreeMap<SourceKey, Option<PixelBuffer>>,
    fingerprint: String,
}

impl SourceSet {
    /// Builds a set from already-decoded buffers. Every present buffer must
    /// share one size and at least one must be present.
    pub fn from_buffers(
        entries: impl IntoIterator<Item = (SourceKey, Option<PixelBuffer>)>,
    ) -> Result<Self, VizError> {
        let buffers: BTreeMap<SourceKey, Option<PixelBuffer>> = entries.into_iter().collect();

        let (width, height) = buffers
            .values()
            .flatten()
            .map(PixelBuffer::dimensions)
            .next()
            .ok_or(VizError::NoSources)?;

        for (key, buffer) in &buffers {
            if let Some(buffer) = buffer {
                if buffer.dimensions() != (width, height) {
                    return Err(VizError::DimensionMismatch {
                        key: *key,
                        expected: (width, height),
                        actual: buffer.dimensions(),
                    });
                }
            }
        }

        let fingerprint = fingerprint(width, height, &buffers);
        Ok(Self {
            width,
            height,
            buffers,
            fingerprint,
        })
    }

    pub fn get(&self, key: SourceKey) -> Option<&PixelBuffer> {
        self.buffers.get(&key).and_then(Option::as_ref)
    }

    /// Requested but failed to load.
    pub fn is_missing(&self, key: SourceKey) -> bool {
        matches!(self.buffers.get(&key), Some(None))
    }

    pub fn requested(&self) -> impl Iterator<Item = SourceKey> + '_ {
        self.buffers.keys().copied()
    }

    pub fn loaded_count(&self) -> usize {
        self.buffers.values().flatten().count()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Content digest; two sets with equal fingerprints hold the same pixels.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }
}

/// Canvas size for a `width`×`height` source whose longest side may not
/// exceed `max_dimension`. Never upscales.
pub fn working_dimensions(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    let longest = width.max(height).max(1) as f64;
    let scale = (max_dimension as f64 / longest).min(1.0);
    let target_width = ((width as f64 * scale).round() as u32).max(1);
    let target_height = ((height as f64 * scale).round() as u32).max(1);
    (target_width, target_height)
}

/// Loads every spec, waits for all of them, and normalises the survivors.
pub async fn load_sources(
    specs: Vec<SourceSpec>,
    config: &VisualizerConfig,
) -> Result<SourceSet, VizError> {
    let started = Instant::now();
    log::info!("Loading {} visualizer sources", specs.len());

    let mut pending = Vec::with_capacity(specs.len());
    for spec in specs {
        let key = spec.key;
        pending.push((key, tokio::spawn(load_one(spec.origin))));
    }

    let mut decoded = Vec::with_capacity(pending.len());
    for (key, handle) in pending {
        let result = match handle.await {
            Ok(result) => result,
            Err(err) => Err(VizError::Task(err.to_string())),
        };
        match result {
            Ok(image) => decoded.push((key, Some(image))),
            Err(err) => {
                log::warn!("Visualizer source {} unavailable: {}", key, err);
                decoded.push((key, None));
            }
        }
    }

    // Resampling and fingerprinting are CPU-bound.
    let max_dimension = config.max_dimension;
    let filter = config.resize_filter.filter_type();
    let set = tokio::task::spawn_blocking(move || {
        normalize_sources(decoded, max_dimension, filter)
    })
    .await
    .map_err(|err| VizError::Task(err.to_string()))??;

    log::info!(
        "Visualizer sources ready: {}/{} loaded at {}x{} in {}ms",
        set.loaded_count(),
        set.buffers.len(),
        set.width,
        set.height,
        started.elapsed().as_millis()
    );
    Ok(set)
}

/// Resamples decoded images to the working resolution taken from the first
/// present image in key order.
pub fn normalize_sources(
    decoded: Vec<(SourceKey, Option<RgbaImage>)>,
    max_dimension: u32,
    filter: FilterType,
) -> Result<SourceSet, VizError> {
    let ordered: BTreeMap<SourceKey, Option<RgbaImage>> = decoded.into_iter().collect();

    let (natural_width, natural_height) = ordered
        .values()
        .flatten()
        .map(RgbaImage::dimensions)
        .next()
        .ok_or(VizError::NoSources)?;
    let (width, height) = working_dimensions(natural_width, natural_height, max_dimension);

    let buffers = ordered.into_iter().map(|(key, image)| {
        let buffer = image.map(|image| {
            if image.dimensions() == (width, height) {
                PixelBuffer::from_image(image)
            } else {
                log::debug!(
                    "Resampling {} from {}x{} to {}x{}",
                    key,
                    image.width(),
                    image.height(),
                    width,
                    height
                );
                PixelBuffer::from_image(image::imageops::resize(&image, width, height, filter))
            }
        });
        (key, buffer)
    });

    SourceSet::from_buffers(buffers)
}

async fn load_one(origin: ImageOrigin) -> Result<RgbaImage, VizError> {
    let bytes = match origin {
        ImageOrigin::Path(path) => {
            log::debug!("Reading visualizer source {}", path.display());
            tokio::fs::read(&path).await?
        }
        ImageOrigin::Bytes(bytes) => bytes,
    };

    tokio::task::spawn_blocking(move || decode(&bytes))
        .await
        .map_err(|e| VizError::Task(e.to_string()))?
}

fn decode(bytes: &[u8]) -> Result<RgbaImage, VizError> {
    let decoded = image::load_from_memory(bytes)
        .map_err(|e| VizError::Decode(format!("Failed to decode image bytes: {}", e)))?;
    Ok(decoded.to_rgba8())
}

fn fingerprint(
    width: u32,
    height: u32,
    buffers: &BTreeMap<SourceKey, Option<PixelBuffer>>,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update([FINGERPRINT_VERSION]);
    hasher.update(width.to_le_bytes());
    hasher.update(height.to_le_bytes());
    for (key, buffer) in buffers {
        hasher.update([*key as u8]);
        match buffer {
            Some(buffer) => {
                hasher.update([1]);
                hasher.update(buffer.as_raw());
            }
            None => hasher.update([0]),
        }
    }
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba};
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
        let image = RgbaImage::from_pixel(width, height, Rgba(rgba));
        let mut cursor = Cursor::new(Vec::new());
        image.write_to(&mut cursor, ImageFormat::Png).unwrap();
        cursor.into_inner()
    }

    fn spec(key: SourceKey, origin: ImageOrigin) -> SourceSpec {
        SourceSpec { key, origin }
    }

    #[test]
    fn test_working_dimensions_caps_longest_side() {
        assert_eq!(working_dimensions(2400, 1600, 1200), (1200, 800));
        assert_eq!(working_dimensions(1000, 3000, 1200), (400, 1200));
        assert_eq!(working_dimensions(640, 480, 1200), (640, 480));
        assert_eq!(working_dimensions(5000, 1, 1000), (1000, 1));
    }

    #[test]
    fn test_normalize_resamples_to_first_present_source() {
        let decoded = vec![
            (SourceKey::OnMask, Some(RgbaImage::new(10, 10))),
            (SourceKey::OffColor, None),
            (SourceKey::OnColor, Some(RgbaImage::new(40, 20))),
        ];
        let set = normalize_sources(decoded, 20, FilterType::Triangle).unwrap();
        assert_eq!(set.dimensions(), (20, 10));
        assert_eq!(set.get(SourceKey::OnMask).unwrap().dimensions(), (20, 10));
        assert!(set.is_missing(SourceKey::OffColor));
        assert!(!set.is_missing(SourceKey::OffMask));
        assert_eq!(set.loaded_count(), 2);
    }

    #[test]
    fn test_from_buffers_rejects_mismatched_sizes() {
        let result = SourceSet::from_buffers(vec![
            (SourceKey::OffColor, Some(PixelBuffer::filled(2, 2, [0; 4]))),
            (SourceKey::OnColor, Some(PixelBuffer::filled(3, 2, [0; 4]))),
        ]);
        assert!(matches!(
            result,
            Err(VizError::DimensionMismatch {
                key: SourceKey::OnColor,
                ..
            })
        ));
    }

    #[test]
    fn test_fingerprint_tracks_content() {
        let a = SourceSet::from_buffers(vec![(
            SourceKey::OffColor,
            Some(PixelBuffer::filled(2, 2, [1, 2, 3, 255])),
        )])
        .unwrap();
        let same = SourceSet::from_buffers(vec![(
            SourceKey::OffColor,
            Some(PixelBuffer::filled(2, 2, [1, 2, 3, 255])),
        )])
        .unwrap();
        let other = SourceSet::from_buffers(vec![(
            SourceKey::OffColor,
            Some(PixelBuffer::filled(2, 2, [9, 2, 3, 255])),
        )])
        .unwrap();
        assert_eq!(a.fingerprint(), same.fingerprint());
        assert_ne!(a.fingerprint(), other.fingerprint());
    }

    #[tokio::test]
    async fn test_load_tolerates_failed_sources() {
        let config = VisualizerConfig::default();
        let specs = vec![
            spec(
                SourceKey::OffColor,
                ImageOrigin::Bytes(png_bytes(8, 4, [200, 200, 200, 255])),
            ),
            spec(
                SourceKey::OnColor,
                ImageOrigin::Path(PathBuf::from("/definitely/not/here.jpg")),
            ),
            spec(SourceKey::OffMask, ImageOrigin::Bytes(b"not an image".to_vec())),
        ];

        let set = load_sources(specs, &config).await.unwrap();
        assert_eq!(set.dimensions(), (8, 4));
        assert!(set.get(SourceKey::OffColor).is_some());
        assert!(set.is_missing(SourceKey::OnColor));
        assert!(set.is_missing(SourceKey::OffMask));
        assert_eq!(set.requested().count(), 3);
    }

    #[tokio::test]
    async fn test_load_with_no_successes_is_not_ready() {
        let config = VisualizerConfig::default();
        let specs = vec![
            spec(SourceKey::OffColor, ImageOrigin::Bytes(Vec::new())),
            spec(
                SourceKey::OnColor,
                ImageOrigin::Path(PathBuf::from("/definitely/not/here.png")),
            ),
        ];
        assert!(matches!(
            load_sources(specs, &config).await,
            Err(VizError::NoSources)
        ));
    }

    #[tokio::test]
    async fn test_load_caps_resolution() {
        let mut config = VisualizerConfig::default();
        config.max_dimension = 16;
        let specs = vec![
            spec(
                SourceKey::OffColor,
                ImageOrigin::Bytes(png_bytes(64, 32, [255, 255, 255, 255])),
            ),
            spec(
                SourceKey::OffMask,
                ImageOrigin::Bytes(png_bytes(32, 32, [128, 128, 128, 255])),
            ),
        ];
        let set = load_sources(specs, &config).await.unwrap();
        assert_eq!(set.dimensions(), (16, 8));
        assert_eq!(set.get(SourceKey::OffMask).unwrap().dimensions(), (16, 8));
    }

    #[tokio::test]
    async fn test_load_matches_synchronous_normalize() {
        let mut config = VisualizerConfig::default();
        config.max_dimension = 20;
        let color = png_bytes(40, 30, [200, 120, 40, 255]);
        let mask = png_bytes(10, 10, [90, 90, 90, 255]);

        let decoded = vec![
            (
                SourceKey::OffColor,
                Some(image::load_from_memory(&color).unwrap().to_rgba8()),
            ),
            (
                SourceKey::OffMask,
                Some(image::load_from_memory(&mask).unwrap().to_rgba8()),
            ),
        ];
        let direct =
            normalize_sources(decoded, config.max_dimension, config.resize_filter.filter_type())
                .unwrap();

        let specs = vec![
            spec(SourceKey::OffColor, ImageOrigin::Bytes(color)),
            spec(SourceKey::OffMask, ImageOrigin::Bytes(mask)),
        ];
        let loaded = load_sources(specs, &config).await.unwrap();
        assert_eq!(loaded.dimensions(), (20, 15));
        assert_eq!(loaded.fingerprint(), direct.fingerprint());
    }
}

use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::curves::{CurveSet, LuminanceCurves};
use crate::error::VizError;
use crate::flood_fill::{label_regions, FloodFillParams, RegionLabels};
use crate::loader::SourceSet;

/// How pixels are assigned to the wall and surface regions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ClassifierStrategy {
    /// Soft weights looked up from a greyscale luminosity mask.
    LuminanceCurves(CurveSet),
    /// Hard labels from a flood fill over a line-art reference image.
    FloodFill(FloodFillParams),
}

impl Default for ClassifierStrategy {
    fn default() -> Self {
        Self::LuminanceCurves(CurveSet::default())
    }
}

impl ClassifierStrategy {
    pub fn validate(&self) -> Result<(), VizError> {
        match self {
            Self::LuminanceCurves(set) => set.validate(),
            Self::FloodFill(params) => params.validate(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RegionMask {
    Curves(LuminanceCurves),
    Labels(RegionLabels),
}

struct CachedMask {
    fingerprint: String,
    mask: Option<RegionMask>,
}

/// Builds the region mask for a source set and keeps it until a set with
/// different content arrives.
pub struct RegionClassifier {
    strategy: ClassifierStrategy,
    cached: Option<CachedMask>,
    builds: usize,
}

impl RegionClassifier {
    pub fn new(strategy: ClassifierStrategy) -> Self {
        Self {
            strategy,
            cached: None,
            builds: 0,
        }
    }

    pub fn strategy(&self) -> &ClassifierStrategy {
        &self.strategy
    }

    /// Mask for `sources`, or `None` when the strategy's input image is
    /// missing from the set.
    pub fn classify(&mut self, sources: &SourceSet) -> Option<&RegionMask> {
        let stale = self
            .cached
            .as_ref()
            .map_or(true, |cached| cached.fingerprint != sources.fingerprint());

        if stale {
            let mask = self.build(sources);
            self.builds += 1;
            self.cached = Some(CachedMask {
                fingerprint: sources.fingerprint().to_string(),
                mask,
            });
        }

        self.cached.as_ref().and_then(|cached| cached.mask.as_ref())
    }

    pub fn invalidate(&mut self) {
        self.cached = None;
    }

    /// How many masks have been built since construction.
    pub fn build_count(&self) -> usize {
        self.builds
    }

    fn build(&self, sources: &SourceSet) -> Option<RegionMask> {
        match &self.strategy {
            ClassifierStrategy::LuminanceCurves(set) => {
                let curves = LuminanceCurves::build(set);
                log::debug!(
                    "Built luminance tables (wall peak {:.3}, surface peak {:.3})",
                    curves.wall.peak(),
                    curves.surface.peak()
                );
                Some(RegionMask::Curves(curves))
            }
            ClassifierStrategy::FloodFill(params) => {
                let Some(reference) = sources.get(params.reference) else {
                    log::warn!(
                        "Flood-fill reference {} not loaded; colours will pass through",
                        params.reference
                    );
                    return None;
                };

                let started = Instant::now();
                let labels = label_regions(reference, params);
                let counts = labels.counts();
                log::info!(
                    "Region labels built from {}: {} outside, {} inside, {} neither in {}ms",
                    params.reference,
                    counts.outside,
                    counts.inside,
                    counts.neither,
                    started.elapsed().as_millis()
                );
                Some(RegionMask::Labels(labels))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::SourceKey;
    use crate::pixel_buffer::PixelBuffer;

    fn set_with(key: SourceKey, rgba: [u8; 4]) -> SourceSet {
        SourceSet::from_buffers(vec![(key, Some(PixelBuffer::filled(3, 3, rgba)))]).unwrap()
    }

    #[test]
    fn test_mask_is_cached_per_source_set() {
        let mut classifier = RegionClassifier::new(ClassifierStrategy::FloodFill(
            FloodFillParams::default(),
        ));
        let sources = set_with(SourceKey::OffColor, [255, 255, 255, 255]);

        assert!(classifier.classify(&sources).is_some());
        assert!(classifier.classify(&sources).is_some());
        assert_eq!(classifier.build_count(), 1);

        let reloaded = set_with(SourceKey::OffColor, [0, 0, 0, 255]);
        classifier.classify(&reloaded);
        assert_eq!(classifier.build_count(), 2);

        classifier.invalidate();
        classifier.classify(&reloaded);
        assert_eq!(classifier.build_count(), 3);
    }

    #[test]
    fn test_flood_fill_without_reference_yields_no_mask() {
        let mut classifier = RegionClassifier::new(ClassifierStrategy::FloodFill(
            FloodFillParams::default(),
        ));
        let sources = set_with(SourceKey::OnColor, [255, 255, 255, 255]);
        assert!(classifier.classify(&sources).is_none());
    }

    #[test]
    fn test_curves_need_no_reference_image() {
        let mut classifier = RegionClassifier::new(ClassifierStrategy::default());
        let sources = set_with(SourceKey::OnColor, [255, 255, 255, 255]);
        assert!(matches!(
            classifier.classify(&sources),
            Some(RegionMask::Curves(_))
        ));
    }

    #[test]
    fn test_strategy_json_is_tagged() {
        let strategy: ClassifierStrategy =
            serde_json::from_str(r#"{ "kind": "luminanceCurves" }"#).unwrap();
        assert_eq!(strategy, ClassifierStrategy::default());

        let strategy: ClassifierStrategy =
            serde_json::from_str(r#"{ "kind": "floodFill", "reference": "onColor" }"#).unwrap();
        match strategy {
            ClassifierStrategy::FloodFill(params) => {
                assert_eq!(params.reference, SourceKey::OnColor);
                assert_eq!(params.dark_threshold, 100);
            }
            other => panic!("unexpected strategy: {:?}", other),
        }
    }
}

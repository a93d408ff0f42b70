use serde::{Deserialize, Serialize};

use crate::error::VizError;

/// Weights at or below this are treated as zero by the compositor.
pub const WEIGHT_EPSILON: f64 = 0.002;

/// A bump-shaped response over the 0–255 brightness range: a smoothstep rise
/// from `rise_start` to `rise_end`, a smoothstep fall from `fall_start` to
/// `fall_end`, scaled by `strength`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurveParams {
    pub rise_start: f64,
    pub rise_end: f64,
    pub fall_start: f64,
    pub fall_end: f64,
    pub strength: f64,
}

impl CurveParams {
    /// Mid-tones: the painted wall texture.
    pub fn wall() -> Self {
        Self {
            rise_start: 40.0,
            rise_end: 92.0,
            fall_start: 155.0,
            fall_end: 212.0,
            strength: 0.68,
        }
    }

    /// Highlights: lit surface between the nails.
    pub fn surface() -> Self {
        Self {
            rise_start: 148.0,
            rise_end: 200.0,
            fall_start: 238.0,
            fall_end: 255.0,
            strength: 0.58,
        }
    }

    pub fn validate(&self, name: &str) -> Result<(), VizError> {
        let in_range = |v: f64| (0.0..=255.0).contains(&v);
        if ![self.rise_start, self.rise_end, self.fall_start, self.fall_end]
            .into_iter()
            .all(in_range)
        {
            return Err(VizError::InvalidConfig(format!(
                "{} curve bounds must lie within 0..=255",
                name
            )));
        }
        if self.rise_end <= self.rise_start || self.fall_end <= self.fall_start {
            return Err(VizError::InvalidConfig(format!(
                "{} curve ramps must have end > start",
                name
            )));
        }
        if !(0.0..=1.0).contains(&self.strength) {
            return Err(VizError::InvalidConfig(format!(
                "{} curve strength must be within 0..=1",
                name
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CurveSet {
    pub wall: CurveParams,
    pub surface: CurveParams,
}

impl Default for CurveSet {
    fn default() -> Self {
        Self {
            wall: CurveParams::wall(),
            surface: CurveParams::surface(),
        }
    }
}

impl CurveSet {
    pub fn validate(&self) -> Result<(), VizError> {
        self.wall.validate("wall")?;
        self.surface.validate("surface")
    }
}

/// Cubic ease `t²(3 − 2t)` for `t` in `0..=1`.
pub fn smoothstep(t: f64) -> f64 {
    (t * t * (3.0 - 2.0 * t)).clamp(0.0, 1.0)
}

fn ramp(v: f64, lo: f64, hi: f64) -> f64 {
    ((v - lo) / (hi - lo)).clamp(0.0, 1.0)
}

pub fn band_weight(v: f64, params: &CurveParams) -> f64 {
    let rise = smoothstep(ramp(v, params.rise_start, params.rise_end));
    let fall = smoothstep(ramp(v, params.fall_start, params.fall_end));
    rise * (1.0 - fall) * params.strength
}

/// `band_weight` sampled at every 8-bit brightness, stored single precision.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightTable {
    weights: [f32; 256],
}

impl WeightTable {
    pub fn build(params: &CurveParams) -> Self {
        let mut weights = [0.0f32; 256];
        for (v, weight) in weights.iter_mut().enumerate() {
            *weight = band_weight(v as f64, params) as f32;
        }
        Self { weights }
    }

    #[inline]
    pub fn weight(&self, luminance: u8) -> f32 {
        self.weights[luminance as usize]
    }

    pub fn peak(&self) -> f32 {
        self.weights.iter().copied().fold(0.0, f32::max)
    }
}

/// Wall and surface tables. Stateless, shared by every frame.
#[derive(Debug, Clone, PartialEq)]
pub struct LuminanceCurves {
    pub wall: WeightTable,
    pub surface: WeightTable,
}

impl LuminanceCurves {
    pub fn build(set: &CurveSet) -> Self {
        Self {
            wall: WeightTable::build(&set.wall),
            surface: WeightTable::build(&set.surface),
        }
    }
}

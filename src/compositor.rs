//! Recolours the current source image toward the chosen wall and surface
//! colours.
//!
//! Both strategies use a multiply blend, which can only darken: every output
//! channel lies in `[0, original]`, so no clamping is needed after rounding.

use rayon::prelude::*;

use crate::classifier::RegionMask;
use crate::color::Rgb;
use crate::curves::{LuminanceCurves, WEIGHT_EPSILON};
use crate::error::VizError;
use crate::flood_fill::RegionLabel;
use crate::loader::{SourceKey, SourceSet};
use crate::pixel_buffer::PixelBuffer;
use crate::state::VisualizerState;

/// Renders one frame for `state`.
///
/// Fails with `SourceUnavailable` when the colour image for the current
/// lighting state never loaded; the caller keeps showing its last frame.
/// Without a usable mask the colour image is copied through untouched.
pub fn composite(
    sources: &SourceSet,
    mask: Option<&RegionMask>,
    state: &VisualizerState,
) -> Result<PixelBuffer, VizError> {
    let color_key = SourceKey::color_for(state.light_on);
    let source = sources
        .get(color_key)
        .ok_or(VizError::SourceUnavailable(color_key))?;
    let (width, height) = source.dimensions();

    let data = match mask {
        Some(RegionMask::Curves(curves)) => {
            let mask_key = SourceKey::mask_for(state.light_on);
            match sources.get(mask_key) {
                Some(luminance) => tint_by_luminance(
                    source.as_raw(),
                    luminance.as_raw(),
                    curves,
                    state.wall_color,
                    state.surface_color,
                ),
                None => {
                    log::debug!("No {} mask loaded, copying {} unchanged", mask_key, color_key);
                    source.as_raw().to_vec()
                }
            }
        }
        Some(RegionMask::Labels(labels)) => remap_regions(
            source.as_raw(),
            labels.as_slice(),
            state.wall_color,
            state.surface_color,
        ),
        None => source.as_raw().to_vec(),
    };

    PixelBuffer::from_raw(width, height, data)
}

/// `original + weight × (original × target/255 − original)`. Evaluated in
/// double precision and in this order so `.5` boundaries land the same way
/// as the page's canvas renderer.
#[inline]
pub fn multiply_blend(original: f64, target: u8, weight: f64) -> f64 {
    original + weight * ((original * target as f64 / 255.0) - original)
}

/// Full-strength multiply, rounded half up: `floor(o·t/255 + 0.5)`.
#[inline]
pub fn multiply(original: u8, target: u8) -> u8 {
    let product = 2 * original as u32 * target as u32;
    ((product + 255) / 510) as u8
}

#[inline]
fn round_channel(value: f64) -> u8 {
    (value + 0.5).floor() as u8
}

fn channels(color: Rgb) -> [u8; 3] {
    [color.red, color.green, color.blue]
}

fn tint_by_luminance(
    src: &[u8],
    luminance: &[u8],
    curves: &LuminanceCurves,
    wall: Rgb,
    surface: Rgb,
) -> Vec<u8> {
    let wall = channels(wall);
    let surface = channels(surface);
    let mut out = vec![0u8; src.len()];

    out.par_chunks_exact_mut(4)
        .zip(src.par_chunks_exact(4))
        .zip(luminance.par_chunks_exact(4))
        .for_each(|((out_px, src_px), lum_px)| {
            // Greyscale mask: any channel is the brightness.
            let lum = lum_px[0];
            let mut rgb = [src_px[0] as f64, src_px[1] as f64, src_px[2] as f64];

            let wall_weight = curves.wall.weight(lum) as f64;
            if wall_weight > WEIGHT_EPSILON {
                for (value, target) in rgb.iter_mut().zip(wall) {
                    *value = multiply_blend(*value, target, wall_weight);
                }
            }
            // Applied to the already-tinted value where the bands overlap.
            let surface_weight = curves.surface.weight(lum) as f64;
            if surface_weight > WEIGHT_EPSILON {
                for (value, target) in rgb.iter_mut().zip(surface) {
                    *value = multiply_blend(*value, target, surface_weight);
                }
            }

            for (dst, value) in out_px.iter_mut().zip(rgb) {
                *dst = round_channel(value);
            }
            out_px[3] = src_px[3];
        });

    out
}

fn remap_regions(src: &[u8], labels: &[RegionLabel], wall: Rgb, surface: Rgb) -> Vec<u8> {
    let wall = channels(wall);
    let surface = channels(surface);
    let mut out = src.to_vec();

    out.par_chunks_exact_mut(4)
        .zip(labels.par_iter())
        .for_each(|(px, label)| {
            let target = match label {
                RegionLabel::Outside => wall,
                RegionLabel::Inside => surface,
                RegionLabel::Neither => return,
            };
            for (channel, t) in px.iter_mut().zip(target) {
                *channel = multiply(*channel, t);
            }
        });

    out
}

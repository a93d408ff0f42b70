use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::error::VizError;
use crate::loader::SourceKey;
use crate::pixel_buffer::PixelBuffer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FloodFillParams {
    /// A pixel whose RGB channels are all below this blocks the fill.
    pub dark_threshold: u8,
    /// An enclosed pixel whose RGB channels all exceed this is `Inside`.
    pub white_threshold: u8,
    /// Buffer the mask is computed from. Should be the variant without
    /// directional lighting so shadows don't form false barriers.
    pub reference: SourceKey,
}

impl Default for FloodFillParams {
    fn default() -> Self {
        Self {
            dark_threshold: 100,
            white_threshold: 238,
            reference: SourceKey::OffColor,
        }
    }
}

impl FloodFillParams {
    pub fn validate(&self) -> Result<(), VizError> {
        if self.dark_threshold > self.white_threshold {
            return Err(VizError::InvalidConfig(
                "darkThreshold must not exceed whiteThreshold".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RegionLabel {
    /// Dark lines and anything enclosed that isn't white.
    Neither = 0,
    /// Reachable from the image edge: the wall.
    Outside = 1,
    /// Enclosed white: the artwork surface.
    Inside = 2,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LabelCounts {
    pub outside: usize,
    pub inside: usize,
    pub neither: usize,
}

/// One label per pixel, row-major, same size as the reference buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionLabels {
    width: u32,
    height: u32,
    labels: Vec<RegionLabel>,
}

impl RegionLabels {
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn as_slice(&self) -> &[RegionLabel] {
        &self.labels
    }

    pub fn get(&self, x: u32, y: u32) -> Option<RegionLabel> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.labels[y as usize * self.width as usize + x as usize])
    }

    pub fn counts(&self) -> LabelCounts {
        let mut counts = LabelCounts::default();
        for label in &self.labels {
            match label {
                RegionLabel::Outside => counts.outside += 1,
                RegionLabel::Inside => counts.inside += 1,
                RegionLabel::Neither => counts.neither += 1,
            }
        }
        counts
    }
}

/// Labels every pixel of `reference` by flood-filling from the image border.
///
/// Dark pixels are walls for the fill, so a closed dark contour separates the
/// bright area it encloses from the bright background around it.
pub fn label_regions(reference: &PixelBuffer, params: &FloodFillParams) -> RegionLabels {
    let width = reference.width() as usize;
    let height = reference.height() as usize;
    let n = width * height;
    let rgba = reference.as_raw();

    let is_barrier = |idx: usize| {
        let px = &rgba[idx * 4..idx * 4 + 3];
        px.iter().all(|&c| c < params.dark_threshold)
    };
    let is_white = |idx: usize| {
        let px = &rgba[idx * 4..idx * 4 + 3];
        px.iter().all(|&c| c > params.white_threshold)
    };

    let mut reached = vec![false; n];
    let mut queue = VecDeque::<usize>::new();

    let seed = |idx: usize, reached: &mut [bool], queue: &mut VecDeque<usize>| {
        if !reached[idx] && !is_barrier(idx) {
            reached[idx] = true;
            queue.push_back(idx);
        }
    };
    if n > 0 {
        for x in 0..width {
            seed(x, &mut reached, &mut queue);
            seed((height - 1) * width + x, &mut reached, &mut queue);
        }
        for y in 0..height {
            seed(y * width, &mut reached, &mut queue);
            seed(y * width + width - 1, &mut reached, &mut queue);
        }
    }

    while let Some(idx) = queue.pop_front() {
        let x = idx % width;
        let y = idx / width;

        for (dx, dy) in [(-1i64, 0i64), (1, 0), (0, -1), (0, 1)] {
            let nx = x as i64 + dx;
            let ny = y as i64 + dy;
            if nx < 0 || nx >= width as i64 || ny < 0 || ny >= height as i64 {
                continue;
            }

            let nidx = ny as usize * width + nx as usize;
            if reached[nidx] || is_barrier(nidx) {
                continue;
            }
            reached[nidx] = true;
            queue.push_back(nidx);
        }
    }

    let labels = (0..n)
        .map(|idx| {
            if reached[idx] {
                RegionLabel::Outside
            } else if is_white(idx) {
                RegionLabel::Inside
            } else {
                RegionLabel::Neither
            }
        })
        .collect();

    RegionLabels {
        width: reference.width(),
        height: reference.height(),
        labels,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const WHITE: [u8; 4] = [255, 255, 255, 255];
    const BLACK: [u8; 4] = [0, 0, 0, 255];

    /// Builds a buffer from rows of `.` (white), `#` (black) and `g` (grey).
    fn buffer_from_rows(rows: &[&str]) -> PixelBuffer {
        let height = rows.len() as u32;
        let width = rows[0].len() as u32;
        let mut data = Vec::new();
        for row in rows {
            for c in row.chars() {
                data.extend_from_slice(&match c {
                    '#' => BLACK,
                    'g' => [180, 180, 180, 255],
                    _ => WHITE,
                });
            }
        }
        PixelBuffer::from_raw(width, height, data).unwrap()
    }

    #[test]
    fn test_enclosed_white_is_inside() {
        let buffer = buffer_from_rows(&[
            "......",
            ".####.",
            ".#..#.",
            ".#..#.",
            ".####.",
            "......",
        ]);
        let labels = label_regions(&buffer, &FloodFillParams::default());

        assert_eq!(labels.get(0, 0), Some(RegionLabel::Outside));
        assert_eq!(labels.get(5, 3), Some(RegionLabel::Outside));
        assert_eq!(labels.get(1, 1), Some(RegionLabel::Neither));
        assert_eq!(labels.get(2, 2), Some(RegionLabel::Inside));
        assert_eq!(labels.get(3, 3), Some(RegionLabel::Inside));
        assert_eq!(
            labels.counts(),
            LabelCounts {
                outside: 20,
                inside: 4,
                neither: 12,
            }
        );
    }

    #[test]
    fn test_gap_in_contour_leaks_fill() {
        let buffer = buffer_from_rows(&[
            "......",
            ".##.#.",
            ".#..#.",
            ".####.",
            "......",
        ]);
        let labels = label_regions(&buffer, &FloodFillParams::default());
        assert_eq!(labels.get(2, 2), Some(RegionLabel::Outside));
        assert_eq!(labels.counts().inside, 0);
    }

    #[test]
    fn test_enclosed_grey_is_neither() {
        let buffer = buffer_from_rows(&[
            ".....",
            ".###.",
            ".#g#.",
            ".###.",
            ".....",
        ]);
        let labels = label_regions(&buffer, &FloodFillParams::default());
        assert_eq!(labels.get(2, 2), Some(RegionLabel::Neither));
    }

    #[test]
    fn test_fill_is_four_connected() {
        // Only diagonal neighbours of the centre are white: no passage.
        let buffer = buffer_from_rows(&[
            ".....",
            "..#..",
            ".#.#.",
            "..#..",
            ".....",
        ]);
        let labels = label_regions(&buffer, &FloodFillParams::default());
        assert_eq!(labels.get(2, 2), Some(RegionLabel::Inside));
    }

    #[test]
    fn test_all_barrier_border_leaves_interior_inside() {
        let buffer = buffer_from_rows(&["####", "#..#", "#..#", "####"]);
        let labels = label_regions(&buffer, &FloodFillParams::default());
        let counts = labels.counts();
        assert_eq!(counts.outside, 0);
        assert_eq!(counts.inside, 4);
        assert_eq!(counts.neither, 12);
    }

    proptest! {
        #[test]
        fn outside_is_exactly_the_reachable_set(cells in proptest::collection::vec(any::<bool>(), 36)) {
            let (w, h) = (6u32, 6u32);
            let mut data = Vec::new();
            for &dark in &cells {
                data.extend_from_slice(if dark { &BLACK } else { &WHITE });
            }
            let buffer = PixelBuffer::from_raw(w, h, data).unwrap();
            let labels = label_regions(&buffer, &FloodFillParams::default());

            let label = |x: u32, y: u32| labels.get(x, y).unwrap();
            for y in 0..h {
                for x in 0..w {
                    let dark = cells[(y * w + x) as usize];
                    let on_edge = x == 0 || y == 0 || x == w - 1 || y == h - 1;
                    match label(x, y) {
                        RegionLabel::Outside => prop_assert!(!dark),
                        RegionLabel::Inside => prop_assert!(!dark && !on_edge),
                        RegionLabel::Neither => prop_assert!(dark),
                    }
                    if !dark && on_edge {
                        prop_assert_eq!(label(x, y), RegionLabel::Outside);
                    }
                    // Closure: the fill never stops next to a passable pixel.
                    if label(x, y) == RegionLabel::Outside {
                        let neighbours = [
                            (x.wrapping_sub(1), y),
                            (x + 1, y),
                            (x, y.wrapping_sub(1)),
                            (x, y + 1),
                        ];
                        for (nx, ny) in neighbours {
                            if let Some(other) = labels.get(nx, ny) {
                                let other_dark = cells[(ny * w + nx) as usize];
                                if !other_dark {
                                    prop_assert_eq!(other, RegionLabel::Outside);
                                }
                            }
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_validate_threshold_order() {
        let params = FloodFillParams {
            dark_threshold: 240,
            white_threshold: 200,
            ..FloodFillParams::default()
        };
        assert!(params.validate().is_err());
        assert!(FloodFillParams::default().validate().is_ok());
    }
}

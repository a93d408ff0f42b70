//! The portfolio's artwork list. Static data, read-only.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtworkRecord {
    pub id: u32,
    pub title: &'static str,
    pub year: u16,
    pub medium: &'static str,
    /// Width in centimetres; the diameter for round pieces.
    pub width_cm: u32,
    pub height_cm: u32,
    pub is_circle: bool,
    pub available: bool,
    pub image: Option<&'static str>,
}

impl ArtworkRecord {
    pub fn aspect_ratio(&self) -> f64 {
        self.width_cm as f64 / self.height_cm.max(1) as f64
    }

    pub fn dimensions_label(&self) -> String {
        if self.is_circle {
            format!("{}cm diameter", self.width_cm)
        } else {
            format!("{}cm × {}cm", self.width_cm, self.height_cm)
        }
    }

    pub fn status_label(&self) -> &'static str {
        if self.available {
            "Available"
        } else {
            "Sold"
        }
    }

    /// The configured image, or where one would be expected.
    pub fn image_path(&self) -> String {
        match self.image {
            Some(path) => path.to_string(),
            None => suggest_image_path(self.title),
        }
    }
}

const fn artwork(
    id: u32,
    title: &'static str,
    year: u16,
    size: (u32, u32, bool),
    available: bool,
    image: &'static str,
) -> ArtworkRecord {
    ArtworkRecord {
        id,
        title,
        year,
        medium: "Mixed media",
        width_cm: size.0,
        height_cm: size.1,
        is_circle: size.2,
        available,
        image: Some(image),
    }
}

/// Display order, which is not id order.
pub static ARTWORKS: [ArtworkRecord; 9] = [
    artwork(0, "Singularity Field", 2023, (95, 78, false), true, "images/singularity-field.jpg"),
    artwork(1, "Chromatic Wheel", 2023, (46, 46, true), true, "images/chromatic-wheel.jpg"),
    artwork(2, "Oxide Spirals", 2022, (46, 46, true), true, "images/oxide-spirals.jpg"),
    artwork(3, "Convergence Chamber", 2023, (80, 80, false), true, "images/convergence-chamber.jpg"),
    artwork(5, "Radiant Axis", 2025, (46, 46, true), true, "images/radiant-axis.jpg"),
    artwork(4, "Radiant Dialogue", 2022, (120, 60, false), true, "images/radiant-dialogue.jpg"),
    artwork(
        6,
        "Refraction in Hexadecagon & Derivatives",
        2021,
        (61, 61, true),
        false,
        "images/refraction-hexadecagon.jpg",
    ),
    artwork(7, "Circular Radiants No.2", 2022, (60, 60, false), true, "images/circular-radiants-2.jpg"),
    artwork(8, "Bilateral Radiance", 2025, (61, 61, true), true, "images/bilateral-radiance.jpg"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CatalogFilter {
    #[default]
    All,
    Available,
    Sold,
}

impl CatalogFilter {
    pub fn matches(self, record: &ArtworkRecord) -> bool {
        match self {
            Self::All => true,
            Self::Available => record.available,
            Self::Sold => !record.available,
        }
    }
}

pub fn filter_catalog(filter: CatalogFilter) -> Vec<&'static ArtworkRecord> {
    ARTWORKS.iter().filter(|record| filter.matches(record)).collect()
}

pub fn find(id: u32) -> Option<&'static ArtworkRecord> {
    ARTWORKS.iter().find(|record| record.id == id)
}

/// Next index when stepping through a filtered list, wrapping at both ends.
pub fn step_index(index: usize, step: isize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    (index as isize + step).rem_euclid(len as isize) as usize
}

fn slug_separators() -> Option<&'static Regex> {
    static SEPARATORS: OnceLock<Option<Regex>> = OnceLock::new();
    SEPARATORS
        .get_or_init(|| Regex::new("[^a-z0-9]+").ok())
        .as_ref()
}

/// `images/<slug>.jpg`, where the slug is the lowercased title with every
/// run of other characters collapsed to one `-`.
pub fn suggest_image_path(title: &str) -> String {
    let lower = title.to_lowercase();
    let slug = match slug_separators() {
        Some(separators) => separators.replace_all(&lower, "-").into_owned(),
        None => lower,
    };
    format!("images/{}.jpg", slug.trim_matches('-'))
}

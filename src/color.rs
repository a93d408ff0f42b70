use palette::Srgb;
use serde::{Deserialize, Serialize};

use crate::error::VizError;

/// 8-bit sRGB triple as produced by a colour picker or swatch.
pub type Rgb = Srgb<u8>;

/// Warm white, the wall colour the page opens with.
pub const DEFAULT_WALL_HEX: &str = "#f5f0e8";
/// Warm cream for the lit surface.
pub const DEFAULT_SURFACE_HEX: &str = "#e8d4a8";

/// Parses a `#RRGGBB` string (the leading `#` is optional).
pub fn hex_to_rgb(hex: &str) -> Result<Rgb, VizError> {
    let trimmed = hex.trim();
    let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);
    if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(VizError::InvalidColor(format!(
            "expected #RRGGBB, got {:?}",
            hex
        )));
    }
    digits
        .parse::<Rgb>()
        .map_err(|e| VizError::InvalidColor(format!("{}: {}", hex, e)))
}

pub fn rgb_to_hex(color: Rgb) -> String {
    format!("#{:02x}{:02x}{:02x}", color.red, color.green, color.blue)
}

/// A named quick-pick wall colour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorPreset {
    pub name: String,
    #[serde(with = "hex")]
    pub color: Rgb,
}

impl ColorPreset {
    fn new(name: &str, hex: &str) -> Result<Self, VizError> {
        Ok(Self {
            name: name.to_string(),
            color: hex_to_rgb(hex)?,
        })
    }

    pub fn hex(&self) -> String {
        rgb_to_hex(self.color)
    }
}

pub fn default_presets() -> Vec<ColorPreset> {
    [
        ("Warm White", DEFAULT_WALL_HEX),
        ("Gallery White", "#ffffff"),
        ("Linen", "#ebe3d3"),
        ("Stone", "#c9c5bd"),
        ("Sage", "#b8c4a9"),
        ("Terracotta", "#c9826b"),
        ("Slate Blue", "#7d8fa3"),
        ("Midnight", "#2b3140"),
    ]
    .iter()
    .filter_map(|(name, hex)| ColorPreset::new(name, hex).ok())
    .collect()
}

/// The swatch whose colour matches `color`, if any. Equal RGB values are the
/// same swatch regardless of how the hex string was cased.
pub fn active_preset(presets: &[ColorPreset], color: Rgb) -> Option<&ColorPreset> {
    presets.iter().find(|preset| preset.color == color)
}

pub fn find_preset<'a>(presets: &'a [ColorPreset], name: &str) -> Option<&'a ColorPreset> {
    presets
        .iter()
        .find(|preset| preset.name.eq_ignore_ascii_case(name.trim()))
}

/// Serde adapter storing an [`Rgb`] as a `#rrggbb` string.
pub mod hex {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::Rgb;

    pub fn serialize<S: Serializer>(color: &Rgb, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::rgb_to_hex(*color))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Rgb, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::hex_to_rgb(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_conversion() {
        assert_eq!(hex_to_rgb("#FF0000").unwrap(), Rgb::new(255, 0, 0));
        assert_eq!(hex_to_rgb("#00ff00").unwrap(), Rgb::new(0, 255, 0));
        assert_eq!(hex_to_rgb("0000FF").unwrap(), Rgb::new(0, 0, 255));
        assert_eq!(rgb_to_hex(Rgb::new(245, 240, 232)), "#f5f0e8");
    }

    #[test]
    fn test_rejects_malformed_hex() {
        for bad in ["", "#", "#fff", "#12345", "#1234567", "#gg0000", "red"] {
            assert!(hex_to_rgb(bad).is_err(), "{:?} should be rejected", bad);
        }
    }

    #[test]
    fn test_active_preset_ignores_hex_case() {
        let presets = default_presets();
        let warm = hex_to_rgb("#F5F0E8").unwrap();
        assert_eq!(active_preset(&presets, warm).unwrap().name, "Warm White");
        assert!(active_preset(&presets, Rgb::new(1, 2, 3)).is_none());
    }

    #[test]
    fn test_find_preset_by_name() {
        let presets = default_presets();
        assert_eq!(find_preset(&presets, "sage").unwrap().hex(), "#b8c4a9");
        assert!(find_preset(&presets, "chartreuse").is_none());
    }

    #[test]
    fn test_preset_serde_uses_hex_strings() {
        let preset = ColorPreset::new("Stone", "#C9C5BD").unwrap();
        let json = serde_json::to_string(&preset).unwrap();
        assert_eq!(json, r##"{"name":"Stone","color":"#c9c5bd"}"##);
        let back: ColorPreset = serde_json::from_str(&json).unwrap();
        assert_eq!(back, preset);
    }
}

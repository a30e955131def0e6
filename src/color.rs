//! Color type and the string forms the rendering engine accepts.
//!
//! Colors travel through expressions as CSS strings: opaque colors as
//! `#rrggbb`, anything translucent as `rgba(r, g, b, a)`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};

/// RGBA color with 8-bit components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(C)]
pub struct Rgba {
    /// Red component (0-255).
    pub r: u8,
    /// Green component (0-255).
    pub g: u8,
    /// Blue component (0-255).
    pub b: u8,
    /// Alpha component (0-255, 255 = fully opaque).
    pub a: u8,
}

impl Rgba {
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);
    /// Opaque black.
    pub const BLACK: Self = Self::new(0, 0, 0, 255);
    /// Opaque white.
    pub const WHITE: Self = Self::new(255, 255, 255, 255);
    /// Neutral grey used as the categorical fallback.
    pub const GREY: Self = Self::rgb(128, 128, 128);

    /// Create a new RGBA color.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Create an opaque RGB color (alpha = 255).
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    /// Create a color with modified alpha.
    #[must_use]
    pub const fn with_alpha(self, a: u8) -> Self {
        Self::new(self.r, self.g, self.b, a)
    }

    /// Linear interpolation between two colors.
    #[must_use]
    pub fn lerp(self, other: Self, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        let inv_t = 1.0 - t;

        Self::new(
            (f32::from(self.r) * inv_t + f32::from(other.r) * t).round() as u8,
            (f32::from(self.g) * inv_t + f32::from(other.g) * t).round() as u8,
            (f32::from(self.b) * inv_t + f32::from(other.b) * t).round() as u8,
            (f32::from(self.a) * inv_t + f32::from(other.a) * t).round() as u8,
        )
    }

    /// Parse `#rgb`, `#rrggbb`, `#rrggbbaa` or `transparent`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidColor`] for anything else.
    pub fn from_hex(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("transparent") {
            return Ok(Self::TRANSPARENT);
        }

        let hex = s.strip_prefix('#').unwrap_or(s);
        let invalid = || Error::InvalidColor(s.to_string());
        let byte = |i: usize| {
            let pair = hex.get(i..i + 2).ok_or_else(invalid)?;
            u8::from_str_radix(pair, 16).map_err(|_| invalid())
        };

        match hex.len() {
            3 => {
                let nibble = |i: usize| {
                    let digit = hex.get(i..=i).ok_or_else(invalid)?;
                    u8::from_str_radix(digit, 16)
                        .map(|v| v * 17)
                        .map_err(|_| invalid())
                };
                Ok(Self::rgb(nibble(0)?, nibble(1)?, nibble(2)?))
            }
            6 => Ok(Self::rgb(byte(0)?, byte(2)?, byte(4)?)),
            8 => Ok(Self::new(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
            _ => Err(invalid()),
        }
    }

    /// `#rrggbb` form, ignoring alpha.
    #[must_use]
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// CSS form understood by the rendering engine.
    #[must_use]
    pub fn to_css(self) -> String {
        if self.a == 255 {
            self.to_hex()
        } else {
            let alpha = (f32::from(self.a) / 255.0 * 100.0).round() / 100.0;
            format!("rgba({}, {}, {}, {alpha})", self.r, self.g, self.b)
        }
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_css())
    }
}

impl FromStr for Rgba {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl Serialize for Rgba {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_css())
    }
}

impl<'de> Deserialize<'de> for Rgba {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Parse a packed hex string such as `"deebf79ecae13182bd"` into colors.
///
/// Catalog tables are stored in this compact form.
pub(crate) fn unpack_hex(packed: &str) -> Vec<Rgba> {
    packed
        .as_bytes()
        .chunks(6)
        .filter_map(|chunk| std::str::from_utf8(chunk).ok())
        .filter_map(|hex| Rgba::from_hex(hex).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgba_constants() {
        assert_eq!(Rgba::BLACK, Rgba::rgb(0, 0, 0));
        assert_eq!(Rgba::WHITE, Rgba::rgb(255, 255, 255));
        assert_eq!(Rgba::TRANSPARENT.a, 0);
    }

    #[test]
    fn test_rgba_lerp() {
        let mid = Rgba::BLACK.lerp(Rgba::WHITE, 0.5);
        assert_eq!(mid.r, 128);
        assert_eq!(mid.g, 128);
        assert_eq!(mid.b, 128);
    }

    #[test]
    fn test_lerp_boundaries() {
        assert_eq!(Rgba::BLACK.lerp(Rgba::WHITE, 0.0), Rgba::BLACK);
        assert_eq!(Rgba::BLACK.lerp(Rgba::WHITE, 1.0), Rgba::WHITE);
        assert_eq!(Rgba::BLACK.lerp(Rgba::WHITE, -0.5), Rgba::BLACK);
        assert_eq!(Rgba::BLACK.lerp(Rgba::WHITE, 1.5), Rgba::WHITE);
    }

    #[test]
    fn test_from_hex_forms() {
        assert_eq!(Rgba::from_hex("#08306b").unwrap(), Rgba::rgb(8, 48, 107));
        assert_eq!(Rgba::from_hex("fff").unwrap(), Rgba::WHITE);
        let half_black = Rgba::new(0, 0, 0, 128);
        assert_eq!(Rgba::from_hex("#00000080").unwrap(), half_black);
        assert_eq!(Rgba::from_hex("transparent").unwrap(), Rgba::TRANSPARENT);
    }

    #[test]
    fn test_from_hex_invalid() {
        assert!(Rgba::from_hex("#12345").is_err());
        assert!(Rgba::from_hex("#gggggg").is_err());
        assert!(Rgba::from_hex("").is_err());
    }

    #[test]
    fn test_to_css() {
        assert_eq!(Rgba::rgb(222, 235, 247).to_css(), "#deebf7");
        assert_eq!(Rgba::TRANSPARENT.to_css(), "rgba(0, 0, 0, 0)");
        let half_black = Rgba::BLACK.with_alpha(128);
        assert_eq!(half_black.to_string(), "rgba(0, 0, 0, 0.5)");
    }

    #[test]
    fn test_unpack_hex() {
        let colors = unpack_hex("deebf79ecae13182bd");
        let expected = vec![
            Rgba::rgb(222, 235, 247),
            Rgba::rgb(158, 202, 225),
            Rgba::rgb(49, 130, 189),
        ];
        assert_eq!(colors, expected);
    }

    #[test]
    fn test_serde_string_form() {
        let json = serde_json::to_string(&Rgba::rgb(255, 0, 0)).unwrap();
        assert_eq!(json, "\"#ff0000\"");
        let back: Rgba = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Rgba::rgb(255, 0, 0));
    }
}

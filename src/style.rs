//! Style identifiers: which geometry is drawn and how values are encoded.
//!
//! Callers pass style ids as `"<geometry>-<variant>"` strings; everything
//! inside the crate works with the typed [`StyleKey`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Geometry type of the layer being styled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Geometry {
    /// Filled polygons (rendering layer type `fill`).
    Polygon,
    /// Lines.
    Line,
    /// Circles/points.
    #[serde(alias = "point")]
    Circle,
    /// Icon symbols.
    Symbol,
}

impl Geometry {
    /// All geometries, in table order.
    pub const ALL: [Geometry; 4] = [Self::Polygon, Self::Line, Self::Circle, Self::Symbol];

    /// Rendering-engine layer type for this geometry.
    #[must_use]
    pub const fn layer_type(self) -> &'static str {
        match self {
            Geometry::Polygon => "fill",
            Geometry::Line => "line",
            Geometry::Circle => "circle",
            Geometry::Symbol => "symbol",
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Geometry::Polygon => "polygon",
            Geometry::Line => "line",
            Geometry::Circle => "circle",
            Geometry::Symbol => "symbol",
        }
    }
}

impl FromStr for Geometry {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "polygon" | "fill" => Ok(Geometry::Polygon),
            "line" => Ok(Geometry::Line),
            "circle" | "point" => Ok(Geometry::Circle),
            "symbol" => Ok(Geometry::Symbol),
            other => Err(Error::UnknownGeometryType(other.to_string())),
        }
    }
}

impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How observations are encoded visually.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// Smooth interpolation across the numeric domain.
    Continuous,
    /// Split around a zero midpoint.
    Diverging,
    /// Discrete labels to discrete colors.
    Categorical,
}

impl Variant {
    fn as_str(self) -> &'static str {
        match self {
            Variant::Continuous => "continuous",
            Variant::Diverging => "diverging",
            Variant::Categorical => "categorical",
        }
    }
}

impl FromStr for Variant {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "continuous" => Ok(Variant::Continuous),
            "diverging" => Ok(Variant::Diverging),
            "categorical" => Ok(Variant::Categorical),
            other => Err(Error::InvalidStyleCombination(format!("unknown variant '{other}'"))),
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `(geometry, variant)` pair selecting an expression shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StyleKey {
    /// Geometry type.
    pub geometry: Geometry,
    /// Encoding variant.
    pub variant: Variant,
}

impl StyleKey {
    /// Create a style key.
    #[must_use]
    pub const fn new(geometry: Geometry, variant: Variant) -> Self {
        Self { geometry, variant }
    }

    /// Parse a `"<geometry>-<variant>"` identifier.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidStyleCombination`] for any unrecognised id.
    pub fn parse(id: &str) -> Result<Self> {
        let invalid = || Error::InvalidStyleCombination(id.to_string());
        let (geometry, variant) = id.split_once('-').ok_or_else(invalid)?;
        let geometry = geometry.parse::<Geometry>().map_err(|_| invalid())?;
        let variant = variant.parse::<Variant>().map_err(|_| invalid())?;
        Ok(Self { geometry, variant })
    }

    /// True for line diverging styles, which use a one-sided magnitude scale.
    #[must_use]
    pub fn is_one_sided(self) -> bool {
        self.geometry == Geometry::Line && self.variant == Variant::Diverging
    }
}

impl FromStr for StyleKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for StyleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.geometry, self.variant)
    }
}

impl Serialize for StyleKey {
    fn serialize<S: serde::Serializer>(
        &self,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for StyleKey {
    fn deserialize<D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_style_ids() {
        assert_eq!(
            StyleKey::parse("polygon-continuous").unwrap(),
            StyleKey::new(Geometry::Polygon, Variant::Continuous)
        );
        let point = StyleKey::parse("point-diverging").unwrap();
        assert_eq!(point.geometry, Geometry::Circle);
        let line = StyleKey::parse("line-categorical").unwrap();
        assert_eq!(line.variant, Variant::Categorical);
    }

    #[test]
    fn test_parse_invalid_style_ids() {
        for id in [
            "",
            "polygon",
            "polygon-",
            "hexbin-continuous",
            "line-stepped",
            "line_diverging",
        ] {
            assert!(
                matches!(StyleKey::parse(id), Err(Error::InvalidStyleCombination(_))),
                "{id} should be rejected"
            );
        }
    }

    #[test]
    fn test_display_round_trips() {
        let key = StyleKey::new(Geometry::Circle, Variant::Diverging);
        assert_eq!(key.to_string(), "circle-diverging");
        assert_eq!(key.to_string().parse::<StyleKey>().unwrap(), key);
    }

    #[test]
    fn test_one_sided() {
        let line = StyleKey::new(Geometry::Line, Variant::Diverging);
        assert!(line.is_one_sided());
        let polygon = StyleKey::new(Geometry::Polygon, Variant::Diverging);
        assert!(!polygon.is_one_sided());
    }

    #[test]
    fn test_layer_type() {
        assert_eq!(Geometry::Polygon.layer_type(), "fill");
        assert_eq!("fill".parse::<Geometry>().unwrap(), Geometry::Polygon);
    }
}

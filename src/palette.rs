//! Color scheme catalogs and palette resolution.
//!
//! Discrete palettes exist for 3 to 9 classes. Larger requests are served by
//! interpolating across the scheme's widest palette.
//!
//! # References
//!
//! - Harrower, M., & Brewer, C. A. (2003). "ColorBrewer.org: An Online Tool for
//!   Selecting Colour Schemes for Maps." *The Cartographic Journal*, 40(1), 27-37.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::color::{unpack_hex, Rgba};
use crate::scale::ColorScale;

/// Smallest palette size with a discrete catalog entry.
pub const MIN_DISCRETE_COLORS: usize = 3;

/// Largest palette size with a discrete catalog entry.
pub const MAX_DISCRETE_COLORS: usize = 9;

/// Scheme used when a requested scheme is unknown.
pub const DEFAULT_SCHEME: &str = "Blues";

/// Read-only source of color schemes.
pub trait PaletteSource {
    /// Discrete palette of exactly `size` colors, if catalogued.
    fn discrete(&self, scheme: &str, size: usize) -> Option<&[Rgba]>;

    /// Colors spanning the scheme's full hue range, used for interpolation.
    fn ramp(&self, scheme: &str) -> Option<&[Rgba]>;
}

/// Scheme name → palette size → colors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaletteRegistry {
    schemes: BTreeMap<String, BTreeMap<usize, Vec<Rgba>>>,
}

impl Default for PaletteRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PaletteRegistry {
    /// Registry with no schemes.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            schemes: BTreeMap::new(),
        }
    }

    /// Registry preloaded with the ColorBrewer sequential and diverging schemes.
    #[must_use]
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        for (name, tables) in BREWER {
            for packed in tables {
                registry = registry.with_palette(name, unpack_hex(packed));
            }
        }
        registry
    }

    /// Add or replace one palette; its size is the number of colors.
    #[must_use]
    pub fn with_palette(mut self, scheme: &str, colors: Vec<Rgba>) -> Self {
        if !colors.is_empty() {
            self.schemes
                .entry(scheme.to_string())
                .or_default()
                .insert(colors.len(), colors);
        }
        self
    }

    /// Merge another registry's palettes over this one.
    #[must_use]
    pub fn merged(mut self, other: &PaletteRegistry) -> Self {
        for (scheme, sizes) in &other.schemes {
            let entry = self.schemes.entry(scheme.clone()).or_default();
            for (size, colors) in sizes {
                entry.insert(*size, colors.clone());
            }
        }
        self
    }

    /// Known scheme names.
    pub fn schemes(&self) -> impl Iterator<Item = &str> {
        self.schemes.keys().map(String::as_str)
    }
}

impl PaletteSource for PaletteRegistry {
    fn discrete(&self, scheme: &str, size: usize) -> Option<&[Rgba]> {
        self.schemes.get(scheme)?.get(&size).map(Vec::as_slice)
    }

    fn ramp(&self, scheme: &str) -> Option<&[Rgba]> {
        let sizes = self.schemes.get(scheme)?;
        sizes.values().next_back().map(Vec::as_slice)
    }
}

/// Resolve `bin_count` colors for a scheme.
///
/// Above [`MAX_DISCRETE_COLORS`] exactly `bin_count` colors are interpolated;
/// otherwise the discrete palette for `bin_count` clamped to 3..=9 is used.
/// Unknown schemes fall back to [`DEFAULT_SCHEME`], then to greyscale.
#[must_use]
pub fn resolve_palette(source: &dyn PaletteSource, scheme: &str, bin_count: usize) -> Vec<Rgba> {
    let size = if bin_count > MAX_DISCRETE_COLORS {
        bin_count
    } else {
        bin_count.clamp(MIN_DISCRETE_COLORS, MAX_DISCRETE_COLORS)
    };

    let scheme = if source.ramp(scheme).is_some() {
        scheme
    } else {
        warn!(scheme, fallback = DEFAULT_SCHEME, "unknown color scheme");
        DEFAULT_SCHEME
    };

    if size <= MAX_DISCRETE_COLORS {
        if let Some(colors) = source.discrete(scheme, size) {
            return colors.to_vec();
        }
    }

    interpolate(source.ramp(scheme), size)
}

fn interpolate(ramp: Option<&[Rgba]>, size: usize) -> Vec<Rgba> {
    let unit = (0.0, 1.0);
    let scale = ramp
        .and_then(|colors| ColorScale::new(colors.to_vec(), unit))
        .unwrap_or_else(|| ColorScale::greyscale(unit));
    scale.samples(size)
}

/// ColorBrewer palettes for 3..=9 classes, packed as `rrggbb` runs.
const BREWER: &[(&str, [&str; 7])] = &[
    (
        "Blues",
        [
            "deebf79ecae13182bd",
            "eff3ffbdd7e76baed62171b5",
            "eff3ffbdd7e76baed63182bd08519c",
            "eff3ffc6dbef9ecae16baed63182bd08519c",
            "eff3ffc6dbef9ecae16baed64292c62171b5084594",
            "f7fbffdeebf7c6dbef9ecae16baed64292c62171b5084594",
            "f7fbffdeebf7c6dbef9ecae16baed64292c62171b508519c08306b",
        ],
    ),
    (
        "Greens",
        [
            "e5f5e0a1d99b31a354",
            "edf8e9bae4b374c476238b45",
            "edf8e9bae4b374c47631a354006d2c",
            "edf8e9c7e9c0a1d99b74c47631a354006d2c",
            "edf8e9c7e9c0a1d99b74c47641ab5d238b45005a32",
            "f7fcf5e5f5e0c7e9c0a1d99b74c47641ab5d238b45005a32",
            "f7fcf5e5f5e0c7e9c0a1d99b74c47641ab5d238b45006d2c00441b",
        ],
    ),
    (
        "Oranges",
        [
            "fee6cefdae6be6550d",
            "feeddefdbe85fd8d3cd94701",
            "feeddefdbe85fd8d3ce6550da63603",
            "feeddefdd0a2fdae6bfd8d3ce6550da63603",
            "feeddefdd0a2fdae6bfd8d3cf16913d948018c2d04",
            "fff5ebfee6cefdd0a2fdae6bfd8d3cf16913d948018c2d04",
            "fff5ebfee6cefdd0a2fdae6bfd8d3cf16913d94801a636037f2704",
        ],
    ),
    (
        "Purples",
        [
            "efedf5bcbddc756bb1",
            "f2f0f7cbc9e29e9ac86a51a3",
            "f2f0f7cbc9e29e9ac8756bb154278f",
            "f2f0f7dadaebbcbddc9e9ac8756bb154278f",
            "f2f0f7dadaebbcbddc9e9ac8807dba6a51a34a1486",
            "fcfbfdefedf5dadaebbcbddc9e9ac8807dba6a51a34a1486",
            "fcfbfdefedf5dadaebbcbddc9e9ac8807dba6a51a354278f3f007d",
        ],
    ),
    (
        "Reds",
        [
            "fee0d2fc9272de2d26",
            "fee5d9fcae91fb6a4acb181d",
            "fee5d9fcae91fb6a4ade2d26a50f15",
            "fee5d9fcbba1fc9272fb6a4ade2d26a50f15",
            "fee5d9fcbba1fc9272fb6a4aef3b2ccb181d99000d",
            "fff5f0fee0d2fcbba1fc9272fb6a4aef3b2ccb181d99000d",
            "fff5f0fee0d2fcbba1fc9272fb6a4aef3b2ccb181da50f1567000d",
        ],
    ),
    (
        "YlOrRd",
        [
            "ffeda0feb24cf03b20",
            "ffffb2fecc5cfd8d3ce31a1c",
            "ffffb2fecc5cfd8d3cf03b20bd0026",
            "ffffb2fed976feb24cfd8d3cf03b20bd0026",
            "ffffb2fed976feb24cfd8d3cfc4e2ae31a1cb10026",
            "ffffccffeda0fed976feb24cfd8d3cfc4e2ae31a1cb10026",
            "ffffccffeda0fed976feb24cfd8d3cfc4e2ae31a1cbd0026800026",
        ],
    ),
    (
        "RdBu",
        [
            "ef8a62f7f7f767a9cf",
            "ca0020f4a58292c5de0571b0",
            "ca0020f4a582f7f7f792c5de0571b0",
            "b2182bef8a62fddbc7d1e5f067a9cf2166ac",
            "b2182bef8a62fddbc7f7f7f7d1e5f067a9cf2166ac",
            "b2182bd6604df4a582fddbc7d1e5f092c5de4393c32166ac",
            "b2182bd6604df4a582fddbc7f7f7f7d1e5f092c5de4393c32166ac",
        ],
    ),
];


// ============================================================================
// Property-based tests with proptest
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Palette length equals the bin count for any count of 3 or more.
        #[test]
        fn prop_palette_length_matches_bins(count in 3usize..64) {
            let registry = PaletteRegistry::builtin();
            prop_assert_eq!(resolve_palette(&registry, "YlOrRd", count).len(), count);
        }
    }
}

//! YAML configuration for thematic layers.
//!
//! ```yaml
//! defaults:
//!   opacity: 0.8
//!   scheme: YlOrRd
//! bands:
//!   transport:
//!     flow_change: [-500, -100, 0, 100, 500]
//! palettes:
//!   Brand:
//!     3: ["#fee8c8", "#fdbb84", "#e34a33"]
//! layers:
//!   links:
//!     source_layer: road_links
//!     style: line-diverging
//!     scaling: root
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::classify::{BandCatalog, ClassificationMethod};
use crate::error::{Error, Result};
use crate::palette::{PaletteRegistry, DEFAULT_SCHEME};
use crate::style::StyleKey;
use crate::width::ScalingMode;

/// Defaults applied when a styling call does not override them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleDefaults {
    /// Layer opacity.
    #[serde(default = "default_opacity")]
    pub opacity: f64,

    /// Width multiplier for line widths and circle radii.
    #[serde(default = "default_width_factor")]
    pub width_factor: f64,

    /// Color scheme name.
    #[serde(default = "default_scheme")]
    pub scheme: String,

    /// Classification method.
    #[serde(default)]
    pub method: ClassificationMethod,
}

fn default_opacity() -> f64 {
    1.0
}
fn default_width_factor() -> f64 {
    1.0
}
fn default_scheme() -> String {
    DEFAULT_SCHEME.to_string()
}

impl Default for StyleDefaults {
    fn default() -> Self {
        Self {
            opacity: default_opacity(),
            width_factor: default_width_factor(),
            scheme: default_scheme(),
            method: ClassificationMethod::default(),
        }
    }
}

/// One styled layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerConfig {
    /// Source layer holding the geometries.
    pub source_layer: String,

    /// Style id, e.g. `line-diverging`.
    pub style: StyleKey,

    /// Width scaling; inferred from bin spacing when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scaling: Option<ScalingMode>,

    /// Color scheme overriding [`StyleDefaults::scheme`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,
}

/// Main configuration structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThematicConfig {
    /// Styling defaults.
    #[serde(default)]
    pub defaults: StyleDefaults,

    /// Precomputed breakpoints per page and metric.
    #[serde(default)]
    pub bands: BandCatalog,

    /// Extra palettes, merged over the built-in schemes.
    #[serde(default = "PaletteRegistry::empty")]
    pub palettes: PaletteRegistry,

    /// Layer id → layer configuration.
    #[serde(default)]
    pub layers: BTreeMap<String, LayerConfig>,
}

impl Default for ThematicConfig {
    fn default() -> Self {
        Self {
            defaults: StyleDefaults::default(),
            bands: BandCatalog::default(),
            palettes: PaletteRegistry::empty(),
            layers: BTreeMap::new(),
        }
    }
}

impl ThematicConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .map_err(|_| Error::ConfigNotFound(path.display().to_string()))?;

        Self::parse(&content)
    }

    /// Parses configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid.
    pub fn parse(yaml: &str) -> Result<Self> {
        serde_yaml_ng::from_str(yaml).map_err(|e| {
            let line = e.location().map(|l| l.line()).unwrap_or(0);
            Error::ConfigParse {
                line,
                message: e.to_string(),
            }
        })
    }

    /// Loads configuration from a file, falling back to defaults on error.
    #[must_use]
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Built-in palettes with the configured ones merged over them.
    #[must_use]
    pub fn palette_registry(&self) -> PaletteRegistry {
        PaletteRegistry::builtin().merged(&self.palettes)
    }

    /// Configuration of a layer.
    #[must_use]
    pub fn layer(&self, layer_id: &str) -> Option<&LayerConfig> {
        self.layers.get(layer_id)
    }
}

//! Lookup tables from layer type to paint-property names.
//!
//! Layer types are the rendering engine's (`fill`, `line`, `circle`,
//! `symbol`); geometry names (`polygon`, `point`) are accepted as aliases.

use tracing::warn;

use crate::config::ThematicConfig;
use crate::error::{Error, Result};

/// Paint-property names emitted by the builder.
pub mod paint {
    /// Polygon fill color.
    pub const FILL_COLOR: &str = "fill-color";
    /// Polygon fill opacity.
    pub const FILL_OPACITY: &str = "fill-opacity";
    /// Line color.
    pub const LINE_COLOR: &str = "line-color";
    /// Line width.
    pub const LINE_WIDTH: &str = "line-width";
    /// Line offset.
    pub const LINE_OFFSET: &str = "line-offset";
    /// Line opacity.
    pub const LINE_OPACITY: &str = "line-opacity";
    /// Circle fill color.
    pub const CIRCLE_COLOR: &str = "circle-color";
    /// Circle radius.
    pub const CIRCLE_RADIUS: &str = "circle-radius";
    /// Circle fill opacity.
    pub const CIRCLE_OPACITY: &str = "circle-opacity";
    /// Circle stroke color.
    pub const CIRCLE_STROKE_COLOR: &str = "circle-stroke-color";
    /// Circle stroke opacity.
    pub const CIRCLE_STROKE_OPACITY: &str = "circle-stroke-opacity";
    /// Circle stroke width.
    pub const CIRCLE_STROKE_WIDTH: &str = "circle-stroke-width";
    /// Symbol icon opacity.
    pub const ICON_OPACITY: &str = "icon-opacity";
}

/// Opacity property for a layer type.
///
/// # Errors
///
/// Returns [`Error::UnknownGeometryType`] for unsupported layer types; every
/// styled layer needs an opacity property to render correctly.
pub fn opacity_property_for(layer_type: &str) -> Result<&'static str> {
    match layer_type {
        "fill" | "polygon" => Ok(paint::FILL_OPACITY),
        "line" => Ok(paint::LINE_OPACITY),
        "circle" | "point" => Ok(paint::CIRCLE_OPACITY),
        "symbol" => Ok(paint::ICON_OPACITY),
        other => Err(Error::UnknownGeometryType(other.to_string())),
    }
}

/// Width property for a layer type, or `None` (with a warning) if the layer
/// type has no width concept.
#[must_use]
pub fn width_property_for(layer_type: &str) -> Option<&'static str> {
    match layer_type {
        "line" => Some(paint::LINE_WIDTH),
        "circle" | "point" => Some(paint::CIRCLE_RADIUS),
        other => {
            warn!(layer_type = other, "layer type has no width property");
            None
        }
    }
}

/// Source-layer name backing a configured layer id.
#[must_use]
pub fn source_layer_for<'a>(config: &'a ThematicConfig, layer_id: &str) -> Option<&'a str> {
    let layer = config.layers.get(layer_id);
    if layer.is_none() {
        warn!(layer_id, "no source layer configured");
    }
    layer.map(|l| l.source_layer.as_str())
}

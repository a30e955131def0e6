//! # Thematic-Viz
//!
//! Styling engine for thematic (choropleth, graduated-line, proportional-symbol)
//! map layers.
//!
//! Given one numeric or categorical observation per feature, thematic-viz
//! classifies the values into bins, resolves a color palette, scales line
//! widths and circle radii, and emits data-driven paint expressions in the
//! rendering engine's JSON vocabulary. Expressions read per-feature runtime
//! state (`value`, `valueAbs`), so re-styling never touches geometry.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use thematic_viz::prelude::*;
//!
//! let values = vec![FeatureValue::new(1u64, 0.0), FeatureValue::new(2u64, 100.0)];
//! let styler = ThematicStyler::new(ThematicConfig::load_or_default("thematic.yaml"));
//!
//! let key = StyleKey::parse("circle-continuous")?;
//! let styled = styler.style(key, &StyleRequest::new(&values, "transport", "flow"));
//! println!("{}", styled.paint.to_json());
//! ```
//!
//! ## Styles
//!
//! | Geometry | continuous | diverging | categorical |
//! |---|---|---|---|
//! | polygon | color ramp | symmetric color ramp | category match |
//! | line | color + width | sign color + width + offset | category match |
//! | circle | color + radius | color + radius | category match + zoom radius |
//! | symbol | hover/select only | hover/select only | hover/select only |
//!
//! ## References
//!
//! - Brewer, C. A. (2003). ColorBrewer color schemes.
//! - Jenks, G. F. (1967). "The Data Model Concept in Statistical Mapping."

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
// Allow unwrap() in tests only - banned in production code
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Core Modules
// ============================================================================

/// Color value type and hex/CSS conversions.
pub mod color;

/// Feature observations and runtime state.
pub mod data;

/// Geometry, variant and style-id parsing.
pub mod style;

/// Scale functions for data-to-visual mappings.
pub mod scale;

// ============================================================================
// Styling Modules
// ============================================================================

/// Breakpoint and category classification.
pub mod classify;

/// Color scheme catalogs and palette resolution.
pub mod palette;

/// Width, radius and offset ramps.
pub mod width;

/// Data-driven expression tree.
pub mod expression;

/// Paint property assembly per geometry and variant.
pub mod builder;

/// Layer type to paint-property lookups.
pub mod accessors;

// ============================================================================
// Integration Modules
// ============================================================================

/// YAML configuration.
pub mod config;

/// Classification-to-paint pipeline for one layer.
pub mod pipeline;

// ============================================================================
// Error Types
// ============================================================================

/// Error types for thematic-viz operations.
pub mod error;

pub use error::{Error, Result};

// ============================================================================
// Prelude
// ============================================================================

/// Commonly used types and traits for convenient imports.
///
/// ```rust,ignore
/// use thematic_viz::prelude::*;
/// ```
pub mod prelude {
    pub use crate::builder::{build_expression, reset_paint_property, PaintProperties, StyleInputs};
    pub use crate::classify::{classify, BandCatalog, BandLookup, BandSource, ClassificationMethod};
    pub use crate::color::Rgba;
    pub use crate::config::ThematicConfig;
    pub use crate::data::{Bins, Category, Datum, FeatureId, FeatureValue};
    pub use crate::error::{Error, Result};
    pub use crate::expression::{EvalContext, Expression};
    pub use crate::palette::{resolve_palette, PaletteRegistry, PaletteSource};
    pub use crate::pipeline::{StyleRequest, StyledLayer, ThematicStyler};
    pub use crate::style::{Geometry, StyleKey, Variant};
    pub use crate::width::{apply_width_factor, ScalingMode, WidthProperty, WidthScale};
}

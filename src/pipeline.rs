//! End-to-end styling of one layer.
//!
//! [`ThematicStyler`] runs classification, palette resolution, width scaling
//! and expression building in order, using a [`ThematicConfig`] for bands,
//! palettes, layer definitions and defaults.

use tracing::{debug, warn};

use crate::builder::{build_expression, legend_entries, LegendEntry, PaintProperties, StyleInputs};
use crate::classify::{classify, BandLookup, ClassificationMethod};
use crate::color::Rgba;
use crate::config::ThematicConfig;
use crate::data::{Bins, FeatureValue};
use crate::palette::{resolve_palette, PaletteRegistry};
use crate::style::{StyleKey, Variant};
use crate::width::{magnitude_stops, ScalingMode, WidthProperty};

/// Inputs of one styling call. Unset options fall back to configuration.
#[derive(Debug, Clone, Copy)]
pub struct StyleRequest<'a> {
    /// Observations, one per feature.
    pub values: &'a [FeatureValue],
    /// Active page, used to look up precomputed bands.
    pub page: &'a str,
    /// Active metric, used to look up precomputed bands.
    pub metric: &'a str,
    /// Classification method override.
    pub method: Option<ClassificationMethod>,
    /// Color scheme override.
    pub scheme: Option<&'a str>,
    /// Opacity override.
    pub opacity: Option<f64>,
    /// Width factor override.
    pub width_factor: Option<f64>,
}

impl<'a> StyleRequest<'a> {
    /// Request with every option taken from configuration.
    #[must_use]
    pub fn new(values: &'a [FeatureValue], page: &'a str, metric: &'a str) -> Self {
        Self {
            values,
            page,
            metric,
            method: None,
            scheme: None,
            opacity: None,
            width_factor: None,
        }
    }

    /// Override the classification method.
    #[must_use]
    pub fn method(mut self, method: ClassificationMethod) -> Self {
        self.method = Some(method);
        self
    }

    /// Override the color scheme.
    #[must_use]
    pub fn scheme(mut self, scheme: &'a str) -> Self {
        self.scheme = Some(scheme);
        self
    }

    /// Override the opacity.
    #[must_use]
    pub fn opacity(mut self, opacity: f64) -> Self {
        self.opacity = Some(opacity);
        self
    }

    /// Override the width factor.
    #[must_use]
    pub fn width_factor(mut self, factor: f64) -> Self {
        self.width_factor = Some(factor);
        self
    }
}

/// Result of styling a layer.
#[derive(Debug, Clone, PartialEq)]
pub struct StyledLayer {
    /// Style that was applied.
    pub key: StyleKey,
    /// Classification output.
    pub bins: Bins,
    /// Resolved palette.
    pub colors: Vec<Rgba>,
    /// Width scaling in effect, for geometries with a width property.
    pub scaling: Option<ScalingMode>,
    /// Paint properties to apply.
    pub paint: PaintProperties,
}

impl StyledLayer {
    /// Legend rows for this layer.
    #[must_use]
    pub fn legend(&self) -> Vec<LegendEntry> {
        legend_entries(self.key, &self.bins, &self.colors)
    }

    /// True when the layer was reset for lack of data.
    #[must_use]
    pub fn is_reset(&self) -> bool {
        self.bins.is_empty()
    }
}

/// Styles layers from a configuration.
#[derive(Debug, Clone)]
pub struct ThematicStyler {
    config: ThematicConfig,
    palettes: PaletteRegistry,
}

impl Default for ThematicStyler {
    fn default() -> Self {
        Self::new(ThematicConfig::default())
    }
}

impl ThematicStyler {
    /// Create a styler; configured palettes are merged over the built-in ones.
    #[must_use]
    pub fn new(config: ThematicConfig) -> Self {
        let palettes = config.palette_registry();
        Self { config, palettes }
    }

    /// The configuration in use.
    #[must_use]
    pub fn config(&self) -> &ThematicConfig {
        &self.config
    }

    /// Style a configured layer.
    ///
    /// Returns `None` (with a warning) for layer ids missing from the
    /// configuration. The layer's scheme and scaling apply unless the request
    /// overrides the scheme.
    #[must_use]
    pub fn style_layer(&self, layer_id: &str, request: &StyleRequest<'_>) -> Option<StyledLayer> {
        let Some(layer) = self.config.layer(layer_id) else {
            warn!(layer_id, "layer not configured");
            return None;
        };
        let request = StyleRequest {
            scheme: request.scheme.or(layer.scheme.as_deref()),
            ..*request
        };
        debug!(
            layer_id,
            source_layer = %layer.source_layer,
            style = %layer.style,
            "styling layer"
        );
        Some(self.style_with(layer.style, &request, layer.scaling))
    }

    /// Style data for an explicit style key, inferring the scaling mode.
    #[must_use]
    pub fn style(&self, key: StyleKey, request: &StyleRequest<'_>) -> StyledLayer {
        self.style_with(key, request, None)
    }

    fn style_with(
        &self,
        key: StyleKey,
        request: &StyleRequest<'_>,
        scaling: Option<ScalingMode>,
    ) -> StyledLayer {
        let defaults = &self.config.defaults;
        let method = request.method.unwrap_or(defaults.method);
        let bands = BandLookup::new(&self.config.bands, request.page, request.metric);

        let bins = classify(request.values, key, method, Some(bands));

        let colors = if bins.is_empty() {
            Vec::new()
        } else {
            // Categorical palettes carry one extra color for the fallback.
            let count = match key.variant {
                Variant::Categorical => bins.len() + 1,
                Variant::Continuous | Variant::Diverging => bins.len(),
            };
            let scheme = request.scheme.unwrap_or(&defaults.scheme);
            resolve_palette(&self.palettes, scheme, count)
        };

        let scaling = WidthProperty::for_geometry(key.geometry).map(|_| {
            scaling.unwrap_or_else(|| match bins.breaks() {
                Some(breaks) => ScalingMode::infer(&magnitude_stops(breaks)),
                None => ScalingMode::Linear,
            })
        });

        let inputs = StyleInputs::new(&bins, &colors)
            .opacity(request.opacity.unwrap_or(defaults.opacity))
            .width_factor(request.width_factor.unwrap_or(defaults.width_factor))
            .scaling(scaling.unwrap_or_default());
        let paint = build_expression(key, &inputs);

        debug!(
            style = %key,
            %method,
            bins = bins.len(),
            colors = colors.len(),
            "styled"
        );
        StyledLayer {
            key,
            bins,
            colors,
            scaling,
            paint,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accessors::paint;
    use crate::builder::reset_paint_property;
    use crate::data::Category;
    use crate::expression::Expression;

    fn numbers(values: &[f64]) -> Vec<FeatureValue> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| FeatureValue::new(i as u64, *v))
            .collect()
    }

    fn key(id: &str) -> StyleKey {
        StyleKey::parse(id).unwrap()
    }

    fn styler_from(yaml: &str) -> ThematicStyler {
        ThematicStyler::new(ThematicConfig::parse(yaml).unwrap())
    }

    #[test]
    fn test_empty_data_resets() {
        let styler = ThematicStyler::default();
        let values = vec![FeatureValue::missing(1u64), FeatureValue::missing(2u64)];
        let polygon = key("polygon-continuous");
        let styled = styler.style(polygon, &StyleRequest::new(&values, "p", "m"));
        assert!(styled.is_reset());
        assert!(styled.colors.is_empty());
        assert_eq!(styled.paint, reset_paint_property(polygon));
    }

    #[test]
    fn test_continuous_palette_matches_bins() {
        let styler = ThematicStyler::default();
        let values = numbers(&(1..=40).map(f64::from).collect::<Vec<_>>());
        let request = StyleRequest::new(&values, "p", "m");
        let styled = styler.style(key("polygon-continuous"), &request);
        assert_eq!(styled.colors.len(), styled.bins.len());
        assert!(styled.paint.get(paint::FILL_COLOR).is_some());
        assert_eq!(styled.scaling, None);
    }

    #[test]
    fn test_categorical_palette_has_fallback_color() {
        let styler = ThematicStyler::default();
        let values = vec![
            FeatureValue::new(1u64, "rail"),
            FeatureValue::new(2u64, "road"),
            FeatureValue::new(3u64, "rail"),
            FeatureValue::new(4u64, "bus"),
        ];
        let request = StyleRequest::new(&values, "p", "m");
        let styled = styler.style(key("polygon-categorical"), &request);
        assert_eq!(styled.bins.categories().unwrap().len(), 3);
        assert_eq!(styled.colors.len(), 4);
        assert_eq!(styled.legend()[0].label, Category::from("bus").to_string());
    }

    #[test]
    fn test_configured_bands_are_used() {
        let styler = styler_from("bands:\n  transport:\n    flow: [0, 10, 100]\n");
        let values = numbers(&[3.0, 50.0, 70.0]);
        let polygon = key("polygon-continuous");
        let request = StyleRequest::new(&values, "transport", "flow");
        let styled = styler.style(polygon, &request);
        assert_eq!(styled.bins, Bins::Breaks(vec![0.0, 10.0, 100.0]));

        let equal_interval = request.method(ClassificationMethod::EqualInterval);
        let fallback = styler.style(polygon, &equal_interval);
        assert_ne!(fallback.bins, styled.bins);
    }

    #[test]
    fn test_style_layer_uses_layer_settings() {
        let yaml = r"
layers:
  links:
    source_layer: road_links
    style: line-diverging
    scaling: root
    scheme: RdBu
";
        let styler = styler_from(yaml);
        let values = numbers(&[-30.0, -5.0, 0.0, 12.0, 40.0]);
        let request = StyleRequest::new(&values, "p", "m");
        let styled = styler.style_layer("links", &request).unwrap();
        assert_eq!(styled.key, key("line-diverging"));
        assert_eq!(styled.scaling, Some(ScalingMode::Root));
        assert!(styled.paint.get(paint::LINE_OFFSET).is_some());
        assert_eq!(styled.bins.breaks().unwrap()[0], 0.0);

        assert!(styler.style_layer("missing", &request).is_none());
    }

    #[test]
    fn test_request_overrides_defaults() {
        let styler = styler_from("defaults:\n  opacity: 0.3\n");
        let values = numbers(&[1.0, 2.0, 3.0]);
        let circle = key("circle-categorical");
        let opacity = |styled: &StyledLayer| {
            let expr = styled.paint.get(paint::CIRCLE_OPACITY);
            expr.and_then(Expression::as_number)
        };

        let request = StyleRequest::new(&values, "p", "m");
        assert_eq!(opacity(&styler.style(circle, &request)), Some(0.3));
        let overridden = request.opacity(0.9);
        assert_eq!(opacity(&styler.style(circle, &overridden)), Some(0.9));
    }
}

//! Paint expression assembly.
//!
//! Combines bins, colors and widths into the paint properties for one
//! `(geometry, variant)` pair:
//!
//! - polygon continuous/diverging: fill interpolated over `value`, hidden when
//!   `value` is null.
//! - polygon categorical: fill matched on `category`.
//! - line continuous: color and width interpolated over `value`.
//! - line diverging: color by sign of `value`, width and offset over
//!   `valueAbs`.
//! - line categorical: color matched on `value`, fixed width.
//! - circle continuous/diverging: color over `value`, radius over `valueAbs`;
//!   the stroke hides for `value` in `{0, null}`, the fill only for null.
//! - circle categorical: color matched on `value`, radius ramped by zoom.
//! - symbol: nothing; hover and selection are driven externally.
//!
//! Empty bins always produce the reset properties.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::accessors::paint;
use crate::color::Rgba;
use crate::data::{Bins, Category, CATEGORY_FIELD, VALUE_ABS_FIELD, VALUE_FIELD};
use crate::expression::{Comparison, Expression};
use crate::style::{Geometry, StyleKey, Variant};
use crate::width::{magnitude_stops, ScalingMode, WidthProperty, WidthScale};

/// Line width for categorical line styles.
pub const CATEGORICAL_LINE_WIDTH: f64 = 3.0;

/// Zoom → radius stops for categorical circle styles.
pub const CATEGORICAL_RADIUS_BY_ZOOM: [(f64, f64); 3] = [(5.0, 2.0), (10.0, 4.0), (15.0, 8.0)];

/// Line color for an exact-zero diverging value.
pub const DIVERGING_ZERO_COLOR: Rgba = Rgba::BLACK;

/// Feature-state flag set while the pointer is over a feature.
pub const HOVER_FLAG: &str = "hover";

/// Feature-state flag set while a feature is selected.
pub const SELECTED_FLAG: &str = "selected";

const NON_POSITIVE_TOLERANCE: f64 = 1e-9;

/// Paint property name → expression, applied verbatim by the renderer.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PaintProperties(BTreeMap<&'static str, Expression>);

impl PaintProperties {
    /// Empty property set (a no-op when applied).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set one property.
    #[must_use]
    pub fn with(mut self, name: &'static str, expression: impl Into<Expression>) -> Self {
        self.0.insert(name, expression.into());
        self
    }

    /// Expression for a property.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Expression> {
        self.0.get(name)
    }

    /// True when no properties are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of properties.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Properties in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Expression)> {
        self.0.iter().map(|(name, expr)| (*name, expr))
    }

    /// JSON object form.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut object = Map::new();
        for (name, expr) in &self.0 {
            object.insert((*name).to_string(), expr.to_json());
        }
        Value::Object(object)
    }
}

/// Everything the builder combines.
#[derive(Debug, Clone, Copy)]
pub struct StyleInputs<'a> {
    /// Classification output.
    pub bins: &'a Bins,
    /// Resolved palette.
    pub colors: &'a [Rgba],
    /// Configured layer opacity.
    pub opacity: f64,
    /// User-facing width multiplier.
    pub width_factor: f64,
    /// Width ramp mode.
    pub scaling: ScalingMode,
}

impl<'a> StyleInputs<'a> {
    /// Inputs with opacity 1, width factor 1 and linear scaling.
    #[must_use]
    pub fn new(bins: &'a Bins, colors: &'a [Rgba]) -> Self {
        Self {
            bins,
            colors,
            opacity: 1.0,
            width_factor: 1.0,
            scaling: ScalingMode::Linear,
        }
    }

    /// Set the opacity.
    #[must_use]
    pub fn opacity(mut self, opacity: f64) -> Self {
        self.opacity = opacity;
        self
    }

    /// Set the width factor.
    #[must_use]
    pub fn width_factor(mut self, factor: f64) -> Self {
        self.width_factor = factor;
        self
    }

    /// Set the scaling mode.
    #[must_use]
    pub fn scaling(mut self, mode: ScalingMode) -> Self {
        self.scaling = mode;
        self
    }
}

type Handler = fn(&StyleInputs<'_>, Variant) -> Option<PaintProperties>;

static HANDLERS: [(Geometry, Variant, Handler); 12] = [
    (Geometry::Polygon, Variant::Continuous, polygon_numeric),
    (Geometry::Polygon, Variant::Diverging, polygon_numeric),
    (Geometry::Polygon, Variant::Categorical, polygon_categorical),
    (Geometry::Line, Variant::Continuous, line_continuous),
    (Geometry::Line, Variant::Diverging, line_diverging),
    (Geometry::Line, Variant::Categorical, line_categorical),
    (Geometry::Circle, Variant::Continuous, circle_numeric),
    (Geometry::Circle, Variant::Diverging, circle_numeric),
    (Geometry::Circle, Variant::Categorical, circle_categorical),
    (Geometry::Symbol, Variant::Continuous, symbol),
    (Geometry::Symbol, Variant::Diverging, symbol),
    (Geometry::Symbol, Variant::Categorical, symbol),
];

/// Build the paint properties for a style.
///
/// Empty bins, or bins of the wrong kind for the variant, yield
/// [`reset_paint_property`].
#[must_use]
pub fn build_expression(key: StyleKey, inputs: &StyleInputs<'_>) -> PaintProperties {
    if inputs.bins.is_empty() {
        debug!(style = %key, "no bins, resetting paint properties");
        return reset_paint_property(key);
    }

    let handler = HANDLERS
        .iter()
        .find(|(g, v, _)| *g == key.geometry && *v == key.variant);
    let Some((_, _, handler)) = handler else {
        warn!(style = %key, "no expression handler");
        return PaintProperties::new();
    };

    handler(inputs, key.variant).unwrap_or_else(|| {
        warn!(style = %key, "bins do not match style variant, resetting paint properties");
        reset_paint_property(key)
    })
}

/// Build from a `"<geometry>-<variant>"` id.
///
/// Unrecognised ids yield empty properties and a warning; this sits on the
/// render path and never fails.
#[must_use]
pub fn build_expression_for(style_id: &str, inputs: &StyleInputs<'_>) -> PaintProperties {
    match StyleKey::parse(style_id) {
        Ok(key) => build_expression(key, inputs),
        Err(err) => {
            warn!(style_id, %err, "skipping styling");
            PaintProperties::new()
        }
    }
}

/// Fully transparent, zero-width properties for a style.
///
/// Every property the builder can emit for the geometry is set, so applying
/// the reset replaces rather than merges with the previous style.
#[must_use]
pub fn reset_paint_property(key: StyleKey) -> PaintProperties {
    let transparent = Expression::Color(Rgba::TRANSPARENT);
    match key.geometry {
        Geometry::Polygon => PaintProperties::new()
            .with(paint::FILL_COLOR, transparent)
            .with(paint::FILL_OPACITY, 0.0),
        Geometry::Line => PaintProperties::new()
            .with(paint::LINE_COLOR, transparent)
            .with(paint::LINE_OPACITY, 0.0)
            .with(paint::LINE_WIDTH, 0.0)
            .with(paint::LINE_OFFSET, 0.0),
        Geometry::Circle => PaintProperties::new()
            .with(paint::CIRCLE_COLOR, transparent)
            .with(paint::CIRCLE_OPACITY, 0.0)
            .with(paint::CIRCLE_STROKE_OPACITY, 0.0)
            .with(paint::CIRCLE_RADIUS, 0.0),
        Geometry::Symbol => PaintProperties::new().with(paint::ICON_OPACITY, 0.0),
    }
}

fn value() -> Expression {
    Expression::feature_state(VALUE_FIELD)
}

fn value_abs() -> Expression {
    Expression::feature_state(VALUE_ABS_FIELD)
}

/// `0` when `value` is one of `suppressed`, otherwise `opacity`.
fn suppress_when(suppressed: Vec<Expression>, opacity: f64) -> Expression {
    let condition = if suppressed.len() == 1 && suppressed[0] == Expression::Null {
        Expression::compare(Comparison::Eq, value(), Expression::Null)
    } else {
        Expression::is_in(value(), suppressed)
    };
    let hidden = vec![(condition, Expression::Number(0.0))];
    Expression::case(hidden, Expression::Number(opacity))
}

fn null_suppressed(opacity: f64) -> Expression {
    suppress_when(vec![Expression::Null], opacity)
}

/// Colors aligned with ascending breaks; reversed when every break is
/// non-positive so the most negative value gets the hot end.
pub(crate) fn ordered_colors(breaks: &[f64], colors: &[Rgba], variant: Variant) -> Vec<Rgba> {
    let mut colors = colors.to_vec();
    let max = breaks.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = breaks.iter().copied().fold(f64::INFINITY, f64::min);
    let non_positive = max <= NON_POSITIVE_TOLERANCE && min < -NON_POSITIVE_TOLERANCE;
    if variant == Variant::Continuous && non_positive {
        colors.reverse();
    }
    colors
}

/// `{0, 1}` orders as `[1, 0]`; otherwise numbers ascend and text sorts
/// lexicographically.
pub(crate) fn ordered_categories(categories: &[Category]) -> Vec<Category> {
    let mut ordered = categories.to_vec();
    ordered.sort();
    if ordered == [Category::Number(0.0), Category::Number(1.0)] {
        ordered.reverse();
    }
    ordered
}

fn color_ramp(breaks: &[f64], colors: &[Rgba], variant: Variant) -> Expression {
    let colors = ordered_colors(breaks, colors, variant);
    let stops = breaks
        .iter()
        .zip(colors)
        .map(|(b, c)| (*b, Expression::Color(c)))
        .collect();
    Expression::interpolate(value(), stops)
}

fn category_match(
    input: Expression,
    categories: &[Category],
    colors: &[Rgba],
    fallback: Rgba,
) -> Expression {
    let swatches = colors.iter().copied().map(Expression::Color);
    let arms = ordered_categories(categories)
        .into_iter()
        .zip(swatches)
        .collect();
    Expression::matching(input, arms, Expression::Color(fallback))
}

fn width_scale(stops: &[f64], property: WidthProperty, inputs: &StyleInputs<'_>) -> WidthScale {
    WidthScale::new(stops, property, inputs.scaling)
        .with_factor(inputs.width_factor)
}

fn polygon_numeric(inputs: &StyleInputs<'_>, variant: Variant) -> Option<PaintProperties> {
    let breaks = inputs.bins.breaks()?;
    let fill = color_ramp(breaks, inputs.colors, variant);
    Some(
        PaintProperties::new()
            .with(paint::FILL_COLOR, fill)
            .with(paint::FILL_OPACITY, null_suppressed(inputs.opacity)),
    )
}

fn polygon_categorical(inputs: &StyleInputs<'_>, _: Variant) -> Option<PaintProperties> {
    let categories = inputs.bins.categories()?;
    let fallback = inputs.colors.last().copied().unwrap_or(Rgba::GREY);
    let input = Expression::feature_state(CATEGORY_FIELD);
    let fill = category_match(input, categories, inputs.colors, fallback);
    Some(
        PaintProperties::new()
            .with(paint::FILL_COLOR, fill)
            .with(paint::FILL_OPACITY, inputs.opacity),
    )
}

fn line_continuous(inputs: &StyleInputs<'_>, variant: Variant) -> Option<PaintProperties> {
    let breaks = inputs.bins.breaks()?;
    let widths = width_scale(breaks, WidthProperty::LineWidth, inputs);
    let color = color_ramp(breaks, inputs.colors, variant);
    Some(
        PaintProperties::new()
            .with(paint::LINE_COLOR, color)
            .with(paint::LINE_WIDTH, widths.width_expression(value(), breaks))
            .with(paint::LINE_OPACITY, null_suppressed(inputs.opacity)),
    )
}

fn line_diverging(inputs: &StyleInputs<'_>, _: Variant) -> Option<PaintProperties> {
    let breaks = inputs.bins.breaks()?;
    let negative = inputs.colors.first().copied().unwrap_or(Rgba::GREY);
    let positive = inputs.colors.last().copied().unwrap_or(Rgba::GREY);
    let below = Expression::compare(Comparison::Lt, value(), Expression::Number(0.0));
    let above = Expression::compare(Comparison::Gt, value(), Expression::Number(0.0));
    let branches = vec![
        (below, Expression::Color(negative)),
        (above, Expression::Color(positive)),
    ];
    let color = Expression::case(branches, Expression::Color(DIVERGING_ZERO_COLOR));

    let stops = magnitude_stops(breaks);
    let widths = width_scale(&stops, WidthProperty::LineWidth, inputs);
    let width = widths.width_expression(value_abs(), &stops);
    let offset = widths.offset_expression(value_abs(), &stops);
    Some(
        PaintProperties::new()
            .with(paint::LINE_COLOR, color)
            .with(paint::LINE_WIDTH, width)
            .with(paint::LINE_OFFSET, offset)
            .with(paint::LINE_OPACITY, null_suppressed(inputs.opacity)),
    )
}

fn line_categorical(inputs: &StyleInputs<'_>, _: Variant) -> Option<PaintProperties> {
    let categories = inputs.bins.categories()?;
    let color = category_match(value(), categories, inputs.colors, Rgba::GREY);
    Some(
        PaintProperties::new()
            .with(paint::LINE_COLOR, color)
            .with(paint::LINE_WIDTH, CATEGORICAL_LINE_WIDTH)
            .with(paint::LINE_OPACITY, null_suppressed(inputs.opacity)),
    )
}

fn circle_numeric(inputs: &StyleInputs<'_>, variant: Variant) -> Option<PaintProperties> {
    let breaks = inputs.bins.breaks()?;
    let stops = magnitude_stops(breaks);
    let radii = width_scale(&stops, WidthProperty::CircleRadius, inputs);
    let color = color_ramp(breaks, inputs.colors, variant);
    let radius = radii.width_expression(value_abs(), &stops);
    let zero_or_null = vec![Expression::Number(0.0), Expression::Null];
    let stroke = suppress_when(zero_or_null, inputs.opacity);
    Some(
        PaintProperties::new()
            .with(paint::CIRCLE_COLOR, color)
            .with(paint::CIRCLE_RADIUS, radius)
            .with(paint::CIRCLE_OPACITY, null_suppressed(inputs.opacity))
            .with(paint::CIRCLE_STROKE_OPACITY, stroke),
    )
}

fn circle_categorical(inputs: &StyleInputs<'_>, _: Variant) -> Option<PaintProperties> {
    let categories = inputs.bins.categories()?;
    let zoom_stops = CATEGORICAL_RADIUS_BY_ZOOM
        .iter()
        .map(|(zoom, r)| (*zoom, Expression::Number(*r)))
        .collect();
    let radius = Expression::interpolate(Expression::Zoom, zoom_stops);
    let color = category_match(value(), categories, inputs.colors, Rgba::GREY);
    Some(
        PaintProperties::new()
            .with(paint::CIRCLE_COLOR, color)
            .with(paint::CIRCLE_RADIUS, radius)
            .with(paint::CIRCLE_OPACITY, inputs.opacity)
            .with(paint::CIRCLE_STROKE_OPACITY, inputs.opacity),
    )
}

fn symbol(_: &StyleInputs<'_>, _: Variant) -> Option<PaintProperties> {
    Some(PaintProperties::new())
}

/// Interaction state a highlight template reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Highlight {
    /// Pointer over the feature.
    Hover,
    /// Feature selected.
    Selected,
}

impl Highlight {
    fn flag(self) -> &'static str {
        match self {
            Highlight::Hover => HOVER_FLAG,
            Highlight::Selected => SELECTED_FLAG,
        }
    }

    fn color(self) -> Rgba {
        match self {
            Highlight::Hover => Rgba::BLACK,
            Highlight::Selected => Rgba::rgb(255, 0, 0),
        }
    }
}

/// Static hover/selection template for the highlight layer of a geometry.
///
/// Independent of data; toggled by the feature-state flag of `highlight`.
#[must_use]
pub fn highlight_style(geometry: Geometry, highlight: Highlight) -> PaintProperties {
    let flag = Expression::feature_state(highlight.flag());
    let toggle = |active: Expression, inactive: Expression| {
        let on = Expression::Boolean(Box::new(flag.clone()), false);
        Expression::case(vec![(on, active)], inactive)
    };
    let color = Expression::Color(highlight.color());
    let clear = Expression::Color(Rgba::TRANSPARENT);
    let white = Expression::Color(Rgba::WHITE);

    match geometry {
        Geometry::Polygon => PaintProperties::new()
            .with(paint::LINE_COLOR, toggle(color, clear))
            .with(paint::LINE_WIDTH, toggle(2.0.into(), 0.0.into())),
        Geometry::Line => PaintProperties::new()
            .with(paint::LINE_COLOR, toggle(color, clear))
            .with(paint::LINE_WIDTH, toggle(10.0.into(), 0.0.into())),
        Geometry::Circle => PaintProperties::new()
            .with(paint::CIRCLE_STROKE_COLOR, toggle(color, white))
            .with(paint::CIRCLE_STROKE_WIDTH, toggle(3.0.into(), 1.0.into())),
        Geometry::Symbol => PaintProperties::new()
            .with(paint::ICON_OPACITY, toggle(1.0.into(), 0.7.into())),
    }
}

/// One legend row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendEntry {
    /// Display label.
    pub label: String,
    /// Swatch color.
    pub color: Rgba,
}

/// Legend rows in display order, using the builder's ordering rules.
#[must_use]
pub fn legend_entries(key: StyleKey, bins: &Bins, colors: &[Rgba]) -> Vec<LegendEntry> {
    let entry = |label: String, color: Rgba| LegendEntry { label, color };
    match bins {
        Bins::Breaks(_) if key.geometry == Geometry::Symbol => Vec::new(),
        Bins::Breaks(breaks) if key.is_one_sided() => {
            if breaks.is_empty() {
                return Vec::new();
            }
            let negative = colors.first().copied().unwrap_or(Rgba::GREY);
            let positive = colors.last().copied().unwrap_or(Rgba::GREY);
            vec![
                entry("< 0".to_string(), negative),
                entry("0".to_string(), DIVERGING_ZERO_COLOR),
                entry("> 0".to_string(), positive),
            ]
        }
        Bins::Breaks(breaks) => breaks
            .iter()
            .zip(ordered_colors(breaks, colors, key.variant))
            .map(|(b, c)| entry(b.to_string(), c))
            .collect(),
        Bins::Categories(categories) => {
            let fallback = if key.geometry == Geometry::Polygon {
                colors.last().copied().unwrap_or(Rgba::GREY)
            } else {
                Rgba::GREY
            };
            ordered_categories(categories)
                .into_iter()
                .zip(colors.iter().copied().chain(std::iter::repeat(fallback)))
                .map(|(c, color)| entry(c.to_string(), color))
                .collect()
        }
    }
}

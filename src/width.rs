//! Width, radius and offset ramps for data-driven line and circle sizes.
//!
//! Two scaling modes are supported:
//!
//! - [`ScalingMode::Linear`]: `min + (max - min) * |v| / max|bin|`
//! - [`ScalingMode::Root`]: the normalised magnitude is raised to `1/3` and
//!   rescaled to `[1, max]`, compressing outliers.
//!
//! Diverging lines also get an offset ramp so positive and negative flows draw
//! as parallel, non-overlapping lines beside the base geometry.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::expression::Expression;
use crate::scale::{LinearScale, Scale};
use crate::style::Geometry;

/// Exponent applied to normalised magnitudes in root mode.
pub const ROOT_EXPONENT: f64 = 1.0 / 3.0;

/// Width at value 0 in root mode, for every property.
pub const ROOT_MIN_WIDTH: f64 = 1.0;

/// Coefficient of variation of bin spacing above which root mode is inferred.
pub const ROOT_MODE_CV_THRESHOLD: f64 = 0.9;

/// Gap between the base geometry and an offset line.
pub const LINE_OFFSET: f64 = 1.0;

/// Root-mode offsets are divided by this to avoid excessive displacement.
pub const ROOT_OFFSET_CORRECTION: f64 = 1.3;

/// Lower and upper bound of a width ramp at factor 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WidthBounds {
    /// Width at value 0.
    pub min: f64,
    /// Width at the largest-magnitude bin.
    pub max: f64,
}

/// Paint property a width ramp drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WidthProperty {
    /// `line-width`, bounded to `[1, 8.5]`.
    LineWidth,
    /// `circle-radius`, bounded to `[2, 25]`.
    CircleRadius,
}

impl WidthProperty {
    /// Bounds at width factor 1 in linear mode.
    #[must_use]
    pub const fn bounds(self) -> WidthBounds {
        match self {
            WidthProperty::LineWidth => WidthBounds { min: 1.0, max: 8.5 },
            WidthProperty::CircleRadius => WidthBounds {
                min: 2.0,
                max: 25.0,
            },
        }
    }

    /// Maximum width at factor 1; factors are measured against this.
    #[must_use]
    pub const fn baseline(self) -> f64 {
        self.bounds().max
    }

    /// Width property of a geometry, if it has one.
    #[must_use]
    pub const fn for_geometry(geometry: Geometry) -> Option<Self> {
        match geometry {
            Geometry::Line => Some(WidthProperty::LineWidth),
            Geometry::Circle => Some(WidthProperty::CircleRadius),
            Geometry::Polygon | Geometry::Symbol => None,
        }
    }
}

/// How magnitudes map to widths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalingMode {
    /// Proportional to magnitude.
    #[default]
    Linear,
    /// Cube root of normalised magnitude.
    Root,
}

impl ScalingMode {
    /// Pick a mode from bin spacing.
    ///
    /// Root mode is chosen when the coefficient of variation (standard
    /// deviation over mean) of consecutive bin differences exceeds
    /// [`ROOT_MODE_CV_THRESHOLD`].
    #[must_use]
    pub fn infer(bins: &[f64]) -> Self {
        let diffs: Vec<f64> = bins.windows(2).map(|w| w[1] - w[0]).collect();
        if diffs.len() < 2 {
            return ScalingMode::Linear;
        }

        let n = diffs.len() as f64;
        let mean = diffs.iter().sum::<f64>() / n;
        if mean.abs() < f64::EPSILON {
            return ScalingMode::Linear;
        }
        let variance = diffs.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / (n - 1.0);
        let cv = variance.sqrt() / mean.abs();

        if cv > ROOT_MODE_CV_THRESHOLD {
            ScalingMode::Root
        } else {
            ScalingMode::Linear
        }
    }
}

/// Width ramp over the magnitudes of a set of bins.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WidthScale {
    mode: ScalingMode,
    property: WidthProperty,
    magnitude: LinearScale,
    factor: f64,
}

impl WidthScale {
    /// Ramp from the lower bound at 0 to `max` at the largest-magnitude bin.
    #[must_use]
    pub fn new(bins: &[f64], property: WidthProperty, mode: ScalingMode) -> Self {
        let max_abs = bins
            .iter()
            .map(|b| b.abs())
            .filter(|b| b.is_finite())
            .fold(0.0, f64::max);
        Self {
            mode,
            property,
            magnitude: LinearScale::new((0.0, max_abs), (0.0, 1.0)),
            factor: 1.0,
        }
    }

    /// Multiply every width by a user-facing factor.
    #[must_use]
    pub fn with_factor(mut self, factor: f64) -> Self {
        self.factor = factor;
        self
    }

    /// Scaling mode in use.
    #[must_use]
    pub fn mode(&self) -> ScalingMode {
        self.mode
    }

    /// Width for value `v`, monotonic in `|v|`.
    ///
    /// Linear mode spans the property's bounds; root mode spans
    /// `[ROOT_MIN_WIDTH, max]`.
    #[must_use]
    pub fn width(&self, v: f64) -> f64 {
        let WidthBounds { min, max } = self.property.bounds();
        let t = self.magnitude.scale(v.abs());
        let width = match self.mode {
            ScalingMode::Linear => min + (max - min) * t,
            ScalingMode::Root => ROOT_MIN_WIDTH + (max - ROOT_MIN_WIDTH) * t.powf(ROOT_EXPONENT),
        };
        width * self.factor
    }

    /// Offset for value `v`.
    #[must_use]
    pub fn offset(&self, v: f64) -> f64 {
        offset_for_width(self.width(v), self.mode)
    }

    /// Width ramp interpolated over `input` at each stop.
    #[must_use]
    pub fn width_expression(&self, input: Expression, stops: &[f64]) -> Expression {
        numeric_ramp(input, stops.iter().map(|s| (*s, self.width(*s))))
    }

    /// Offset ramp interpolated over `input` at each stop.
    #[must_use]
    pub fn offset_expression(&self, input: Expression, stops: &[f64]) -> Expression {
        numeric_ramp(input, stops.iter().map(|s| (*s, self.offset(*s))))
    }
}

/// `-(width / 2 + LINE_OFFSET)`, divided by the root correction in root mode.
#[must_use]
pub fn offset_for_width(width: f64, mode: ScalingMode) -> f64 {
    let offset = -(width / 2.0 + LINE_OFFSET);
    match mode {
        ScalingMode::Linear => offset,
        ScalingMode::Root => offset / ROOT_OFFSET_CORRECTION,
    }
}

/// Ascending distinct magnitudes of `bins`, always starting at 0.
#[must_use]
pub fn magnitude_stops(bins: &[f64]) -> Vec<f64> {
    let mut stops: Vec<f64> = bins
        .iter()
        .map(|b| b.abs())
        .filter(|b| b.is_finite())
        .collect();
    stops.push(0.0);
    stops.sort_by(f64::total_cmp);
    stops.dedup();
    stops
}

/// A rescaled width ramp and, for lines, its regenerated offset ramp.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaledWidths {
    /// Width (or radius) expression.
    pub width: Expression,
    /// Offset expression, present for line widths.
    pub offset: Option<Expression>,
}

/// Rescale an existing width ramp to `new_factor` without recomputing bins.
///
/// The factor the ramp currently represents is its largest width over the
/// property's baseline; every width is multiplied by `new_factor / existing`
/// and offsets are regenerated from the new widths.
///
/// # Errors
///
/// Returns [`Error::MalformedExpression`] if `existing` is not a linear
/// interpolation with numeric outputs and a positive maximum.
pub fn apply_width_factor(
    existing: &Expression,
    new_factor: f64,
    property: WidthProperty,
    mode: ScalingMode,
) -> Result<ScaledWidths> {
    let (input, samples) = width_samples(existing)?;
    let existing_factor = calculate_max_width_factor(max_width(&samples), property);
    if !existing_factor.is_finite() || existing_factor <= 0.0 {
        return Err(Error::MalformedExpression(format!(
            "width ramp has no positive maximum: {}",
            existing.to_json()
        )));
    }

    let corrective = new_factor / existing_factor;
    let scaled: Vec<(f64, f64)> = samples
        .iter()
        .map(|(stop, w)| (*stop, w * corrective))
        .collect();

    let width = numeric_ramp(input.clone(), scaled.iter().copied());
    let offset = (property == WidthProperty::LineWidth).then(|| {
        let offsets = scaled
            .iter()
            .map(|(stop, w)| (*stop, offset_for_width(*w, mode)));
        numeric_ramp(input.clone(), offsets)
    });

    Ok(ScaledWidths { width, offset })
}

/// Scale factor implied by an absolute maximum width.
#[must_use]
pub fn calculate_max_width_factor(width: f64, property: WidthProperty) -> f64 {
    width / property.baseline()
}

/// Scale factor implied by an existing width ramp.
///
/// # Errors
///
/// Returns [`Error::MalformedExpression`] if `existing` is not a linear
/// interpolation with numeric outputs.
pub fn max_width_factor_of(existing: &Expression, property: WidthProperty) -> Result<f64> {
    let (_, samples) = width_samples(existing)?;
    Ok(calculate_max_width_factor(max_width(&samples), property))
}

fn numeric_ramp(input: Expression, samples: impl IntoIterator<Item = (f64, f64)>) -> Expression {
    let stops = samples
        .into_iter()
        .map(|(stop, width)| (stop, Expression::Number(width)))
        .collect();
    Expression::interpolate(input, stops)
}

fn width_samples(expr: &Expression) -> Result<(&Expression, Vec<(f64, f64)>)> {
    let malformed = || Error::MalformedExpression(expr.to_json().to_string());
    let (input, stops) = expr.as_interpolation().ok_or_else(malformed)?;
    if stops.is_empty() {
        return Err(malformed());
    }
    let mut samples = Vec::with_capacity(stops.len());
    for (stop, output) in stops {
        let width = output.as_number().ok_or_else(malformed)?;
        samples.push((*stop, width));
    }
    Ok((input, samples))
}

fn max_width(samples: &[(f64, f64)]) -> f64 {
    samples
        .iter()
        .map(|(_, w)| *w)
        .fold(f64::NEG_INFINITY, f64::max)
}


// ============================================================================
// Property-based tests with proptest
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn mode() -> impl Strategy<Value = ScalingMode> {
        prop_oneof![Just(ScalingMode::Linear), Just(ScalingMode::Root)]
    }

    fn property() -> impl Strategy<Value = WidthProperty> {
        prop_oneof![
            Just(WidthProperty::LineWidth),
            Just(WidthProperty::CircleRadius)
        ]
    }

    proptest! {
        /// Widths are monotonic in |v| and stay within the bounds.
        #[test]
        fn prop_width_monotonic_and_bounded(
            bins in prop::collection::vec(-1.0e4f64..1.0e4, 1..10),
            a in -2.0e4f64..2.0e4,
            b in -2.0e4f64..2.0e4,
            mode in mode(),
            property in property(),
        ) {
            let scale = WidthScale::new(&bins, property, mode);
            let (small, large) = if a.abs() <= b.abs() { (a, b) } else { (b, a) };
            prop_assert!(scale.width(small) <= scale.width(large) + 1e-12);
            let max = property.baseline();
            for v in [a, b] {
                let w = scale.width(v);
                prop_assert!((1.0..=max + 1e-12).contains(&w), "width {} out of bounds", w);
            }
        }
    }
}

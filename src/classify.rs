//! Class breakpoint computation.
//!
//! Supports quantile, equal-interval, logarithmic and k-means classification
//! plus externally supplied per-metric breakpoints.
//!
//! Breakpoints are rounded to two significant figures; when rounding makes
//! adjacent breakpoints collide the whole set is re-rounded with one more
//! figure, up to [`MAX_SIGNIFICANT_FIGURES`].
//!
//! # References
//!
//! - Jenks, G. F., & Caspall, F. C. (1971). "Error on Choroplethic Maps."
//!   *Annals of the Association of American Geographers*, 61(2), 217-244.
//! - Lloyd, S. (1982). "Least squares quantization in PCM."
//!   *IEEE Transactions on Information Theory*, 28(2), 129-137.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::data::{numeric_values, Bins, Category, FeatureValue};
use crate::error::{Error, Result};
use crate::style::{StyleKey, Variant};

/// Classes computed for continuous styles (yielding at most 8 breakpoints).
pub const CONTINUOUS_CLASSES: usize = 7;

/// Classes computed on absolute values for diverging styles (at most 3 breakpoints).
pub const DIVERGING_CLASSES: usize = 2;

/// Stand-in for zero so logarithmic breaks stay defined.
pub const LOG_ZERO_SUBSTITUTE: f64 = 0.01;

/// Significant figures used for the first rounding pass.
pub const MIN_SIGNIFICANT_FIGURES: u32 = 2;

/// Precision escalation stops here.
pub const MAX_SIGNIFICANT_FIGURES: u32 = 10;

const KMEANS_MAX_ITERATIONS: usize = 200;

/// Algorithm producing breakpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClassificationMethod {
    /// Precomputed per-metric breakpoints, falling back to quantile.
    #[default]
    Default,
    /// Equal-count classes.
    Quantile,
    /// Equal-width classes between min and max.
    EqualInterval,
    /// Equal-width classes in log10 space.
    Logarithmic,
    /// One-dimensional k-means (Lloyd's algorithm).
    KMeans,
}

impl ClassificationMethod {
    fn as_str(self) -> &'static str {
        match self {
            ClassificationMethod::Default => "default",
            ClassificationMethod::Quantile => "quantile",
            ClassificationMethod::EqualInterval => "equal-interval",
            ClassificationMethod::Logarithmic => "logarithmic",
            ClassificationMethod::KMeans => "k-means",
        }
    }
}

impl FromStr for ClassificationMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "default" => Ok(ClassificationMethod::Default),
            "quantile" | "q" => Ok(ClassificationMethod::Quantile),
            "equal-interval" | "e" => Ok(ClassificationMethod::EqualInterval),
            "logarithmic" | "l" => Ok(ClassificationMethod::Logarithmic),
            "k-means" | "k" => Ok(ClassificationMethod::KMeans),
            other => Err(Error::ConfigParse {
                line: 0,
                message: format!("unknown classification method '{other}'"),
            }),
        }
    }
}

impl fmt::Display for ClassificationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read-only source of precomputed breakpoints, keyed by page and metric.
pub trait BandSource {
    /// Breakpoints for a metric on a page, if any were supplied.
    fn bands(&self, page: &str, metric: &str) -> Option<&[f64]>;
}

/// Precomputed breakpoints loaded from configuration (page → metric → bands).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BandCatalog {
    pages: BTreeMap<String, BTreeMap<String, Vec<f64>>>,
}

impl BandCatalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the breakpoints of one metric.
    #[must_use]
    pub fn with_bands(mut self, page: &str, metric: &str, bands: Vec<f64>) -> Self {
        self.pages
            .entry(page.to_string())
            .or_default()
            .insert(metric.to_string(), bands);
        self
    }

    /// True when no breakpoints are defined.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pages.values().all(BTreeMap::is_empty)
    }
}

impl BandSource for BandCatalog {
    fn bands(&self, page: &str, metric: &str) -> Option<&[f64]> {
        self.pages
            .get(page)?
            .get(metric)
            .map(Vec::as_slice)
            .filter(|b| !b.is_empty())
    }
}

/// A band source together with the page/metric context used to query it.
#[derive(Clone, Copy)]
pub struct BandLookup<'a> {
    /// Catalog to query.
    pub source: &'a dyn BandSource,
    /// Active page.
    pub page: &'a str,
    /// Active metric.
    pub metric: &'a str,
}

impl<'a> BandLookup<'a> {
    /// Create a lookup.
    #[must_use]
    pub fn new(source: &'a dyn BandSource, page: &'a str, metric: &'a str) -> Self {
        Self {
            source,
            page,
            metric,
        }
    }

    fn get(&self) -> Option<&'a [f64]> {
        self.source.bands(self.page, self.metric)
    }
}

impl fmt::Debug for BandLookup<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BandLookup")
            .field("page", &self.page)
            .field("metric", &self.metric)
            .finish()
    }
}

/// Compute bins for a style.
///
/// Never fails: empty or all-null input yields empty bins, which the builder
/// turns into the reset expression.
#[must_use]
pub fn classify(
    values: &[FeatureValue],
    key: StyleKey,
    method: ClassificationMethod,
    bands: Option<BandLookup<'_>>,
) -> Bins {
    match key.variant {
        Variant::Categorical => Bins::Categories(categories(values)),
        Variant::Continuous => {
            let data = numeric_values(values);
            Bins::Breaks(continuous_breaks(&data, method, bands))
        }
        Variant::Diverging => {
            let magnitudes: Vec<f64> = numeric_values(values).iter().map(|v| v.abs()).collect();
            let one_sided = key.is_one_sided();
            Bins::Breaks(diverging_breaks(&magnitudes, one_sided, method, bands))
        }
    }
}

/// Distinct observed categories in first-seen order.
fn categories(values: &[FeatureValue]) -> Vec<Category> {
    let mut seen = BTreeSet::new();
    values
        .iter()
        .filter_map(|fv| fv.value.as_ref())
        .map(Category::from)
        .filter(|c| !matches!(c, Category::Number(n) if !n.is_finite()))
        .filter(|c| seen.insert(c.clone()))
        .collect()
}

fn continuous_breaks(
    data: &[f64],
    method: ClassificationMethod,
    bands: Option<BandLookup<'_>>,
) -> Vec<f64> {
    if data.is_empty() {
        debug!("no numeric values to classify");
        return Vec::new();
    }

    let method = match method {
        ClassificationMethod::Default => {
            if let Some(precomputed) = bands.and_then(|b| b.get()) {
                return sanitize(precomputed);
            }
            debug!(?bands, "no precomputed bands, falling back to quantile");
            ClassificationMethod::Quantile
        }
        other => other,
    };

    if method == ClassificationMethod::Logarithmic {
        return logarithmic_breaks(data, CONTINUOUS_CLASSES, round_breaks);
    }

    round_breaks(&limits(&sorted(data), method, CONTINUOUS_CLASSES))
}

fn diverging_breaks(
    magnitudes: &[f64],
    one_sided: bool,
    method: ClassificationMethod,
    bands: Option<BandLookup<'_>>,
) -> Vec<f64> {
    if magnitudes.is_empty() {
        debug!("no numeric values to classify");
        return Vec::new();
    }

    let method = match method {
        ClassificationMethod::Default => {
            if let Some(precomputed) = bands.and_then(|b| b.get()) {
                let symmetric = sanitize(precomputed);
                if !one_sided {
                    return symmetric;
                }
                let mut upper: Vec<f64> = symmetric.into_iter().filter(|b| *b >= 0.0).collect();
                if upper.first() != Some(&0.0) {
                    upper.insert(0, 0.0);
                }
                return upper;
            }
            debug!(?bands, "no precomputed diverging bands, falling back to quantile");
            ClassificationMethod::Quantile
        }
        other => other,
    };

    let magnitude_breaks = if method == ClassificationMethod::Logarithmic {
        logarithmic_breaks(magnitudes, DIVERGING_CLASSES, round_decimals)
    } else {
        let raw = limits(&sorted(magnitudes), method, DIVERGING_CLASSES);
        round_decimals(&raw)
    };

    let positive: Vec<f64> = magnitude_breaks.into_iter().filter(|b| *b > 0.0).collect();
    if one_sided {
        std::iter::once(0.0).chain(positive).collect()
    } else {
        positive
            .iter()
            .rev()
            .map(|b| -b)
            .chain(std::iter::once(0.0))
            .chain(positive.iter().copied())
            .collect()
    }
}

/// Logarithmic breaks with zeros substituted and mapped back after rounding.
fn logarithmic_breaks(data: &[f64], classes: usize, round: fn(&[f64]) -> Vec<f64>) -> Vec<f64> {
    let had_zero = data.iter().any(|v| *v == 0.0);
    let substituted: Vec<f64> = data
        .iter()
        .map(|v| if *v == 0.0 { LOG_ZERO_SUBSTITUTE } else { *v })
        .collect();

    if substituted.iter().any(|v| *v < 0.0) {
        warn!(
            "logarithmic classification needs non-negative values, falling back to quantile"
        );
        return round(&limits(&sorted(data), ClassificationMethod::Quantile, classes));
    }

    let log_sorted = sorted(&substituted);
    let mut rounded = round(&limits(&log_sorted, ClassificationMethod::Logarithmic, classes));
    if had_zero {
        for b in &mut rounded {
            if *b == LOG_ZERO_SUBSTITUTE {
                *b = 0.0;
            }
        }
    }
    rounded
}

fn sorted(data: &[f64]) -> Vec<f64> {
    let mut values: Vec<f64> = data.iter().copied().filter(|v| v.is_finite()).collect();
    values.sort_by(f64::total_cmp);
    values
}

fn sanitize(bands: &[f64]) -> Vec<f64> {
    let mut bands = sorted(bands);
    bands.dedup();
    bands
}

/// Class limits (`classes + 1` values at most) for ascending `values`.
///
/// Duplicate limits are removed, so the result is strictly increasing.
#[must_use]
pub fn limits(values: &[f64], method: ClassificationMethod, classes: usize) -> Vec<f64> {
    let (Some(&min), Some(&max)) = (values.first(), values.last()) else {
        return Vec::new();
    };
    let classes = classes.max(1);
    let n = classes as f64;

    let mut out = match method {
        ClassificationMethod::Default | ClassificationMethod::Quantile => {
            let mut out = Vec::with_capacity(classes + 1);
            out.push(min);
            for i in 1..classes {
                let p = (values.len() - 1) as f64 * i as f64 / n;
                let lower = p.floor() as usize;
                let fraction = p - lower as f64;
                if fraction == 0.0 || lower + 1 >= values.len() {
                    out.push(values[lower]);
                } else {
                    let (a, b) = (values[lower], values[lower + 1]);
                    out.push(a * (1.0 - fraction) + b * fraction);
                }
            }
            out.push(max);
            out
        }
        ClassificationMethod::EqualInterval => {
            let mut out: Vec<f64> = (0..classes)
                .map(|i| min + (i as f64 / n) * (max - min))
                .collect();
            out.push(max);
            out
        }
        ClassificationMethod::Logarithmic => {
            if min <= 0.0 {
                return limits(values, ClassificationMethod::Quantile, classes);
            }
            let (log_min, log_max) = (min.log10(), max.log10());
            let step = (log_max - log_min) / n;
            let interior = (1..classes).map(|i| 10f64.powf(log_min + i as f64 * step));
            let mut out = vec![min];
            out.extend(interior);
            out.push(max);
            out
        }
        ClassificationMethod::KMeans => kmeans_limits(values, classes),
    };

    out.dedup();
    out
}

/// Lloyd's algorithm in one dimension; limits are the global minimum followed
/// by the maximum of every non-empty cluster.
fn kmeans_limits(values: &[f64], classes: usize) -> Vec<f64> {
    let (min, max) = (values[0], values[values.len() - 1]);
    let mut centroids: Vec<f64> = (0..classes)
        .map(|j| min + (j as f64 / classes as f64) * (max - min))
        .collect();
    let mut assignments = vec![0usize; values.len()];

    for _ in 0..KMEANS_MAX_ITERATIONS {
        for (slot, value) in assignments.iter_mut().zip(values) {
            *slot = nearest(&centroids, *value);
        }

        let mut sums = vec![0.0; classes];
        let mut counts = vec![0usize; classes];
        for (&cluster, value) in assignments.iter().zip(values) {
            sums[cluster] += value;
            counts[cluster] += 1;
        }

        let updated: Vec<f64> = centroids
            .iter()
            .zip(sums.iter().zip(&counts))
            .map(|(old, (sum, count))| {
                if *count == 0 {
                    *old
                } else {
                    sum / *count as f64
                }
            })
            .collect();

        let converged = updated == centroids;
        centroids = updated;
        if converged {
            break;
        }
    }

    let mut cluster_max: Vec<Option<f64>> = vec![None; classes];
    for (&cluster, &value) in assignments.iter().zip(values) {
        let slot = &mut cluster_max[cluster];
        *slot = Some(slot.map_or(value, |m: f64| m.max(value)));
    }

    let mut out = vec![min];
    let mut maxima: Vec<f64> = cluster_max.into_iter().flatten().collect();
    maxima.sort_by(f64::total_cmp);
    out.extend(maxima);
    out.dedup();
    out
}

fn nearest(centroids: &[f64], value: f64) -> usize {
    let mut best = 0;
    let mut best_distance = f64::INFINITY;
    for (j, centroid) in centroids.iter().enumerate() {
        let distance = (centroid - value).abs();
        if distance < best_distance {
            best_distance = distance;
            best = j;
        }
    }
    best
}

/// Round `x` to `figures` significant figures.
///
/// Values whose scaling factor or rounded result is not representable
/// (near `f64::MIN_POSITIVE` or `f64::MAX`) are returned unchanged.
#[must_use]
pub fn round_significant(x: f64, figures: u32) -> f64 {
    if x == 0.0 || !x.is_finite() {
        return x;
    }
    let magnitude = x.abs().log10().ceil() as i32;
    let power = figures as i32 - magnitude;
    let factor = 10f64.powi(power.abs());
    if !factor.is_finite() {
        return x;
    }
    let rounded = if power >= 0 {
        (x * factor).round() / factor
    } else {
        (x / factor).round() * factor
    };
    if rounded.is_finite() {
        rounded
    } else {
        x
    }
}

/// Round breakpoints, escalating precision until no adjacent pair collides.
///
/// At the precision cap any remaining duplicates are dropped.
#[must_use]
pub fn round_breaks(breaks: &[f64]) -> Vec<f64> {
    let mut figures = MIN_SIGNIFICANT_FIGURES;
    loop {
        let mut rounded: Vec<f64> = breaks
            .iter()
            .map(|b| round_significant(*b, figures))
            .collect();
        if !has_adjacent_duplicates(&rounded) {
            return rounded;
        }
        if figures >= MAX_SIGNIFICANT_FIGURES {
            warn!(
                figures,
                "breakpoints still collide at precision cap, dropping duplicates"
            );
            rounded.dedup();
            return rounded;
        }
        figures += 1;
    }
}

fn round_decimals(breaks: &[f64]) -> Vec<f64> {
    let mut rounded: Vec<f64> = breaks.iter().map(|b| (b * 100.0).round() / 100.0).collect();
    rounded.dedup();
    rounded
}

fn has_adjacent_duplicates(values: &[f64]) -> bool {
    values.windows(2).any(|w| w[0] == w[1])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::Geometry;
    use approx::assert_relative_eq;

    fn features(values: &[f64]) -> Vec<FeatureValue> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| FeatureValue::new(i as u64, *v))
            .collect()
    }

    const POLYGON_CONTINUOUS: StyleKey = StyleKey::new(Geometry::Polygon, Variant::Continuous);
    const POLYGON_DIVERGING: StyleKey = StyleKey::new(Geometry::Polygon, Variant::Diverging);
    const LINE_DIVERGING: StyleKey = StyleKey::new(Geometry::Line, Variant::Diverging);

    fn quantile(values: &[f64], key: StyleKey) -> Bins {
        classify(&features(values), key, ClassificationMethod::Quantile, None)
    }

    #[test]
    fn test_round_significant() {
        assert_relative_eq!(round_significant(12345.0, 2), 12000.0);
        assert_relative_eq!(round_significant(0.012_34, 2), 0.012);
        assert_relative_eq!(round_significant(-987.0, 2), -990.0);
        assert_relative_eq!(round_significant(1.0, 2), 1.0);
        assert_eq!(round_significant(0.0, 2), 0.0);
    }

    #[test]
    fn test_round_significant_keeps_tiny_values() {
        assert_eq!(round_significant(5e-308, 2), 5e-308);
        assert_eq!(round_significant(f64::MIN_POSITIVE, 10), f64::MIN_POSITIVE);
        assert_eq!(round_significant(f64::MAX, 2), f64::MAX);
    }

    #[test]
    fn test_round_breaks_near_min_positive_stay_ordered() {
        let rounded = round_breaks(&[5e-308, 1.0]);
        assert!(rounded.iter().all(|b| !b.is_nan()));
        assert!(rounded.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(rounded, vec![5e-308, 1.0]);
    }

    #[test]
    fn test_round_breaks_escalates_precision() {
        let rounded = round_breaks(&[100.0, 104.0, 110.0]);
        assert_eq!(rounded, vec![100.0, 104.0, 110.0]);
    }

    #[test]
    fn test_round_breaks_two_figures_when_distinct() {
        assert_eq!(round_breaks(&[1234.0, 5678.0]), vec![1200.0, 5700.0]);
    }

    #[test]
    fn test_round_breaks_cap_drops_duplicates() {
        let a = 1.000_000_000_01;
        let rounded = round_breaks(&[a, a + 1e-12, 2.0]);
        assert_eq!(rounded.len(), 2);
    }

    #[test]
    fn test_quantile_limits() {
        let values: Vec<f64> = (0..=8).map(f64::from).collect();
        let l = limits(&values, ClassificationMethod::Quantile, 4);
        assert_eq!(l, vec![0.0, 2.0, 4.0, 6.0, 8.0]);
    }

    #[test]
    fn test_quantile_limits_interpolate() {
        let l = limits(&[0.0, 10.0], ClassificationMethod::Quantile, 4);
        assert_eq!(l, vec![0.0, 2.5, 5.0, 7.5, 10.0]);
    }

    #[test]
    fn test_equal_interval_limits() {
        let l = limits(&[0.0, 3.0, 100.0], ClassificationMethod::EqualInterval, 4);
        assert_eq!(l, vec![0.0, 25.0, 50.0, 75.0, 100.0]);
    }

    #[test]
    fn test_logarithmic_limits() {
        let l = limits(&[1.0, 1000.0], ClassificationMethod::Logarithmic, 3);
        assert_eq!(l.len(), 4);
        assert_relative_eq!(l[1], 10.0, epsilon = 1e-9);
        assert_relative_eq!(l[2], 100.0, epsilon = 1e-9);
    }

    #[test]
    fn test_kmeans_limits_separates_clusters() {
        let values = [1.0, 1.1, 1.2, 10.0, 10.5, 11.0, 50.0, 51.0];
        let l = limits(&values, ClassificationMethod::KMeans, 3);
        assert_eq!(l, vec![1.0, 1.2, 11.0, 51.0]);
    }

    #[test]
    fn test_limits_single_value() {
        let constant = limits(&[5.0, 5.0, 5.0], ClassificationMethod::Quantile, 7);
        assert_eq!(constant, vec![5.0]);
        assert_eq!(limits(&[5.0], ClassificationMethod::KMeans, 7), vec![5.0]);
        let empty = limits(&[], ClassificationMethod::EqualInterval, 7);
        assert!(empty.is_empty());
    }

    #[test]
    fn test_classify_empty_is_empty() {
        assert!(quantile(&[], POLYGON_CONTINUOUS).is_empty());

        let all_null = vec![FeatureValue::missing(1), FeatureValue::missing(2)];
        let method = ClassificationMethod::Default;
        let bins = classify(&all_null, POLYGON_DIVERGING, method, None);
        assert!(bins.is_empty());
    }

    #[test]
    fn test_classify_default_uses_precomputed_bands() {
        let bands = vec![50.0, 0.0, 10.0];
        let catalog = BandCatalog::new().with_bands("charging", "demand", bands);
        let lookup = Some(BandLookup::new(&catalog, "charging", "demand"));
        let data = features(&[1.0, 2.0]);
        let method = ClassificationMethod::Default;
        let bins = classify(&data, POLYGON_CONTINUOUS, method, lookup);
        assert_eq!(bins, Bins::Breaks(vec![0.0, 10.0, 50.0]));
    }

    #[test]
    fn test_classify_default_falls_back_to_quantile() {
        let catalog = BandCatalog::new();
        let lookup = BandLookup::new(&catalog, "charging", "demand");
        let data = features(&[0.0, 50.0, 100.0]);
        let method = ClassificationMethod::Default;
        let fallback = classify(&data, POLYGON_CONTINUOUS, method, Some(lookup));
        assert_eq!(fallback, quantile(&[0.0, 50.0, 100.0], POLYGON_CONTINUOUS));
        assert_eq!(fallback.breaks().unwrap().first(), Some(&0.0));
        assert_eq!(fallback.breaks().unwrap().last(), Some(&100.0));
    }

    #[test]
    fn test_classify_logarithmic_maps_zero_back() {
        let data = features(&[0.0, 1.0, 10.0, 100.0]);
        let method = ClassificationMethod::Logarithmic;
        let bins = classify(&data, POLYGON_CONTINUOUS, method, None);
        let breaks = bins.breaks().unwrap();
        assert_eq!(breaks[0], 0.0);
        assert_eq!(*breaks.last().unwrap(), 100.0);
        assert!(breaks.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_classify_logarithmic_negative_falls_back() {
        let data = features(&[-5.0, 1.0, 10.0]);
        let method = ClassificationMethod::Logarithmic;
        let log = classify(&data, POLYGON_CONTINUOUS, method, None);
        assert_eq!(log, quantile(&[-5.0, 1.0, 10.0], POLYGON_CONTINUOUS));
    }

    #[test]
    fn test_classify_diverging_mirrors_for_polygons() {
        let bins = quantile(&[5.0, -15.0, 25.0], POLYGON_DIVERGING);
        let expected = vec![-25.0, -15.0, -5.0, 0.0, 5.0, 15.0, 25.0];
        assert_eq!(bins, Bins::Breaks(expected));
    }

    #[test]
    fn test_classify_diverging_one_sided_for_lines() {
        let data = features(&[5.0, -15.0, 25.0]);
        let bins = classify(&data, LINE_DIVERGING, ClassificationMethod::Default, None);
        assert_eq!(bins, Bins::Breaks(vec![0.0, 5.0, 15.0, 25.0]));
    }

    #[test]
    fn test_classify_diverging_rounds_to_two_decimals() {
        let bins = quantile(&[0.123, 0.4567, 1.0], POLYGON_DIVERGING);
        let expected = vec![-1.0, -0.46, -0.12, 0.0, 0.12, 0.46, 1.0];
        assert_eq!(bins, Bins::Breaks(expected));
    }

    #[test]
    fn test_classify_diverging_zero_not_duplicated() {
        let bins = quantile(&[0.0, 0.0, 8.0], POLYGON_DIVERGING);
        assert_eq!(bins, Bins::Breaks(vec![-8.0, 0.0, 8.0]));
    }

    #[test]
    fn test_classify_diverging_precomputed_upper_half_for_lines() {
        let bands = vec![-100.0, -10.0, 0.0, 10.0, 100.0];
        let catalog = BandCatalog::new().with_bands("flows", "net", bands.clone());
        let lookup = Some(BandLookup::new(&catalog, "flows", "net"));
        let data = features(&[3.0]);
        let method = ClassificationMethod::Default;

        let line = classify(&data, LINE_DIVERGING, method, lookup);
        assert_eq!(line, Bins::Breaks(vec![0.0, 10.0, 100.0]));

        let polygon = classify(&data, POLYGON_DIVERGING, method, lookup);
        assert_eq!(polygon, Bins::Breaks(bands));
    }

    #[test]
    fn test_classify_categorical_distinct_in_first_seen_order() {
        let data = vec![
            FeatureValue::new(1, "rail"),
            FeatureValue::new(2, "road"),
            FeatureValue::new(3, "rail"),
            FeatureValue::missing(4),
        ];
        let key = StyleKey::new(Geometry::Line, Variant::Categorical);
        let bins = classify(&data, key, ClassificationMethod::Default, None);
        let expected = vec![Category::from("rail"), Category::from("road")];
        assert_eq!(bins, Bins::Categories(expected));
    }

    #[test]
    fn test_method_parse_and_display() {
        let kmeans: ClassificationMethod = "k-means".parse().unwrap();
        let short: ClassificationMethod = "q".parse().unwrap();
        assert_eq!(kmeans, ClassificationMethod::KMeans);
        assert_eq!(short, ClassificationMethod::Quantile);
        let name = ClassificationMethod::EqualInterval.to_string();
        assert_eq!(name, "equal-interval");
        assert!("jenks".parse::<ClassificationMethod>().is_err());
    }
}

// ============================================================================
// Property-based tests with proptest
// ============================================================================

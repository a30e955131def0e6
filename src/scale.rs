//! Scale functions for data-to-visual mappings.
//!
//! Scales transform data values to visual properties (width, radius, color).
//! Based on the Grammar of Graphics [Wilkinson 2005].

use crate::color::Rgba;

/// Trait for scale functions that map domain values to range values.
pub trait Scale<D, R> {
    /// Transform a domain value to a range value.
    fn scale(&self, value: D) -> R;

    /// Get the domain extent.
    fn domain(&self) -> (D, D);

    /// Get the range extent.
    fn range(&self) -> (R, R);
}

/// Linear scale for continuous-to-continuous mapping.
///
/// A degenerate domain (min == max) maps every value to `range.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    domain_min: f64,
    domain_max: f64,
    range_min: f64,
    range_max: f64,
}

impl LinearScale {
    /// Create a new linear scale.
    #[must_use]
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self {
            domain_min: domain.0,
            domain_max: domain.1,
            range_min: range.0,
            range_max: range.1,
        }
    }

    /// Position of `value` within the domain, clamped to `[0, 1]`.
    #[must_use]
    pub fn normalize(&self, value: f64) -> f64 {
        let span = self.domain_max - self.domain_min;
        if span.abs() < f64::EPSILON {
            return 0.0;
        }
        ((value - self.domain_min) / span).clamp(0.0, 1.0)
    }
}

impl Scale<f64, f64> for LinearScale {
    fn scale(&self, value: f64) -> f64 {
        self.range_min + self.normalize(value) * (self.range_max - self.range_min)
    }

    fn domain(&self) -> (f64, f64) {
        (self.domain_min, self.domain_max)
    }

    fn range(&self) -> (f64, f64) {
        (self.range_min, self.range_max)
    }
}

/// Color scale interpolating piecewise-linearly through evenly spaced stops.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorScale {
    colors: Vec<Rgba>,
    domain_min: f64,
    domain_max: f64,
}

impl ColorScale {
    /// Create a new color scale; `None` if `colors` is empty.
    #[must_use]
    pub fn new(colors: Vec<Rgba>, domain: (f64, f64)) -> Option<Self> {
        if colors.is_empty() {
            return None;
        }
        Some(Self {
            colors,
            domain_min: domain.0,
            domain_max: domain.1,
        })
    }

    /// Create a greyscale color scale (white to black).
    #[must_use]
    pub fn greyscale(domain: (f64, f64)) -> Self {
        Self {
            colors: vec![Rgba::WHITE, Rgba::BLACK],
            domain_min: domain.0,
            domain_max: domain.1,
        }
    }

    /// Sample `count` colors evenly across the whole domain, endpoints included.
    #[must_use]
    pub fn samples(&self, count: usize) -> Vec<Rgba> {
        match count {
            0 => Vec::new(),
            1 => vec![self.scale(self.domain_min)],
            _ => {
                let span = self.domain_max - self.domain_min;
                (0..count)
                    .map(|i| {
                        let t = i as f64 / (count - 1) as f64;
                        self.scale(self.domain_min + t * span)
                    })
                    .collect()
            }
        }
    }
}

impl Scale<f64, Rgba> for ColorScale {
    fn scale(&self, value: f64) -> Rgba {
        let t = LinearScale::new(self.domain(), (0.0, 1.0)).normalize(value);

        if self.colors.len() == 1 {
            return self.colors[0];
        }

        let segment_count = self.colors.len() - 1;
        let segment = (t * segment_count as f64).floor() as usize;
        let segment = segment.min(segment_count - 1);

        let local_t = t * segment_count as f64 - segment as f64;

        self.colors[segment].lerp(self.colors[segment + 1], local_t as f32)
    }

    fn domain(&self) -> (f64, f64) {
        (self.domain_min, self.domain_max)
    }

    fn range(&self) -> (Rgba, Rgba) {
        let first = self.colors.first().copied().unwrap_or(Rgba::BLACK);
        let last = self.colors.last().copied().unwrap_or(Rgba::WHITE);
        (first, last)
    }
}

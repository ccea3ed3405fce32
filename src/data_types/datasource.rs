use super::viewport::AxisDomain;
use crate::simd::{max_f64, min_f64};

/// Trait for data sources that feed points into the spatial pipeline.
///
/// Sources expose their raw backing arrays so the mapper can copy them chunk by
/// chunk without intermediate iterators. The reported length may be larger than
/// the arrays; readers must bound iteration by the shortest of the three.
pub trait SpatialDataSource {
    /// Number of points the source claims to hold.
    fn len(&self) -> usize;

    /// Raw X values.
    fn x_data(&self) -> &[f64];

    /// Raw Y values.
    fn y_data(&self) -> &[f64];

    /// Optional per-point weights (used by weight-driven Z modes).
    fn weight_data(&self) -> Option<&[f64]> {
        None
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of points that can actually be read: `min(len, x.len(), y.len())`.
    fn readable_len(&self) -> usize {
        self.len().min(self.x_data().len()).min(self.y_data().len())
    }

    /// Returns the bounds of the readable data as (x_min, x_max, y_min, y_max).
    fn get_bounds(&self) -> Option<(f64, f64, f64, f64)> {
        let n = self.readable_len();
        if n == 0 {
            return None;
        }
        let xs = &self.x_data()[..n];
        let ys = &self.y_data()[..n];
        Some((min_f64(xs), max_f64(xs), min_f64(ys), max_f64(ys)))
    }

    /// Data-space domain covering the readable data.
    fn domain(&self) -> Option<AxisDomain> {
        self.get_bounds()
            .map(|(x_min, x_max, y_min, y_max)| AxisDomain::new(x_min, x_max, y_min, y_max))
    }
}

/// Owned column storage for a series.
#[derive(Clone, Debug, Default)]
pub struct VecDataSource {
    x: Vec<f64>,
    y: Vec<f64>,
    weights: Option<Vec<f64>>,
    reported_len: Option<usize>,
}

impl VecDataSource {
    pub fn new(x: Vec<f64>, y: Vec<f64>) -> Self {
        Self {
            x,
            y,
            weights: None,
            reported_len: None,
        }
    }

    pub fn from_points(points: impl IntoIterator<Item = (f64, f64)>) -> Self {
        let (x, y) = points.into_iter().unzip();
        Self::new(x, y)
    }

    pub fn with_weights(mut self, weights: Vec<f64>) -> Self {
        self.weights = Some(weights);
        self
    }

    /// Overrides the reported point count (e.g. a model that announces more
    /// points than it has materialized yet).
    pub fn with_reported_len(mut self, len: usize) -> Self {
        self.reported_len = Some(len);
        self
    }

    /// Appends a point. Weights, when present, are padded with 0.
    pub fn push(&mut self, x: f64, y: f64) {
        self.x.push(x);
        self.y.push(y);
        if let Some(w) = self.weights.as_mut() {
            w.push(0.0);
        }
    }

    /// Replace all data.
    pub fn set_data(&mut self, x: Vec<f64>, y: Vec<f64>) {
        self.x = x;
        self.y = y;
        self.weights = None;
        self.reported_len = None;
    }
}

impl SpatialDataSource for VecDataSource {
    fn len(&self) -> usize {
        self.reported_len.unwrap_or(self.x.len().min(self.y.len()))
    }

    fn x_data(&self) -> &[f64] {
        &self.x
    }

    fn y_data(&self) -> &[f64] {
        &self.y
    }

    fn weight_data(&self) -> Option<&[f64]> {
        self.weights.as_deref()
    }
}

/// Borrowed view over existing columns (zero-copy).
#[derive(Clone, Copy, Debug)]
pub struct SliceDataSource<'a> {
    x: &'a [f64],
    y: &'a [f64],
    weights: Option<&'a [f64]>,
}

impl<'a> SliceDataSource<'a> {
    pub fn new(x: &'a [f64], y: &'a [f64]) -> Self {
        Self { x, y, weights: None }
    }

    pub fn with_weights(mut self, weights: &'a [f64]) -> Self {
        self.weights = Some(weights);
        self
    }
}

impl SpatialDataSource for SliceDataSource<'_> {
    fn len(&self) -> usize {
        self.x.len().min(self.y.len())
    }

    fn x_data(&self) -> &[f64] {
        self.x
    }

    fn y_data(&self) -> &[f64] {
        self.y
    }

    fn weight_data(&self) -> Option<&[f64]> {
        self.weights
    }
}

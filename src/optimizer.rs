//! In-place point thinning for mapped chunks.
//!
//! The optimizer compacts a chunk's interleaved coordinates to the front of the
//! array and returns the retained count. The domain filter runs on data-space
//! points before transformation. Pixel bounds and the minimum distance to the
//! previously retained point are checked on projected points, optionally keeping
//! local y extrema and widening the threshold with depth.

use crate::data_types::{
    BoundsSpace, DepthAttenuation, DepthDamping, DepthDampingMode, OptimizerConfig, PlotContext,
};

#[derive(Clone, Debug, Default)]
pub struct SpatialOptimizer {
    bounds: BoundsSpace,
    min_dist_sq: f64,
    min_dist_sq_x: f64,
    min_dist_sq_y: f64,
    preserve_peaks: bool,
    depth: Option<DepthAttenuation>,
    damping: Option<DepthDamping>,
    last: Option<(f64, f64)>,
}

impl SpatialOptimizer {
    pub fn new() -> Self {
        Self {
            preserve_peaks: true,
            ..Default::default()
        }
    }

    pub fn from_config(config: &OptimizerConfig) -> Self {
        let mut optimizer = Self::new()
            .with_bounds(config.bounds)
            .with_min_pixel_distance(config.min_pixel_distance)
            .with_preserve_peaks(config.preserve_peaks);
        if let Some([x, y]) = config.min_pixel_distance_xy {
            optimizer = optimizer.with_min_pixel_distance_xy(x, y);
        }
        if let Some(d) = config.depth_attenuation {
            optimizer = optimizer.with_depth_attenuation(d.near, d.far, d.scale);
        }
        if let Some(d) = config.depth_damping {
            optimizer = optimizer.with_depth_damping(d.factor, d.mode);
        }
        optimizer
    }

    pub fn with_bounds(mut self, bounds: BoundsSpace) -> Self {
        self.bounds = bounds;
        self
    }

    /// Uniform minimum distance; clears any per-axis setting.
    pub fn with_min_pixel_distance(mut self, distance: f64) -> Self {
        let d = distance.max(0.0);
        self.min_dist_sq = d * d;
        self.min_dist_sq_x = 0.0;
        self.min_dist_sq_y = 0.0;
        self
    }

    /// Per-axis minimum distances; a point is dropped only when it is close on both axes.
    pub fn with_min_pixel_distance_xy(mut self, dx: f64, dy: f64) -> Self {
        let (dx, dy) = (dx.max(0.0), dy.max(0.0));
        self.min_dist_sq = 0.0;
        self.min_dist_sq_x = dx * dx;
        self.min_dist_sq_y = dy * dy;
        self
    }

    /// Invalid parameters (non-finite, `scale <= 0` or `far <= near`) disable attenuation.
    pub fn with_depth_attenuation(mut self, near: f64, far: f64, scale: f64) -> Self {
        let valid = scale.is_finite()
            && scale > 0.0
            && near.is_finite()
            && far.is_finite()
            && far > near;
        self.depth = valid.then_some(DepthAttenuation { near, far, scale });
        self
    }

    pub fn with_depth_damping(mut self, factor: f64, mode: DepthDampingMode) -> Self {
        self.damping = (factor.is_finite() && factor > 0.0).then_some(DepthDamping { factor, mode });
        self
    }

    pub fn with_preserve_peaks(mut self, preserve: bool) -> Self {
        self.preserve_peaks = preserve;
        self
    }

    /// Forgets the last retained point; called at the start of each stream.
    pub fn reset(&mut self) {
        self.last = None;
    }

    fn is_thinning(&self) -> bool {
        self.min_dist_sq > 0.0 || self.min_dist_sq_x > 0.0 || self.min_dist_sq_y > 0.0
    }

    fn depth_scale(&self, z: f64) -> f64 {
        let Some(depth) = self.depth else {
            return 1.0;
        };
        let t = ((z - depth.near) / (depth.far - depth.near)).clamp(0.0, 1.0);
        let mut scale = 1.0 + depth.scale * t;
        if let Some(damping) = self.damping {
            let m = match damping.mode {
                DepthDampingMode::Linear => t,
                DepthDampingMode::Exponential => t * t,
            };
            scale *= 1.0 + damping.factor * m;
        }
        scale
    }

    fn domain_bounds(&self, context: Option<&PlotContext>) -> Option<(f64, f64, f64, f64)> {
        let ctx = context?;
        (self.bounds == BoundsSpace::Domain).then_some((
            ctx.domain.x_min,
            ctx.domain.x_max,
            ctx.domain.y_min,
            ctx.domain.y_max,
        ))
    }

    fn pixel_bounds(&self, context: Option<&PlotContext>) -> Option<(f64, f64, f64, f64)> {
        let ctx = context?;
        (self.bounds == BoundsSpace::Pixels).then_some((
            ctx.bounds.min_x(),
            ctx.bounds.max_x(),
            ctx.bounds.min_y(),
            ctx.bounds.max_y(),
        ))
    }

    /// Drops data-space points outside the context's axis domain.
    ///
    /// Runs on mapped coordinates before any transform; a no-op unless the
    /// bounds space is [`BoundsSpace::Domain`] and a context is given.
    pub fn filter_domain(&self, coords: &mut [f64], count: usize, context: Option<&PlotContext>) -> usize {
        let count = count.min(coords.len() / 3);
        let Some(bounds) = self.domain_bounds(context) else {
            return count;
        };
        compact(coords, count, |x, y| within(bounds, x, y))
    }

    /// Compacts the first `count` projected points of `coords` in place and returns how many remain.
    ///
    /// Expects screen coordinates. The pixel bounds filter needs a context;
    /// thinning applies either way.
    pub fn apply(&mut self, coords: &mut [f64], count: usize, context: Option<&PlotContext>) -> usize {
        let count = count.min(coords.len() / 3);
        let bounds = self.pixel_bounds(context);
        if bounds.is_none() && !self.is_thinning() {
            return count;
        }

        let mut write = 0;
        for i in 0..count {
            let base = i * 3;
            let (x, y, z) = (coords[base], coords[base + 1], coords[base + 2]);

            if let Some(bounds) = bounds {
                if !within(bounds, x, y) {
                    continue;
                }
            }

            if let Some((last_x, last_y)) = self.last {
                if self.is_too_close(x - last_x, y - last_y, z)
                    && !(self.preserve_peaks && is_local_peak(coords, i, count))
                {
                    continue;
                }
            }

            let out = write * 3;
            coords[out] = x;
            coords[out + 1] = y;
            coords[out + 2] = z;
            write += 1;
            self.last = Some((x, y));
        }
        write
    }

    fn is_too_close(&self, dx: f64, dy: f64, z: f64) -> bool {
        if !self.is_thinning() {
            return false;
        }
        let scale = self.depth_scale(z);
        let s2 = scale * scale;
        if self.min_dist_sq_x > 0.0 || self.min_dist_sq_y > 0.0 {
            dx * dx < self.min_dist_sq_x * s2 && dy * dy < self.min_dist_sq_y * s2
        } else {
            dx * dx + dy * dy < self.min_dist_sq * s2
        }
    }
}

#[inline]
fn within((min_x, max_x, min_y, max_y): (f64, f64, f64, f64), x: f64, y: f64) -> bool {
    x >= min_x && x <= max_x && y >= min_y && y <= max_y
}

fn compact(coords: &mut [f64], count: usize, keep: impl Fn(f64, f64) -> bool) -> usize {
    let mut write = 0;
    for i in 0..count {
        let base = i * 3;
        if !keep(coords[base], coords[base + 1]) {
            continue;
        }
        coords.copy_within(base..base + 3, write * 3);
        write += 1;
    }
    write
}

// Compaction never writes past the read cursor, so slot `index - 1` holds its own point.
fn is_local_peak(coords: &[f64], index: usize, count: usize) -> bool {
    if index == 0 || index + 1 >= count {
        return false;
    }
    let prev = coords[(index - 1) * 3 + 1];
    let curr = coords[index * 3 + 1];
    let next = coords[(index + 1) * 3 + 1];
    if curr == prev && curr == next {
        return false;
    }
    (curr >= prev && curr >= next) || (curr <= prev && curr <= next)
}

//! Lane-width probing and batch helpers for interleaved xyz coordinates.
//! Relying on auto-vectorization by LLVM: every kernel walks full lanes through
//! fixed-size arrays and finishes the tail with a plain scalar loop.

use std::sync::OnceLock;

/// Upper bound for the lane width, sizes the stack/scratch arrays.
pub const MAX_LANES: usize = 8;

/// Returns the number of f64 elements processed together by one step of a batch loop.
///
/// Probed once per process from the CPU features (AVX-512: 8, AVX: 4, SSE2/NEON: 2).
pub fn lane_width() -> usize {
    static LANES: OnceLock<usize> = OnceLock::new();
    *LANES.get_or_init(detect_lane_width)
}

#[cfg(target_arch = "x86_64")]
fn detect_lane_width() -> usize {
    if std::arch::is_x86_feature_detected!("avx512f") {
        8
    } else if std::arch::is_x86_feature_detected!("avx") {
        4
    } else {
        2
    }
}

#[cfg(target_arch = "aarch64")]
fn detect_lane_width() -> usize {
    2
}

#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
fn detect_lane_width() -> usize {
    1
}

/// Clamps a requested lane count into `1..=MAX_LANES`.
#[inline]
pub fn clamp_lanes(lanes: usize) -> usize {
    lanes.clamp(1, MAX_LANES)
}

/// Per-lane temporaries reused by batched kernels (structure of arrays).
#[derive(Clone, Debug)]
pub struct LaneScratch {
    lanes: usize,
    pub(crate) x: [f64; MAX_LANES],
    pub(crate) y: [f64; MAX_LANES],
    pub(crate) z: [f64; MAX_LANES],
    pub(crate) out_x: [f64; MAX_LANES],
    pub(crate) out_y: [f64; MAX_LANES],
    pub(crate) out_z: [f64; MAX_LANES],
    pub(crate) out_w: [f64; MAX_LANES],
}

impl LaneScratch {
    pub fn new(lanes: usize) -> Self {
        Self {
            lanes: clamp_lanes(lanes),
            x: [0.0; MAX_LANES],
            y: [0.0; MAX_LANES],
            z: [0.0; MAX_LANES],
            out_x: [0.0; MAX_LANES],
            out_y: [0.0; MAX_LANES],
            out_z: [0.0; MAX_LANES],
            out_w: [0.0; MAX_LANES],
        }
    }

    /// Scratch sized for the probed hardware lane width.
    pub fn for_hardware() -> Self {
        Self::new(lane_width())
    }

    pub fn lanes(&self) -> usize {
        self.lanes
    }

    /// Loads one lane of interleaved xyz triples into the x/y/z rows.
    #[inline(always)]
    pub(crate) fn gather(&mut self, coords: &[f64]) {
        for (k, p) in coords.chunks_exact(3).take(self.lanes).enumerate() {
            self.x[k] = p[0];
            self.y[k] = p[1];
            self.z[k] = p[2];
        }
    }

    /// Writes the out rows back as interleaved xyz triples.
    #[inline(always)]
    pub(crate) fn scatter(&self, coords: &mut [f64]) {
        for (k, p) in coords.chunks_exact_mut(3).take(self.lanes).enumerate() {
            p[0] = self.out_x[k];
            p[1] = self.out_y[k];
            p[2] = self.out_z[k];
        }
    }
}

impl Default for LaneScratch {
    fn default() -> Self {
        Self::for_hardware()
    }
}

/// Number of points that can be processed safely from both slices.
#[inline]
pub(crate) fn clamp_count(input: &[f64], output: &[f64], count: usize) -> usize {
    count.min(input.len() / 3).min(output.len() / 3)
}

/// Minimum of a flat slice, NaN for an empty slice. NaN entries are ignored.
pub fn min_f64(data: &[f64]) -> f64 {
    if data.is_empty() {
        return f64::NAN;
    }
    let chunks = data.chunks_exact(8);
    let rem = chunks.remainder();
    let mut min_val = f64::INFINITY;
    for c in chunks {
        let m = c[0].min(c[1]).min(c[2]).min(c[3]).min(c[4]).min(c[5]).min(c[6]).min(c[7]);
        min_val = min_val.min(m);
    }
    for &v in rem {
        min_val = min_val.min(v);
    }
    min_val
}

/// Maximum of a flat slice, NaN for an empty slice. NaN entries are ignored.
pub fn max_f64(data: &[f64]) -> f64 {
    if data.is_empty() {
        return f64::NAN;
    }
    let chunks = data.chunks_exact(8);
    let rem = chunks.remainder();
    let mut max_val = f64::NEG_INFINITY;
    for c in chunks {
        let m = c[0].max(c[1]).max(c[2]).max(c[3]).max(c[4]).max(c[5]).max(c[6]).max(c[7]);
        max_val = max_val.max(m);
    }
    for &v in rem {
        max_val = max_val.max(v);
    }
    max_val
}

/// Finds (min z, max z) over the first `count` interleaved points.
/// NaN depths are skipped. Returns (+inf, -inf) for an empty range.
pub fn z_bounds(coords: &[f64], count: usize) -> (f64, f64) {
    let count = count.min(coords.len() / 3);
    let coords = &coords[..count * 3];

    let mut min_z = f64::INFINITY;
    let mut max_z = f64::NEG_INFINITY;

    let chunks = coords.chunks_exact(3 * 4);
    let rem = chunks.remainder();

    for c in chunks {
        let lo = c[2].min(c[5]).min(c[8]).min(c[11]);
        let hi = c[2].max(c[5]).max(c[8]).max(c[11]);
        min_z = min_z.min(lo);
        max_z = max_z.max(hi);
    }

    for p in rem.chunks_exact(3) {
        min_z = min_z.min(p[2]);
        max_z = max_z.max(p[2]);
    }
    (min_z, max_z)
}

/// Returns the index of the point whose (x, y) is closest to the target and
/// within `radius_sq` (squared distance), or `None`. Ties keep the lowest index.
pub fn nearest_xy_index(
    coords: &[f64],
    count: usize,
    lanes: usize,
    x: f64,
    y: f64,
    radius_sq: f64,
) -> Option<usize> {
    let count = count.min(coords.len() / 3);
    let lanes = clamp_lanes(lanes);
    let full = count - count % lanes;

    let mut dist = [0.0f64; MAX_LANES];
    let mut best_dist = f64::INFINITY;
    let mut best_idx = None;

    for (i, lane) in coords[..full * 3].chunks_exact(lanes * 3).enumerate() {
        for (k, p) in lane.chunks_exact(3).enumerate() {
            let dx = p[0] - x;
            let dy = p[1] - y;
            dist[k] = dx * dx + dy * dy;
        }
        for (k, &d) in dist[..lanes].iter().enumerate() {
            if d <= radius_sq && d < best_dist {
                best_dist = d;
                best_idx = Some(i * lanes + k);
            }
        }
    }

    for (i, p) in coords[full * 3..count * 3].chunks_exact(3).enumerate() {
        let dx = p[0] - x;
        let dy = p[1] - y;
        let d = dx * dx + dy * dy;
        if d <= radius_sq && d < best_dist {
            best_dist = d;
            best_idx = Some(full + i);
        }
    }

    best_idx
}

/// Largest absolute difference between two equally shaped coordinate slices,
/// per axis. Matching non-finite values (same infinity, or both NaN) count as equal.
pub fn max_axis_deviation(a: &[f64], b: &[f64], count: usize) -> [f64; 3] {
    let count = count.min(a.len() / 3).min(b.len() / 3);
    let mut max = [0.0f64; 3];
    for (pa, pb) in a[..count * 3].chunks_exact(3).zip(b[..count * 3].chunks_exact(3)) {
        for axis in 0..3 {
            let d = deviation(pa[axis], pb[axis]);
            if d > max[axis] {
                max[axis] = d;
            }
        }
    }
    max
}

#[inline]
fn deviation(a: f64, b: f64) -> f64 {
    if a.is_finite() && b.is_finite() {
        return (a - b).abs();
    }
    if (a.is_nan() && b.is_nan()) || a == b {
        0.0
    } else {
        f64::INFINITY
    }
}

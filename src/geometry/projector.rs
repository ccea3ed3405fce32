use super::Vector3D;
use crate::data_types::PlotBounds;
use crate::simd::{clamp_count, LaneScratch};
use serde::{Deserialize, Serialize};

/// Default share of the shorter viewport side used when fitting a projector.
pub const DEFAULT_FIT_RATIO: f64 = 0.45;

/// Parallel projection: `sx = cx + x * scale`, `sy = cy - y * scale`, z unchanged.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrthographicProjector {
    pub scale: f64,
    pub center_x: f64,
    pub center_y: f64,
}

impl Default for OrthographicProjector {
    fn default() -> Self {
        Self {
            scale: 1.0,
            center_x: 0.0,
            center_y: 0.0,
        }
    }
}

impl OrthographicProjector {
    pub fn new(scale: f64, center_x: f64, center_y: f64) -> Self {
        Self {
            scale,
            center_x,
            center_y,
        }
    }

    #[inline(always)]
    pub fn project_xyz(&self, x: f64, y: f64, z: f64) -> (f64, f64, f64) {
        (
            self.center_x + x * self.scale,
            self.center_y - y * self.scale,
            z,
        )
    }

    pub fn apply_batch(
        &self,
        input: &[f64],
        output: &mut [f64],
        count: usize,
        scratch: &mut LaneScratch,
    ) -> usize {
        let count = clamp_count(input, output, count);
        let lanes = scratch.lanes();
        let full = count - count % lanes;
        let (s, cx, cy) = (self.scale, self.center_x, self.center_y);

        for (src, dst) in input[..full * 3]
            .chunks_exact(lanes * 3)
            .zip(output[..full * 3].chunks_exact_mut(lanes * 3))
        {
            scratch.gather(src);
            for k in 0..lanes {
                scratch.out_x[k] = cx + scratch.x[k] * s;
                scratch.out_y[k] = cy - scratch.y[k] * s;
                scratch.out_z[k] = scratch.z[k];
            }
            scratch.scatter(dst);
        }

        for (src, dst) in input[full * 3..count * 3]
            .chunks_exact(3)
            .zip(output[full * 3..count * 3].chunks_exact_mut(3))
        {
            let (x, y, z) = self.project_xyz(src[0], src[1], src[2]);
            dst[0] = x;
            dst[1] = y;
            dst[2] = z;
        }
        count
    }
}

/// Perspective divide by the biased depth `d = z + z_bias`.
///
/// `sx = cx + x * (scale / d)`, `sy = cy - y * (scale / d)` and the output z is
/// `d`. Zero or negative divisors are not guarded; non-finite results are left
/// for the clipping stage to discard.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PerspectiveProjector {
    pub scale: f64,
    pub center_x: f64,
    pub center_y: f64,
    #[serde(default = "default_z_bias")]
    pub z_bias: f64,
}

fn default_z_bias() -> f64 {
    1.0
}

impl Default for PerspectiveProjector {
    fn default() -> Self {
        Self {
            scale: 1.0,
            center_x: 0.0,
            center_y: 0.0,
            z_bias: default_z_bias(),
        }
    }
}

impl PerspectiveProjector {
    pub fn new(scale: f64, center_x: f64, center_y: f64, z_bias: f64) -> Self {
        Self {
            scale,
            center_x,
            center_y,
            z_bias,
        }
    }

    #[inline(always)]
    pub fn project_xyz(&self, x: f64, y: f64, z: f64) -> (f64, f64, f64) {
        let d = z + self.z_bias;
        let f = self.scale / d;
        (self.center_x + x * f, self.center_y - y * f, d)
    }

    pub fn apply_batch(
        &self,
        input: &[f64],
        output: &mut [f64],
        count: usize,
        scratch: &mut LaneScratch,
    ) -> usize {
        let count = clamp_count(input, output, count);
        let lanes = scratch.lanes();
        let full = count - count % lanes;
        let (s, cx, cy, bias) = (self.scale, self.center_x, self.center_y, self.z_bias);

        for (src, dst) in input[..full * 3]
            .chunks_exact(lanes * 3)
            .zip(output[..full * 3].chunks_exact_mut(lanes * 3))
        {
            scratch.gather(src);
            for k in 0..lanes {
                scratch.out_z[k] = scratch.z[k] + bias;
            }
            for k in 0..lanes {
                scratch.out_w[k] = s / scratch.out_z[k];
            }
            for k in 0..lanes {
                scratch.out_x[k] = cx + scratch.x[k] * scratch.out_w[k];
                scratch.out_y[k] = cy - scratch.y[k] * scratch.out_w[k];
            }
            scratch.scatter(dst);
        }

        for (src, dst) in input[full * 3..count * 3]
            .chunks_exact(3)
            .zip(output[full * 3..count * 3].chunks_exact_mut(3))
        {
            let (x, y, z) = self.project_xyz(src[0], src[1], src[2]);
            dst[0] = x;
            dst[1] = y;
            dst[2] = z;
        }
        count
    }
}

/// Closed set of projections, dispatched once per chunk.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Projector {
    Orthographic(OrthographicProjector),
    Perspective(PerspectiveProjector),
}

impl Default for Projector {
    fn default() -> Self {
        Projector::Orthographic(OrthographicProjector::default())
    }
}

impl From<OrthographicProjector> for Projector {
    fn from(p: OrthographicProjector) -> Self {
        Projector::Orthographic(p)
    }
}

impl From<PerspectiveProjector> for Projector {
    fn from(p: PerspectiveProjector) -> Self {
        Projector::Perspective(p)
    }
}

impl Projector {
    pub fn orthographic(scale: f64, center_x: f64, center_y: f64) -> Self {
        OrthographicProjector::new(scale, center_x, center_y).into()
    }

    pub fn perspective(scale: f64, center_x: f64, center_y: f64, z_bias: f64) -> Self {
        PerspectiveProjector::new(scale, center_x, center_y, z_bias).into()
    }

    pub fn project_xyz(&self, x: f64, y: f64, z: f64) -> (f64, f64, f64) {
        match self {
            Projector::Orthographic(p) => p.project_xyz(x, y, z),
            Projector::Perspective(p) => p.project_xyz(x, y, z),
        }
    }

    pub fn apply_one(&self, v: Vector3D) -> Vector3D {
        let (x, y, z) = self.project_xyz(v.x, v.y, v.z);
        Vector3D::new(x, y, z)
    }

    pub fn apply_batch(
        &self,
        input: &[f64],
        output: &mut [f64],
        count: usize,
        scratch: &mut LaneScratch,
    ) -> usize {
        match self {
            Projector::Orthographic(p) => p.apply_batch(input, output, count, scratch),
            Projector::Perspective(p) => p.apply_batch(input, output, count, scratch),
        }
    }

    pub fn scale(&self) -> f64 {
        match self {
            Projector::Orthographic(p) => p.scale,
            Projector::Perspective(p) => p.scale,
        }
    }

    pub fn center(&self) -> (f64, f64) {
        match self {
            Projector::Orthographic(p) => (p.center_x, p.center_y),
            Projector::Perspective(p) => (p.center_x, p.center_y),
        }
    }

    pub fn set_scale(&mut self, scale: f64) {
        match self {
            Projector::Orthographic(p) => p.scale = scale,
            Projector::Perspective(p) => p.scale = scale,
        }
    }

    pub fn set_center(&mut self, center_x: f64, center_y: f64) {
        match self {
            Projector::Orthographic(p) => {
                p.center_x = center_x;
                p.center_y = center_y;
            }
            Projector::Perspective(p) => {
                p.center_x = center_x;
                p.center_y = center_y;
            }
        }
    }

    /// Centers the projector on `bounds` with a scale of `fill_ratio` times the shorter side.
    pub fn fit_to_viewport(&mut self, bounds: &PlotBounds, fill_ratio: f64) {
        let scale = bounds.min_extent() * fill_ratio;
        self.set_scale(scale);
        self.set_center(bounds.center_x(), bounds.center_y());
        tracing::debug!(
            "Projector fitted: scale={:.3} center=({:.1}, {:.1})",
            scale,
            bounds.center_x(),
            bounds.center_y()
        );
    }
}

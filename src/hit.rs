//! Nearest-point queries over a buffer's coordinates.

use crate::buffer::SpatialBuffer;
use crate::geometry::Vector3D;
use crate::simd::nearest_xy_index;

/// Which coordinate array of the buffer a query reads.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CoordSpace {
    /// Input array; holds the projected chunk after a mapper pass.
    #[default]
    Input,
    Output,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct HitDetector;

impl HitDetector {
    /// Nearest projected point within `radius` of (x, y). Ties go to the lowest index.
    pub fn find_hit_index(
        &self,
        buffer: &SpatialBuffer,
        count: usize,
        x: f64,
        y: f64,
        radius: f64,
    ) -> Option<usize> {
        self.nearest_index(buffer, count, x, y, radius, CoordSpace::Input)
    }

    pub fn nearest_index(
        &self,
        buffer: &SpatialBuffer,
        count: usize,
        x: f64,
        y: f64,
        radius: f64,
        space: CoordSpace,
    ) -> Option<usize> {
        if count == 0 || !(radius > 0.0) {
            return None;
        }
        nearest_xy_index(coords(buffer, space), count, buffer.lanes(), x, y, radius * radius)
    }

    /// Nearest point (3D distance) inside the axis-aligned box `center ± half`.
    pub fn nearest_in_box(
        &self,
        buffer: &SpatialBuffer,
        count: usize,
        center: Vector3D,
        half: Vector3D,
        space: CoordSpace,
    ) -> Option<usize> {
        if count == 0 || !(half.x > 0.0 && half.y > 0.0 && half.z > 0.0) {
            return None;
        }
        let data = coords(buffer, space);
        let count = count.min(data.len() / 3);
        let points: &[[f64; 3]] = bytemuck::cast_slice(&data[..count * 3]);

        let mut best = None;
        let mut best_dist = f64::INFINITY;
        for (i, p) in points.iter().enumerate() {
            let d = Vector3D::from_array(*p) - center;
            if d.x.abs() > half.x || d.y.abs() > half.y || d.z.abs() > half.z {
                continue;
            }
            let dist = d.length_squared();
            if dist < best_dist {
                best_dist = dist;
                best = Some(i);
            }
        }
        best
    }
}

fn coords(buffer: &SpatialBuffer, space: CoordSpace) -> &[f64] {
    match space {
        CoordSpace::Input => buffer.input(),
        CoordSpace::Output => buffer.output(),
    }
}

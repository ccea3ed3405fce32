use super::batch::{is_drawable, SpatialPathBatch};
use crate::buffer::SpatialBuffer;
use crate::geometry::Vector3D;
use crate::mapper::ChunkConsumer;
use crate::simd::z_bounds;
use serde::{Deserialize, Serialize};

/// Segments with a smaller depth difference are not interpolated.
const DZ_EPSILON: f64 = 1e-12;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClippingMode {
    /// Drop points behind `z_min`, inserting interpolated boundary points.
    #[default]
    Clip,
    /// Forward every point unmodified.
    Clamp,
}

#[derive(Clone, Copy, Debug)]
struct LastPoint {
    x: f64,
    y: f64,
    z: f64,
    visible: bool,
}

/// Turns projected chunks into a [`SpatialPathBatch`], clipping against the
/// near plane `z_min`. Path state carries across chunks so a line crossing a
/// chunk boundary stays connected.
#[derive(Clone, Debug)]
pub struct SpatialPathBatchBuilder {
    batch: SpatialPathBatch,
    z_min: f64,
    clipping: ClippingMode,
    last: Option<LastPoint>,
}

impl Default for SpatialPathBatchBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SpatialPathBatchBuilder {
    pub fn new() -> Self {
        Self::with_batch(SpatialPathBatch::new())
    }

    pub fn with_batch(batch: SpatialPathBatch) -> Self {
        Self {
            batch,
            z_min: 0.0,
            clipping: ClippingMode::Clip,
            last: None,
        }
    }

    pub fn with_z_min(mut self, z_min: f64) -> Self {
        self.z_min = z_min;
        self
    }

    pub fn with_clipping(mut self, clipping: ClippingMode) -> Self {
        self.clipping = clipping;
        self
    }

    pub fn batch(&self) -> &SpatialPathBatch {
        &self.batch
    }

    pub fn z_min(&self) -> f64 {
        self.z_min
    }

    pub fn set_z_min(&mut self, z_min: f64) {
        self.z_min = z_min;
    }

    pub fn clipping(&self) -> ClippingMode {
        self.clipping
    }

    pub fn set_clipping(&mut self, clipping: ClippingMode) {
        self.clipping = clipping;
    }

    /// Clears accumulated points and path state.
    pub fn reset(&mut self) {
        self.batch.clear();
        self.last = None;
    }

    /// Clears accumulated points but keeps the path state, so the next chunk
    /// continues from the last point seen.
    pub fn clear_batch(&mut self) {
        self.batch.clear();
    }

    /// Breaks the current path; the next visible point starts a new run.
    pub fn reset_path_state(&mut self) {
        self.last = None;
    }

    pub fn is_chunk_potentially_visible(&self, buffer: &SpatialBuffer, count: usize) -> bool {
        self.is_potentially_visible(buffer.input(), count)
    }

    fn is_potentially_visible(&self, coords: &[f64], count: usize) -> bool {
        let count = count.min(coords.len() / 3);
        if count == 0 {
            return false;
        }
        if self.clipping == ClippingMode::Clamp {
            return true;
        }
        let (_, max_z) = z_bounds(coords, count);
        max_z >= self.z_min
    }

    /// Appends `p1 -> p2` as an isolated path.
    pub fn push_line_segment(&mut self, p1: Vector3D, p2: Vector3D) {
        let coords = [p1.x, p1.y, p1.z, p2.x, p2.y, p2.z];
        self.reset_path_state();
        self.accept_coords(&coords, 2);
        self.reset_path_state();
    }

    /// Consumes `count` interleaved xyz points.
    pub fn accept_coords(&mut self, coords: &[f64], count: usize) {
        let count = count.min(coords.len() / 3);
        if count == 0 {
            return;
        }
        if !self.is_potentially_visible(coords, count) {
            self.last = None;
            return;
        }
        let points: &[[f64; 3]] = bytemuck::cast_slice(&coords[..count * 3]);

        if self.clipping == ClippingMode::Clamp {
            for &[x, y, z] in points {
                self.batch.push(x, y, self.last.is_none());
                self.last = Some(LastPoint {
                    x,
                    y,
                    z,
                    visible: true,
                });
            }
            return;
        }

        let z_min = self.z_min;
        for &[x, y, z] in points {
            let visible = is_drawable(x, y, z, z_min);
            match self.last {
                Some(last) if visible && !last.visible => {
                    // Entering: the boundary point starts the run unless the
                    // current point already lies on the plane.
                    let clip = (z != z_min).then(|| interpolate(last, x, y, z, z_min)).flatten();
                    if let Some((cx, cy)) = clip {
                        self.batch.push(cx, cy, true);
                    }
                    self.batch.push(x, y, clip.is_none());
                }
                Some(last) if !visible && last.visible => {
                    if last.z != z_min {
                        if let Some((cx, cy)) = interpolate(last, x, y, z, z_min) {
                            self.batch.push(cx, cy, false);
                        }
                    }
                }
                Some(_) if visible => self.batch.push(x, y, false),
                None if visible => self.batch.push(x, y, true),
                _ => {}
            }
            self.last = Some(LastPoint { x, y, z, visible });
        }
    }
}

/// Point at `z == z_min` on the segment from `last` to (x, y, z), if finite.
#[inline]
fn interpolate(last: LastPoint, x: f64, y: f64, z: f64, z_min: f64) -> Option<(f64, f64)> {
    let dz = z - last.z;
    if !(dz.abs() > DZ_EPSILON) {
        return None;
    }
    let t = (z_min - last.z) / dz;
    let cx = last.x + t * (x - last.x);
    let cy = last.y + t * (y - last.y);
    (cx.is_finite() && cy.is_finite()).then_some((cx, cy))
}

impl ChunkConsumer for SpatialPathBatchBuilder {
    fn accept(&mut self, buffer: &SpatialBuffer, count: usize) {
        self.accept_coords(buffer.input(), count);
    }
}

use super::Vector3D;
use crate::simd::{clamp_count, LaneScratch};
use glam::{DMat4, DVec3};
use serde::{Deserialize, Serialize};
use std::ops::Mul;

/// Tolerance used to decide whether the homogeneous coordinate needs a divide.
const W_EPSILON: f64 = 1e-12;

/// Row-major 4x4 affine/projective transform.
///
/// Points are treated as column vectors `(x, y, z, 1)`; element `[r * 4 + c]`
/// is row `r`, column `c`. When the resulting `w` is neither 0 nor 1 the
/// output is divided by it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Matrix4x4 {
    elements: [f64; 16],
}

impl Default for Matrix4x4 {
    fn default() -> Self {
        Self::identity()
    }
}

impl Matrix4x4 {
    pub const IDENTITY: Self = Self {
        elements: [
            1.0, 0.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ],
    };

    pub fn identity() -> Self {
        Self::IDENTITY
    }

    pub fn from_rows(elements: [f64; 16]) -> Self {
        Self { elements }
    }

    /// Builds a matrix from 16 row-major values.
    pub fn try_from_slice(values: &[f64]) -> eyre::Result<Self> {
        let elements: [f64; 16] = values.try_into().map_err(|_| {
            eyre::eyre!("matrix requires 16 values, got {}", values.len())
        })?;
        Ok(Self { elements })
    }

    pub fn translation(tx: f64, ty: f64, tz: f64) -> Self {
        DMat4::from_translation(DVec3::new(tx, ty, tz)).into()
    }

    pub fn scale(sx: f64, sy: f64, sz: f64) -> Self {
        DMat4::from_scale(DVec3::new(sx, sy, sz)).into()
    }

    /// Rotation about the X axis, angle in radians.
    pub fn rotation_x(radians: f64) -> Self {
        DMat4::from_rotation_x(radians).into()
    }

    pub fn rotation_y(radians: f64) -> Self {
        DMat4::from_rotation_y(radians).into()
    }

    pub fn rotation_z(radians: f64) -> Self {
        DMat4::from_rotation_z(radians).into()
    }

    pub fn elements(&self) -> &[f64; 16] {
        &self.elements
    }

    /// # Panics
    /// Panics when `row` or `col` is not in `0..4`.
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.elements[element_index(row, col)]
    }

    /// # Panics
    /// Panics when `row` or `col` is not in `0..4`.
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.elements[element_index(row, col)] = value;
    }

    /// Overwrites the translation column, leaving the rest untouched.
    pub fn set_translation(&mut self, tx: f64, ty: f64, tz: f64) {
        self.elements[3] = tx;
        self.elements[7] = ty;
        self.elements[11] = tz;
    }

    pub fn is_identity(&self) -> bool {
        self.elements == Self::IDENTITY.elements
    }

    #[inline(always)]
    fn transform_raw(&self, x: f64, y: f64, z: f64) -> (f64, f64, f64) {
        let e = &self.elements;
        let ox = e[0] * x + e[1] * y + e[2] * z + e[3];
        let oy = e[4] * x + e[5] * y + e[6] * z + e[7];
        let oz = e[8] * x + e[9] * y + e[10] * z + e[11];
        let w = e[12] * x + e[13] * y + e[14] * z + e[15];
        if needs_divide(w) {
            (ox / w, oy / w, oz / w)
        } else {
            (ox, oy, oz)
        }
    }

    /// Transforms raw coordinates.
    pub fn transform_xyz(&self, x: f64, y: f64, z: f64) -> (f64, f64, f64) {
        self.transform_raw(x, y, z)
    }

    pub fn apply_one(&self, v: Vector3D) -> Vector3D {
        let (x, y, z) = self.transform_raw(v.x, v.y, v.z);
        Vector3D::new(x, y, z)
    }

    /// Transforms `count` interleaved points from `input` into `output`.
    ///
    /// Full lanes of `scratch.lanes()` points go through the SoA scratch rows,
    /// the remainder through the scalar path. Both evaluate the same expressions
    /// in the same order, so results are bit-identical to [`Self::apply_one`].
    /// Returns the number of points actually written (clamped to both slices).
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
        let e = &self.elements;

        for (src, dst) in input[..full * 3]
            .chunks_exact(lanes * 3)
            .zip(output[..full * 3].chunks_exact_mut(lanes * 3))
        {
            scratch.gather(src);
            for k in 0..lanes {
                scratch.out_x[k] = e[0] * scratch.x[k] + e[1] * scratch.y[k] + e[2] * scratch.z[k] + e[3];
            }
            for k in 0..lanes {
                scratch.out_y[k] = e[4] * scratch.x[k] + e[5] * scratch.y[k] + e[6] * scratch.z[k] + e[7];
            }
            for k in 0..lanes {
                scratch.out_z[k] = e[8] * scratch.x[k] + e[9] * scratch.y[k] + e[10] * scratch.z[k] + e[11];
            }
            for k in 0..lanes {
                scratch.out_w[k] = e[12] * scratch.x[k] + e[13] * scratch.y[k] + e[14] * scratch.z[k] + e[15];
            }
            for k in 0..lanes {
                let w = scratch.out_w[k];
                if needs_divide(w) {
                    scratch.out_x[k] /= w;
                    scratch.out_y[k] /= w;
                    scratch.out_z[k] /= w;
                }
            }
            scratch.scatter(dst);
        }

        for (src, dst) in input[full * 3..count * 3]
            .chunks_exact(3)
            .zip(output[full * 3..count * 3].chunks_exact_mut(3))
        {
            let (x, y, z) = self.transform_raw(src[0], src[1], src[2]);
            dst[0] = x;
            dst[1] = y;
            dst[2] = z;
        }
        count
    }
}

#[inline]
fn element_index(row: usize, col: usize) -> usize {
    assert!(row < 4 && col < 4, "matrix index ({}, {}) out of range", row, col);
    row * 4 + col
}

#[inline(always)]
fn needs_divide(w: f64) -> bool {
    w.abs() > W_EPSILON && (w - 1.0).abs() > W_EPSILON
}

impl From<DMat4> for Matrix4x4 {
    fn from(m: DMat4) -> Self {
        // glam is column-major; its transpose's columns are our rows.
        Self {
            elements: m.transpose().to_cols_array(),
        }
    }
}

impl From<Matrix4x4> for DMat4 {
    fn from(m: Matrix4x4) -> Self {
        DMat4::from_cols_array(&m.elements).transpose()
    }
}

/// `a * b` applies `b` first, then `a`.
impl Mul for Matrix4x4 {
    type Output = Matrix4x4;

    fn mul(self, rhs: Matrix4x4) -> Matrix4x4 {
        (DMat4::from(self) * DMat4::from(rhs)).into()
    }
}

//! Offline precision gate for the batched projection kernels.
//!
//! Compares [`Projector::apply_batch`] against a reference evaluation written
//! out point by point. Used from tests and CI; never on the render path.

use crate::buffer::SpatialBuffer;
use crate::geometry::{Matrix4x4, Projector, Vector3D};
use crate::simd::{max_axis_deviation, LaneScratch};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};

/// Maximum tolerated per-axis deviation between batch and reference.
pub const PRECISION_THRESHOLD: f64 = 1e-9;

/// Edge-value mix the audit samples are drawn from.
const SEEDS: [f64; 12] = [
    -1e9, -1e6, -1e3, -1.0, -1e-6, 0.0, 1e-12, 1e-6, 1.0, 1e3, 1e6, 1e9,
];

const UNIT_CUBE: [[f64; 3]; 8] = [
    [-1.0, -1.0, -1.0],
    [1.0, -1.0, -1.0],
    [1.0, 1.0, -1.0],
    [-1.0, 1.0, -1.0],
    [-1.0, -1.0, 1.0],
    [1.0, -1.0, 1.0],
    [1.0, 1.0, 1.0],
    [-1.0, 1.0, 1.0],
];

const TETRAHEDRON: [[f64; 3]; 4] = [
    [1.0, 1.0, 1.0],
    [-1.0, -1.0, 1.0],
    [-1.0, 1.0, -1.0],
    [1.0, -1.0, -1.0],
];

/// Per-axis maximum absolute deviation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PrecisionAudit {
    pub max_delta_x: f64,
    pub max_delta_y: f64,
    pub max_delta_z: f64,
}

impl PrecisionAudit {
    pub fn max_delta(&self) -> f64 {
        self.max_delta_x.max(self.max_delta_y).max(self.max_delta_z)
    }

    pub fn passes(&self) -> bool {
        self.max_delta() <= PRECISION_THRESHOLD
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ValidationStatus {
    Pass,
    Fail,
}

impl fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationStatus::Pass => f.write_str("PASS"),
            ValidationStatus::Fail => f.write_str("FAIL"),
        }
    }
}

/// Result of a named scenario. `Display` renders the line-oriented CI format.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub scenario: String,
    pub points: usize,
    pub lanes: usize,
    pub max_delta_x: f64,
    pub max_delta_y: f64,
    pub max_delta_z: f64,
    pub threshold: f64,
    pub status: ValidationStatus,
}

impl ValidationReport {
    pub fn passed(&self) -> bool {
        self.status == ValidationStatus::Pass
    }

    pub fn to_json(&self) -> eyre::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "SpatialValidationReport")?;
        writeln!(f, "scenario={}", self.scenario)?;
        writeln!(f, "points={}", self.points)?;
        writeln!(f, "lanes={}", self.lanes)?;
        writeln!(f, "maxDeltaX={:e}", self.max_delta_x)?;
        writeln!(f, "maxDeltaY={:e}", self.max_delta_y)?;
        writeln!(f, "maxDeltaZ={:e}", self.max_delta_z)?;
        writeln!(f, "threshold={:e}", self.threshold)?;
        write!(f, "status={}", self.status)
    }
}

/// A projector configuration to validate by name.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub projector: Projector,
    pub points: usize,
}

impl Scenario {
    pub fn new(name: impl Into<String>, projector: Projector, points: usize) -> Self {
        Self {
            name: name.into(),
            projector,
            points,
        }
    }
}

/// Wall-clock comparison of per-point and batched matrix application.
#[derive(Clone, Copy, Debug)]
pub struct PerformanceAudit {
    pub points: usize,
    pub iterations: usize,
    pub per_point: Duration,
    pub batched: Duration,
}

impl PerformanceAudit {
    pub fn speedup(&self) -> f64 {
        self.per_point.as_secs_f64() / self.batched.as_secs_f64().max(f64::MIN_POSITIVE)
    }
}

/// Interleaved audit samples: `x = S[i % 12]`, `y = S[(i + 3) % 12]`, `z = S[(i + 5) % 12]`.
pub fn seed_points(count: usize) -> Vec<f64> {
    let n = SEEDS.len();
    (0..count)
        .flat_map(|i| [SEEDS[i % n], SEEDS[(i + 3) % n], SEEDS[(i + 5) % n]])
        .collect()
}

/// Reference projection, evaluated one point at a time from the projector parameters.
fn reference_project(projector: &Projector, p: [f64; 3]) -> [f64; 3] {
    let [x, y, z] = p;
    match projector {
        Projector::Orthographic(o) => [o.center_x + x * o.scale, o.center_y - y * o.scale, z],
        Projector::Perspective(q) => {
            let d = z + q.z_bias;
            let f = q.scale / d;
            [q.center_x + x * f, q.center_y - y * f, d]
        }
    }
}

fn audit_points(projector: &Projector, input: &[f64], scratch: &mut LaneScratch) -> PrecisionAudit {
    let count = input.len() / 3;
    let mut batched = vec![0.0; input.len()];
    projector.apply_batch(input, &mut batched, count, scratch);

    let points: &[[f64; 3]] = bytemuck::cast_slice(input);
    let reference: Vec<f64> = points
        .iter()
        .flat_map(|&p| reference_project(projector, p))
        .collect();

    let [dx, dy, dz] = max_axis_deviation(&batched, &reference, count);
    PrecisionAudit {
        max_delta_x: dx,
        max_delta_y: dy,
        max_delta_z: dz,
    }
}

/// Audits `point_count` seed samples with the hardware lane width.
pub fn precision_audit(projector: &Projector, point_count: usize) -> eyre::Result<PrecisionAudit> {
    precision_audit_with(projector, point_count, &mut LaneScratch::for_hardware())
}

pub fn precision_audit_with(
    projector: &Projector,
    point_count: usize,
    scratch: &mut LaneScratch,
) -> eyre::Result<PrecisionAudit> {
    eyre::ensure!(point_count > 0, "precision audit needs at least one point");
    Ok(audit_points(projector, &seed_points(point_count), scratch))
}

/// Fails when any axis deviates by more than [`PRECISION_THRESHOLD`].
pub fn validate_precision_gate(projector: &Projector, point_count: usize) -> eyre::Result<()> {
    let audit = precision_audit(projector, point_count)?;
    if !audit.passes() {
        tracing::warn!("Precision gate failed: {:?}", audit);
        eyre::bail!(
            "precision gate failed: maxDelta={:e} threshold={:e}",
            audit.max_delta(),
            PRECISION_THRESHOLD
        );
    }
    Ok(())
}

pub fn validation_report(
    scenario: &str,
    projector: &Projector,
    point_count: usize,
) -> eyre::Result<ValidationReport> {
    let mut scratch = LaneScratch::for_hardware();
    let lanes = scratch.lanes();
    let audit = precision_audit_with(projector, point_count, &mut scratch)?;
    Ok(ValidationReport {
        scenario: scenario.to_string(),
        points: point_count,
        lanes,
        max_delta_x: audit.max_delta_x,
        max_delta_y: audit.max_delta_y,
        max_delta_z: audit.max_delta_z,
        threshold: PRECISION_THRESHOLD,
        status: if audit.passes() {
            ValidationStatus::Pass
        } else {
            ValidationStatus::Fail
        },
    })
}

/// Reports for several scenarios, computed in parallel, in input order.
pub fn validate_scenarios(scenarios: &[Scenario]) -> eyre::Result<Vec<ValidationReport>> {
    scenarios
        .par_iter()
        .map(|s| validation_report(&s.name, &s.projector, s.points))
        .collect()
}

fn validate_shape(projector: &Projector, shape: &[[f64; 3]], name: &str) -> eyre::Result<()> {
    for &p in shape {
        let v = projector.apply_one(Vector3D::from_array(p));
        eyre::ensure!(
            v.x.is_finite() && v.y.is_finite(),
            "{}: non-finite projection for {:?}",
            name,
            p
        );
    }
    let input: &[f64] = bytemuck::cast_slice(shape);
    let audit = audit_points(projector, input, &mut LaneScratch::for_hardware());
    eyre::ensure!(
        audit.passes(),
        "{}: batch projection mismatch (maxDelta={:e})",
        name,
        audit.max_delta()
    );
    Ok(())
}

/// Projects the eight corners of `[-1, 1]^3` and checks finiteness and batch agreement.
pub fn validate_unit_cube(projector: &Projector) -> eyre::Result<()> {
    validate_shape(projector, &UNIT_CUBE, "unit cube")
}

pub fn validate_tetrahedron(projector: &Projector) -> eyre::Result<()> {
    validate_shape(projector, &TETRAHEDRON, "tetrahedron")
}

/// Times `iterations` passes of an identity transform over 10,000 points,
/// once per point and once batched.
pub fn performance_audit(iterations: usize) -> PerformanceAudit {
    const POINTS: usize = 10_000;
    let mut buffer = SpatialBuffer::new(POINTS);
    for i in 0..POINTS {
        let t = i as f64;
        buffer.set_point(i, t * 0.001, t * 0.002, t * 0.003);
    }
    let m = Matrix4x4::identity();

    let start = Instant::now();
    {
        let (input, output, _) = buffer.stage_mut();
        for _ in 0..iterations {
            for (src, dst) in input.chunks_exact(3).zip(output.chunks_exact_mut(3)) {
                let (x, y, z) = m.transform_xyz(src[0], src[1], src[2]);
                dst[0] = x;
                dst[1] = y;
                dst[2] = z;
            }
        }
    }
    let per_point = start.elapsed();

    let start = Instant::now();
    {
        let (input, output, scratch) = buffer.stage_mut();
        for _ in 0..iterations {
            m.apply_batch(input, output, POINTS, scratch);
        }
    }
    let batched = start.elapsed();

    tracing::debug!(
        "Performance audit: per_point={:?} batched={:?} over {} iterations",
        per_point,
        batched,
        iterations
    );
    PerformanceAudit {
        points: POINTS,
        iterations,
        per_point,
        batched,
    }
}

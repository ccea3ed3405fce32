use crate::geometry::{Matrix4x4, Projector, DEFAULT_FIT_RATIO};
use crate::mapper::ZMode;
use crate::path::{ClippingMode, DepthMode};
use eyre::WrapErr;
use serde::{Deserialize, Serialize};

/// Which rectangle the optimizer's bounds filter tests against.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundsSpace {
    /// No bounds filtering.
    #[default]
    None,
    /// The visible data domain of the plot context.
    Domain,
    /// The pixel rectangle of the plot context.
    Pixels,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepthDampingMode {
    #[default]
    Linear,
    Exponential,
}

/// Grows the distance threshold with depth: `scale = 1 + depth_scale * t`,
/// `t = clamp((z - near) / (far - near), 0, 1)`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DepthAttenuation {
    pub near: f64,
    pub far: f64,
    pub scale: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DepthDamping {
    /// Extra multiplier `1 + factor * m(t)`; values <= 0 disable damping.
    pub factor: f64,
    #[serde(default)]
    pub mode: DepthDampingMode,
}

/// Point-thinning settings applied to each chunk before transformation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    pub bounds: BoundsSpace,
    /// Uniform minimum distance between retained points (0 disables).
    pub min_pixel_distance: f64,
    /// Per-axis minimum distances; overrides `min_pixel_distance` when set.
    pub min_pixel_distance_xy: Option<[f64; 2]>,
    /// Keep local y extrema even when they fall below the distance threshold.
    pub preserve_peaks: bool,
    pub depth_attenuation: Option<DepthAttenuation>,
    pub depth_damping: Option<DepthDamping>,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            bounds: BoundsSpace::None,
            min_pixel_distance: 0.0,
            min_pixel_distance_xy: None,
            preserve_peaks: true,
            depth_attenuation: None,
            depth_damping: None,
        }
    }
}

/// Serializable description of a spatial layer's pipeline.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SpatialConfig {
    /// Points per chunk; must be at least 1.
    pub capacity: usize,
    /// Pins the batch lane width (1..=8); probed from the CPU when absent.
    pub lanes: Option<usize>,
    pub z_mode: ZMode,
    /// Row-major model transform applied before projection.
    pub transform: Option<Matrix4x4>,
    pub projector: Option<Projector>,
    /// Re-center and re-scale the projector from the plot bounds on every render.
    pub fit_to_viewport: bool,
    pub fit_ratio: f64,
    pub clipping: ClippingMode,
    pub z_min: f64,
    pub depth_mode: DepthMode,
    pub optimizer: Option<OptimizerConfig>,
}

impl Default for SpatialConfig {
    fn default() -> Self {
        Self {
            capacity: 256,
            lanes: None,
            z_mode: ZMode::Constant(0.0),
            transform: None,
            projector: None,
            fit_to_viewport: true,
            fit_ratio: DEFAULT_FIT_RATIO,
            clipping: ClippingMode::Clip,
            z_min: 0.0,
            depth_mode: DepthMode::Layered,
            optimizer: None,
        }
    }
}

impl SpatialConfig {
    pub fn from_json(json: &str) -> eyre::Result<Self> {
        let config: SpatialConfig =
            serde_json::from_str(json).wrap_err("failed to parse spatial config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> eyre::Result<String> {
        serde_json::to_string_pretty(self).wrap_err("failed to serialize spatial config")
    }

    pub fn validate(&self) -> eyre::Result<()> {
        eyre::ensure!(self.capacity >= 1, "capacity must be at least 1");
        eyre::ensure!(
            !matches!(self.z_mode, ZMode::Custom(_)),
            "custom z mode cannot be described by a config"
        );
        if let Some(lanes) = self.lanes {
            eyre::ensure!(
                (1..=crate::simd::MAX_LANES).contains(&lanes),
                "lanes must be in 1..={}, got {}",
                crate::simd::MAX_LANES,
                lanes
            );
        }
        eyre::ensure!(self.fit_ratio.is_finite(), "fit_ratio must be finite");
        Ok(())
    }
}

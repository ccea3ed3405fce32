//! gpui_chart_spatial: projection and path batching for 3D chart layers

pub mod buffer;
pub mod data_types;
pub mod geometry;
pub mod hit;
pub mod layer;
pub mod mapper;
pub mod optimizer;
pub mod path;
pub mod simd;
pub mod validator;

#[cfg(feature = "polars")]
pub mod polars_source;
#[cfg(feature = "gpui")]
pub mod rendering;

pub use buffer::SpatialBuffer;
pub use data_types::{AxisDomain, PlotBounds, PlotContext, SpatialConfig, SpatialDataSource, VecDataSource};
pub use geometry::{Matrix4x4, OrthographicProjector, PerspectiveProjector, Projector, Vector3D};
pub use hit::{CoordSpace, HitDetector};
pub use layer::{SpatialLayer, SpatialPipeline};
pub use mapper::{ChunkConsumer, SpatialDataMapper, ZMode};
pub use optimizer::SpatialOptimizer;
pub use path::{
    ClippingMode, DepthAwareBatchConsumer, DepthMode, PathCommand, SpatialPathBatch,
    SpatialPathBatchBuilder,
};
pub use simd::{lane_width, LaneScratch};

//! Per-layer pipeline ownership.
//!
//! A [`SpatialPipeline`] bundles every reusable object one layer needs
//! (mapper, buffer, transform, projector, depth consumer and builder).
//! [`SpatialLayer`] puts it behind a mutex so a renderer holding `&self` can
//! drive it once per frame.

use crate::buffer::SpatialBuffer;
use crate::data_types::{PlotContext, SpatialConfig, SpatialDataSource};
use crate::geometry::{Matrix4x4, Projector, DEFAULT_FIT_RATIO};
use crate::mapper::{SpatialDataMapper, ZMode};
use crate::optimizer::SpatialOptimizer;
use crate::path::{
    DepthAwareBatchConsumer, DepthMode, SpatialPathBatch, SpatialPathBatchBuilder,
};
use parking_lot::Mutex;

#[derive(Clone, Debug)]
pub struct SpatialPipeline {
    mapper: SpatialDataMapper,
    buffer: SpatialBuffer,
    transform: Option<Matrix4x4>,
    projector: Option<Projector>,
    fit_to_viewport: bool,
    fit_ratio: f64,
    consumer: DepthAwareBatchConsumer,
}

impl SpatialPipeline {
    /// # Panics
    /// Panics when `capacity` is 0.
    pub fn new(capacity: usize) -> Self {
        Self::with_buffer(SpatialBuffer::new(capacity))
    }

    pub fn with_buffer(buffer: SpatialBuffer) -> Self {
        Self {
            mapper: SpatialDataMapper::default(),
            buffer,
            transform: None,
            projector: None,
            fit_to_viewport: true,
            fit_ratio: DEFAULT_FIT_RATIO,
            consumer: DepthAwareBatchConsumer::new(SpatialPathBatchBuilder::new()),
        }
    }

    pub fn from_config(config: &SpatialConfig) -> eyre::Result<Self> {
        config.validate()?;
        let buffer = match config.lanes {
            Some(lanes) => SpatialBuffer::with_lanes(config.capacity, lanes),
            None => SpatialBuffer::try_new(config.capacity)?,
        };
        let builder = SpatialPathBatchBuilder::new()
            .with_z_min(config.z_min)
            .with_clipping(config.clipping);

        let mut mapper = SpatialDataMapper::new(config.z_mode.clone());
        if let Some(optimizer) = config.optimizer.as_ref() {
            mapper = mapper.with_optimizer(SpatialOptimizer::from_config(optimizer));
        }

        tracing::debug!(
            "Spatial pipeline configured: capacity={} lanes={} projector={:?} depth={:?}",
            config.capacity,
            buffer.lanes(),
            config.projector,
            config.depth_mode
        );

        Ok(Self {
            mapper,
            buffer,
            transform: config.transform,
            projector: config.projector,
            fit_to_viewport: config.fit_to_viewport,
            fit_ratio: config.fit_ratio,
            consumer: DepthAwareBatchConsumer::with_policy(builder, config.depth_mode),
        })
    }

    pub fn with_z_mode(mut self, z_mode: ZMode) -> Self {
        self.mapper.set_z_mode(z_mode);
        self
    }

    pub fn with_transform(mut self, transform: Matrix4x4) -> Self {
        self.transform = Some(transform);
        self
    }

    pub fn with_projector(mut self, projector: Projector) -> Self {
        self.projector = Some(projector);
        self
    }

    pub fn with_depth_mode(mut self, mode: DepthMode) -> Self {
        self.consumer.set_policy(mode);
        self
    }

    pub fn with_fit_to_viewport(mut self, fit: bool) -> Self {
        self.fit_to_viewport = fit;
        self
    }

    pub fn set_transform(&mut self, transform: Option<Matrix4x4>) {
        self.transform = transform;
    }

    pub fn set_projector(&mut self, projector: Option<Projector>) {
        self.projector = projector;
    }

    pub fn projector(&self) -> Option<&Projector> {
        self.projector.as_ref()
    }

    pub fn mapper_mut(&mut self) -> &mut SpatialDataMapper {
        &mut self.mapper
    }

    pub fn buffer(&self) -> &SpatialBuffer {
        &self.buffer
    }

    pub fn buffer_mut(&mut self) -> &mut SpatialBuffer {
        &mut self.buffer
    }

    pub fn builder_mut(&mut self) -> &mut SpatialPathBatchBuilder {
        self.consumer.builder_mut()
    }

    pub fn batch(&self) -> &SpatialPathBatch {
        self.consumer.builder().batch()
    }

    /// Rebuilds the batch from the whole source.
    pub fn process<S>(&mut self, source: &S, context: Option<&PlotContext>) -> &SpatialPathBatch
    where
        S: SpatialDataSource + ?Sized,
    {
        self.consumer.reset();
        self.consumer.builder_mut().reset();

        let fit_context = context.filter(|_| self.fit_to_viewport);
        match (fit_context, self.projector.as_mut()) {
            (Some(ctx), Some(projector)) => {
                self.mapper.map_all_projected_in(
                    source,
                    &mut self.buffer,
                    self.transform.as_ref(),
                    projector,
                    ctx,
                    self.fit_ratio,
                    &mut self.consumer,
                );
            }
            (_, projector) => {
                self.mapper.map_all_projected(
                    source,
                    &mut self.buffer,
                    self.transform.as_ref(),
                    projector.as_deref(),
                    &mut self.consumer,
                );
            }
        }
        self.consumer.flush().batch()
    }

    /// Builds a batch from the unconsumed ring samples only. The path state is
    /// kept so consecutive deltas join up.
    pub fn process_ring_delta(&mut self) -> &SpatialPathBatch {
        self.consumer.reset();
        self.consumer.builder_mut().clear_batch();
        self.mapper.map_ring_delta_projected(
            &mut self.buffer,
            self.transform.as_ref(),
            self.projector.as_ref(),
            &mut self.consumer,
        );
        self.consumer.flush().batch()
    }

    pub fn write_ring(&mut self, x: f64, y: f64, z: f64) {
        self.buffer.write_ring(x, y, z);
    }
}

/// Shareable handle over a [`SpatialPipeline`].
#[derive(Debug)]
pub struct SpatialLayer {
    pipeline: Mutex<SpatialPipeline>,
}

impl SpatialLayer {
    pub fn new(pipeline: SpatialPipeline) -> Self {
        Self {
            pipeline: Mutex::new(pipeline),
        }
    }

    pub fn from_config(config: &SpatialConfig) -> eyre::Result<Self> {
        Ok(Self::new(SpatialPipeline::from_config(config)?))
    }

    /// Streams `source` through the pipeline and hands the finished batch to `paint`.
    pub fn render<S, F, R>(&self, source: &S, context: Option<&PlotContext>, paint: F) -> R
    where
        S: SpatialDataSource + ?Sized,
        F: FnOnce(&SpatialPathBatch) -> R,
    {
        let mut pipeline = self.pipeline.lock();
        paint(pipeline.process(source, context))
    }

    pub fn render_ring_delta<F, R>(&self, paint: F) -> R
    where
        F: FnOnce(&SpatialPathBatch) -> R,
    {
        let mut pipeline = self.pipeline.lock();
        paint(pipeline.process_ring_delta())
    }

    pub fn write_ring(&self, x: f64, y: f64, z: f64) {
        self.pipeline.lock().write_ring(x, y, z);
    }

    /// Forces the next ring delta to cover the whole retained window.
    pub fn invalidate_ring(&self) {
        let mut pipeline = self.pipeline.lock();
        pipeline.buffer_mut().reset_ring_delta_cursor();
        pipeline.builder_mut().reset_path_state();
    }

    pub fn with_pipeline<R>(&self, f: impl FnOnce(&mut SpatialPipeline) -> R) -> R {
        f(&mut self.pipeline.lock())
    }
}

//! Streams a data source through fixed-capacity [`SpatialBuffer`] chunks.
//!
//! Each chunk is filled with interleaved xyz (z derived by a [`ZMode`]),
//! optionally thinned, transformed and projected, then handed to a
//! [`ChunkConsumer`]. Consumers always read the chunk from `buffer.input()`;
//! the output array is stage scratch.

use crate::buffer::SpatialBuffer;
use crate::data_types::{PlotContext, SpatialDataSource};
use crate::geometry::{Matrix4x4, Projector};
use crate::optimizer::SpatialOptimizer;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Caller-supplied depth function of `(index, x, y, weight)`.
pub type ZFunction = Arc<dyn Fn(usize, f64, f64, f64) -> f64 + Send + Sync>;

/// How the third coordinate is derived for 2D sources.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "mode", content = "value", rename_all = "snake_case")]
pub enum ZMode {
    Constant(f64),
    /// Global point index (chunk offset + local index).
    FromIndex,
    FromY,
    /// Source weights; missing weights read as 0.
    FromWeight,
    #[serde(skip)]
    Custom(ZFunction),
}

impl Default for ZMode {
    fn default() -> Self {
        ZMode::Constant(0.0)
    }
}

impl fmt::Debug for ZMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ZMode::Constant(v) => f.debug_tuple("Constant").field(v).finish(),
            ZMode::FromIndex => f.write_str("FromIndex"),
            ZMode::FromY => f.write_str("FromY"),
            ZMode::FromWeight => f.write_str("FromWeight"),
            ZMode::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl ZMode {
    pub fn custom(f: impl Fn(usize, f64, f64, f64) -> f64 + Send + Sync + 'static) -> Self {
        ZMode::Custom(Arc::new(f))
    }

    fn uses_weights(&self) -> bool {
        matches!(self, ZMode::FromWeight | ZMode::Custom(_))
    }

    #[inline]
    fn z_for(&self, index: usize, x: f64, y: f64, weights: Option<&[f64]>) -> f64 {
        match self {
            ZMode::Constant(v) => *v,
            ZMode::FromIndex => index as f64,
            ZMode::FromY => y,
            ZMode::FromWeight => weight_at(weights, index),
            ZMode::Custom(f) => f(index, x, y, weight_at(weights, index)),
        }
    }
}

#[inline]
fn weight_at(weights: Option<&[f64]>, index: usize) -> f64 {
    weights.and_then(|w| w.get(index)).copied().unwrap_or(0.0)
}

/// Receives each processed chunk. The first `count` points of
/// `buffer.input()` are valid for the duration of the call.
pub trait ChunkConsumer {
    fn accept(&mut self, buffer: &SpatialBuffer, count: usize);
}

impl<F> ChunkConsumer for F
where
    F: FnMut(&SpatialBuffer, usize),
{
    fn accept(&mut self, buffer: &SpatialBuffer, count: usize) {
        (*self)(buffer, count)
    }
}

#[derive(Clone, Debug, Default)]
pub struct SpatialDataMapper {
    z_mode: ZMode,
    optimizer: Option<SpatialOptimizer>,
}

impl SpatialDataMapper {
    pub fn new(z_mode: ZMode) -> Self {
        Self {
            z_mode,
            optimizer: None,
        }
    }

    pub fn with_optimizer(mut self, optimizer: SpatialOptimizer) -> Self {
        self.optimizer = Some(optimizer);
        self
    }

    pub fn z_mode(&self) -> &ZMode {
        &self.z_mode
    }

    pub fn set_z_mode(&mut self, z_mode: ZMode) {
        self.z_mode = z_mode;
    }

    pub fn optimizer(&self) -> Option<&SpatialOptimizer> {
        self.optimizer.as_ref()
    }

    pub fn set_optimizer(&mut self, optimizer: Option<SpatialOptimizer>) {
        self.optimizer = optimizer;
    }

    /// Points that can actually be read: `min(len, x.len(), y.len())`.
    pub fn point_count<S: SpatialDataSource + ?Sized>(&self, source: &S) -> usize {
        source.readable_len()
    }

    /// `ceil(point_count / capacity)`.
    pub fn chunk_count<S: SpatialDataSource + ?Sized>(
        &self,
        source: &S,
        buffer: &SpatialBuffer,
    ) -> usize {
        self.point_count(source).div_ceil(buffer.capacity())
    }

    /// Writes up to `count` points starting at `start` into the buffer input.
    /// Returns the number written (bounded by capacity and the readable length).
    pub fn map_range<S: SpatialDataSource + ?Sized>(
        &self,
        source: &S,
        start: usize,
        count: usize,
        buffer: &mut SpatialBuffer,
    ) -> usize {
        let available = self.point_count(source);
        if start >= available {
            return 0;
        }
        let n = count.min(buffer.capacity()).min(available - start);
        let xs = &source.x_data()[start..start + n];
        let ys = &source.y_data()[start..start + n];
        let weights = if self.z_mode.uses_weights() {
            source.weight_data()
        } else {
            None
        };

        let out = &mut buffer.input_mut()[..n * 3];
        for (i, ((dst, &x), &y)) in out.chunks_exact_mut(3).zip(xs).zip(ys).enumerate() {
            let index = start + i;
            dst[0] = x;
            dst[1] = y;
            dst[2] = self.z_mode.z_for(index, x, y, weights);
        }
        n
    }

    /// Streams the whole source in capacity-sized chunks without transforming it.
    pub fn map_all<S, C>(&mut self, source: &S, buffer: &mut SpatialBuffer, consumer: &mut C)
    where
        S: SpatialDataSource + ?Sized,
        C: ChunkConsumer + ?Sized,
    {
        let total = self.begin_stream(source);
        let capacity = buffer.capacity();
        let mut offset = 0;
        while offset < total {
            let written = self.map_range(source, offset, capacity, buffer);
            tracing::trace!("Mapped chunk offset={} count={}", offset, written);
            if written > 0 {
                consumer.accept(buffer, written);
            }
            offset += capacity;
        }
    }

    /// Streams the source through optional transform and projector stages.
    pub fn map_all_projected<S, C>(
        &mut self,
        source: &S,
        buffer: &mut SpatialBuffer,
        transform: Option<&Matrix4x4>,
        projector: Option<&Projector>,
        consumer: &mut C,
    ) where
        S: SpatialDataSource + ?Sized,
        C: ChunkConsumer + ?Sized,
    {
        self.stream_projected(source, buffer, transform, projector, None, consumer);
    }

    /// Like [`Self::map_all_projected`], first fitting the projector to the
    /// plot bounds (`fit_ratio` of the shorter side, centered). The context also
    /// drives the optimizer's bounds filter: domain bounds before the stages,
    /// pixel bounds after projection.
    #[allow(clippy::too_many_arguments)]
    pub fn map_all_projected_in<S, C>(
        &mut self,
        source: &S,
        buffer: &mut SpatialBuffer,
        transform: Option<&Matrix4x4>,
        projector: &mut Projector,
        context: &PlotContext,
        fit_ratio: f64,
        consumer: &mut C,
    ) where
        S: SpatialDataSource + ?Sized,
        C: ChunkConsumer + ?Sized,
    {
        projector.fit_to_viewport(&context.bounds, fit_ratio);
        self.stream_projected(source, buffer, transform, Some(&*projector), Some(context), consumer);
    }

    fn stream_projected<S, C>(
        &mut self,
        source: &S,
        buffer: &mut SpatialBuffer,
        transform: Option<&Matrix4x4>,
        projector: Option<&Projector>,
        context: Option<&PlotContext>,
        consumer: &mut C,
    ) where
        S: SpatialDataSource + ?Sized,
        C: ChunkConsumer + ?Sized,
    {
        let total = self.begin_stream(source);
        let capacity = buffer.capacity();
        let mut offset = 0;
        while offset < total {
            let mapped = self.map_range(source, offset, capacity, buffer);
            let mut written = self.filter_domain(buffer, mapped, context);
            if written > 0 {
                run_stages(buffer, written, transform, projector);
                written = self.optimize(buffer, written, context);
            }
            tracing::trace!(
                "Projected chunk offset={} mapped={} kept={}",
                offset,
                mapped,
                written
            );
            if written > 0 {
                consumer.accept(buffer, written);
            }
            offset += capacity;
        }
    }

    /// Streams only the unconsumed ring samples (oldest first) through the
    /// stages, then marks them consumed. Returns the number of samples delivered.
    pub fn map_ring_delta_projected<C>(
        &mut self,
        buffer: &mut SpatialBuffer,
        transform: Option<&Matrix4x4>,
        projector: Option<&Projector>,
        consumer: &mut C,
    ) -> usize
    where
        C: ChunkConsumer + ?Sized,
    {
        if !buffer.is_ring_enabled() {
            return 0;
        }
        let delta = buffer.ring_delta_count();
        if delta == 0 {
            return 0;
        }
        let start = buffer.ring_delta_start();
        let loaded = buffer.load_ring_window(start, delta);
        if let Some(optimizer) = self.optimizer.as_mut() {
            optimizer.reset();
        }
        run_stages(buffer, loaded, transform, projector);
        let written = self.optimize(buffer, loaded, None);
        if written > 0 {
            consumer.accept(buffer, written);
        }
        buffer.consume_ring_delta();
        written
    }

    fn begin_stream<S: SpatialDataSource + ?Sized>(&mut self, source: &S) -> usize {
        let total = self.point_count(source);
        if source.len() > total {
            tracing::warn!(
                "Data source reports {} points but only {} are readable",
                source.len(),
                total
            );
        }
        if let Some(optimizer) = self.optimizer.as_mut() {
            optimizer.reset();
        }
        total
    }

    fn filter_domain(
        &self,
        buffer: &mut SpatialBuffer,
        count: usize,
        context: Option<&PlotContext>,
    ) -> usize {
        match self.optimizer.as_ref() {
            Some(optimizer) if count > 0 => optimizer.filter_domain(buffer.input_mut(), count, context),
            _ => count,
        }
    }

    /// Thins projected points in the buffer's input array.
    fn optimize(
        &mut self,
        buffer: &mut SpatialBuffer,
        count: usize,
        context: Option<&PlotContext>,
    ) -> usize {
        match self.optimizer.as_mut() {
            Some(optimizer) if count > 0 => optimizer.apply(buffer.input_mut(), count, context),
            _ => count,
        }
    }
}

/// input -> transform -> output -> project -> input. Missing stages copy.
fn run_stages(
    buffer: &mut SpatialBuffer,
    count: usize,
    transform: Option<&Matrix4x4>,
    projector: Option<&Projector>,
) {
    let n = count * 3;
    let (input, output, scratch) = buffer.stage_mut();
    match (transform, projector) {
        (None, None) => {}
        (Some(m), None) => {
            m.apply_batch(input, output, count, scratch);
            input[..n].copy_from_slice(&output[..n]);
        }
        (None, Some(p)) => {
            output[..n].copy_from_slice(&input[..n]);
            p.apply_batch(output, input, count, scratch);
        }
        (Some(m), Some(p)) => {
            m.apply_batch(input, output, count, scratch);
            p.apply_batch(output, input, count, scratch);
        }
    }
}

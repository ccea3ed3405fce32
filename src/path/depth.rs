use super::builder::SpatialPathBatchBuilder;
use crate::buffer::SpatialBuffer;
use crate::mapper::ChunkConsumer;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepthMode {
    /// Forward chunks immediately in submission order.
    #[default]
    Layered,
    /// Hold every point until `flush`, then forward farthest first.
    SortedBackToFront,
}

/// Supplies the depth mode; queried on every chunk and at flush.
pub trait DepthPolicy {
    fn mode(&self) -> DepthMode;
}

impl DepthPolicy for DepthMode {
    fn mode(&self) -> DepthMode {
        *self
    }
}

impl<F> DepthPolicy for F
where
    F: Fn() -> DepthMode,
{
    fn mode(&self) -> DepthMode {
        self()
    }
}

/// Chunk consumer in front of a [`SpatialPathBatchBuilder`] that can defer
/// and depth-sort points. Sorting is stable: equal depths keep submission order.
#[derive(Clone, Debug)]
pub struct DepthAwareBatchConsumer<P: DepthPolicy = DepthMode> {
    builder: SpatialPathBatchBuilder,
    policy: P,
    staged: Vec<f64>,
    sorted: Vec<f64>,
    order: Vec<usize>,
}

impl DepthAwareBatchConsumer<DepthMode> {
    pub fn new(builder: SpatialPathBatchBuilder) -> Self {
        Self::with_policy(builder, DepthMode::Layered)
    }
}

impl<P: DepthPolicy> DepthAwareBatchConsumer<P> {
    pub fn with_policy(builder: SpatialPathBatchBuilder, policy: P) -> Self {
        Self {
            builder,
            policy,
            staged: Vec::new(),
            sorted: Vec::new(),
            order: Vec::new(),
        }
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    pub fn set_policy(&mut self, policy: P) {
        self.policy = policy;
    }

    pub fn builder(&self) -> &SpatialPathBatchBuilder {
        &self.builder
    }

    pub fn builder_mut(&mut self) -> &mut SpatialPathBatchBuilder {
        &mut self.builder
    }

    /// Number of points waiting for `flush`.
    pub fn pending(&self) -> usize {
        self.staged.len() / 3
    }

    /// Drops pending points without forwarding them.
    pub fn reset(&mut self) {
        self.staged.clear();
    }

    /// Forwards all pending points, farthest (largest z) first.
    pub fn flush(&mut self) -> &mut SpatialPathBatchBuilder {
        let n = self.pending();
        if n == 0 {
            return &mut self.builder;
        }

        let staged = &self.staged;
        self.order.clear();
        self.order.extend(0..n);
        // `+ 0.0` folds -0.0 into 0.0 so signed zeros tie.
        self.order.sort_unstable_by(|&a, &b| {
            (staged[b * 3 + 2] + 0.0)
                .total_cmp(&(staged[a * 3 + 2] + 0.0))
                .then(a.cmp(&b))
        });

        self.sorted.clear();
        for &i in &self.order {
            self.sorted.extend_from_slice(&staged[i * 3..i * 3 + 3]);
        }
        tracing::debug!("Depth consumer flushed {} points back to front", n);

        self.builder.accept_coords(&self.sorted, n);
        self.staged.clear();
        &mut self.builder
    }

    pub fn into_builder(mut self) -> SpatialPathBatchBuilder {
        self.flush();
        self.builder
    }
}

impl<P: DepthPolicy> ChunkConsumer for DepthAwareBatchConsumer<P> {
    fn accept(&mut self, buffer: &SpatialBuffer, count: usize) {
        let count = count.min(buffer.capacity());
        if count == 0 {
            return;
        }
        match self.policy.mode() {
            DepthMode::Layered => self.builder.accept_coords(buffer.input(), count),
            DepthMode::SortedBackToFront => {
                self.staged.extend_from_slice(&buffer.input()[..count * 3]);
            }
        }
    }
}

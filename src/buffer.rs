//! Reusable per-pipeline coordinate storage.
//!
//! A [`SpatialBuffer`] owns two interleaved xyz arrays of `capacity` points
//! (`input` and `output`), the lane scratch used by batched kernels, and an
//! optional ring arena for sweep displays that keep the last N samples.

use crate::geometry::Vector3D;
use crate::simd::LaneScratch;

#[derive(Clone, Debug)]
pub struct SpatialBuffer {
    capacity: usize,
    input: Vec<f64>,
    output: Vec<f64>,
    scratch: LaneScratch,
    ring: Option<RingState>,
}

/// Ring bookkeeping. `start` is the physical slot of the oldest retained sample.
#[derive(Clone, Debug)]
struct RingState {
    coords: Vec<f64>,
    start: usize,
    count: usize,
    write_seq: u64,
    consumed_seq: u64,
}

impl RingState {
    fn new(capacity: usize) -> Self {
        Self {
            coords: vec![0.0; capacity * 3],
            start: 0,
            count: 0,
            write_seq: 0,
            consumed_seq: 0,
        }
    }

    fn clear(&mut self) {
        self.start = 0;
        self.count = 0;
        self.write_seq = 0;
        self.consumed_seq = 0;
    }
}

impl SpatialBuffer {
    /// Creates a buffer for `capacity` points with the hardware lane width.
    ///
    /// # Panics
    /// Panics when `capacity` is 0. Use [`SpatialBuffer::try_new`] for untrusted input.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "SpatialBuffer capacity must be > 0");
        Self::with_scratch(capacity, LaneScratch::for_hardware())
    }

    pub fn try_new(capacity: usize) -> eyre::Result<Self> {
        eyre::ensure!(capacity > 0, "SpatialBuffer capacity must be > 0");
        Ok(Self::with_scratch(capacity, LaneScratch::for_hardware()))
    }

    /// Creates a buffer whose batched kernels run `lanes` points per step (clamped to 1..=8).
    ///
    /// # Panics
    /// Panics when `capacity` is 0.
    pub fn with_lanes(capacity: usize, lanes: usize) -> Self {
        assert!(capacity > 0, "SpatialBuffer capacity must be > 0");
        Self::with_scratch(capacity, LaneScratch::new(lanes))
    }

    fn with_scratch(capacity: usize, scratch: LaneScratch) -> Self {
        Self {
            capacity,
            input: vec![0.0; capacity * 3],
            output: vec![0.0; capacity * 3],
            scratch,
            ring: None,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn lanes(&self) -> usize {
        self.scratch.lanes()
    }

    pub fn input(&self) -> &[f64] {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut [f64] {
        &mut self.input
    }

    pub fn output(&self) -> &[f64] {
        &self.output
    }

    pub fn output_mut(&mut self) -> &mut [f64] {
        &mut self.output
    }

    pub fn scratch_mut(&mut self) -> &mut LaneScratch {
        &mut self.scratch
    }

    /// Splits the buffer into (input, output, scratch) so a kernel can read one
    /// array and write the other.
    pub fn stage_mut(&mut self) -> (&mut [f64], &mut [f64], &mut LaneScratch) {
        (&mut self.input, &mut self.output, &mut self.scratch)
    }

    /// The first `count` input points as xyz triples.
    pub fn points(&self, count: usize) -> &[[f64; 3]] {
        let count = count.min(self.capacity);
        bytemuck::cast_slice(&self.input[..count * 3])
    }

    /// Writes one input point.
    ///
    /// # Panics
    /// Panics when `index >= capacity`.
    pub fn set_point(&mut self, index: usize, x: f64, y: f64, z: f64) {
        let base = index * 3;
        self.input[base] = x;
        self.input[base + 1] = y;
        self.input[base + 2] = z;
    }

    /// # Panics
    /// Panics when `index >= capacity`.
    pub fn point(&self, index: usize) -> Vector3D {
        let base = index * 3;
        Vector3D::new(self.input[base], self.input[base + 1], self.input[base + 2])
    }

    pub fn is_aligned_for_lanes(&self, lanes: usize) -> bool {
        lanes > 0 && self.capacity % lanes == 0
    }

    /// Largest multiple of `lanes` that fits in the capacity.
    pub fn aligned_point_count(&self, lanes: usize) -> usize {
        if lanes == 0 {
            return 0;
        }
        (self.capacity / lanes) * lanes
    }

    // --- Ring mode ---

    pub fn is_ring_enabled(&self) -> bool {
        self.ring.is_some()
    }

    /// Toggles ring mode. Changing the state clears the ring.
    pub fn set_ring_enabled(&mut self, enabled: bool) {
        match (enabled, self.ring.is_some()) {
            (true, false) => {
                tracing::debug!("Ring mode enabled (capacity {})", self.capacity);
                self.ring = Some(RingState::new(self.capacity));
            }
            (false, true) => self.ring = None,
            _ => {}
        }
    }

    pub fn reset_ring(&mut self) {
        if let Some(ring) = self.ring.as_mut() {
            ring.clear();
        }
    }

    /// Physical slot of the oldest retained sample.
    pub fn ring_start(&self) -> usize {
        self.ring.as_ref().map_or(0, |r| r.start)
    }

    pub fn ring_count(&self) -> usize {
        self.ring.as_ref().map_or(0, |r| r.count)
    }

    /// Appends a sample, dropping the oldest once the ring is full.
    /// Enables ring mode on first use. Returns the physical slot written.
    pub fn write_ring(&mut self, x: f64, y: f64, z: f64) -> usize {
        let capacity = self.capacity;
        let ring = self.ring.get_or_insert_with(|| {
            tracing::debug!("Ring mode enabled by write (capacity {})", capacity);
            RingState::new(capacity)
        });
        let index = if ring.count < capacity {
            let index = (ring.start + ring.count) % capacity;
            ring.count += 1;
            index
        } else {
            let index = ring.start;
            ring.start = (ring.start + 1) % capacity;
            index
        };
        let base = index * 3;
        ring.coords[base] = x;
        ring.coords[base + 1] = y;
        ring.coords[base + 2] = z;
        ring.write_seq += 1;
        index
    }

    /// Physical slot for a logical index (0 = oldest), or `None` when out of range.
    pub fn ring_physical_index(&self, local: usize) -> Option<usize> {
        let ring = self.ring.as_ref()?;
        (local < ring.count).then(|| (ring.start + local) % self.capacity)
    }

    /// Sample at a logical index (0 = oldest).
    pub fn ring_point(&self, local: usize) -> Option<Vector3D> {
        let index = self.ring_physical_index(local)?;
        let coords = &self.ring.as_ref()?.coords;
        let base = index * 3;
        Some(Vector3D::new(coords[base], coords[base + 1], coords[base + 2]))
    }

    /// Number of samples written since the last consume, capped at the capacity.
    pub fn ring_delta_count(&self) -> usize {
        let Some(ring) = self.ring.as_ref() else {
            return 0;
        };
        let delta = ring.write_seq.saturating_sub(ring.consumed_seq);
        delta.min(self.capacity as u64) as usize
    }

    /// Logical index of the first unconsumed sample.
    pub fn ring_delta_start(&self) -> usize {
        self.ring_count().saturating_sub(self.ring_delta_count())
    }

    pub fn consume_ring_delta(&mut self) {
        if let Some(ring) = self.ring.as_mut() {
            ring.consumed_seq = ring.write_seq;
        }
    }

    /// Marks the whole retained window as unconsumed again.
    pub fn reset_ring_delta_cursor(&mut self) {
        if let Some(ring) = self.ring.as_mut() {
            ring.consumed_seq = ring.write_seq.saturating_sub(ring.count as u64);
        }
    }

    /// Copies `count` ring samples starting at logical index `start` into the
    /// front of the input array, oldest first. Returns the number copied.
    pub fn load_ring_window(&mut self, start: usize, count: usize) -> usize {
        let Some(ring) = self.ring.as_ref() else {
            return 0;
        };
        let available = ring.count.saturating_sub(start);
        let count = count.min(available).min(self.capacity);
        let mut physical = (ring.start + start) % self.capacity;
        for dst in self.input[..count * 3].chunks_exact_mut(3) {
            let base = physical * 3;
            dst.copy_from_slice(&ring.coords[base..base + 3]);
            physical += 1;
            if physical == self.capacity {
                physical = 0;
            }
        }
        count
    }
}

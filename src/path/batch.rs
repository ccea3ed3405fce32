use crate::buffer::SpatialBuffer;
use std::ops::Range;

const DEFAULT_CAPACITY: usize = 256;

/// Drawing command produced from a batch.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PathCommand {
    MoveTo { x: f64, y: f64 },
    LineTo { x: f64, y: f64 },
}

/// Growable screen-space path: x/y arrays plus per-point visibility and
/// move-to bits. Capacity only grows; clearing keeps the storage.
#[derive(Clone, Debug)]
pub struct SpatialPathBatch {
    xs: Vec<f64>,
    ys: Vec<f64>,
    visible: Vec<u64>,
    move_to: Vec<u64>,
    point_count: usize,
}

impl Default for SpatialPathBatch {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl SpatialPathBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            xs: vec![0.0; capacity],
            ys: vec![0.0; capacity],
            visible: vec![0; mask_words(capacity)],
            move_to: vec![0; mask_words(capacity)],
            point_count: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.xs.len()
    }

    pub fn point_count(&self) -> usize {
        self.point_count
    }

    pub fn is_empty(&self) -> bool {
        self.point_count == 0
    }

    pub fn xs(&self) -> &[f64] {
        &self.xs[..self.point_count]
    }

    pub fn ys(&self) -> &[f64] {
        &self.ys[..self.point_count]
    }

    /// Drops all points, keeping capacity.
    pub fn clear(&mut self) {
        self.point_count = 0;
    }

    pub fn is_visible(&self, index: usize) -> bool {
        index < self.point_count && get_bit(&self.visible, index)
    }

    pub fn is_move_to(&self, index: usize) -> bool {
        index < self.point_count && get_bit(&self.move_to, index)
    }

    /// Grows storage to hold at least `required` points (`cap + cap / 2 + 1` steps).
    pub fn ensure_capacity(&mut self, required: usize) {
        let old = self.xs.len();
        if required <= old {
            return;
        }
        let mut cap = old;
        while cap < required {
            cap = cap + (cap >> 1) + 1;
        }
        self.xs.resize(cap, 0.0);
        self.ys.resize(cap, 0.0);
        self.visible.resize(mask_words(cap), 0);
        self.move_to.resize(mask_words(cap), 0);
        tracing::debug!("SpatialPathBatch grew {} -> {} points", old, cap);
    }

    /// Appends a visible point.
    pub fn push(&mut self, x: f64, y: f64, move_to: bool) {
        let i = self.point_count;
        self.ensure_capacity(i + 1);
        self.xs[i] = x;
        self.ys[i] = y;
        set_bit(&mut self.visible, i, true);
        set_bit(&mut self.move_to, i, move_to);
        self.point_count = i + 1;
    }

    /// Replaces the contents with the first `count` projected points of the
    /// buffer input, all visible, one path starting at point 0.
    pub fn set_from_buffer(&mut self, buffer: &SpatialBuffer, count: usize) {
        self.load(buffer, count, None);
    }

    /// Like [`Self::set_from_buffer`], marking points with `z < z_min` (or any
    /// non-finite coordinate) invisible. Coordinates are copied unchanged.
    pub fn set_from_buffer_clipped(&mut self, buffer: &SpatialBuffer, count: usize, z_min: f64) {
        self.load(buffer, count, Some(z_min));
    }

    fn load(&mut self, buffer: &SpatialBuffer, count: usize, z_min: Option<f64>) {
        let points = buffer.points(count);
        self.ensure_capacity(points.len());
        for (i, &[x, y, z]) in points.iter().enumerate() {
            self.xs[i] = x;
            self.ys[i] = y;
            let visible = z_min.map_or(true, |z_min| is_drawable(x, y, z, z_min));
            set_bit(&mut self.visible, i, visible);
            set_bit(&mut self.move_to, i, i == 0);
        }
        self.point_count = points.len();
    }

    /// Index ranges of contiguous drawn runs. A run starts at a move-to point or
    /// at the first visible point after an invisible one.
    pub fn runs(&self) -> Runs<'_> {
        Runs {
            batch: self,
            next: 0,
        }
    }

    /// The batch as move-to/line-to commands, skipping invisible points.
    pub fn commands(&self) -> impl Iterator<Item = PathCommand> + '_ {
        self.runs().flat_map(move |run| {
            let start = run.start;
            run.map(move |i| {
                let (x, y) = (self.xs[i], self.ys[i]);
                if i == start {
                    PathCommand::MoveTo { x, y }
                } else {
                    PathCommand::LineTo { x, y }
                }
            })
        })
    }
}

pub struct Runs<'a> {
    batch: &'a SpatialPathBatch,
    next: usize,
}

impl Iterator for Runs<'_> {
    type Item = Range<usize>;

    fn next(&mut self) -> Option<Range<usize>> {
        let n = self.batch.point_count;
        let mut i = self.next;
        while i < n && !self.batch.is_visible(i) {
            i += 1;
        }
        if i >= n {
            self.next = n;
            return None;
        }
        let start = i;
        i += 1;
        while i < n && self.batch.is_visible(i) && !self.batch.is_move_to(i) {
            i += 1;
        }
        self.next = i;
        Some(start..i)
    }
}

/// Visible when on or in front of the near plane with finite coordinates.
#[inline]
pub(crate) fn is_drawable(x: f64, y: f64, z: f64, z_min: f64) -> bool {
    z >= z_min && x.is_finite() && y.is_finite() && z.is_finite()
}

#[inline]
fn mask_words(points: usize) -> usize {
    points.div_ceil(64).max(1)
}

#[inline]
fn get_bit(mask: &[u64], index: usize) -> bool {
    mask.get(index >> 6)
        .is_some_and(|w| w & (1u64 << (index & 63)) != 0)
}

#[inline]
fn set_bit(mask: &mut [u64], index: usize, value: bool) {
    let bit = 1u64 << (index & 63);
    if value {
        mask[index >> 6] |= bit;
    } else {
        mask[index >> 6] &= !bit;
    }
}

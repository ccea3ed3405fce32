use gpui_chart_spatial::data_types::VecDataSource;
use gpui_chart_spatial::path::SpatialPathBatchBuilder;
use gpui_chart_spatial::{
    DepthMode, Matrix4x4, Projector, SpatialBuffer, SpatialDataMapper, SpatialPipeline, ZMode,
};
use std::alloc::{GlobalAlloc, Layout, System};
use std::cell::Cell;

struct CountingAllocator;

thread_local! {
    static ALLOCATED: Cell<usize> = const { Cell::new(0) };
}

fn record(size: usize) {
    let _ = ALLOCATED.try_with(|c| c.set(c.get() + size));
}

unsafe impl GlobalAlloc for CountingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        record(layout.size());
        unsafe { System.alloc(layout) }
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        unsafe { System.dealloc(ptr, layout) }
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        record(new_size);
        unsafe { System.realloc(ptr, layout, new_size) }
    }
}

#[global_allocator]
static GLOBAL: CountingAllocator = CountingAllocator;

const WARMUP: usize = 200;
const ITERATIONS: usize = 1000;
const BUDGET_BYTES: usize = 4096;

fn allocated_during(mut f: impl FnMut()) -> usize {
    let before = ALLOCATED.with(Cell::get);
    f();
    ALLOCATED.with(Cell::get) - before
}

fn source() -> VecDataSource {
    let xs = (0..1000).map(|i| i as f64 * 0.01).collect();
    let ys = (0..1000).map(|i| (i as f64 * 0.05).sin()).collect();
    VecDataSource::new(xs, ys)
}

#[test]
fn test_steady_state_projection_does_not_allocate() {
    let source = source();
    let mut buffer = SpatialBuffer::new(128);
    let mut mapper = SpatialDataMapper::new(ZMode::FromY);
    let mut builder = SpatialPathBatchBuilder::new();
    let transform = Matrix4x4::translation(0.0, 0.0, 3.0) * Matrix4x4::rotation_y(0.4);
    let projector = Projector::perspective(200.0, 400.0, 300.0, 1.0);

    let mut frame = || {
        builder.reset();
        mapper.map_all_projected(&source, &mut buffer, Some(&transform), Some(&projector), &mut builder);
    };
    for _ in 0..WARMUP {
        frame();
    }
    let bytes = allocated_during(|| {
        for _ in 0..ITERATIONS {
            frame();
        }
    });
    assert!(bytes < BUDGET_BYTES, "allocated {} bytes over {} frames", bytes, ITERATIONS);
}

#[test]
fn test_steady_state_sorted_pipeline_does_not_allocate() {
    let source = source();
    let mut pipeline = SpatialPipeline::new(64)
        .with_z_mode(ZMode::FromIndex)
        .with_projector(Projector::orthographic(1.0, 0.0, 0.0))
        .with_depth_mode(DepthMode::SortedBackToFront);

    for _ in 0..WARMUP {
        pipeline.process(&source, None);
    }
    let bytes = allocated_during(|| {
        for _ in 0..ITERATIONS {
            pipeline.process(&source, None);
        }
    });
    assert!(bytes < BUDGET_BYTES, "allocated {} bytes over {} frames", bytes, ITERATIONS);
}

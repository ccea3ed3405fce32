use gpui_chart_spatial::data_types::{AxisDomain, PlotBounds, PlotContext, VecDataSource};
use gpui_chart_spatial::geometry::{Matrix4x4, Projector};
use gpui_chart_spatial::{SpatialBuffer, SpatialDataMapper, SpatialOptimizer, ZMode};

fn model(n: usize) -> VecDataSource {
    let xs = (0..n).map(|i| i as f64 * 1.25 + 0.1).collect();
    let ys = (0..n).map(|i| (i % 4) as f64 * 2.5 + 0.2).collect();
    VecDataSource::new(xs, ys)
}

#[test]
fn test_map_all_chunks_preserve_index_continuity() {
    let source = model(13);
    let mut buffer = SpatialBuffer::new(5);
    let mut mapper = SpatialDataMapper::new(ZMode::FromIndex);

    let mut sizes = Vec::new();
    let mut seen = Vec::new();
    mapper.map_all(&source, &mut buffer, &mut |buf: &SpatialBuffer, n: usize| {
        sizes.push(n);
        seen.extend_from_slice(buf.points(n));
    });

    assert_eq!(sizes, vec![5, 5, 3]);
    assert_eq!(seen.len(), 13);
    for (i, p) in seen.iter().enumerate() {
        assert_eq!(p[0], i as f64 * 1.25 + 0.1, "x at {}", i);
        assert_eq!(p[1], (i % 4) as f64 * 2.5 + 0.2, "y at {}", i);
        assert_eq!(p[2], i as f64, "z must be the global index");
    }
    assert_eq!(mapper.chunk_count(&source, &buffer), 3);
}

#[test]
fn test_map_all_projected_orthographic() {
    let source = model(13);
    let mut buffer = SpatialBuffer::new(5);
    let mut mapper = SpatialDataMapper::new(ZMode::Constant(1.5));
    let transform = Matrix4x4::translation(1.0, 2.0, 3.0);
    let projector = Projector::orthographic(2.0, 10.0, 20.0);

    let mut offset = 0;
    mapper.map_all_projected(
        &source,
        &mut buffer,
        Some(&transform),
        Some(&projector),
        &mut |buf: &SpatialBuffer, n: usize| {
            for (k, p) in buf.points(n).iter().enumerate() {
                let i = offset + k;
                let x = source_x(i);
                let y = source_y(i);
                assert!((p[0] - (10.0 + (x + 1.0) * 2.0)).abs() < 1e-9);
                assert!((p[1] - (20.0 - (y + 2.0) * 2.0)).abs() < 1e-9);
                assert!((p[2] - 4.5).abs() < 1e-9);
            }
            offset += n;
        },
    );
    assert_eq!(offset, 13);
}

fn source_x(i: usize) -> f64 {
    i as f64 * 1.25 + 0.1
}

fn source_y(i: usize) -> f64 {
    (i % 4) as f64 * 2.5 + 0.2
}

#[test]
fn test_map_all_projected_perspective_from_y() {
    let source = model(101);
    let mut buffer = SpatialBuffer::new(16);
    let mut mapper = SpatialDataMapper::new(ZMode::FromY);
    let transform = Matrix4x4::translation(0.75, -1.25, 2.5);
    let projector = Projector::perspective(1.1, 100.0, 75.0, 0.8);

    let mut chunks = 0;
    let mut offset = 0;
    mapper.map_all_projected(
        &source,
        &mut buffer,
        Some(&transform),
        Some(&projector),
        &mut |buf: &SpatialBuffer, n: usize| {
            chunks += 1;
            for (k, p) in buf.points(n).iter().enumerate() {
                let i = offset + k;
                let (x, y, z) = (source_x(i) + 0.75, source_y(i) - 1.25, source_y(i) + 2.5);
                let d = z + 0.8;
                assert!((p[0] - (100.0 + x * (1.1 / d))).abs() < 1e-9, "x at {}", i);
                assert!((p[1] - (75.0 - y * (1.1 / d))).abs() < 1e-9, "y at {}", i);
                assert!((p[2] - d).abs() < 1e-9, "depth at {}", i);
            }
            offset += n;
        },
    );
    assert_eq!(chunks, 7);
    assert_eq!(offset, 101);
}

#[test]
fn test_projector_only_and_transform_only_stages() {
    let source = VecDataSource::new(vec![1.0, 2.0], vec![3.0, 4.0]);
    let mut buffer = SpatialBuffer::new(4);
    let mut mapper = SpatialDataMapper::new(ZMode::Constant(0.5));

    let projector = Projector::orthographic(10.0, 0.0, 0.0);
    let mut got = Vec::new();
    mapper.map_all_projected(&source, &mut buffer, None, Some(&projector), &mut |b: &SpatialBuffer, n: usize| {
        got.extend_from_slice(b.points(n))
    });
    assert_eq!(got, vec![[10.0, -30.0, 0.5], [20.0, -40.0, 0.5]]);

    let transform = Matrix4x4::translation(1.0, 1.0, 1.0);
    got.clear();
    mapper.map_all_projected(&source, &mut buffer, Some(&transform), None, &mut |b: &SpatialBuffer, n: usize| {
        got.extend_from_slice(b.points(n))
    });
    assert_eq!(got, vec![[2.0, 4.0, 1.5], [3.0, 5.0, 1.5]]);
}

#[test]
fn test_inconsistent_source_is_truncated() {
    let source = VecDataSource::new(vec![0.0, 1.0, 2.0, 3.0], vec![0.0, 1.0, 2.0]).with_reported_len(50);
    let mapper = SpatialDataMapper::default();
    assert_eq!(mapper.point_count(&source), 3);

    let mut buffer = SpatialBuffer::new(2);
    let mut total = 0;
    SpatialDataMapper::default().map_all(&source, &mut buffer, &mut |_: &SpatialBuffer, n: usize| total += n);
    assert_eq!(total, 3);
}

#[test]
fn test_empty_source_never_calls_consumer() {
    let source = VecDataSource::new(Vec::new(), Vec::new());
    let mut buffer = SpatialBuffer::new(8);
    let mut calls = 0;
    SpatialDataMapper::default().map_all(&source, &mut buffer, &mut |_: &SpatialBuffer, _: usize| calls += 1);
    assert_eq!(calls, 0);
}

#[test]
fn test_weight_and_custom_z_modes() {
    let source = VecDataSource::new(vec![1.0, 2.0, 3.0], vec![10.0, 20.0, 30.0]).with_weights(vec![0.5, 0.25]);
    let mut buffer = SpatialBuffer::new(3);

    let mapper = SpatialDataMapper::new(ZMode::FromWeight);
    assert_eq!(mapper.map_range(&source, 0, 3, &mut buffer), 3);
    let z: Vec<f64> = buffer.points(3).iter().map(|p| p[2]).collect();
    assert_eq!(z, vec![0.5, 0.25, 0.0], "missing weights read as zero");

    let mapper = SpatialDataMapper::new(ZMode::custom(|i, x, y, w| i as f64 * 100.0 + x + y + w));
    mapper.map_range(&source, 1, 2, &mut buffer);
    assert_eq!(buffer.points(2)[0][2], 100.0 + 2.0 + 20.0 + 0.25);
    assert_eq!(buffer.points(2)[1][2], 200.0 + 3.0 + 30.0);
}

#[test]
fn test_map_range_bounds() {
    let source = model(10);
    let mut buffer = SpatialBuffer::new(4);
    let mapper = SpatialDataMapper::default();
    assert_eq!(mapper.map_range(&source, 8, 4, &mut buffer), 2);
    assert_eq!(mapper.map_range(&source, 2, 100, &mut buffer), 4);
    assert_eq!(mapper.map_range(&source, 10, 1, &mut buffer), 0);
}

#[test]
fn test_plot_context_fits_projector_before_projecting() {
    let source = VecDataSource::new(vec![0.0, 1.0], vec![0.0, 1.0]);
    let mut buffer = SpatialBuffer::new(8);
    let mut mapper = SpatialDataMapper::new(ZMode::Constant(0.0));
    let mut projector = Projector::orthographic(1.0, 0.0, 0.0);
    let context = PlotContext::new(PlotBounds::new(0.0, 0.0, 200.0, 100.0), AxisDomain::default());

    let mut got = Vec::new();
    mapper.map_all_projected_in(
        &source,
        &mut buffer,
        None,
        &mut projector,
        &context,
        0.5,
        &mut |b: &SpatialBuffer, n: usize| got.extend_from_slice(b.points(n)),
    );
    // scale = 100 * 0.5, center = (100, 50)
    assert_eq!(got, vec![[100.0, 50.0, 0.0], [150.0, 0.0, 0.0]]);
    assert_eq!(projector.scale(), 50.0);
}

#[test]
fn test_optimizer_thins_chunks_and_resets_per_stream() {
    let source = VecDataSource::new(vec![0.0, 0.1, 0.2, 5.0], vec![0.0, 0.0, 0.0, 0.0]);
    let mut buffer = SpatialBuffer::new(8);
    let mut mapper = SpatialDataMapper::new(ZMode::Constant(0.0))
        .with_optimizer(SpatialOptimizer::new().with_min_pixel_distance(1.0).with_preserve_peaks(false));

    for _ in 0..2 {
        let mut got = Vec::new();
        mapper.map_all_projected(&source, &mut buffer, None, None, &mut |b: &SpatialBuffer, n: usize| {
            got.extend(b.points(n).iter().map(|p| p[0]))
        });
        assert_eq!(got, vec![0.0, 5.0]);
    }
}

#[test]
fn test_ring_delta_projection() {
    let mut buffer = SpatialBuffer::new(4);
    buffer.set_ring_enabled(true);
    for i in 0..6 {
        buffer.write_ring(i as f64, 0.0, 1.0);
    }
    let mut mapper = SpatialDataMapper::default();
    let projector = Projector::orthographic(2.0, 0.0, 0.0);

    let mut got = Vec::new();
    let n = mapper.map_ring_delta_projected(&mut buffer, None, Some(&projector), &mut |b: &SpatialBuffer, n: usize| {
        got.extend(b.points(n).iter().map(|p| p[0]))
    });
    assert_eq!(n, 4);
    assert_eq!(got, vec![4.0, 6.0, 8.0, 10.0]);
    assert_eq!(buffer.ring_delta_count(), 0);
    assert_eq!(buffer.ring_point(0).unwrap().x, 2.0, "ring samples stay in data space");

    buffer.write_ring(6.0, 0.0, 1.0);
    got.clear();
    mapper.map_ring_delta_projected(&mut buffer, None, Some(&projector), &mut |b: &SpatialBuffer, n: usize| {
        got.extend(b.points(n).iter().map(|p| p[0]))
    });
    assert_eq!(got, vec![12.0]);

    let n = mapper.map_ring_delta_projected(&mut buffer, None, Some(&projector), &mut |_: &SpatialBuffer, _: usize| {
        panic!("no pending samples")
    });
    assert_eq!(n, 0);
}

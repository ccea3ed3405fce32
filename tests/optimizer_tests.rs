use gpui_chart_spatial::data_types::{
    AxisDomain, BoundsSpace, DepthDampingMode, OptimizerConfig, PlotBounds, PlotContext,
};
use gpui_chart_spatial::SpatialOptimizer;

fn coords(points: &[[f64; 3]]) -> Vec<f64> {
    points.iter().flatten().copied().collect()
}

fn run(optimizer: &mut SpatialOptimizer, points: &[[f64; 3]], context: Option<&PlotContext>) -> Vec<[f64; 3]> {
    let mut data = coords(points);
    optimizer.reset();
    let kept = optimizer.apply(&mut data, points.len(), context);
    data[..kept * 3].chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect()
}

fn xs(points: &[[f64; 3]]) -> Vec<f64> {
    points.iter().map(|p| p[0]).collect()
}

#[test]
fn test_min_distance_drops_close_points() {
    let points = [[0.0, 0.0, 0.0], [0.5, 0.0, 0.0], [1.0, 0.0, 0.0], [1.5, 0.0, 0.0], [10.0, 0.0, 0.0]];
    let mut optimizer = SpatialOptimizer::new().with_min_pixel_distance(2.0);
    // Flat runs are not peaks, so preserving peaks keeps nothing extra
    assert_eq!(xs(&run(&mut optimizer, &points, None)), vec![0.0, 10.0]);

    let mut optimizer = optimizer.with_preserve_peaks(false);
    assert_eq!(xs(&run(&mut optimizer, &points, None)), vec![0.0, 10.0]);
}

#[test]
fn test_peaks_survive_thinning() {
    let points = [[0.0, 0.0, 0.0], [0.5, 1.0, 0.0], [1.0, 0.5, 0.0], [5.0, 0.4, 0.0]];

    let mut optimizer = SpatialOptimizer::new().with_min_pixel_distance(2.0);
    assert_eq!(xs(&run(&mut optimizer, &points, None)), vec![0.0, 0.5, 5.0]);

    let mut optimizer = optimizer.with_preserve_peaks(false);
    assert_eq!(xs(&run(&mut optimizer, &points, None)), vec![0.0, 5.0]);
}

#[test]
fn test_depth_attenuation_widens_threshold() {
    let near = [[0.0, 0.0, 0.0], [1.5, 0.0, 0.0]];
    let far = [[0.0, 0.0, 10.0], [1.5, 0.0, 10.0]];

    let mut optimizer = SpatialOptimizer::new()
        .with_min_pixel_distance(1.0)
        .with_depth_attenuation(0.0, 10.0, 1.0);
    assert_eq!(run(&mut optimizer, &near, None).len(), 2);
    assert_eq!(run(&mut optimizer, &far, None).len(), 1, "threshold doubles at the far plane");

    // far <= near disables attenuation
    let mut optimizer = optimizer.with_depth_attenuation(10.0, 10.0, 1.0);
    assert_eq!(run(&mut optimizer, &far, None).len(), 2);
}

#[test]
fn test_depth_damping_multiplies_scale() {
    let far = [[0.0, 0.0, 10.0], [3.0, 0.0, 10.0]];
    let mut optimizer = SpatialOptimizer::new()
        .with_min_pixel_distance(1.0)
        .with_depth_attenuation(0.0, 10.0, 1.0);
    assert_eq!(run(&mut optimizer, &far, None).len(), 2);

    let mut optimizer = optimizer.with_depth_damping(1.0, DepthDampingMode::Exponential);
    assert_eq!(run(&mut optimizer, &far, None).len(), 1, "scale 2 * 2 = 4 covers a distance of 3");
}

#[test]
fn test_per_axis_distance_requires_both_axes_close() {
    let points = [[0.0, 0.0, 0.0], [0.5, 5.0, 0.0], [0.6, 5.5, 0.0]];
    let mut optimizer = SpatialOptimizer::new()
        .with_min_pixel_distance_xy(1.0, 1.0)
        .with_preserve_peaks(false);
    assert_eq!(xs(&run(&mut optimizer, &points, None)), vec![0.0, 0.5]);
}

#[test]
fn test_bounds_filter_needs_context() {
    let points = [[-1.0, 10.0, 0.0], [50.0, 10.0, 0.0], [101.0, 10.0, 0.0], [60.0, 60.0, 0.0]];
    let context = PlotContext::new(PlotBounds::new(0.0, 0.0, 100.0, 50.0), AxisDomain::new(0.0, 1.0, 0.0, 1.0));

    let mut optimizer = SpatialOptimizer::new().with_bounds(BoundsSpace::Pixels);
    assert_eq!(xs(&run(&mut optimizer, &points, Some(&context))), vec![50.0]);
    assert_eq!(run(&mut optimizer, &points, None).len(), 4, "no context, no bounds filter");

    let optimizer = SpatialOptimizer::new().with_bounds(BoundsSpace::Domain);
    let mut unit = coords(&[[1.5, 0.5, 0.0], [0.5, 0.5, 0.0], [0.25, 2.0, 0.0]]);
    assert_eq!(optimizer.filter_domain(&mut unit, 3, Some(&context)), 1);
    assert_eq!(&unit[..3], &[0.5, 0.5, 0.0]);
    assert_eq!(optimizer.filter_domain(&mut unit, 3, None), 3, "no context, no domain filter");
}

#[test]
fn test_each_pass_checks_only_its_own_space() {
    let context = PlotContext::new(PlotBounds::new(0.0, 0.0, 100.0, 50.0), AxisDomain::new(0.0, 1.0, 0.0, 1.0));
    let outside_domain = [[50.0, 10.0, 0.0]];

    let mut domain = SpatialOptimizer::new().with_bounds(BoundsSpace::Domain);
    assert_eq!(run(&mut domain, &outside_domain, Some(&context)).len(), 1, "projected pass ignores domain bounds");

    let pixels = SpatialOptimizer::new().with_bounds(BoundsSpace::Pixels);
    let mut data = coords(&[[500.0, 500.0, 0.0]]);
    assert_eq!(pixels.filter_domain(&mut data, 1, Some(&context)), 1, "data pass ignores pixel bounds");
}

#[test]
fn test_state_carries_across_chunks_until_reset() {
    let mut optimizer = SpatialOptimizer::new()
        .with_min_pixel_distance(2.0)
        .with_preserve_peaks(false);
    let mut first = coords(&[[0.0, 0.0, 0.0]]);
    assert_eq!(optimizer.apply(&mut first, 1, None), 1);
    let mut second = coords(&[[1.0, 0.0, 0.0]]);
    assert_eq!(optimizer.apply(&mut second, 1, None), 0, "compared against the previous chunk");

    optimizer.reset();
    assert_eq!(optimizer.apply(&mut second, 1, None), 1);
}

#[test]
fn test_from_config() {
    let config = OptimizerConfig {
        min_pixel_distance: 2.0,
        preserve_peaks: false,
        ..Default::default()
    };
    let mut optimizer = SpatialOptimizer::from_config(&config);
    let points = [[0.0, 0.0, 0.0], [0.5, 1.0, 0.0], [1.0, 0.0, 0.0]];
    assert_eq!(run(&mut optimizer, &points, None).len(), 1);

    let mut passthrough = SpatialOptimizer::from_config(&OptimizerConfig::default());
    assert_eq!(run(&mut passthrough, &points, None).len(), 3);
}

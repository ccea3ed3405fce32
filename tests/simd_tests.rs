use gpui_chart_spatial::simd::{
    clamp_lanes, lane_width, max_axis_deviation, max_f64, min_f64, nearest_xy_index, z_bounds,
    LaneScratch, MAX_LANES,
};

#[test]
fn test_lane_width_is_stable_and_bounded() {
    let first = lane_width();
    assert!((1..=MAX_LANES).contains(&first));
    assert_eq!(lane_width(), first, "lane width must be probed once");
}

#[test]
fn test_lane_scratch_clamps() {
    assert_eq!(LaneScratch::new(0).lanes(), 1);
    assert_eq!(LaneScratch::new(64).lanes(), MAX_LANES);
    assert_eq!(clamp_lanes(3), 3);
    assert_eq!(LaneScratch::default().lanes(), lane_width());
}

#[test]
fn test_min_max_f64() {
    let data: Vec<f64> = (0..21).map(|i| ((i * 7) % 13) as f64 - 4.0).collect();
    assert_eq!(min_f64(&data), -4.0);
    assert_eq!(max_f64(&data), 8.0);
    assert!(min_f64(&[]).is_nan());
}

#[test]
fn test_z_bounds_with_remainder() {
    // 5 points: one full group of 4 and a tail of 1
    let coords = [
        0.0, 0.0, 3.0, //
        0.0, 0.0, -2.0, //
        0.0, 0.0, 7.5, //
        0.0, 0.0, 1.0, //
        0.0, 0.0, -9.0,
    ];
    assert_eq!(z_bounds(&coords, 5), (-9.0, 7.5));
    assert_eq!(z_bounds(&coords, 4), (-2.0, 7.5));

    let (lo, hi) = z_bounds(&coords, 0);
    assert_eq!(lo, f64::INFINITY);
    assert_eq!(hi, f64::NEG_INFINITY);
}

#[test]
fn test_nearest_xy_index_all_lane_widths() {
    let mut coords = Vec::new();
    for i in 0..19 {
        coords.extend_from_slice(&[i as f64, 0.0, 0.0]);
    }
    for lanes in 1..=MAX_LANES {
        assert_eq!(nearest_xy_index(&coords, 19, lanes, 17.2, 0.0, 1.0), Some(17), "lanes={}", lanes);
        assert_eq!(nearest_xy_index(&coords, 19, lanes, 50.0, 0.0, 1.0), None, "lanes={}", lanes);
        // Equidistant between 3 and 4: lowest index wins
        assert_eq!(nearest_xy_index(&coords, 19, lanes, 3.5, 0.0, 1.0), Some(3), "lanes={}", lanes);
    }
}

#[test]
fn test_max_axis_deviation_non_finite() {
    let a = [1.0, f64::INFINITY, f64::NAN, 2.0, 0.0, 0.0];
    let b = [1.5, f64::INFINITY, f64::NAN, 2.0, f64::NEG_INFINITY, 0.0];
    let d = max_axis_deviation(&a, &b, 2);
    assert_eq!(d[0], 0.5);
    assert_eq!(d[1], f64::INFINITY, "finite vs infinite must count as a mismatch");
    assert_eq!(d[2], 0.0, "both NaN counts as equal");
}

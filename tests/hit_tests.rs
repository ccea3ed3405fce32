use gpui_chart_spatial::{CoordSpace, HitDetector, SpatialBuffer, Vector3D};

fn grid_buffer(lanes: usize) -> SpatialBuffer {
    let mut buffer = SpatialBuffer::with_lanes(16, lanes);
    for i in 0..16 {
        buffer.set_point(i, (i % 4) as f64 * 10.0, (i / 4) as f64 * 10.0, i as f64);
    }
    buffer
}

#[test]
fn test_find_hit_index_nearest_within_radius() {
    for lanes in 1..=8 {
        let buffer = grid_buffer(lanes);
        let hit = HitDetector.find_hit_index(&buffer, 16, 21.0, 9.0, 3.0);
        assert_eq!(hit, Some(6), "lanes={}", lanes);
        assert_eq!(HitDetector.find_hit_index(&buffer, 16, 5.0, 5.0, 3.0), None);
    }
}

#[test]
fn test_hit_respects_count() {
    let buffer = grid_buffer(4);
    assert_eq!(HitDetector.find_hit_index(&buffer, 16, 30.0, 30.0, 1.0), Some(15));
    assert_eq!(HitDetector.find_hit_index(&buffer, 15, 30.0, 30.0, 1.0), None);
    assert_eq!(HitDetector.find_hit_index(&buffer, 0, 0.0, 0.0, 1.0), None);
}

#[test]
fn test_non_positive_radius_never_hits() {
    let buffer = grid_buffer(4);
    assert_eq!(HitDetector.find_hit_index(&buffer, 16, 0.0, 0.0, 0.0), None);
    assert_eq!(HitDetector.find_hit_index(&buffer, 16, 0.0, 0.0, -1.0), None);
    assert_eq!(HitDetector.find_hit_index(&buffer, 16, 0.0, 0.0, f64::NAN), None);
}

#[test]
fn test_output_space_query() {
    let mut buffer = grid_buffer(2);
    buffer.output_mut()[..3].copy_from_slice(&[100.0, 100.0, 0.0]);
    let hit = HitDetector.nearest_index(&buffer, 1, 101.0, 100.0, 2.0, CoordSpace::Output);
    assert_eq!(hit, Some(0));
    assert_eq!(HitDetector.nearest_index(&buffer, 1, 101.0, 100.0, 2.0, CoordSpace::Input), None);
}

#[test]
fn test_nearest_in_box_uses_depth() {
    let buffer = grid_buffer(4);
    let center = Vector3D::new(10.0, 10.0, 5.0);

    let hit = HitDetector.nearest_in_box(&buffer, 16, center, Vector3D::new(11.0, 11.0, 0.5), CoordSpace::Input);
    assert_eq!(hit, Some(5));

    // Point 5 sits at z=5; a box far in depth excludes it
    let far = Vector3D::new(10.0, 10.0, 50.0);
    assert_eq!(
        HitDetector.nearest_in_box(&buffer, 16, far, Vector3D::new(1.0, 1.0, 1.0), CoordSpace::Input),
        None
    );
    assert_eq!(
        HitDetector.nearest_in_box(&buffer, 16, center, Vector3D::new(1.0, 0.0, 1.0), CoordSpace::Input),
        None,
        "degenerate boxes match nothing"
    );
}

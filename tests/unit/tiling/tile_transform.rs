use std::f64::consts::FRAC_PI_2;

use super::*;

fn assert_coeffs(actual: Affine, expected: [f64; 6]) {
    for (a, e) in actual.as_coeffs().iter().zip(expected) {
        assert!((a - e).abs() < 1e-12, "{:?} != {expected:?}", actual.as_coeffs());
    }
}

#[test]
fn default_is_identity() {
    let mut t = TileTransform::new();
    assert!(!t.is_dirty());
    assert_eq!(t.local_transform(), Affine::IDENTITY);
}

#[test]
fn scale_and_position_compose_without_rotation() {
    let mut t = TileTransform::new();
    t.set_scale(Vec2::new(2.0, 3.0));
    t.set_position(Vec2::new(10.0, -4.0));
    assert!(t.is_dirty());
    assert_coeffs(t.local_transform(), [2.0, 0.0, 0.0, 3.0, 10.0, -4.0]);
    assert!(!t.is_dirty());
}

#[test]
fn rotation_is_applied_after_scale() {
    let mut t = TileTransform::new();
    t.set_scale(Vec2::new(2.0, 1.0));
    t.set_rotation(FRAC_PI_2);
    let m = t.local_transform();
    let p = m * kurbo::Point::new(1.0, 0.0);
    assert!((p.x - 0.0).abs() < 1e-12);
    assert!((p.y - 2.0).abs() < 1e-12);
}

#[test]
fn pivot_is_subtracted_through_linear_part() {
    let mut t = TileTransform::new();
    t.set_scale(Vec2::new(2.0, 2.0));
    t.set_pivot(Vec2::new(5.0, 1.0));
    t.set_position(Vec2::new(3.0, 3.0));
    assert_coeffs(t.local_transform(), [2.0, 0.0, 0.0, 2.0, -7.0, 1.0]);
}

#[test]
fn skew_x_shears_the_y_axis() {
    let mut t = TileTransform::new();
    t.set_skew(Vec2::new(0.5, 0.0));
    let m = t.local_transform();
    let c = m.as_coeffs();
    assert!((c[0] - 1.0).abs() < 1e-12);
    assert!((c[1] - 0.0).abs() < 1e-12);
    assert!((c[2] - 0.5f64.sin()).abs() < 1e-12);
    assert!((c[3] - 0.5f64.cos()).abs() < 1e-12);
}

#[test]
fn cached_matrix_is_reused_until_a_setter_runs() {
    let mut t = TileTransform::new();
    t.set_position(Vec2::new(1.0, 1.0));
    let first = t.local_transform();
    assert_eq!(t.local_transform(), first);
    t.set_position(Vec2::new(2.0, 1.0));
    assert_ne!(t.local_transform(), first);
}

#![allow(clippy::float_cmp)]

use std::f64::consts::{FRAC_PI_2, PI};

use super::*;

const EPSILON: f64 = 1e-9;

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

fn point_approx_eq(a: Point, b: Point) -> bool {
    approx_eq(a.x(), b.x()) && approx_eq(a.y(), b.y())
}

fn pt(x: f64, y: f64) -> Point {
    Point::new(x, y).unwrap()
}

// =============================================================
// Point: construction and validation
// =============================================================

#[test]
fn point_new_stores_coordinates() {
    let p = pt(3.0, 4.0);
    assert_eq!(p.x(), 3.0);
    assert_eq!(p.y(), 4.0);
}

#[test]
fn point_new_rejects_nan() {
    let err = Point::new(f64::NAN, 0.0).unwrap_err();
    assert!(matches!(err, SceneError::NonFinite { field: "x", .. }));
}

#[test]
fn point_new_rejects_infinity() {
    let err = Point::new(0.0, f64::INFINITY).unwrap_err();
    assert!(matches!(err, SceneError::NonFinite { field: "y", .. }));
}

#[test]
fn point_setters_validate_and_keep_old_value() {
    let mut p = pt(1.0, 2.0);
    assert!(p.set_x(f64::NAN).is_err());
    assert_eq!(p.x(), 1.0);
    p.set_y(7.5).unwrap();
    assert_eq!(p.y(), 7.5);
}

#[test]
fn point_default_is_origin() {
    assert_eq!(Point::default(), Point::ORIGIN);
}

#[test]
fn point_display_lists_both_axes() {
    assert_eq!(pt(1.0, 2.5).to_string(), "X: 1, Y: 2.5");
}

// =============================================================
// Point: arithmetic
// =============================================================

#[test]
fn add_and_subtract_are_component_wise() {
    let a = pt(1.0, 2.0);
    let b = pt(10.0, -4.0);
    assert_eq!(a.add(b).unwrap(), pt(11.0, -2.0));
    assert_eq!(b.subtract(a).unwrap(), pt(9.0, -6.0));
}

#[test]
fn add_reports_overflow() {
    let big = pt(f64::MAX, 0.0);
    assert!(big.add(big).is_err());
}

#[test]
fn distance_is_euclidean() {
    assert!(approx_eq(pt(0.0, 0.0).distance_to(pt(3.0, 4.0)), 5.0));
}

#[test]
fn rotate_around_quarter_turn() {
    let p = pt(10.0, 0.0).rotate_around(Point::ORIGIN, FRAC_PI_2).unwrap();
    assert!(point_approx_eq(p, pt(0.0, 10.0)));
}

#[test]
fn rotate_around_non_origin_pivot() {
    let p = pt(2.0, 1.0).rotate_around(pt(1.0, 1.0), PI).unwrap();
    assert!(point_approx_eq(p, pt(0.0, 1.0)));
}

#[test]
fn rotate_around_rejects_nan_angle() {
    assert!(pt(1.0, 1.0).rotate_around(Point::ORIGIN, f64::NAN).is_err());
}

#[test]
fn within_checks_are_inclusive() {
    let p = pt(5.0, 10.0);
    assert!(p.x_within(5.0, 6.0).unwrap());
    assert!(p.y_within(0.0, 10.0).unwrap());
    assert!(!p.x_within(6.0, 9.0).unwrap());
}

#[test]
fn within_rejects_reversed_bounds() {
    let err = pt(0.0, 0.0).x_within(3.0, 1.0).unwrap_err();
    assert_eq!(err, SceneError::InvalidRange { low: 3.0, high: 1.0 });
}

#[test]
fn average_of_points() {
    let avg = Point::average(&[pt(0.0, 0.0), pt(4.0, 2.0), pt(2.0, 4.0)]).unwrap();
    assert!(point_approx_eq(avg, pt(2.0, 2.0)));
}

#[test]
fn average_of_nothing_fails() {
    assert!(matches!(Point::average(&[]), Err(SceneError::EmptyInput(_))));
}

// =============================================================
// Affine transforms
// =============================================================

fn apply(t: Affine, x: f64, y: f64) -> (f64, f64) {
    let p = t * kurbo::Point::new(x, y);
    (p.x, p.y)
}

#[test]
fn canvas_order_is_post_multiplication() {
    // translate(10, 0) then rotate(90°): local (1, 0) lands at (10, 1).
    let t = Affine::translate((10.0, 0.0)) * Affine::rotate(FRAC_PI_2);
    let (x, y) = apply(t, 1.0, 0.0);
    assert!(approx_eq(x, 10.0));
    assert!(approx_eq(y, 1.0));
}

#[test]
fn invert_undoes_composition() {
    let t = Affine::translate((40.0, -12.0)) * Affine::rotate(0.7) * Affine::scale_non_uniform(2.0, 0.5);
    let inv = invert(t).unwrap();
    let (x, y) = apply(t, 3.5, -8.25);
    let (bx, by) = apply(inv, x, y);
    assert!(approx_eq(bx, 3.5));
    assert!(approx_eq(by, -8.25));
}

#[test]
fn invert_singular_is_none() {
    assert!(invert(Affine::scale_non_uniform(0.0, 1.0)).is_none());
    assert!(invert(Affine::new([f64::NAN, 0.0, 0.0, 1.0, 0.0, 0.0])).is_none());
}

#[test]
fn rotation_matches_point_rotate_around() {
    let angle = 0.9;
    let t = Affine::translate((5.0, 5.0)) * Affine::rotate(angle) * Affine::translate((-5.0, -5.0));
    let (x, y) = apply(t, 9.0, 2.0);
    let p = pt(9.0, 2.0).rotate_around(pt(5.0, 5.0), angle).unwrap();
    assert!(approx_eq(x, p.x()));
    assert!(approx_eq(y, p.y()));
}

#[test]
fn converts_into_kurbo_point() {
    let p: kurbo::Point = pt(3.0, -4.0).into();
    assert_eq!((p.x, p.y), (3.0, -4.0));
}

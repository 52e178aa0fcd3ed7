#![allow(clippy::float_cmp)]

use std::f64::consts::FRAC_PI_2;

use super::*;
use crate::raster::RasterSurface;

// =============================================================
// Color
// =============================================================

#[test]
fn from_hex_short_form_expands_digits() {
    assert_eq!(Color::from_hex("#f80"), Some(Color::rgb(255, 136, 0)));
}

#[test]
fn from_hex_long_form() {
    assert_eq!(Color::from_hex("#1a2b3c"), Some(Color::rgb(0x1a, 0x2b, 0x3c)));
}

#[test]
fn from_hex_with_alpha() {
    assert_eq!(Color::from_hex("#ff000080"), Some(Color::rgba(255, 0, 0, 128)));
}

#[test]
fn from_hex_rejects_missing_hash() {
    assert_eq!(Color::from_hex("ff0000"), None);
}

#[test]
fn from_hex_rejects_bad_digits() {
    assert_eq!(Color::from_hex("#gg0000"), None);
    assert_eq!(Color::from_hex("#12345"), None);
}

#[test]
fn to_css_uses_unit_alpha() {
    assert_eq!(Color::RED.to_css(), "rgba(255, 0, 0, 1)");
    assert_eq!(Color::TRANSPARENT.to_css(), "rgba(0, 0, 0, 0)");
}

// =============================================================
// Rect
// =============================================================

#[test]
fn centered_rect_straddles_origin() {
    let r = Rect::centered(10.0, 4.0);
    assert_eq!(r, Rect::new(-5.0, -2.0, 10.0, 4.0));
}

// =============================================================
// Default transform helpers
// =============================================================

#[test]
fn translate_post_multiplies_current_transform() {
    let mut s = RasterSurface::new(4, 4);
    s.set_transform(Affine::scale_non_uniform(2.0, 2.0)).unwrap();
    s.translate(3.0, 1.0).unwrap();
    let p = s.transform() * kurbo::Point::ORIGIN;
    assert_eq!((p.x, p.y), (6.0, 2.0));
}

#[test]
fn rotate_then_scale_compose_in_call_order() {
    let mut s = RasterSurface::new(4, 4);
    s.rotate(FRAC_PI_2).unwrap();
    s.scale(3.0, 1.0).unwrap();
    let kurbo::Point { x, y } = s.transform() * kurbo::Point::new(1.0, 0.0);
    assert!(x.abs() < 1e-9);
    assert!((y - 3.0).abs() < 1e-9);
}

#[test]
fn restore_returns_to_saved_transform() {
    let mut s = RasterSurface::new(4, 4);
    s.translate(5.0, 5.0).unwrap();
    s.save();
    s.rotate(1.0).unwrap();
    s.restore();
    assert_eq!(s.transform(), Affine::translate((5.0, 5.0)));
}

#[test]
fn unbalanced_restore_is_ignored() {
    let mut s = RasterSurface::new(4, 4);
    s.translate(1.0, 2.0).unwrap();
    s.restore();
    assert_eq!(s.transform(), Affine::translate((1.0, 2.0)));
}

#[test]
fn scoped_restores_after_error() {
    let mut s = RasterSurface::new(4, 4);
    let result: Result<(), SurfaceError> = scoped(&mut s, |s| {
        s.translate(9.0, 9.0)?;
        Err(SurfaceError("boom".into()))
    });
    assert!(result.is_err());
    assert_eq!(s.transform(), Affine::IDENTITY);
}

use aloft_geom::{Aabb, DVec3, Rgb, Vec3};

fn approx_eq(a: f32, b: f32, eps: f32) -> bool {
    (a - b).abs() <= eps
}

fn vec3_approx_eq(a: Vec3, b: Vec3, eps: f32) -> bool {
    approx_eq(a.x, b.x, eps) && approx_eq(a.y, b.y, eps) && approx_eq(a.z, b.z, eps)
}

#[test]
fn vec3_cross_of_grid_edges_points_up() {
    // Edges of a terrain quad walked +z then +x.
    let e1 = Vec3::new(0.0, 0.0, 6.25);
    let e2 = Vec3::new(6.25, 0.0, 0.0);
    let n = e1.cross(e2).normalized();
    assert!(vec3_approx_eq(n, Vec3::UP, 1e-6));
}

#[test]
fn vec3_normalized_zero_is_noop() {
    let z = Vec3::ZERO.normalized();
    assert_eq!(z, Vec3::ZERO);
    assert!(!z.x.is_nan());
}

#[test]
fn dvec3_relative_to_keeps_precision_far_from_origin() {
    let origin = DVec3::new(4_000_000.0, 0.0, -8_000_000.0);
    let p = DVec3::new(4_000_012.34, 5.0, -7_999_987.66);
    let local = p.relative_to(origin);
    assert!(approx_eq(local.x, 12.34, 1e-3));
    assert!(approx_eq(local.z, 12.34, 1e-3));
    let back = origin.offset(local);
    assert!((back.x - p.x).abs() < 1e-3);
}

#[test]
fn aabb_include_grows_from_empty() {
    let mut bb = Aabb::EMPTY;
    assert!(bb.is_empty());
    bb.include(Vec3::new(1.0, -2.0, 3.0));
    bb.include(Vec3::new(-1.0, 4.0, 0.5));
    assert!(!bb.is_empty());
    assert_eq!(bb.min, Vec3::new(-1.0, -2.0, 0.5));
    assert_eq!(bb.max, Vec3::new(1.0, 4.0, 3.0));
    assert!(bb.contains(Vec3::new(0.0, 0.0, 1.0)));
    assert!(!bb.contains(Vec3::new(0.0, 5.0, 1.0)));
}

#[test]
fn rgb_from_hex_channels() {
    let c = Rgb::from_hex(0xff8000);
    assert!(approx_eq(c.r, 1.0, 1e-6));
    assert!(approx_eq(c.g, 128.0 / 255.0, 1e-6));
    assert!(approx_eq(c.b, 0.0, 1e-6));
}

#[test]
fn rgb_hsl_primaries() {
    let red = Rgb::from_hsl(0.0, 1.0, 0.5);
    assert!(approx_eq(red.r, 1.0, 1e-5) && approx_eq(red.g, 0.0, 1e-5));
    let green = Rgb::from_hsl(1.0 / 3.0, 1.0, 0.5);
    assert!(approx_eq(green.g, 1.0, 1e-5) && approx_eq(green.b, 0.0, 1e-5));
    let grey = Rgb::from_hsl(0.7, 0.0, 0.25);
    assert_eq!(grey, Rgb::new(0.25, 0.25, 0.25));
}

//! Geometry primitives shared by the fbik solvers.
//!
//! Bases are [`Matrix3`] values whose columns are the frame's X, Y and Z
//! axes. Directions handed to the angular clamps are unit vectors expressed
//! in the frame being limited.

use nalgebra::{Matrix3, Quaternion, Rotation3, UnitQuaternion, Vector3};

/// Tolerance used for weight comparisons and normalization.
///
/// Weights within this distance of 0 or 1 are treated as exactly 0 or 1.
pub const IK_EPSILON: f32 = 1.0e-7;

/// Normalize `v`, or `None` if it is too short to have a direction.
pub fn normalize(v: &Vector3<f32>) -> Option<Vector3<f32>> {
    let len = v.norm();
    (len > IK_EPSILON).then(|| v / len)
}

/// Whether every component of `v` is within tolerance of one.
pub fn is_fuzzy_one(v: &Vector3<f32>) -> bool {
    v.iter().all(|c| (c - 1.0).abs() <= 1.0e-6)
}

// ---------------------------------------------------------------------------
// Square-region clamps
// ---------------------------------------------------------------------------

/// Clamp `value` into `[-minus, plus]`, returning whether it moved.
fn clamp_signed(value: &mut f32, minus: f32, plus: f32) -> bool {
    if *value < -minus {
        *value = -minus;
        true
    } else if *value > plus {
        *value = plus;
        true
    } else {
        false
    }
}

/// Square-region clamp of a unit direction on its X/Y components.
///
/// Bounds are sines of the limit angles: X is kept in `[-x_minus, x_plus]`,
/// Y in `[-y_minus, y_plus]`. Values on a bound are left untouched. When a
/// component is clamped the Z component is rebuilt as `sqrt(1 - x² - y²)` and
/// the result renormalized. An unclamped direction pointing backwards
/// (`z < 0`) is mirrored to the forward hemisphere.
///
/// Returns `true` if `dir` was modified.
pub fn limit_xy_square(
    dir: &mut Vector3<f32>,
    x_minus: f32,
    x_plus: f32,
    y_minus: f32,
    y_plus: f32,
) -> bool {
    let mut limited = clamp_signed(&mut dir.x, x_minus, x_plus);
    limited |= clamp_signed(&mut dir.y, y_minus, y_plus);
    if limited {
        dir.z = (1.0 - (dir.x * dir.x + dir.y * dir.y)).max(0.0).sqrt();
        if let Some(n) = normalize(dir) {
            *dir = n;
        }
        true
    } else if dir.z < 0.0 {
        dir.z = -dir.z;
        true
    } else {
        false
    }
}

/// Square-region clamp of a unit direction on its X/Z components.
///
/// Same contract as [`limit_xy_square`] with Y as the rebuilt component.
pub fn limit_xz_square(
    dir: &mut Vector3<f32>,
    x_minus: f32,
    x_plus: f32,
    z_minus: f32,
    z_plus: f32,
) -> bool {
    let mut limited = clamp_signed(&mut dir.x, x_minus, x_plus);
    limited |= clamp_signed(&mut dir.z, z_minus, z_plus);
    if limited {
        dir.y = (1.0 - (dir.x * dir.x + dir.z * dir.z)).max(0.0).sqrt();
        if let Some(n) = normalize(dir) {
            *dir = n;
        }
        true
    } else if dir.y < 0.0 {
        dir.y = -dir.y;
        true
    } else {
        false
    }
}

// ---------------------------------------------------------------------------
// Circular clamp
// ---------------------------------------------------------------------------

/// Circular (cosine) clamp of a unit direction around +Z.
///
/// A backwards direction is first mirrored to the forward hemisphere, then a
/// direction further than the cone's half-angle from +Z is pulled onto the
/// cone, keeping its lateral heading. A direction with no lateral part
/// collapses to +Z.
///
/// Returns `true` if `dir` was modified.
pub fn limit_cone(dir: &mut Vector3<f32>, cos_limit: f32) -> bool {
    let mut limited = false;
    if dir.z < 0.0 {
        dir.z = -dir.z;
        limited = true;
    }
    if dir.z < cos_limit {
        let lateral = (dir.x * dir.x + dir.y * dir.y).sqrt();
        if lateral > IK_EPSILON {
            let sin_limit = (1.0 - cos_limit * cos_limit).max(0.0).sqrt();
            let scale = sin_limit / lateral;
            *dir = Vector3::new(dir.x * scale, dir.y * scale, cos_limit);
        } else {
            *dir = Vector3::z();
        }
        limited = true;
    }
    limited
}

// ---------------------------------------------------------------------------
// Basis construction
// ---------------------------------------------------------------------------

/// Component of `v` orthogonal to the unit axis `axis`, normalized.
fn orthogonal_to(v: &Vector3<f32>, axis: &Vector3<f32>) -> Option<Vector3<f32>> {
    normalize(&(v - axis * axis.dot(v)))
}

/// Build an orthonormal basis whose Y axis is exactly `y_dir`.
///
/// X is best-fit to `x_dir`; `z_dir` is used when `x_dir` is parallel to
/// `y_dir`. Returns `None` when no orthonormal frame can be recovered.
pub fn basis_lock_y(
    x_dir: &Vector3<f32>,
    y_dir: &Vector3<f32>,
    z_dir: &Vector3<f32>,
) -> Option<Matrix3<f32>> {
    let y = normalize(y_dir)?;
    let x = orthogonal_to(x_dir, &y).or_else(|| normalize(&y.cross(z_dir)))?;
    let z = x.cross(&y);
    Some(Matrix3::from_columns(&[x, y, z]))
}

/// Build an orthonormal basis whose Z axis is exactly `z_dir`.
///
/// X is best-fit to `x_dir`; `y_dir` is used when `x_dir` is parallel to
/// `z_dir`. Returns `None` when no orthonormal frame can be recovered.
pub fn basis_lock_z(
    x_dir: &Vector3<f32>,
    y_dir: &Vector3<f32>,
    z_dir: &Vector3<f32>,
) -> Option<Matrix3<f32>> {
    let z = normalize(z_dir)?;
    let x = orthogonal_to(x_dir, &z).or_else(|| normalize(&y_dir.cross(&z)))?;
    let y = z.cross(&x);
    Some(Matrix3::from_columns(&[x, y, z]))
}

/// Build an orthonormal basis from Y and Z candidates, keeping Z exact.
///
/// Fails if the two are parallel or either is zero-length.
pub fn basis_from_yz_lock_z(y_dir: &Vector3<f32>, z_dir: &Vector3<f32>) -> Option<Matrix3<f32>> {
    let z = normalize(z_dir)?;
    let x = normalize(&y_dir.cross(&z))?;
    let y = z.cross(&x);
    Some(Matrix3::from_columns(&[x, y, z]))
}

// ---------------------------------------------------------------------------
// Rotation <-> basis
// ---------------------------------------------------------------------------

/// Rotation matrix of `q`.
pub fn basis_from_rotation(q: &UnitQuaternion<f32>) -> Matrix3<f32> {
    q.to_rotation_matrix().into_inner()
}

/// Rotation of an orthonormal basis.
pub fn rotation_from_basis(basis: &Matrix3<f32>) -> UnitQuaternion<f32> {
    UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(*basis))
}

/// Renormalize a rotation after a chain of products.
pub fn renormalize(q: &UnitQuaternion<f32>) -> UnitQuaternion<f32> {
    UnitQuaternion::new_normalize(q.into_inner())
}

/// `basis · (point - from_origin) + to_origin`.
///
/// Moves a bind-pose point expressed relative to `from_origin` into the
/// frame described by `basis` anchored at `to_origin`.
pub fn transform_point(
    basis: &Matrix3<f32>,
    point: &Vector3<f32>,
    from_origin: &Vector3<f32>,
    to_origin: &Vector3<f32>,
) -> Vector3<f32> {
    basis * (point - from_origin) + to_origin
}

// ---------------------------------------------------------------------------
// Blending
// ---------------------------------------------------------------------------

/// Shortest-path spherical blend from `from` to `to` by `weight`.
///
/// Weights within [`IK_EPSILON`] of 0 or 1 return the endpoints exactly.
pub fn blend_rotation(
    from: &UnitQuaternion<f32>,
    to: &UnitQuaternion<f32>,
    weight: f32,
) -> UnitQuaternion<f32> {
    if weight <= IK_EPSILON {
        return *from;
    }
    if weight >= 1.0 - IK_EPSILON {
        return *to;
    }
    from.try_slerp(to, weight, 1.0e-6).unwrap_or_else(|| {
        // Nearly identical rotations: a normalized lerp is exact enough.
        let a = from.into_inner();
        let mut b = to.into_inner();
        if a.coords.dot(&b.coords) < 0.0 {
            b = -b;
        }
        UnitQuaternion::new_normalize(Quaternion::from(a.coords.lerp(&b.coords, weight)))
    })
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;

    use super::*;
    use approx::assert_relative_eq;

    fn assert_orthonormal(m: &Matrix3<f32>) {
        let identity = m.transpose() * m;
        assert_relative_eq!(identity, Matrix3::identity(), epsilon = 1e-5);
        assert_relative_eq!(m.determinant(), 1.0, epsilon = 1e-5);
    }

    // ---- normalize ----

    #[test]
    fn normalize_unit_length() {
        let n = normalize(&Vector3::new(3.0, 0.0, 4.0)).unwrap();
        assert_relative_eq!(n, Vector3::new(0.6, 0.0, 0.8), epsilon = 1e-6);
    }

    #[test]
    fn normalize_zero_fails() {
        assert!(normalize(&Vector3::zeros()).is_none());
        assert!(normalize(&Vector3::new(1e-9, 0.0, 0.0)).is_none());
    }

    #[test]
    fn fuzzy_one() {
        assert!(is_fuzzy_one(&Vector3::new(1.0, 1.0, 1.0)));
        assert!(!is_fuzzy_one(&Vector3::new(1.0, 1.2, 1.0)));
    }

    // ---- square clamps ----

    #[test]
    fn square_clamp_inside_is_untouched() {
        let mut dir = Vector3::new(0.1, 0.05, 0.0);
        dir.z = (1.0f32 - 0.01 - 0.0025).sqrt();
        let before = dir;
        assert!(!limit_xy_square(&mut dir, 0.5, 0.5, 0.5, 0.5));
        assert_eq!(dir, before);
    }

    #[test]
    fn square_clamp_boundary_is_untouched() {
        let limit = 30.0f32.to_radians().sin();
        let mut dir = Vector3::new(limit, 0.0, (1.0 - limit * limit).sqrt());
        let before = dir;
        assert!(!limit_xy_square(&mut dir, limit, limit, limit, limit));
        assert_eq!(dir, before);
    }

    #[test]
    fn square_clamp_beyond_boundary_is_pulled_back() {
        let limit = 30.0f32.to_radians().sin();
        let x = limit + 1e-4;
        let mut dir = Vector3::new(x, 0.0, (1.0 - x * x).sqrt());
        assert!(limit_xy_square(&mut dir, limit, limit, limit, limit));
        assert_relative_eq!(dir.x, limit, epsilon = 1e-6);
        assert_relative_eq!(dir.norm(), 1.0, epsilon = 1e-6);
        assert!(dir.z > 0.0);
    }

    #[test]
    fn square_clamp_asymmetric_bounds() {
        // y_minus = 0.1, y_plus = 0.3: a direction pointing far down clamps to -0.1
        let mut dir = Vector3::new(0.0, -0.8, 0.6);
        assert!(limit_xy_square(&mut dir, 0.5, 0.5, 0.1, 0.3));
        assert_relative_eq!(dir.y, -0.1, epsilon = 1e-6);
        assert_relative_eq!(dir.norm(), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn square_clamp_mirrors_backwards_direction() {
        let mut dir = Vector3::new(0.0, 0.0, -1.0);
        assert!(limit_xy_square(&mut dir, 0.5, 0.5, 0.5, 0.5));
        assert_relative_eq!(dir, Vector3::z(), epsilon = 1e-6);
    }

    #[test]
    fn square_clamp_both_axes_stays_unit() {
        let mut dir = Vector3::new(0.9, 0.9, 0.0).normalize();
        assert!(limit_xy_square(&mut dir, 0.5, 0.5, 0.5, 0.5));
        assert_relative_eq!(dir.x, 0.5, epsilon = 1e-6);
        assert_relative_eq!(dir.y, 0.5, epsilon = 1e-6);
        assert_relative_eq!(dir.norm(), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn square_clamp_xz_rebuilds_y() {
        let mut dir = Vector3::new(0.0, 0.6, 0.8);
        assert!(limit_xz_square(&mut dir, 0.1, 0.1, 0.2, 0.2));
        assert_relative_eq!(dir.z, 0.2, epsilon = 1e-6);
        assert_relative_eq!(dir.y, (1.0f32 - 0.04).sqrt(), epsilon = 1e-6);
    }

    #[test]
    fn square_clamp_xz_boundary_is_untouched() {
        let limit = 0.25f32;
        let mut dir = Vector3::new(0.0, (1.0 - limit * limit).sqrt(), -limit);
        let before = dir;
        assert!(!limit_xz_square(&mut dir, 0.1, 0.1, limit, limit));
        assert_eq!(dir, before);
    }

    // ---- cone clamp ----

    #[test]
    fn cone_inside_is_untouched() {
        let cos = 30.0f32.to_radians().cos();
        let mut dir = Vector3::new(0.2, 0.0, (1.0f32 - 0.04).sqrt());
        let before = dir;
        assert!(!limit_cone(&mut dir, cos));
        assert_eq!(dir, before);
    }

    #[test]
    fn cone_outside_is_pulled_to_edge() {
        let cos = 30.0f32.to_radians().cos();
        let mut dir = Vector3::new(0.6, 0.6, 0.2).normalize();
        assert!(limit_cone(&mut dir, cos));
        assert_relative_eq!(dir.z, cos, epsilon = 1e-6);
        assert_relative_eq!(dir.norm(), 1.0, epsilon = 1e-6);
        // Heading preserved
        assert_relative_eq!(dir.x, dir.y, epsilon = 1e-6);
    }

    #[test]
    fn cone_straight_back_collapses_forward() {
        let mut dir = Vector3::new(0.0, 0.0, -1.0);
        assert!(limit_cone(&mut dir, 0.5));
        assert_relative_eq!(dir, Vector3::z(), epsilon = 1e-6);
    }

    // ---- bases ----

    #[test]
    fn lock_y_keeps_y_exact() {
        let y = Vector3::new(0.1, 1.0, 0.2).normalize();
        let b = basis_lock_y(&Vector3::x(), &y, &Vector3::z()).unwrap();
        assert_orthonormal(&b);
        assert_relative_eq!(b.column(1).into_owned(), y, epsilon = 1e-6);
    }

    #[test]
    fn lock_y_falls_back_to_z_candidate() {
        let b = basis_lock_y(&Vector3::y(), &Vector3::y(), &Vector3::z()).unwrap();
        assert_orthonormal(&b);
        assert_relative_eq!(b.column(0).into_owned(), Vector3::x(), epsilon = 1e-6);
    }

    #[test]
    fn lock_z_keeps_z_exact() {
        let z = Vector3::new(0.3, -0.2, 1.0).normalize();
        let b = basis_lock_z(&Vector3::x(), &Vector3::y(), &z).unwrap();
        assert_orthonormal(&b);
        assert_relative_eq!(b.column(2).into_owned(), z, epsilon = 1e-6);
    }

    #[test]
    fn lock_z_identity_axes() {
        let b = basis_lock_z(&Vector3::x(), &Vector3::y(), &Vector3::z()).unwrap();
        assert_relative_eq!(b, Matrix3::identity(), epsilon = 1e-6);
    }

    #[test]
    fn lock_z_degenerate_fails() {
        assert!(basis_lock_z(&Vector3::x(), &Vector3::y(), &Vector3::zeros()).is_none());
        assert!(basis_lock_z(&Vector3::z(), &Vector3::z(), &Vector3::z()).is_none());
    }

    #[test]
    fn yz_lock_z_parallel_fails() {
        assert!(basis_from_yz_lock_z(&Vector3::z(), &Vector3::z()).is_none());
    }

    #[test]
    fn yz_lock_z_orthogonalizes_y() {
        let y = Vector3::new(0.0, 1.0, 0.3);
        let b = basis_from_yz_lock_z(&y, &Vector3::z()).unwrap();
        assert_orthonormal(&b);
        assert_relative_eq!(b.column(1).into_owned(), Vector3::y(), epsilon = 1e-6);
    }

    #[test]
    fn rotation_basis_roundtrip() {
        let q = UnitQuaternion::from_euler_angles(0.3, -0.2, 1.1);
        let back = rotation_from_basis(&basis_from_rotation(&q));
        assert_relative_eq!(q.angle_to(&back), 0.0, epsilon = 1e-5);
    }

    #[test]
    fn transform_point_offsets() {
        let basis = basis_from_rotation(&UnitQuaternion::from_axis_angle(&Vector3::y_axis(), FRAC_PI_2));
        let p = transform_point(
            &basis,
            &Vector3::new(0.0, 1.0, 1.0),
            &Vector3::new(0.0, 1.0, 0.0),
            &Vector3::new(5.0, 0.0, 0.0),
        );
        assert_relative_eq!(p, Vector3::new(6.0, 0.0, 0.0), epsilon = 1e-6);
    }

    // ---- blending ----

    #[test]
    fn blend_endpoints_are_exact() {
        let from = UnitQuaternion::from_euler_angles(0.1, 0.2, 0.3);
        let to = UnitQuaternion::from_euler_angles(-0.4, 0.5, 0.0);
        assert_eq!(blend_rotation(&from, &to, 0.0), from);
        assert_eq!(blend_rotation(&from, &to, IK_EPSILON * 0.5), from);
        assert_eq!(blend_rotation(&from, &to, 1.0 - IK_EPSILON * 0.5), to);
        assert_eq!(blend_rotation(&from, &to, 1.0), to);
    }

    #[test]
    fn blend_midpoint_is_halfway() {
        let from = UnitQuaternion::identity();
        let to = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), 1.0);
        let mid = blend_rotation(&from, &to, 0.5);
        assert_relative_eq!(mid.angle_to(&from), 0.5, epsilon = 1e-5);
        assert_relative_eq!(mid.angle_to(&to), 0.5, epsilon = 1e-5);
    }

    #[test]
    fn blend_takes_shortest_path() {
        let from = UnitQuaternion::identity();
        let to = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), 0.8);
        // Same rotation, opposite quaternion sign
        let to_flipped = UnitQuaternion::new_unchecked(-to.into_inner());
        let mid = blend_rotation(&from, &to_flipped, 0.5);
        assert_relative_eq!(mid.angle_to(&from), 0.4, epsilon = 1e-5);
    }

    #[test]
    fn blend_nearly_identical_is_stable() {
        let from = UnitQuaternion::from_axis_angle(&Vector3::x_axis(), 0.3);
        let to = UnitQuaternion::from_axis_angle(&Vector3::x_axis(), 0.300_000_1);
        let mid = blend_rotation(&from, &to, 0.5);
        assert_relative_eq!(mid.angle_to(&from), 0.0, epsilon = 1e-4);
    }
}

//! Rotation helpers: matrix → quaternion, Euler → matrix, look-at rotations.

use nalgebra::{Matrix3, Matrix4, Rotation3, UnitQuaternion, Vector3};

/// Converts a 3x3 rotation matrix to a unit quaternion in (x, y, z, w) order.
///
/// The input is trusted to be orthonormal. No sign canonicalization is done,
/// so `q` and `-q` may both come back for equivalent rotations.
pub fn quaternion_xyzw(rotation: &Matrix3<f64>) -> [f64; 4] {
    let rot = Rotation3::from_matrix_unchecked(*rotation);
    let q = UnitQuaternion::from_rotation_matrix(&rot);
    [q.i, q.j, q.k, q.w]
}

/// Rebuilds the rotation matrix of an (x, y, z, w) quaternion.
pub fn matrix_from_xyzw(q: [f64; 4]) -> Matrix3<f64> {
    let quat = UnitQuaternion::from_quaternion(nalgebra::Quaternion::new(q[3], q[0], q[1], q[2]));
    *quat.to_rotation_matrix().matrix()
}

/// Rotation from XYZ Euler angles in radians (applied x first, then y, then z).
pub fn rotation_from_euler(roll: f64, pitch: f64, yaw: f64) -> Rotation3<f64> {
    Rotation3::from_euler_angles(roll, pitch, yaw)
}

/// Homogeneous transform from a translation and a rotation.
pub fn build_transformation_mat(position: Vector3<f64>, rotation: &Rotation3<f64>) -> Matrix4<f64> {
    let mut m = rotation.to_homogeneous();
    m.fixed_view_mut::<3, 1>(0, 3).copy_from(&position);
    m
}

/// Camera rotation whose -Z axis points along `forward` and whose Y axis
/// leans towards world +Z, rolled by `inplane` radians about the view axis.
///
/// Falls back to world +Y as the up hint when `forward` is vertical.
pub fn rotation_from_forward(forward: &Vector3<f64>, inplane: f64) -> Rotation3<f64> {
    let z_axis = -forward.normalize();
    let mut up_hint = Vector3::z();
    if z_axis.cross(&up_hint).norm() < 1e-9 {
        up_hint = Vector3::y();
    }
    let x_axis = up_hint.cross(&z_axis).normalize();
    let y_axis = z_axis.cross(&x_axis);

    let base = Rotation3::from_matrix_unchecked(Matrix3::from_columns(&[x_axis, y_axis, z_axis]));
    base * Rotation3::from_axis_angle(&Vector3::z_axis(), inplane)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Unit;
    use proptest::prelude::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_identity_quaternion() {
        let q = quaternion_xyzw(&Matrix3::identity());
        let sign = q[3].signum();
        assert_relative_eq!(q[0] * sign, 0.0);
        assert_relative_eq!(q[1] * sign, 0.0);
        assert_relative_eq!(q[2] * sign, 0.0);
        assert_relative_eq!(q[3] * sign, 1.0);
    }

    #[test]
    fn test_quarter_turn_about_z() {
        let r = rotation_from_euler(0.0, 0.0, FRAC_PI_2);
        let q = quaternion_xyzw(r.matrix());
        let h = (0.5f64).sqrt();
        let sign = q[3].signum();
        assert_relative_eq!(q[2] * sign, h, epsilon = 1e-12);
        assert_relative_eq!(q[3] * sign, h, epsilon = 1e-12);
    }

    #[test]
    fn test_euler_is_z_y_x_composition() {
        let (roll, pitch, yaw) = (0.3, -0.4, 1.1);
        let expected = Rotation3::from_axis_angle(&Vector3::z_axis(), yaw)
            * Rotation3::from_axis_angle(&Vector3::y_axis(), pitch)
            * Rotation3::from_axis_angle(&Vector3::x_axis(), roll);
        assert_relative_eq!(
            *rotation_from_euler(roll, pitch, yaw).matrix(),
            *expected.matrix(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_build_transformation_mat() {
        let rot = rotation_from_euler(FRAC_PI_2, 0.0, 0.0);
        let m = build_transformation_mat(Vector3::new(0.0, -25.0, 0.0), &rot);

        assert_relative_eq!(m[(1, 3)], -25.0);
        assert_relative_eq!(m[(3, 3)], 1.0);
        // camera -Z ends up looking along +Y
        let view = -m.fixed_view::<3, 1>(0, 2).into_owned();
        assert_relative_eq!(view, Vector3::new(0.0, 1.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_rotation_from_forward_points_camera() {
        let forward = Vector3::new(-3.0, 4.0, -10.0);
        let rot = rotation_from_forward(&forward, 0.3);
        let view = -(rot * Vector3::z());
        assert_relative_eq!(view, forward.normalize(), epsilon = 1e-12);
        assert_relative_eq!(rot.matrix().determinant(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_rotation_from_forward_vertical() {
        let rot = rotation_from_forward(&Vector3::new(0.0, 0.0, -1.0), 0.0);
        let view = -(rot * Vector3::z());
        assert_relative_eq!(view, Vector3::new(0.0, 0.0, -1.0), epsilon = 1e-12);
    }

    proptest! {
        #[test]
        fn prop_quaternion_round_trip(
            roll in -PI..PI,
            pitch in -FRAC_PI_2..FRAC_PI_2,
            yaw in -PI..PI,
        ) {
            let m = *rotation_from_euler(roll, pitch, yaw).matrix();
            let back = matrix_from_xyzw(quaternion_xyzw(&m));
            prop_assert!((m - back).abs().max() < 1e-6);
        }

        #[test]
        fn prop_quaternion_is_unit(
            ax in -1.0f64..1.0, ay in -1.0f64..1.0, az in 0.1f64..1.0, angle in -PI..PI,
        ) {
            let axis = Unit::new_normalize(Vector3::new(ax, ay, az));
            let m = *Rotation3::from_axis_angle(&axis, angle).matrix();
            let q = quaternion_xyzw(&m);
            let norm = q.iter().map(|c| c * c).sum::<f64>().sqrt();
            prop_assert!((norm - 1.0).abs() < 1e-9);
        }
    }
}

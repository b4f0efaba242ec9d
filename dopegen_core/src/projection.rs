//! Cuboid projection - 3D bounding-box corners to 2D pixel keypoints.
//!
//! Two projections live here:
//! - [`project_cuboid`]: the DOPE keypoint skeleton (8 reordered corners plus
//!   centroid) using the negated axis-angle / translation extrinsics the DOPE
//!   tooling expects
//! - [`project_points`]: the renderer's own pinhole projection (camera looks
//!   down its -Z axis, image y grows downwards), used for label files

use crate::error::{CoreError, Result};
use nalgebra::{Matrix3, Matrix4, Point2, Point3, Rotation3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

/// Corner permutation from renderer bounding-box order to DOPE cuboid order.
///
/// Pinned by downstream consumers of the annotation format; do not rederive.
pub const DOPE_CUBOID_ORDER: [usize; 8] = [6, 2, 1, 5, 7, 3, 0, 4];

/// Number of keypoints in a projected cuboid (8 corners + centroid).
pub const CUBOID_KEYPOINTS: usize = 9;

/// Pinhole intrinsics with zero skew.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraIntrinsics {
    pub fx: f64,
    pub fy: f64,
    pub cx: f64,
    pub cy: f64,
}

impl CameraIntrinsics {
    pub fn new(fx: f64, fy: f64, cx: f64, cy: f64) -> Self {
        Self { fx, fy, cx, cy }
    }

    /// Reads fx, fy, cx, cy from a K matrix.
    pub fn from_k(k: &Matrix3<f64>) -> Self {
        Self {
            fx: k[(0, 0)],
            fy: k[(1, 1)],
            cx: k[(0, 2)],
            cy: k[(1, 2)],
        }
    }

    /// Builds the K matrix.
    pub fn to_k(&self) -> Matrix3<f64> {
        Matrix3::new(
            self.fx, 0.0, self.cx,
            0.0, self.fy, self.cy,
            0.0, 0.0, 1.0,
        )
    }

    /// Perspective divide + intrinsics. Depth sign is not checked.
    pub fn project(&self, p_cam: &Vector3<f64>) -> Point2<f64> {
        Point2::new(
            self.fx * p_cam.x / p_cam.z + self.cx,
            self.fy * p_cam.y / p_cam.z + self.cy,
        )
    }
}

/// World-to-camera extrinsics in the DOPE convention.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DopeExtrinsics {
    /// Negated axis-angle of the world-to-camera rotation
    pub rvec: Vector3<f64>,

    /// Negated world-to-camera translation
    pub tvec: Vector3<f64>,

    /// Rotation described by `rvec`, i.e. the transposed world-to-camera rotation
    pub rotation: Rotation3<f64>,
}

impl DopeExtrinsics {
    /// Derives the extrinsics from a camera-to-world pose.
    pub fn from_pose(cam2world: &Matrix4<f64>) -> Result<Self> {
        let world2cam = cam2world.try_inverse().ok_or(CoreError::SingularPose)?;
        let rotation = world2cam.fixed_view::<3, 3>(0, 0).into_owned();
        let translation = world2cam.fixed_view::<3, 1>(0, 3).into_owned();

        let rotation = Rotation3::from_matrix_unchecked(rotation);
        // Quaternion axis stays defined at a half turn, unlike Rotation3::axis
        let axis_angle = UnitQuaternion::from_rotation_matrix(&rotation).scaled_axis();
        Ok(Self {
            rvec: -axis_angle,
            tvec: -translation,
            rotation: rotation.transpose(),
        })
    }

    /// Moves a world point into the camera frame.
    pub fn transform(&self, p: &Point3<f64>) -> Vector3<f64> {
        self.rotation * p.coords + self.tvec
    }
}

/// Mean of the 8 corners.
pub fn centroid(corners: &[Point3<f64>; 8]) -> Point3<f64> {
    let sum = corners
        .iter()
        .fold(Vector3::zeros(), |acc, p| acc + p.coords);
    Point3::from(sum / 8.0)
}

/// Projects a bounding box into the 9-point DOPE cuboid.
///
/// `corners` are in renderer bounding-box order; the output holds the
/// corners in [`DOPE_CUBOID_ORDER`] followed by the centroid, in pixels.
/// Points behind the camera are projected as-is.
pub fn project_cuboid(
    corners: &[Point3<f64>; 8],
    cam2world: &Matrix4<f64>,
    intrinsics: &CameraIntrinsics,
) -> Result<Vec<Point2<f64>>> {
    let extrinsics = DopeExtrinsics::from_pose(cam2world)?;

    let mut cuboid: Vec<Point2<f64>> = DOPE_CUBOID_ORDER
        .iter()
        .map(|&i| intrinsics.project(&extrinsics.transform(&corners[i])))
        .collect();
    cuboid.push(intrinsics.project(&extrinsics.transform(&centroid(corners))));

    Ok(cuboid)
}

/// Projects world points with the renderer's camera model.
///
/// The camera looks down its local -Z with +Y up; pixel rows grow downwards.
pub fn project_points(
    points: &[Point3<f64>],
    cam2world: &Matrix4<f64>,
    intrinsics: &CameraIntrinsics,
) -> Result<Vec<Point2<f64>>> {
    let world2cam = cam2world.try_inverse().ok_or(CoreError::SingularPose)?;

    Ok(points
        .iter()
        .map(|p| {
            let local = world2cam.transform_point(p);
            intrinsics.project(&Vector3::new(local.x, -local.y, -local.z))
        })
        .collect())
}

/// Depth of each point along the renderer camera's view axis.
pub fn view_depths(points: &[Point3<f64>], cam2world: &Matrix4<f64>) -> Result<Vec<f64>> {
    let world2cam = cam2world.try_inverse().ok_or(CoreError::SingularPose)?;
    Ok(points
        .iter()
        .map(|p| -world2cam.transform_point(p).z)
        .collect())
}

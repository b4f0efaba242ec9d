//! Software renderer implementing `RenderContext` for deterministic runs.

use crate::world::{SceneDescription, SimError};
use dopegen_core::projection::{project_points, view_depths, CameraIntrinsics};
use dopegen_env::{
    ColorFrame, EnvError, PointLight, RenderContext, RenderOutput, SceneObject, SegmentationMap,
};
use nalgebra::{Matrix3, Matrix4, Point3, Rotation3};
use std::path::Path;
use tracing::debug;

/// Focal length of the virtual lens (mm).
pub const LENS_MM: f64 = 35.0;

/// Sensor width (mm); the sensor fits the larger image dimension.
pub const SENSOR_MM: f64 = 36.0;

const AMBIENT: f32 = 0.15;
const BACKGROUND: [u8; 3] = [40, 40, 48];
const NEAR_CLIP: f64 = 1e-3;

/// Deterministic stand-in renderer.
///
/// Each object is painted as the screen-space rectangle enclosing its
/// projected bounding box, far objects first, so nearer objects occlude
/// farther ones. Shading is one flat intensity per object from ambient light
/// plus inverse-square point lights. Objects crossing the near plane are not
/// drawn.
#[derive(Debug, Clone)]
pub struct SimRenderer {
    width: u32,
    height: u32,

    /// Current camera-to-world transform
    pose: Matrix4<f64>,

    /// Objects in load order
    objects: Vec<SceneObject>,

    lights: Vec<PointLight>,

    /// Number of completed render calls
    frames_rendered: u64,
}

impl SimRenderer {
    /// Creates a 640x480 renderer over `objects` with the camera at the origin.
    pub fn new(objects: Vec<SceneObject>) -> Self {
        Self {
            width: 640,
            height: 480,
            pose: Matrix4::identity(),
            objects,
            lights: Vec::new(),
            frames_rendered: 0,
        }
    }

    /// Builds a renderer from a parsed scene description.
    pub fn from_scene(scene: &SceneDescription) -> Result<Self, SimError> {
        Ok(Self::new(scene.instantiate()?))
    }

    /// Loads a scene file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SimError> {
        Self::from_scene(&SceneDescription::load(path)?)
    }

    pub fn lights(&self) -> &[PointLight] {
        &self.lights
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    fn intrinsics_struct(&self) -> CameraIntrinsics {
        let f = LENS_MM / SENSOR_MM * self.width.max(self.height) as f64;
        CameraIntrinsics::new(
            f,
            f,
            (self.width as f64 - 1.0) / 2.0,
            (self.height as f64 - 1.0) / 2.0,
        )
    }

    /// Flat shading intensity per channel for a surface point.
    fn shade(&self, object: &SceneObject, at: &Point3<f64>) -> [u8; 3] {
        let mut light = [AMBIENT; 3];
        for l in &self.lights {
            let d2 = (Point3::from(l.location) - at).norm_squared().max(1e-6);
            let irradiance = (l.energy / (4.0 * std::f64::consts::PI * d2)) as f32;
            for c in 0..3 {
                light[c] += irradiance * l.color[c];
            }
        }
        let mut rgb = [0u8; 3];
        for c in 0..3 {
            rgb[c] = ((object.color[c] * light[c].min(1.0)).clamp(0.0, 1.0) * 255.0).round() as u8;
        }
        rgb
    }

    /// Pixel rectangle covered by an object, or `None` when it is clipped.
    fn footprint(
        &self,
        object: &SceneObject,
        intrinsics: &CameraIntrinsics,
    ) -> Result<Option<(u32, u32, u32, u32)>, EnvError> {
        let corners = object.bound_box();
        let depths = view_depths(&corners, &self.pose).map_err(|e| EnvError::render(e.to_string()))?;
        if depths.iter().any(|&d| d <= NEAR_CLIP) {
            return Ok(None);
        }

        let uv = project_points(&corners, &self.pose, intrinsics)
            .map_err(|e| EnvError::render(e.to_string()))?;
        let (mut u0, mut v0, mut u1, mut v1) = (f64::MAX, f64::MAX, f64::MIN, f64::MIN);
        for p in &uv {
            u0 = u0.min(p.x);
            v0 = v0.min(p.y);
            u1 = u1.max(p.x);
            v1 = v1.max(p.y);
        }

        let (w, h) = (self.width as f64, self.height as f64);
        if u1 < 0.0 || v1 < 0.0 || u0 >= w || v0 >= h {
            return Ok(None);
        }
        let x0 = u0.max(0.0).floor() as u32;
        let y0 = v0.max(0.0).floor() as u32;
        let x1 = (u1.ceil() as u32).min(self.width - 1);
        let y1 = (v1.ceil() as u32).min(self.height - 1);
        Ok(Some((x0, y0, x1, y1)))
    }
}

impl RenderContext for SimRenderer {
    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn set_resolution(&mut self, width: u32, height: u32) -> Result<(), EnvError> {
        if width == 0 || height == 0 {
            return Err(EnvError::InvalidResolution { width, height });
        }
        self.width = width;
        self.height = height;
        Ok(())
    }

    fn intrinsics(&self) -> Matrix3<f64> {
        self.intrinsics_struct().to_k()
    }

    fn camera_pose(&self) -> Matrix4<f64> {
        self.pose
    }

    fn set_camera_pose(&mut self, cam2world: Matrix4<f64>) {
        self.pose = cam2world;
    }

    fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    fn set_object_rotation(&mut self, index: usize, rotation: Rotation3<f64>) -> Result<(), EnvError> {
        let count = self.objects.len();
        let object = self
            .objects
            .get_mut(index)
            .ok_or(EnvError::UnknownObject { index, count })?;
        object.rotation = rotation;
        Ok(())
    }

    fn add_point_light(&mut self, light: PointLight) {
        self.lights.push(light);
    }

    fn clear_lights(&mut self) {
        self.lights.clear();
    }

    fn render(&mut self) -> Result<RenderOutput, EnvError> {
        let world2cam = self
            .pose
            .try_inverse()
            .ok_or_else(|| EnvError::render("camera pose is not invertible"))?;
        let intrinsics = self.intrinsics_struct();

        // Painter's order: farthest object centre first
        let mut order: Vec<(usize, f64)> = self
            .objects
            .iter()
            .enumerate()
            .map(|(i, o)| (i, -world2cam.transform_point(&Point3::from(o.location)).z))
            .collect();
        order.sort_by(|a, b| b.1.total_cmp(&a.1));

        let mut color = ColorFrame::filled(self.width, self.height, BACKGROUND);
        let mut segmentation = SegmentationMap::new(self.width, self.height);

        for (i, _) in order {
            let object = &self.objects[i];
            let Some((x0, y0, x1, y1)) = self.footprint(object, &intrinsics)? else {
                debug!("{} not drawn (clipped or off-screen)", object.name);
                continue;
            };
            let rgb = self.shade(object, &Point3::from(object.location));
            for y in y0..=y1 {
                for x in x0..=x1 {
                    segmentation.set(x, y, object.instance_id);
                    color.set_pixel(x, y, rgb);
                }
            }
        }

        self.frames_rendered += 1;
        Ok(RenderOutput { color, segmentation })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use dopegen_core::pose::{build_transformation_mat, rotation_from_euler};
    use dopegen_core::visibility::count_pixels;
    use nalgebra::Vector3;
    use std::f64::consts::FRAC_PI_2;

    /// Camera at (0, -10, 0) looking along +Y.
    fn front_pose() -> Matrix4<f64> {
        build_transformation_mat(Vector3::new(0.0, -10.0, 0.0), &rotation_from_euler(FRAC_PI_2, 0.0, 0.0))
    }

    fn cube(name: &str, id: u32, location: Vector3<f64>) -> SceneObject {
        SceneObject::new(name, "box", id, location, Vector3::new(1.0, 1.0, 1.0))
    }

    #[test]
    fn test_default_intrinsics() {
        let renderer = SimRenderer::new(Vec::new());
        let k = renderer.intrinsics();
        assert_relative_eq!(k[(0, 0)], 35.0 / 36.0 * 640.0);
        assert_relative_eq!(k[(0, 2)], 319.5);
        assert_relative_eq!(k[(1, 2)], 239.5);
    }

    #[test]
    fn test_centered_object_covers_principal_point() {
        let mut renderer = SimRenderer::new(vec![cube("a", 1, Vector3::zeros())]);
        renderer.set_camera_pose(front_pose());

        let out = renderer.render().unwrap();
        assert_eq!(out.segmentation.get(320, 240), 1);
        assert_eq!(out.segmentation.get(0, 0), 0);
        assert!(count_pixels(&out.segmentation, 1) > 100);
        assert_eq!(renderer.frames_rendered(), 1);
    }

    #[test]
    fn test_near_object_occludes_far_object() {
        let far = cube("far", 1, Vector3::new(0.0, 5.0, 0.0));
        let near = cube("near", 2, Vector3::new(0.0, -2.0, 0.0));
        let mut renderer = SimRenderer::new(vec![far, near]);
        renderer.set_camera_pose(front_pose());

        let out = renderer.render().unwrap();
        assert_eq!(out.segmentation.get(320, 240), 2);
    }

    #[test]
    fn test_object_behind_camera_not_drawn() {
        let mut renderer = SimRenderer::new(vec![cube("behind", 1, Vector3::new(0.0, -20.0, 0.0))]);
        renderer.set_camera_pose(front_pose());

        let out = renderer.render().unwrap();
        assert_eq!(count_pixels(&out.segmentation, 1), 0);
    }

    #[test]
    fn test_lights_brighten_frame() {
        let mut renderer = SimRenderer::new(vec![cube("a", 1, Vector3::zeros())]);
        renderer.set_camera_pose(front_pose());
        let dark = renderer.render().unwrap();

        renderer.add_point_light(PointLight::white([0.0, -3.0, 0.0], 1000.0));
        let lit = renderer.render().unwrap();

        let idx = ((240 * 640 + 320) * 3) as usize;
        assert!(lit.color.as_bytes()[idx] > dark.color.as_bytes()[idx]);

        renderer.clear_lights();
        assert!(renderer.lights().is_empty());
    }

    #[test]
    fn test_invalid_inputs() {
        let mut renderer = SimRenderer::new(vec![cube("a", 1, Vector3::zeros())]);
        assert!(renderer.set_resolution(0, 10).is_err());
        assert!(matches!(
            renderer.set_object_rotation(3, Rotation3::identity()),
            Err(EnvError::UnknownObject { index: 3, count: 1 })
        ));

        renderer.set_camera_pose(Matrix4::zeros());
        assert!(matches!(renderer.render(), Err(EnvError::RenderError(_))));
    }
}

//! Renderer session trait used by every dopegen pipeline.

use crate::error::EnvError;
use crate::types::{PointLight, RenderOutput, SceneObject};
use nalgebra::{Matrix3, Matrix4, Rotation3};

/// The central interface for renderer interaction.
///
/// All renderer state (camera pose, object poses, lights, resolution) is
/// read and mutated through this trait, so the annotation pipeline never
/// depends on hidden global state.
///
/// # Implementations
///
/// - **Simulation**: `SimRenderer` in `dopegen_sim` - deterministic software
///   stand-in painting cuboid footprints
///
/// # Call order
///
/// A frame is produced by `set_camera_pose` → `render`. The pose and
/// intrinsics read back afterwards describe exactly the returned frame.
pub trait RenderContext {
    /// Returns the output resolution as (width, height).
    fn resolution(&self) -> (u32, u32);

    /// Changes the output resolution. Intrinsics follow the new size.
    fn set_resolution(&mut self, width: u32, height: u32) -> Result<(), EnvError>;

    /// Returns the 3x3 intrinsic matrix K.
    fn intrinsics(&self) -> Matrix3<f64>;

    /// Returns the current camera-to-world transform.
    fn camera_pose(&self) -> Matrix4<f64>;

    /// Replaces the camera-to-world transform used by the next render.
    fn set_camera_pose(&mut self, cam2world: Matrix4<f64>);

    /// Returns the loaded objects in scene-load order.
    fn objects(&self) -> &[SceneObject];

    /// Sets the world rotation of the object at `index`.
    fn set_object_rotation(&mut self, index: usize, rotation: Rotation3<f64>)
        -> Result<(), EnvError>;

    /// Adds a point light to the scene.
    fn add_point_light(&mut self, light: PointLight);

    /// Removes all lights.
    fn clear_lights(&mut self);

    /// Renders one frame from the current camera pose.
    fn render(&mut self) -> Result<RenderOutput, EnvError>;
}

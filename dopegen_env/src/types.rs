//! Scene and frame types shared between the renderer and the annotation pipeline.

use crate::error::EnvError;
use nalgebra::{Point3, Rotation3, Vector3};
use serde::{Deserialize, Serialize};

/// Signs of the local (x, y, z) half extents for each bounding-box corner,
/// in the order the renderer reports them.
pub const BOUND_BOX_SIGNS: [[f64; 3]; 8] = [
    [-1.0, -1.0, -1.0],
    [-1.0, -1.0, 1.0],
    [-1.0, 1.0, 1.0],
    [-1.0, 1.0, -1.0],
    [1.0, -1.0, -1.0],
    [1.0, -1.0, 1.0],
    [1.0, 1.0, 1.0],
    [1.0, 1.0, -1.0],
];

/// A mesh instance loaded from the scene.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneObject {
    /// Object name as stored in the scene (e.g. "door_0")
    pub name: String,

    /// Class label written to annotations (e.g. "door")
    pub class: String,

    /// 1-based instance id; also the value painted into segmentation maps
    pub instance_id: u32,

    /// World-space location of the object origin
    pub location: Vector3<f64>,

    /// Object-to-world rotation
    pub rotation: Rotation3<f64>,

    /// Local axis-aligned half extents of the mesh
    pub half_extents: Vector3<f64>,

    /// Base color (linear, 0..1)
    pub color: [f32; 3],
}

impl SceneObject {
    /// Creates an unrotated object.
    pub fn new(
        name: impl Into<String>,
        class: impl Into<String>,
        instance_id: u32,
        location: Vector3<f64>,
        half_extents: Vector3<f64>,
    ) -> Self {
        Self {
            name: name.into(),
            class: class.into(),
            instance_id,
            location,
            rotation: Rotation3::identity(),
            half_extents,
            color: [0.8, 0.8, 0.8],
        }
    }

    /// Returns the 8 world-space corners of the bounding box.
    pub fn bound_box(&self) -> [Point3<f64>; 8] {
        BOUND_BOX_SIGNS.map(|s| {
            let local = Vector3::new(
                s[0] * self.half_extents.x,
                s[1] * self.half_extents.y,
                s[2] * self.half_extents.z,
            );
            Point3::from(self.location + self.rotation * local)
        })
    }

    /// Rotation as a plain 3x3 matrix.
    pub fn rotation_matrix(&self) -> nalgebra::Matrix3<f64> {
        *self.rotation.matrix()
    }
}

/// A point light.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointLight {
    pub location: [f64; 3],
    pub energy: f64,
    pub color: [f32; 3],
}

impl PointLight {
    /// White light at `location`.
    pub fn white(location: [f64; 3], energy: f64) -> Self {
        Self {
            location,
            energy,
            color: [1.0, 1.0, 1.0],
        }
    }
}

/// Per-pixel instance ids, row-major. 0 is background.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentationMap {
    width: u32,
    height: u32,
    ids: Vec<u32>,
}

impl SegmentationMap {
    /// Creates an all-background map.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ids: vec![0; width as usize * height as usize],
        }
    }

    /// Wraps an existing buffer.
    pub fn from_vec(width: u32, height: u32, ids: Vec<u32>) -> Result<Self, EnvError> {
        let expected = width as usize * height as usize;
        if ids.len() != expected {
            return Err(EnvError::BufferSize {
                expected,
                actual: ids.len(),
            });
        }
        Ok(Self { width, height, ids })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Instance id at pixel (x, y).
    pub fn get(&self, x: u32, y: u32) -> u32 {
        self.ids[(y * self.width + x) as usize]
    }

    pub fn set(&mut self, x: u32, y: u32, id: u32) {
        let idx = (y * self.width + x) as usize;
        self.ids[idx] = id;
    }

    /// Raw row-major ids.
    pub fn as_slice(&self) -> &[u32] {
        &self.ids
    }
}

/// An RGB8 color frame, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorFrame {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl ColorFrame {
    /// Creates a frame filled with one color.
    pub fn filled(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let mut data = Vec::with_capacity(width as usize * height as usize * 3);
        for _ in 0..(width as usize * height as usize) {
            data.extend_from_slice(&rgb);
        }
        Self {
            width,
            height,
            data,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, rgb: [u8; 3]) {
        let idx = ((y * self.width + x) * 3) as usize;
        self.data[idx..idx + 3].copy_from_slice(&rgb);
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

/// Everything one render call produces.
#[derive(Debug, Clone)]
pub struct RenderOutput {
    pub color: ColorFrame,
    pub segmentation: SegmentationMap,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_bound_box_axis_aligned() {
        let obj = SceneObject::new(
            "box",
            "box",
            1,
            Vector3::new(1.0, 2.0, 3.0),
            Vector3::new(0.5, 1.0, 2.0),
        );
        let bb = obj.bound_box();

        assert_relative_eq!(bb[0].coords, Vector3::new(0.5, 1.0, 1.0));
        assert_relative_eq!(bb[6].coords, Vector3::new(1.5, 3.0, 5.0));
        assert_relative_eq!(bb[1].coords, Vector3::new(0.5, 1.0, 5.0));
    }

    #[test]
    fn test_bound_box_follows_rotation() {
        let mut obj = SceneObject::new("box", "box", 1, Vector3::zeros(), Vector3::new(1.0, 0.0, 0.0));
        obj.rotation = Rotation3::from_euler_angles(0.0, 0.0, std::f64::consts::FRAC_PI_2);

        // +x half extent rotated onto +y
        let bb = obj.bound_box();
        assert_relative_eq!(bb[4].coords, Vector3::new(0.0, 1.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_segmentation_map_buffer_size() {
        assert!(SegmentationMap::from_vec(2, 2, vec![0; 3]).is_err());

        let mut map = SegmentationMap::from_vec(2, 2, vec![0; 4]).unwrap();
        map.set(1, 1, 7);
        assert_eq!(map.get(1, 1), 7);
        assert_eq!(map.as_slice(), &[0, 0, 0, 7]);
    }

    #[test]
    fn test_color_frame_set_pixel() {
        let mut frame = ColorFrame::filled(2, 1, [10, 20, 30]);
        frame.set_pixel(1, 0, [1, 2, 3]);
        assert_eq!(frame.as_bytes(), &[10, 20, 30, 1, 2, 3]);
    }
}

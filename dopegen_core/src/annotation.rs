//! DOPE annotation documents - one JSON file per rendered frame.
//!
//! The layout, field names and sign conventions are consumed verbatim by
//! DOPE training tooling:
//!
//! ```text
//! camera_data
//!   width, height
//!   camera_look_at { at = -R[:,2], eye = -t, up = R[:,0] }
//!   intrinsics     { fx, fy, cx, cy }
//! objects[]
//!   class, name, visibility, projected_cuboid?, location, quaternion_xyzw
//! ```

use crate::error::{CoreError, Result};
use crate::pose::quaternion_xyzw;
use crate::projection::{project_cuboid, CameraIntrinsics};
use crate::visibility::VisibilityFilter;
use dopegen_env::{RenderContext, SceneObject, SegmentationMap};
use nalgebra::Matrix4;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::debug;

/// Camera placement as stored in the annotation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraLookAt {
    pub at: [f64; 3],
    pub eye: [f64; 3],
    pub up: [f64; 3],
}

impl CameraLookAt {
    /// Derives at/eye/up from a camera-to-world pose.
    pub fn from_pose(cam2world: &Matrix4<f64>) -> Self {
        let m = cam2world;
        Self {
            at: [-m[(0, 2)], -m[(1, 2)], -m[(2, 2)]],
            eye: [-m[(0, 3)], -m[(1, 3)], -m[(2, 3)]],
            up: [m[(0, 0)], m[(1, 0)], m[(2, 0)]],
        }
    }
}

/// `camera_data` block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraData {
    pub width: u32,
    pub height: u32,
    pub camera_look_at: CameraLookAt,
    pub intrinsics: CameraIntrinsics,
}

/// One visible object in a frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectAnnotation {
    pub class: String,
    pub name: String,

    /// Pixels owned by the object in the segmentation map
    pub visibility: u64,

    /// 8 DOPE-ordered corners + centroid, in pixels
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projected_cuboid: Option<Vec<[f64; 2]>>,

    pub location: [f64; 3],
    pub quaternion_xyzw: [f64; 4],
}

/// A complete per-frame document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DopeFrame {
    pub camera_data: CameraData,
    pub objects: Vec<ObjectAnnotation>,
}

/// Knobs for [`annotate_frame`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnnotationOptions {
    pub visibility: VisibilityFilter,

    /// Emit `projected_cuboid` for every object
    pub include_cuboid: bool,
}

impl Default for AnnotationOptions {
    fn default() -> Self {
        Self {
            visibility: VisibilityFilter::default(),
            include_cuboid: true,
        }
    }
}

impl AnnotationOptions {
    pub fn with_min_pixels(mut self, min_pixels: u64) -> Self {
        self.visibility = VisibilityFilter::new(min_pixels);
        self
    }

    pub fn with_cuboid(mut self, include: bool) -> Self {
        self.include_cuboid = include;
        self
    }
}

/// Builds the camera block from the session's current state.
pub fn camera_data<R: RenderContext + ?Sized>(ctx: &R) -> CameraData {
    let (width, height) = ctx.resolution();
    CameraData {
        width,
        height,
        camera_look_at: CameraLookAt::from_pose(&ctx.camera_pose()),
        intrinsics: CameraIntrinsics::from_k(&ctx.intrinsics()),
    }
}

/// Annotates one object, or returns `None` if it fails the visibility filter.
pub fn annotate_object(
    object: &SceneObject,
    cam2world: &Matrix4<f64>,
    intrinsics: &CameraIntrinsics,
    segmentation: &SegmentationMap,
    options: &AnnotationOptions,
) -> Result<Option<ObjectAnnotation>> {
    let Some(visibility) = options.visibility.evaluate(segmentation, object.instance_id) else {
        debug!(
            "Skipping {} (instance {}): below {} pixels",
            object.name, object.instance_id, options.visibility.min_pixels
        );
        return Ok(None);
    };

    let projected_cuboid = if options.include_cuboid {
        let cuboid = project_cuboid(&object.bound_box(), cam2world, intrinsics)?;
        Some(cuboid.iter().map(|p| [p.x, p.y]).collect())
    } else {
        None
    };

    Ok(Some(ObjectAnnotation {
        class: object.class.clone(),
        name: object.name.clone(),
        visibility,
        projected_cuboid,
        location: [object.location.x, object.location.y, object.location.z],
        quaternion_xyzw: quaternion_xyzw(&object.rotation_matrix()),
    }))
}

/// Builds the annotation document for the frame just rendered by `ctx`.
///
/// `objects` are visited in order; the output keeps that order minus the
/// objects the visibility filter rejects.
pub fn annotate_frame<'a, R, I>(
    ctx: &R,
    objects: I,
    segmentation: &SegmentationMap,
    options: &AnnotationOptions,
) -> Result<DopeFrame>
where
    R: RenderContext + ?Sized,
    I: IntoIterator<Item = &'a SceneObject>,
{
    let camera_data = camera_data(ctx);
    let cam2world = ctx.camera_pose();

    let mut annotations = Vec::new();
    for object in objects {
        if let Some(annotation) = annotate_object(
            object,
            &cam2world,
            &camera_data.intrinsics,
            segmentation,
            options,
        )? {
            annotations.push(annotation);
        }
    }

    Ok(DopeFrame {
        camera_data,
        objects: annotations,
    })
}

/// Serializes a document with 4-space indentation.
pub fn to_json_string(frame: &DopeFrame) -> Result<String> {
    let mut buf = Vec::new();
    write_pretty(&mut buf, frame)?;
    // serde_json only emits UTF-8
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Writes a document to `path`, replacing any existing file.
///
/// The parent directory must already exist.
pub fn write_json(path: impl AsRef<Path>, frame: &DopeFrame) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| CoreError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    write_pretty(&mut writer, frame)?;
    writer.flush().map_err(|e| CoreError::io(path, e))?;
    Ok(())
}

fn write_pretty<W: Write>(writer: W, frame: &DopeFrame) -> Result<()> {
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(writer, formatter);
    frame.serialize(&mut ser)?;
    Ok(())
}

//! dopegen Core - DOPE-style pose annotation pipeline
//!
//! Turns a rendered frame into training annotations:
//! 1. **Projection**: bounding-box corners + centroid → 9 pixel keypoints
//! 2. **Pose**: object rotation matrix → (x, y, z, w) quaternion
//! 3. **Visibility**: segmentation pixel count, with a minimum threshold
//! 4. **Serialization**: one DOPE JSON document per frame
//!
//! Renderer state is only ever read through [`dopegen_env::RenderContext`].

pub mod annotation;
pub mod camera_file;
pub mod error;
pub mod imaging;
pub mod labels;
pub mod pose;
pub mod projection;
pub mod visibility;

// Re-export key types for convenience
pub use annotation::{annotate_frame, write_json, AnnotationOptions, DopeFrame, ObjectAnnotation};
pub use camera_file::{read_camera_positions, CameraPosition};
pub use error::{CoreError, Result};
pub use imaging::FrameFormat;
pub use labels::KeypointLabel;
pub use pose::quaternion_xyzw;
pub use projection::{project_cuboid, project_points, CameraIntrinsics, DOPE_CUBOID_ORDER};
pub use visibility::VisibilityFilter;

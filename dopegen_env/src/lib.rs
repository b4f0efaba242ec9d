//! dopegen Renderer Session Layer
//!
//! This crate provides the narrow interface through which dopegen pipelines
//! drive a 3D renderer: load scene → set camera pose → render → receive a
//! color frame and an instance segmentation map.
//!
//! # Core Concept: Explicit Session
//!
//! Renderers typically keep implicit scene and camera state mutated by
//! sequential calls. Here that state lives behind [`RenderContext`], which is
//! passed by reference to the projector and serializer. Nothing reads
//! renderer state any other way.
//!
//! # Example
//!
//! ```ignore
//! use dopegen_env::RenderContext;
//!
//! fn render_at<R: RenderContext>(ctx: &mut R, pose: nalgebra::Matrix4<f64>) {
//!     ctx.set_camera_pose(pose);
//!     let out = ctx.render()?;
//!     annotate(ctx, &out);
//! }
//! ```

mod context;
mod error;
mod types;

pub use context::RenderContext;
pub use error::EnvError;
pub use types::{
    ColorFrame, PointLight, RenderOutput, SceneObject, SegmentationMap, BOUND_BOX_SIGNS,
};

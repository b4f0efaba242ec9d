//! dopegen Simulation Renderer and Dataset Pipelines
//!
//! This crate provides the deterministic renderer and the pipelines that turn
//! a scene plus camera placements into a synthetic pose-estimation dataset.
//!
//! # Core Principle: Reproducible Datasets
//!
//! - **Rendering**: `SimRenderer` paints cuboid footprints with no hidden state
//! - **Randomness**: lights and camera placement come from one seeded ChaCha8 RNG
//! - **Failures**: a broken frame is logged and skipped, never fatal
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │                    PipelineRunner                      │
//! │   dope  │  sweep  │  orbit                             │
//! └────┬───────────────────────────────┬───────────────────┘
//!      │ RenderContext                 │ annotations / images
//! ┌────▼──────────┐              ┌─────▼──────────────┐
//! │  SimRenderer  │              │   dopegen_core     │
//! │ (scene.json)  │              │ project → filter → │
//! └───────────────┘              │ serialize          │
//!                                └────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use dopegen_sim::{DopeConfig, PipelineRunner, SimRenderer};
//!
//! let renderer = SimRenderer::load("scene.json")?;
//! let mut runner = PipelineRunner::new(renderer);
//! let summary = runner.run_dope(&DopeConfig::new("camera_positions", "output"))?;
//! assert!(summary.passed());
//! ```

mod context;
mod world;
pub mod pipelines;
pub mod runner;

pub use context::SimRenderer;
pub use world::{ObjectDescription, SceneDescription, SimError};
pub use pipelines::PipelineId;
pub use runner::{DopeConfig, FrameFailure, OrbitConfig, PipelineRunner, RunSummary, SweepConfig};

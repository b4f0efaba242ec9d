//! Pipeline runner - drives a `RenderContext` frame by frame and writes datasets.
//!
//! Every pipeline follows the same error policy: setup failures (output
//! directories, camera file, resolution) abort the run, while a failure
//! inside one frame is logged, recorded in the [`RunSummary`] and the loop
//! moves on to the next frame.

use crate::pipelines::PipelineId;

use dopegen_core::annotation::{annotate_frame, write_json, AnnotationOptions};
use dopegen_core::camera_file::read_camera_positions;
use dopegen_core::imaging::{draw_cuboid_markers, save_binary_mask, save_color, save_image, to_rgb_image, FrameFormat};
use dopegen_core::labels::{write_labels, KeypointLabel};
use dopegen_core::pose::{build_transformation_mat, rotation_from_euler, rotation_from_forward};
use dopegen_core::projection::{project_cuboid, project_points, CameraIntrinsics};
use dopegen_core::{CameraPosition, CoreError, Result};
use dopegen_env::{PointLight, RenderContext};
use nalgebra::Vector3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::f64::consts::{FRAC_PI_2, PI};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// The single fixed light used by the dope and orbit pipelines.
pub const KEY_LIGHT: PointLight = PointLight {
    location: [5.0, -5.0, 5.0],
    energy: 1000.0,
    color: [1.0, 1.0, 1.0],
};

/// Maximum in-plane camera roll for the orbit pipeline (radians).
pub const ORBIT_MAX_INPLANE: f64 = 0.7854;

/// A frame that could not be produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameFailure {
    pub index: usize,
    pub reason: String,
}

/// Results from running a pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    /// Pipeline that was run
    pub pipeline: PipelineId,

    /// Frames attempted
    pub frames_total: usize,

    /// Frames fully written
    pub frames_written: usize,

    /// Frames that failed, in order
    pub failed: Vec<FrameFailure>,
}

impl RunSummary {
    fn new(pipeline: PipelineId) -> Self {
        Self {
            pipeline,
            frames_total: 0,
            frames_written: 0,
            failed: Vec::new(),
        }
    }

    /// True when no frame failed.
    pub fn passed(&self) -> bool {
        self.failed.is_empty()
    }

    fn record(&mut self, index: usize, result: Result<()>) {
        self.frames_total += 1;
        match result {
            Ok(()) => self.frames_written += 1,
            Err(e) => {
                error!("Error processing frame {}: {}", index, e);
                self.failed.push(FrameFailure {
                    index,
                    reason: e.to_string(),
                });
            }
        }
    }
}

/// Configuration for the `dope` pipeline.
#[derive(Debug, Clone)]
pub struct DopeConfig {
    /// Camera positions file
    pub camera_file: PathBuf,

    /// Directory receiving frame_NNNNNN.{json,jpg}
    pub output_dir: PathBuf,

    pub width: u32,
    pub height: u32,

    /// Objects below this many pixels are left out
    pub min_pixels: u64,

    /// Emit `projected_cuboid`
    pub include_cuboid: bool,

    pub write_images: bool,
    pub write_json: bool,
}

impl Default for DopeConfig {
    fn default() -> Self {
        Self {
            camera_file: PathBuf::from("camera_positions"),
            output_dir: PathBuf::from("output"),
            width: 512,
            height: 512,
            min_pixels: 0,
            include_cuboid: true,
            write_images: true,
            write_json: true,
        }
    }
}

impl DopeConfig {
    pub fn new(camera_file: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            camera_file: camera_file.into(),
            output_dir: output_dir.into(),
            ..Default::default()
        }
    }

    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_min_pixels(mut self, min_pixels: u64) -> Self {
        self.min_pixels = min_pixels;
        self
    }

    pub fn with_cuboid(mut self, include: bool) -> Self {
        self.include_cuboid = include;
        self
    }

    pub fn with_outputs(mut self, images: bool, json: bool) -> Self {
        self.write_images = images;
        self.write_json = json;
        self
    }
}

/// Configuration for the `sweep` pipeline.
#[derive(Debug, Clone)]
pub struct SweepConfig {
    pub output_dir: PathBuf,
    pub width: u32,
    pub height: u32,

    /// Number of frames to render
    pub nb_frames: usize,

    pub min_pixels: u64,

    /// Overlay projected cuboid keypoints on the saved images
    pub debug: bool,

    /// Seed for light randomization
    pub seed: u64,

    /// Only objects whose name starts with one of these are annotated
    pub prefixes: Vec<String>,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            width: 640,
            height: 480,
            nb_frames: 2,
            min_pixels: 100,
            debug: false,
            seed: 42,
            prefixes: vec!["door".to_string(), "frame".to_string()],
        }
    }
}

impl SweepConfig {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            ..Default::default()
        }
    }

    pub fn with_frames(mut self, nb_frames: usize) -> Self {
        self.nb_frames = nb_frames;
        self
    }

    pub fn with_min_pixels(mut self, min_pixels: u64) -> Self {
        self.min_pixels = min_pixels;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_prefixes(mut self, prefixes: Vec<String>) -> Self {
        self.prefixes = prefixes;
        self
    }
}

/// Configuration for the `orbit` pipeline.
#[derive(Debug, Clone)]
pub struct OrbitConfig {
    /// Root directory; rgb/, masks/ and labels/ are created below it
    pub output_dir: PathBuf,
    pub width: u32,
    pub height: u32,

    /// Number of rotation steps over [0, 2π]
    pub steps: usize,

    /// Seed for camera placement
    pub seed: u64,
}

impl Default for OrbitConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            width: 640,
            height: 480,
            steps: 36,
            seed: 42,
        }
    }
}

impl OrbitConfig {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            ..Default::default()
        }
    }

    pub fn with_steps(mut self, steps: usize) -> Self {
        self.steps = steps;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// `frame_000042.<ext>`
pub fn frame_file_name(index: usize, extension: &str) -> String {
    format!("frame_{index:06}.{extension}")
}

/// `n` evenly spaced values over [start, end], both ends included.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => (0..n)
            .map(|i| start + (end - start) * i as f64 / (n - 1) as f64)
            .collect(),
    }
}

/// Camera pose used by the sweep pipeline: 25 units in front of the origin.
pub fn sweep_camera_pose() -> nalgebra::Matrix4<f64> {
    build_transformation_mat(
        Vector3::new(0.0, -25.0, 0.0),
        &rotation_from_euler(FRAC_PI_2, 0.0, 0.0),
    )
}

fn ensure_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path).map_err(|e| CoreError::io(path, e))
}

/// 1 to 3 point lights with randomized placement, energy and tint.
pub fn random_lights(rng: &mut impl Rng) -> Vec<PointLight> {
    let count = rng.gen_range(1..4);
    (0..count)
        .map(|_| PointLight {
            location: [
                rng.gen_range(-10.0..10.0),
                rng.gen_range(-10.0..10.0),
                rng.gen_range(5.0..15.0),
            ],
            energy: rng.gen_range(300.0..1500.0),
            color: [
                rng.gen_range(0.8..1.0),
                rng.gen_range(0.8..1.0),
                rng.gen_range(0.8..1.0),
            ],
        })
        .collect()
}

/// Runs pipelines against a renderer session.
pub struct PipelineRunner<R: RenderContext> {
    ctx: R,
}

impl<R: RenderContext> PipelineRunner<R> {
    /// Creates a runner owning the session.
    pub fn new(ctx: R) -> Self {
        Self { ctx }
    }

    /// Read access to the session.
    pub fn context(&self) -> &R {
        &self.ctx
    }

    /// Returns the session.
    pub fn into_inner(self) -> R {
        self.ctx
    }

    /// One frame per camera position: `frame_NNNNNN.json` + `frame_NNNNNN.jpg`.
    pub fn run_dope(&mut self, config: &DopeConfig) -> Result<RunSummary> {
        ensure_dir(&config.output_dir)?;
        let positions = read_camera_positions(&config.camera_file)?;

        self.ctx.set_resolution(config.width, config.height)?;
        self.ctx.clear_lights();
        self.ctx.add_point_light(KEY_LIGHT);

        let options = AnnotationOptions::default()
            .with_min_pixels(config.min_pixels)
            .with_cuboid(config.include_cuboid);

        info!(
            "Rendering {} camera positions into {}",
            positions.len(),
            config.output_dir.display()
        );

        let mut summary = RunSummary::new(PipelineId::Dope);
        for (idx, position) in positions.iter().enumerate() {
            debug!(
                "Processing camera position {}: position={:?}, rotation={:?}",
                idx,
                position.position.as_slice(),
                position.euler.as_slice()
            );
            let result = self.dope_frame(idx, position, config, &options);
            summary.record(idx, result);
        }

        info!(
            "Rendering complete: {}/{} frames written",
            summary.frames_written, summary.frames_total
        );
        Ok(summary)
    }

    fn dope_frame(
        &mut self,
        idx: usize,
        position: &CameraPosition,
        config: &DopeConfig,
        options: &AnnotationOptions,
    ) -> Result<()> {
        self.ctx.set_camera_pose(position.to_pose());
        let output = self.ctx.render()?;

        if config.write_json {
            let frame = annotate_frame(&self.ctx, self.ctx.objects(), &output.segmentation, options)?;
            write_json(config.output_dir.join(frame_file_name(idx, "json")), &frame)?;
        }
        if config.write_images {
            let path = config
                .output_dir
                .join(frame_file_name(idx, FrameFormat::Jpeg.extension()));
            save_color(&output.color, path, FrameFormat::Jpeg)?;
        }
        Ok(())
    }

    /// Fixed camera, fresh random lights each frame, prefix-filtered objects.
    pub fn run_sweep(&mut self, config: &SweepConfig) -> Result<RunSummary> {
        let mut summary = RunSummary::new(PipelineId::Sweep);

        let targets: Vec<usize> = self
            .ctx
            .objects()
            .iter()
            .enumerate()
            .filter(|(_, o)| config.prefixes.iter().any(|p| o.name.starts_with(p.as_str())))
            .map(|(i, _)| i)
            .collect();
        if targets.is_empty() {
            warn!("No objects matching {:?} found in the scene", config.prefixes);
            return Ok(summary);
        }

        ensure_dir(&config.output_dir)?;
        self.ctx.set_resolution(config.width, config.height)?;
        self.ctx.set_camera_pose(sweep_camera_pose());

        let options = AnnotationOptions::default().with_min_pixels(config.min_pixels);
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);

        info!(
            "Sweeping {} frames over {} target objects (seed={})",
            config.nb_frames,
            targets.len(),
            config.seed
        );

        for frame in 0..config.nb_frames {
            self.ctx.clear_lights();
            for light in random_lights(&mut rng) {
                self.ctx.add_point_light(light);
            }
            let result = self.sweep_frame(frame, &targets, config, &options);
            summary.record(frame, result);
        }

        info!("Saved JSON and images to {}", config.output_dir.display());
        Ok(summary)
    }

    fn sweep_frame(
        &mut self,
        frame: usize,
        targets: &[usize],
        config: &SweepConfig,
        options: &AnnotationOptions,
    ) -> Result<()> {
        let output = self.ctx.render()?;
        let objects = self.ctx.objects();
        let selected = targets.iter().map(|&i| &objects[i]);

        let document = annotate_frame(&self.ctx, selected, &output.segmentation, options)?;
        write_json(config.output_dir.join(frame_file_name(frame, "json")), &document)?;

        let mut image = to_rgb_image(&output.color)?;
        if config.debug {
            let pose = self.ctx.camera_pose();
            let intrinsics = CameraIntrinsics::from_k(&self.ctx.intrinsics());
            for &i in targets {
                let cuboid = project_cuboid(&objects[i].bound_box(), &pose, &intrinsics)?;
                draw_cuboid_markers(&mut image, &cuboid);
            }
        }
        let path = config
            .output_dir
            .join(frame_file_name(frame, FrameFormat::Png.extension()));
        save_image(&image, path, FrameFormat::Png)
    }

    /// Rotates every object through [0, 2π] and renders each step from a
    /// random viewpoint above the scene.
    pub fn run_orbit(&mut self, config: &OrbitConfig) -> Result<RunSummary> {
        let rgb_dir = config.output_dir.join("rgb");
        let mask_dir = config.output_dir.join("masks");
        let label_dir = config.output_dir.join("labels");
        for dir in [&rgb_dir, &mask_dir, &label_dir] {
            ensure_dir(dir)?;
        }

        self.ctx.set_resolution(config.width, config.height)?;
        self.ctx.clear_lights();
        self.ctx.add_point_light(KEY_LIGHT);

        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let mut summary = RunSummary::new(PipelineId::Orbit);

        info!("Orbiting {} steps (seed={})", config.steps, config.seed);

        for (step, angle) in linspace(0.0, 2.0 * PI, config.steps).into_iter().enumerate() {
            let stem = format!("{:06}_angle_{}", step, angle.to_degrees() as i64);
            let camera_position = Vector3::new(
                rng.gen_range(-10.0..10.0),
                rng.gen_range(-10.0..10.0),
                rng.gen_range(8.0..12.0),
            );
            let inplane = rng.gen_range(-ORBIT_MAX_INPLANE..ORBIT_MAX_INPLANE);

            let dirs = [&rgb_dir, &mask_dir, &label_dir];
            let result = self.orbit_frame(angle, camera_position, inplane, &stem, dirs);
            summary.record(step, result);
        }

        info!("Dataset generation with object rotation and camera variation complete");
        Ok(summary)
    }

    fn orbit_frame(
        &mut self,
        angle: f64,
        camera_position: Vector3<f64>,
        inplane: f64,
        stem: &str,
        [rgb_dir, mask_dir, label_dir]: [&PathBuf; 3],
    ) -> Result<()> {
        let rotation = rotation_from_euler(angle / 2.0, angle, 0.0);
        for i in 0..self.ctx.objects().len() {
            self.ctx.set_object_rotation(i, rotation)?;
        }

        let look = rotation_from_forward(&(-camera_position), inplane);
        self.ctx
            .set_camera_pose(build_transformation_mat(camera_position, &look));
        let output = self.ctx.render()?;

        save_color(&output.color, rgb_dir.join(format!("{stem}.png")), FrameFormat::Png)?;
        save_binary_mask(&output.segmentation, mask_dir.join(format!("{stem}.png")))?;

        let (width, height) = self.ctx.resolution();
        let pose = self.ctx.camera_pose();
        let intrinsics = CameraIntrinsics::from_k(&self.ctx.intrinsics());
        let mut labels = Vec::with_capacity(self.ctx.objects().len());
        for object in self.ctx.objects() {
            let keypoints = project_points(&object.bound_box(), &pose, &intrinsics)?;
            labels.push(KeypointLabel::from_pixels(object.instance_id, &keypoints, width, height));
        }
        write_labels(label_dir.join(format!("{stem}.txt")), &labels, &intrinsics, width, height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::SimRenderer;
    use approx::assert_relative_eq;
    use dopegen_env::SceneObject;

    fn door_scene() -> SimRenderer {
        let door = SceneObject::new("door_0", "door", 1, Vector3::zeros(), Vector3::new(2.0, 0.2, 3.0));
        let lamp = SceneObject::new("lamp_0", "lamp", 2, Vector3::new(8.0, 0.0, 0.0), Vector3::new(0.3, 0.3, 0.3));
        SimRenderer::new(vec![door, lamp])
    }

    #[test]
    fn test_linspace() {
        let v = linspace(0.0, 2.0 * PI, 36);
        assert_eq!(v.len(), 36);
        assert_relative_eq!(v[35], 2.0 * PI);
        assert_eq!(linspace(1.0, 2.0, 1), vec![1.0]);
        assert!(linspace(0.0, 1.0, 0).is_empty());
    }

    #[test]
    fn test_frame_file_name() {
        assert_eq!(frame_file_name(0, "json"), "frame_000000.json");
        assert_eq!(frame_file_name(1234567, "png"), "frame_1234567.png");
    }

    #[test]
    fn test_random_lights_ranges_and_determinism() {
        let mut a = ChaCha8Rng::seed_from_u64(7);
        let mut b = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..20 {
            let lights = random_lights(&mut a);
            assert_eq!(lights, random_lights(&mut b));
            assert!((1..=3).contains(&lights.len()));
            for l in &lights {
                assert!((5.0..15.0).contains(&l.location[2]));
                assert!((300.0..1500.0).contains(&l.energy));
                assert!(l.color.iter().all(|c| (0.8..1.0).contains(c)));
            }
        }
    }

    #[test]
    fn test_sweep_without_targets_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let mut runner = PipelineRunner::new(door_scene());

        let config = SweepConfig::new(&out).with_prefixes(vec!["window".into()]);
        let summary = runner.run_sweep(&config).unwrap();

        assert_eq!(summary.frames_total, 0);
        assert!(summary.passed());
        assert!(!out.exists());
    }

    #[test]
    fn test_sweep_annotates_only_targets() {
        let dir = tempfile::tempdir().unwrap();
        let config = SweepConfig::new(dir.path())
            .with_frames(1)
            .with_min_pixels(1)
            .with_debug(true);
        let mut runner = PipelineRunner::new(door_scene());

        let summary = runner.run_sweep(&config).unwrap();
        assert_eq!(summary.frames_written, 1);

        let text = std::fs::read_to_string(dir.path().join("frame_000000.json")).unwrap();
        let doc: dopegen_core::DopeFrame = serde_json::from_str(&text).unwrap();
        assert_eq!(doc.objects.len(), 1);
        assert_eq!(doc.objects[0].name, "door_0");
        assert_eq!(doc.objects[0].projected_cuboid.as_ref().map(Vec::len), Some(9));
        assert!(dir.path().join("frame_000000.png").exists());

        // lights are replaced, not accumulated
        assert!(runner.context().lights().len() <= 3);
    }

    #[test]
    fn test_orbit_rotates_objects() {
        let dir = tempfile::tempdir().unwrap();
        let mut runner = PipelineRunner::new(door_scene());
        runner.run_orbit(&OrbitConfig::new(dir.path()).with_steps(3)).unwrap();

        // last step is a full turn about x/2 and y
        let renderer = runner.into_inner();
        let expected = rotation_from_euler(PI, 2.0 * PI, 0.0);
        assert_relative_eq!(
            *renderer.objects()[0].rotation.matrix(),
            *expected.matrix(),
            epsilon = 1e-12
        );
        assert_eq!(renderer.frames_rendered(), 3);
    }
}

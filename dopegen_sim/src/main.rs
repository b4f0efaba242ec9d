//! dopegen dataset generator CLI
//!
//! Render synthetic frames and write DOPE-style pose annotations.

use anyhow::Context;
use clap::{Parser, Subcommand};
use dopegen_env::RenderContext;
use dopegen_sim::{
    DopeConfig, OrbitConfig, PipelineId, PipelineRunner, RunSummary, SimRenderer, SweepConfig,
};
use std::path::{Path, PathBuf};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

/// dopegen synthetic dataset generator
#[derive(Parser, Debug)]
#[command(name = "dopegen-sim")]
#[command(about = "Generate synthetic pose-estimation datasets with DOPE annotations", long_about = None)]
struct Args {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print the run summary as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// One frame per camera position: frame_NNNNNN.json + frame_NNNNNN.jpg
    Dope {
        /// Path to the camera positions file
        #[arg(default_value = "camera_positions")]
        camera: PathBuf,

        /// Path to the scene description
        #[arg(default_value = "scene.json")]
        scene: PathBuf,

        /// Where the final files will be saved
        #[arg(default_value = "output")]
        output_dir: PathBuf,

        /// Image output width
        #[arg(long, default_value = "512")]
        width: u32,

        /// Image output height
        #[arg(long, default_value = "512")]
        height: u32,

        /// Minimum number of pixels for an object to be annotated
        #[arg(long, default_value = "0")]
        min_pixels: u64,

        /// Leave projected_cuboid out of the annotations
        #[arg(long)]
        no_cuboid: bool,

        /// Skip writing .jpg frames
        #[arg(long)]
        no_images: bool,

        /// Skip writing .json annotations
        #[arg(long)]
        no_json: bool,
    },

    /// Fixed camera with randomized lights: frame_NNNNNN.json + frame_NNNNNN.png
    Sweep {
        /// Path to the scene description
        #[arg(long, default_value = "scene.json")]
        scene: PathBuf,

        /// Image output width
        #[arg(long, default_value = "640")]
        width: u32,

        /// Image output height
        #[arg(long, default_value = "480")]
        height: u32,

        /// How many total frames to generate
        #[arg(long, default_value = "2")]
        nb_frames: usize,

        /// Output folder for images and JSON data
        #[arg(long, default_value = "output/")]
        outf: PathBuf,

        /// Minimum number of pixels for visibility
        #[arg(long, default_value = "100")]
        min_pixels: u64,

        /// Render cuboid markers for debugging purposes
        #[arg(long)]
        debug: bool,

        /// Seed for light randomization
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Object name prefixes to annotate
        #[arg(long = "prefix", default_values = ["door", "frame"])]
        prefixes: Vec<String>,
    },

    /// Object rotation sweep with random cameras: rgb/, masks/, labels/
    Orbit {
        /// Path to the scene description
        #[arg(default_value = "scene.json")]
        scene: PathBuf,

        /// Where the final files will be saved
        #[arg(default_value = "output")]
        output_dir: PathBuf,

        /// Rotation steps over a full turn
        #[arg(long, default_value = "36")]
        steps: usize,

        /// Image output width
        #[arg(long, default_value = "640")]
        width: u32,

        /// Image output height
        #[arg(long, default_value = "480")]
        height: u32,

        /// Seed for camera placement
        #[arg(short, long, default_value = "42")]
        seed: u64,
    },

    /// List the available pipelines
    List,
}

impl Command {
    fn pipeline(&self) -> Option<PipelineId> {
        match self {
            Command::Dope { .. } => Some(PipelineId::Dope),
            Command::Sweep { .. } => Some(PipelineId::Sweep),
            Command::Orbit { .. } => Some(PipelineId::Orbit),
            Command::List => None,
        }
    }
}

fn load_runner(scene: &Path) -> anyhow::Result<PipelineRunner<SimRenderer>> {
    let renderer = SimRenderer::load(scene)
        .with_context(|| format!("Failed to load scene {}", scene.display()))?;
    info!("Loaded {} objects from {}", renderer.objects().len(), scene.display());
    Ok(PipelineRunner::new(renderer))
}

fn run(command: Command) -> anyhow::Result<Option<RunSummary>> {
    if let Some(pipeline) = command.pipeline() {
        info!("dopegen {}: {}", pipeline, pipeline.description());
    }

    let summary = match command {
        Command::Dope {
            camera,
            scene,
            output_dir,
            width,
            height,
            min_pixels,
            no_cuboid,
            no_images,
            no_json,
        } => {
            let config = DopeConfig::new(camera, output_dir)
                .with_resolution(width, height)
                .with_min_pixels(min_pixels)
                .with_cuboid(!no_cuboid)
                .with_outputs(!no_images, !no_json);
            load_runner(&scene)?.run_dope(&config)?
        }
        Command::Sweep {
            scene,
            width,
            height,
            nb_frames,
            outf,
            min_pixels,
            debug,
            seed,
            prefixes,
        } => {
            let config = SweepConfig {
                width,
                height,
                ..SweepConfig::new(outf)
            }
            .with_frames(nb_frames)
            .with_min_pixels(min_pixels)
            .with_debug(debug)
            .with_seed(seed)
            .with_prefixes(prefixes);
            load_runner(&scene)?.run_sweep(&config)?
        }
        Command::Orbit {
            scene,
            output_dir,
            steps,
            width,
            height,
            seed,
        } => {
            let config = OrbitConfig {
                width,
                height,
                ..OrbitConfig::new(output_dir)
            }
            .with_steps(steps)
            .with_seed(seed);
            load_runner(&scene)?.run_orbit(&config)?
        }
        Command::List => {
            for pipeline in PipelineId::all() {
                println!("{:<8}{}", pipeline.name(), pipeline.description());
            }
            return Ok(None);
        }
    };
    Ok(Some(summary))
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    let Some(summary) = run(args.command)? else {
        return Ok(());
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else if summary.passed() {
        info!(
            "✓ {}: {}/{} frames written",
            summary.pipeline, summary.frames_written, summary.frames_total
        );
    } else {
        error!(
            "✗ {}: {}/{} frames failed",
            summary.pipeline,
            summary.failed.len(),
            summary.frames_total
        );
        for failure in &summary.failed {
            error!("  - frame {}: {}", failure.index, failure.reason);
        }
    }

    // Exit with proper code for CI
    if !summary.passed() {
        std::process::exit(1);
    }
    Ok(())
}

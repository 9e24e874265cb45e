use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

mod config;
mod engine;
mod manifest;
mod synth;

use config::Config;
use depthcheck_core::synthetic;
use engine::AnalysisJob;

#[derive(Parser)]
#[command(name = "depthcheck", version, about = "Depth-map face anti-spoofing")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze a capture manifest and print the verdict as JSON.
    Analyze {
        /// Path to the capture manifest (JSON).
        manifest: PathBuf,
        /// Include metrics and the heatmap in the verdict.
        #[arg(long)]
        debug: bool,
        /// Skip depth analysis entirely.
        #[arg(long)]
        no_depth: bool,
        /// Seconds to wait for the analysis before giving up.
        #[arg(long)]
        timeout_secs: Option<u64>,
        /// Write the decoded heatmap JPEG here (implies --debug).
        #[arg(long)]
        heatmap_out: Option<PathBuf>,
    },
    /// Write a synthetic capture for testing.
    Synth {
        #[arg(value_enum)]
        scene: synth::Scene,
        /// Output directory for depth.raw and capture.json.
        out_dir: PathBuf,
        /// Depth map width and height in pixels.
        #[arg(
            long,
            default_value_t = 128,
            value_parser = clap::value_parser!(u32)
                .range(i64::from(synthetic::MIN_SIZE)..=i64::from(synthetic::MAX_SIZE))
        )]
        size: u32,
        /// Sample encoding (depth-f16, depth-f32, disparity-f16, disparity-f32).
        #[arg(long, default_value = "depth-f32")]
        encoding: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Analyze {
            manifest,
            debug,
            no_depth,
            timeout_secs,
            heatmap_out,
        } => {
            let mut config = Config::from_env();
            config.enable_debug |= debug || heatmap_out.is_some();
            if no_depth {
                config.enable_depth_data = false;
            }
            if let Some(secs) = timeout_secs {
                config.timeout_secs = secs;
            }
            analyze(&config, &manifest, heatmap_out).await
        }
        Command::Synth {
            scene,
            out_dir,
            size,
            encoding,
        } => synth::run(scene, &out_dir, size, &encoding),
    }
}

async fn analyze(
    config: &Config,
    manifest_path: &std::path::Path,
    heatmap_out: Option<PathBuf>,
) -> Result<()> {
    let capture = manifest::load(manifest_path)?;
    tracing::info!(
        manifest = %manifest_path.display(),
        faces = capture.faces.len(),
        has_depth = capture.depth.is_some(),
        "capture loaded"
    );

    let handle = engine::spawn_engine()?;
    let job = AnalysisJob {
        image_size: capture.image_size,
        faces: capture.faces,
        depth: capture.depth,
        options: config.analysis_options(),
    };
    let verdict = handle
        .analyze(job, Duration::from_secs(config.timeout_secs))
        .await?;

    println!("{}", serde_json::to_string_pretty(&verdict)?);

    if let Some(path) = heatmap_out {
        match &verdict.debug_heatmap {
            Some(encoded) => {
                let jpeg = STANDARD
                    .decode(encoded)
                    .context("heatmap is not valid base64")?;
                std::fs::write(&path, jpeg)
                    .with_context(|| format!("failed to write {}", path.display()))?;
                tracing::info!(path = %path.display(), "heatmap written");
            }
            None => {
                tracing::warn!(status = %verdict.status, "no heatmap produced for this capture");
            }
        }
    }

    Ok(())
}

//! `depthcheck synth`: writes a synthetic capture (raw depth + manifest)
//! for exercising the analyzer without a depth camera.

use anyhow::{Context, Result};
use clap::ValueEnum;
use std::path::Path;

use depthcheck_core::synthetic::{flat_plane, nose_bump};
use depthcheck_core::DepthEncoding;

use crate::manifest;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Scene {
    /// Constant depth, like a photo held up to the camera.
    Flat,
    /// Conical nose relief with sensor-like noise.
    Bump,
}

/// Run the synth command.
pub fn run(scene: Scene, out_dir: &Path, size: u32, encoding: &str) -> Result<()> {
    let encoding: DepthEncoding = encoding
        .parse()
        .with_context(|| format!("invalid --encoding '{encoding}'"))?;

    let capture = match scene {
        Scene::Flat => flat_plane(size, encoding),
        Scene::Bump => nose_bump(size, encoding),
    };

    let path = manifest::save(
        out_dir,
        capture.image_size,
        vec![capture.face],
        &capture.depth,
    )?;

    let edge = capture.depth.width;
    println!(
        "Wrote {:?} scene ({edge}x{edge}, {encoding}) to {}",
        scene,
        path.display()
    );
    Ok(())
}

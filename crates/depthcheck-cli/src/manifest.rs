//! Capture manifests: a JSON sidecar describing the photo size, detected
//! faces and the raw depth file of one capture.
//!
//! ```json
//! {
//!   "image": { "width": 4032, "height": 3024 },
//!   "depth": { "path": "depth.raw", "width": 640, "height": 480,
//!              "bytesPerRow": 1280, "format": "hdis" },
//!   "faces": [ { "bounds": { "x": 0.3, "y": 0.3, "width": 0.4, "height": 0.4 },
//!                "landmarks": [ { "x": 0.5, "y": 0.52 } ] } ]
//! }
//! ```
//!
//! `depth.path` is resolved relative to the manifest's directory.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use depthcheck_core::{DepthMap, FaceRegion, Size};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepthEntry {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub bytes_per_row: usize,
    /// Encoding name or four-character code.
    pub format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub image: Size,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth: Option<DepthEntry>,
    #[serde(default)]
    pub faces: Vec<FaceRegion>,
}

/// A manifest with its depth file read into memory.
pub struct LoadedCapture {
    pub image_size: Size,
    pub faces: Vec<FaceRegion>,
    pub depth: Option<DepthMap>,
}

pub fn load(path: &Path) -> Result<LoadedCapture> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read manifest {}", path.display()))?;
    let manifest: Manifest = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse manifest {}", path.display()))?;

    let base = path.parent().unwrap_or(Path::new("."));
    let depth = match manifest.depth {
        Some(entry) => {
            let depth_path = base.join(&entry.path);
            let data = fs::read(&depth_path)
                .with_context(|| format!("failed to read depth file {}", depth_path.display()))?;
            if data.is_empty() {
                bail!("depth file {} is empty", depth_path.display());
            }
            tracing::debug!(
                path = %depth_path.display(),
                bytes = data.len(),
                width = entry.width,
                height = entry.height,
                format = %entry.format,
                "depth file loaded"
            );
            Some(DepthMap {
                data,
                width: entry.width,
                height: entry.height,
                bytes_per_row: entry.bytes_per_row,
                format: entry.format,
            })
        }
        None => None,
    };

    Ok(LoadedCapture {
        image_size: manifest.image,
        faces: manifest.faces,
        depth,
    })
}

/// Write `map` next to a manifest at `dir/capture.json`. Returns the manifest path.
pub fn save(
    dir: &Path,
    image_size: Size,
    faces: Vec<FaceRegion>,
    map: &DepthMap,
) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create directory {}", dir.display()))?;

    let depth_name = PathBuf::from("depth.raw");
    let depth_path = dir.join(&depth_name);
    fs::write(&depth_path, &map.data)
        .with_context(|| format!("failed to write {}", depth_path.display()))?;

    let manifest = Manifest {
        image: image_size,
        depth: Some(DepthEntry {
            path: depth_name,
            width: map.width,
            height: map.height,
            bytes_per_row: map.bytes_per_row,
            format: map.format.clone(),
        }),
        faces,
    };
    let manifest_path = dir.join("capture.json");
    fs::write(&manifest_path, serde_json::to_string_pretty(&manifest)?)
        .with_context(|| format!("failed to write {}", manifest_path.display()))?;

    Ok(manifest_path)
}

//! xbm-anim CLI - Convert animation projects described in JSON manifests.

#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use image::imageops::FilterType;
use rayon::prelude::*;

use xbm_anim::{
    bitmap::{GridError, PixelGrid},
    pipeline::{Artifact, convert_project},
    schema::{ConversionConfig, Project},
};

/// Frame loading errors.
#[derive(Debug, thiserror::Error)]
enum LoadError {
    #[error("{0}")]
    Image(#[from] image::ImageError),
    #[error("{0}")]
    Grid(#[from] GridError),
}

fn main() {
    #[cfg(feature = "dhat-heap")]
    let _profiler = dhat::Profiler::new_heap();

    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 && args[1] == "--example" {
        print_example_project();
        return;
    }

    if args.len() < 2 {
        eprintln!("Usage: {} <project.json>...", args[0]);
        eprintln!();
        eprintln!("Convert animation projects to u8g2 XBM C source.");
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  project.json  Project manifest; output is written next to it as .h");
        eprintln!();
        eprintln!("An example manifest is printed with the --example flag.");
        std::process::exit(1);
    }

    let projects: Vec<PathBuf> = args[1..].iter().map(PathBuf::from).collect();
    let start = Instant::now();

    // Each project is an independent run.
    let results: Vec<(PathBuf, Result<Artifact, String>)> = projects
        .par_iter()
        .map(|path| (path.clone(), run_project(path)))
        .collect();

    let mut failed = false;
    for (path, result) in results {
        match result {
            Ok(artifact) => {
                let output = path.with_extension("h");
                println!("{} -> {}", path.display(), output.display());
                println!("  {artifact}");
            }
            Err(e) => {
                eprintln!("Error converting {}: {}", path.display(), e);
                failed = true;
            }
        }
    }

    println!(
        "Converted {} project(s) in {:.2}s",
        projects.len(),
        start.elapsed().as_secs_f32()
    );

    if failed {
        std::process::exit(1);
    }
}

fn run_project(path: &Path) -> Result<Artifact, String> {
    let manifest =
        fs::read_to_string(path).map_err(|e| format!("Error reading manifest: {}", e))?;
    let project: Project =
        serde_json::from_str(&manifest).map_err(|e| format!("Error parsing manifest: {}", e))?;

    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let artifact = convert_project(&project, base_dir, load_grid).map_err(|e| e.to_string())?;

    artifact
        .write_to_path(path.with_extension("h"))
        .map_err(|e| format!("Error writing output: {}", e))?;
    Ok(artifact)
}

/// Decode an image, fit it to the canvas and threshold it.
fn load_grid(path: &Path, config: &ConversionConfig) -> Result<PixelGrid, LoadError> {
    let (width, height) = (config.canvas.width, config.canvas.height);
    let image = image::open(path)?;
    let luma = image
        .resize_exact(width as u32, height as u32, FilterType::Lanczos3)
        .into_luma8();
    Ok(PixelGrid::from_luma(
        width,
        height,
        luma.as_raw(),
        config.threshold,
        config.invert,
    )?)
}

fn print_example_project() {
    let project = Project::example();

    println!("Example project (face.json):");
    match serde_json::to_string_pretty(&project) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("Error serializing example: {}", e),
    }
}

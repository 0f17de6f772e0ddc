use std::path::{Path, PathBuf};
use std::process::Command;

use image::GrayImage;
use imageproc::contrast::{threshold, ThresholdType};
use tempfile::TempDir;

use crate::error::{AlignError, Result};

/// One PNG per page of a rasterized PDF, in document order.
///
/// The PNGs live in a temporary directory owned by this value, so they are
/// removed on every exit path, including failures, as soon as it is dropped.
#[derive(Debug)]
pub struct RasterizedDocument {
    _dir: TempDir,
    pages: Vec<PathBuf>,
}

impl RasterizedDocument {
    pub fn pages(&self) -> &[PathBuf] {
        &self.pages
    }
}

fn raster_error(path: &Path, reason: impl Into<String>) -> AlignError {
    AlignError::Rasterization {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

/// Convert every page of the PDF at `path` into a PNG at `dpi`, via
/// `pdftoppm`.
pub fn rasterize_document(path: &Path, dpi: u32) -> Result<RasterizedDocument> {
    if !path.exists() {
        return Err(AlignError::Configuration(format!(
            "no such file: {}",
            path.display()
        )));
    }

    let dir = TempDir::new().map_err(|e| raster_error(path, e.to_string()))?;
    let prefix = dir.path().join("out");

    log::debug!("rasterizing {} at {} dpi", path.display(), dpi);
    let output = Command::new("pdftoppm")
        .arg(path)
        .arg(&prefix)
        .args(["-png", "-r"])
        .arg(dpi.to_string())
        .output()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                raster_error(
                    path,
                    "pdftoppm not found; install poppler-utils (e.g. apt install poppler-utils)",
                )
            } else {
                raster_error(path, e.to_string())
            }
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(raster_error(
            path,
            format!("pdftoppm exited with {}: {}", output.status, stderr.trim()),
        ));
    }

    // pdftoppm zero-pads page numbers, so a lexicographic sort restores
    // document order.
    let mut pages: Vec<PathBuf> = std::fs::read_dir(dir.path())
        .map_err(|e| raster_error(path, e.to_string()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .collect();
    pages.sort();

    Ok(RasterizedDocument { _dir: dir, pages })
}

/// Load a rasterized page as 8-bit grayscale.
pub fn load_gray(path: &Path) -> Result<GrayImage> {
    let img = image::open(path).map_err(|e| raster_error(path, e.to_string()))?;
    Ok(img.to_luma8())
}

/// Binarize a grayscale raster at the midpoint, the form the detector
/// operates on.
pub fn binarize(img: &GrayImage) -> GrayImage {
    threshold(img, 127, ThresholdType::Binary)
}

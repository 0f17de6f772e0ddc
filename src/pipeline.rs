use std::path::{Path, PathBuf};

use image::GrayImage;
use nalgebra::Point2;

use crate::cli::Cli;
use crate::detection::find_markers;
use crate::error::{AlignError, Result};
use crate::geometry::{orient_markers, AffineTransform};
use crate::pdf::{encode_document, write_document, JpegPage};
use crate::raster::{binarize, load_gray, rasterize_document};
use crate::warp::{encode_jpeg, warp_to_template};

/// The fixed destination frame every scanned page is registered into:
/// the template's oriented marker points and its canvas size.
///
/// Computed once per run and passed by reference into each page step;
/// nothing else is shared between pages.
pub struct TemplateFrame {
    pub points: [Point2<f64>; 3],
    pub width: u32,
    pub height: u32,
}

/// Load and binarize the marker glyph.
///
/// The glyph PDF is rasterized at a DPI equal to the desired patch size in
/// pixels, so its (one-inch) page lands at exactly `dpi * marker_size`
/// pixels square.
pub fn load_marker(path: &Path, dpi: u32, marker_size_in: f64) -> Result<GrayImage> {
    let marker_px = (dpi as f64 * marker_size_in) as u32;
    let raster = rasterize_document(path, marker_px)?;
    let first = raster.pages().first().ok_or_else(|| {
        AlignError::Configuration(format!("marker PDF has no pages: {}", path.display()))
    })?;
    Ok(binarize(&load_gray(first)?))
}

/// Rasterize the template once and cache its oriented marker points and
/// dimensions as the run's destination frame.
pub fn load_template_frame(
    path: &Path,
    dpi: u32,
    marker: &GrayImage,
    threshold: f32,
) -> Result<TemplateFrame> {
    let raster = rasterize_document(path, dpi)?;
    let first = raster.pages().first().ok_or_else(|| {
        AlignError::Configuration(format!("template PDF has no pages: {}", path.display()))
    })?;
    let gray = load_gray(first)?;
    let points = orient_markers(find_markers(&binarize(&gray), marker, threshold)?);
    log::debug!("template markers at {points:?}");

    let (width, height) = gray.dimensions();
    Ok(TemplateFrame {
        points,
        width,
        height,
    })
}

/// Register one page against the destination frame and compress the result.
///
/// Detection runs on a binarized copy; the warp resamples the raw grayscale
/// raster so the output keeps its tonal range.
pub fn register_page(
    gray: &GrayImage,
    marker: &GrayImage,
    frame: &TemplateFrame,
    threshold: f32,
    quality: u8,
) -> Result<JpegPage> {
    let points = orient_markers(find_markers(&binarize(gray), marker, threshold)?);
    let transform = AffineTransform::from_correspondences(&points, &frame.points)?;
    let registered = warp_to_template(gray, &transform, frame.width, frame.height)?;
    Ok(JpegPage {
        data: encode_jpeg(&registered, quality)?,
        width: frame.width,
        height: frame.height,
    })
}

/// Register every page in document order. The first failing page aborts the
/// run, annotated with its 1-based index.
pub fn register_pages(
    pages: &[PathBuf],
    marker: &GrayImage,
    frame: &TemplateFrame,
    threshold: f32,
    quality: u8,
) -> Result<Vec<JpegPage>> {
    let total = pages.len();
    let mut registered = Vec::with_capacity(total);
    for (index, path) in pages.iter().enumerate() {
        let page_no = index + 1;
        log::info!("matching page {page_no} / {total}");
        let page = load_gray(path)
            .and_then(|gray| register_page(&gray, marker, frame, threshold, quality))
            .map_err(|e| e.on_page(page_no))?;
        registered.push(page);
    }
    Ok(registered)
}

/// Run the whole pipeline: marker, template frame, per-page registration,
/// final PDF assembly.
pub fn run(cli: &Cli) -> Result<()> {
    cli.validate()?;

    log::info!("loading marker {}", cli.marker.display());
    let marker = load_marker(&cli.marker, cli.dpi, cli.marker_size)?;

    log::info!("loading template {}", cli.template.display());
    let frame = load_template_frame(&cli.template, cli.dpi, &marker, cli.threshold)?;

    log::info!("rasterizing scan {} (this may take a while)", cli.input.display());
    let scan = rasterize_document(&cli.input, cli.dpi)?;

    let pages = register_pages(scan.pages(), &marker, &frame, cli.threshold, cli.quality)?;

    let output = cli.output_path();
    log::info!("writing {} pages to {}", pages.len(), output.display());
    let doc = encode_document(&pages, cli.dpi)?;
    write_document(doc, &output)
}

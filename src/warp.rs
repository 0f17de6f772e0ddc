use image::codecs::jpeg::JpegEncoder;
use image::{GrayImage, Luma};

use crate::error::{AlignError, Result};
use crate::geometry::AffineTransform;
use nalgebra::Point2;

const BACKGROUND: f64 = 255.0;

/// Resample a page through `transform` onto the template's canvas.
///
/// The transform maps page space to template space; every output pixel is
/// inverse-mapped back into the page and bilinearly sampled. Output pixels
/// whose source coordinate falls outside the page reveal background and are
/// filled white, matching paper.
pub fn warp_to_template(
    src: &GrayImage,
    transform: &AffineTransform,
    out_width: u32,
    out_height: u32,
) -> Result<GrayImage> {
    let inverse = transform.inverse()?;
    let (src_w, src_h) = src.dimensions();

    let out = GrayImage::from_fn(out_width, out_height, |x, y| {
        let p = inverse.apply(&Point2::new(x as f64, y as f64));
        Luma([sample_bilinear(src, src_w, src_h, p.x, p.y) as u8])
    });
    Ok(out)
}

fn sample_bilinear(src: &GrayImage, width: u32, height: u32, x: f64, y: f64) -> f64 {
    if x < 0.0 || y < 0.0 || x > (width - 1) as f64 || y > (height - 1) as f64 {
        return BACKGROUND;
    }

    let x0 = x.floor() as u32;
    let y0 = y.floor() as u32;
    let x1 = (x0 + 1).min(width - 1);
    let y1 = (y0 + 1).min(height - 1);
    let fx = x - x0 as f64;
    let fy = y - y0 as f64;

    let p00 = src.get_pixel(x0, y0)[0] as f64;
    let p10 = src.get_pixel(x1, y0)[0] as f64;
    let p01 = src.get_pixel(x0, y1)[0] as f64;
    let p11 = src.get_pixel(x1, y1)[0] as f64;

    let top = p00 * (1.0 - fx) + p10 * fx;
    let bottom = p01 * (1.0 - fx) + p11 * fx;
    (top * (1.0 - fy) + bottom * fy).round().clamp(0.0, 255.0)
}

/// Compress a registered page to JPEG. The page is already normalized to the
/// template's shape, so trading fidelity for file size is acceptable here.
pub fn encode_jpeg(img: &GrayImage, quality: u8) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, quality)
        .encode_image(img)
        .map_err(|e| AlignError::Encoding(e.to_string()))?;
    Ok(buf)
}

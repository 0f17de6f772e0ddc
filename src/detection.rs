use image::GrayImage;
use imageproc::template_matching::{match_template, MatchTemplateMethod};
use nalgebra::Point2;

use crate::error::{AlignError, Result};
use crate::geometry::dist;

/// A raw template-match hit: the top-left corner of the match window plus
/// its normalized cross-correlation score.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    point: Point2<f64>,
    score: f32,
}

/// Find the centers of the three alignment markers in a binarized page.
///
/// Runs normalized cross-correlation of the marker patch over the page and
/// keeps every location scoring at least `threshold`. A single printed
/// marker lights up a whole neighbourhood of the response surface, so the
/// raw hits are clustered (radius: half the marker width) and each cluster
/// is reduced to its best-scoring member before the window-corner positions
/// are shifted to marker centers.
///
/// Fails unless exactly three markers remain: fewer means the scan is
/// damaged or mis-printed, more means something else on the page resembles
/// the marker glyph. Neither is recoverable here.
pub fn find_markers(
    page: &GrayImage,
    marker: &GrayImage,
    threshold: f32,
) -> Result<[Point2<f64>; 3]> {
    let (marker_w, marker_h) = marker.dimensions();
    if page.width() < marker_w || page.height() < marker_h {
        return Err(AlignError::InsufficientMarkers { found: 0 });
    }

    let response = match_template(
        page,
        marker,
        MatchTemplateMethod::CrossCorrelationNormalized,
    );

    let mut candidates = Vec::new();
    for (x, y, pixel) in response.enumerate_pixels() {
        if pixel[0] >= threshold {
            candidates.push(Candidate {
                point: Point2::new(x as f64, y as f64),
                score: pixel[0],
            });
        }
    }

    let raw_count = candidates.len();
    let radius = marker_w as f64 / 2.0;
    let representatives = cluster_candidates(candidates, radius);

    let centers: Vec<Point2<f64>> = representatives
        .iter()
        .map(|c| {
            Point2::new(
                c.point.x + (marker_w / 2) as f64,
                c.point.y + (marker_h / 2) as f64,
            )
        })
        .collect();

    log::debug!(
        "{} raw detections collapsed to {} markers",
        raw_count,
        centers.len()
    );

    match centers.len() {
        3 => Ok([centers[0], centers[1], centers[2]]),
        n if n < 3 => Err(AlignError::InsufficientMarkers { found: n }),
        n => Err(AlignError::AmbiguousMarkers { found: n }),
    }
}

/// Greedy clustering of raw hits: take an unprocessed candidate as a seed,
/// absorb every remaining candidate strictly closer than `radius`, keep the
/// highest-scoring member of each cluster.
fn cluster_candidates(mut pending: Vec<Candidate>, radius: f64) -> Vec<Candidate> {
    let mut representatives = Vec::new();
    while let Some(seed) = pending.first().copied() {
        let mut best = seed;
        let mut remainder = Vec::with_capacity(pending.len());
        for candidate in pending.drain(1..) {
            if dist(&candidate.point, &seed.point) < radius {
                if candidate.score > best.score {
                    best = candidate;
                }
            } else {
                remainder.push(candidate);
            }
        }
        pending = remainder;
        representatives.push(best);
    }
    representatives
}

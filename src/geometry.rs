use nalgebra::{Matrix3, Point2, Vector3};

use crate::error::{AlignError, Result};

/// Euclidean distance between two marker centers.
pub fn dist(a: &Point2<f64>, b: &Point2<f64>) -> f64 {
    nalgebra::distance(a, b)
}

/// Put three marker points into a canonical order: origin (top-left) first,
/// then the remaining two sorted by ascending distance from the origin.
///
/// The origin is the point *not* on the longest pairwise segment: the two
/// markers farthest apart sit on the diagonal of the (missing-corner)
/// rectangle, and the corner marker is opposite it. The result is invariant
/// to the input ordering, so detection order does not matter.
///
/// The distance sort of the remaining two points assumes a roughly
/// rectangular, boundedly-rotated layout; it does not disambiguate
/// "top-right" from "bottom-left" under large rotations or near-square
/// layouts. Kept as-is because both the template and every scan go through
/// the same ordering, so correspondences still line up.
pub fn orient_markers(points: [Point2<f64>; 3]) -> [Point2<f64>; 3] {
    let [p1, p2, p3] = points;
    let d12 = dist(&p1, &p2);
    let d23 = dist(&p2, &p3);
    let d13 = dist(&p1, &p3);

    let origin = if d12 >= d23 && d12 >= d13 {
        p3
    } else if d23 >= d13 {
        p1
    } else {
        p2
    };

    // Equidistant remainders (square-ish layouts) would otherwise keep the
    // caller's order, and detection order differs between template and scan;
    // break ties on coordinates so the order depends only on the points.
    let mut ordered = [p1, p2, p3];
    ordered.sort_by(|a, b| {
        dist(&origin, a)
            .partial_cmp(&dist(&origin, b))
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal))
            .then_with(|| a.y.partial_cmp(&b.y).unwrap_or(std::cmp::Ordering::Equal))
    });
    ordered
}

/// An affine plane-to-plane map (rotation, translation, non-uniform scale,
/// shear), stored as a 3x3 matrix whose last row is `[0, 0, 1]`.
#[derive(Debug, Clone, Copy)]
pub struct AffineTransform {
    matrix: Matrix3<f64>,
}

impl AffineTransform {
    /// Compute the unique affine map sending each `src` point onto the
    /// corresponding `dst` point.
    ///
    /// Three correspondences pin down all six degrees of freedom exactly, so
    /// there is no residual to minimize. Collinear source points make the
    /// system singular and fail with [`AlignError::Registration`].
    pub fn from_correspondences(
        src: &[Point2<f64>; 3],
        dst: &[Point2<f64>; 3],
    ) -> Result<AffineTransform> {
        // Rows [x_i, y_i, 1]; its determinant is twice the signed triangle area.
        let basis = Matrix3::new(
            src[0].x, src[0].y, 1.0, //
            src[1].x, src[1].y, 1.0, //
            src[2].x, src[2].y, 1.0,
        );
        if basis.determinant().abs() < 1e-6 {
            return Err(AlignError::Registration);
        }
        let inv = basis.try_inverse().ok_or(AlignError::Registration)?;

        let xs = inv * Vector3::new(dst[0].x, dst[1].x, dst[2].x);
        let ys = inv * Vector3::new(dst[0].y, dst[1].y, dst[2].y);

        Ok(AffineTransform {
            matrix: Matrix3::new(
                xs[0], xs[1], xs[2], //
                ys[0], ys[1], ys[2], //
                0.0, 0.0, 1.0,
            ),
        })
    }

    pub fn identity() -> AffineTransform {
        AffineTransform {
            matrix: Matrix3::identity(),
        }
    }

    /// Map a source-space point into destination space.
    pub fn apply(&self, p: &Point2<f64>) -> Point2<f64> {
        let v = self.matrix * Vector3::new(p.x, p.y, 1.0);
        Point2::new(v.x, v.y)
    }

    /// The backward map, for inverse-mapping output pixels during warping.
    pub fn inverse(&self) -> Result<AffineTransform> {
        let matrix = self.matrix.try_inverse().ok_or(AlignError::Registration)?;
        Ok(AffineTransform { matrix })
    }

    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.matrix
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn template_points() -> [Point2<f64>; 3] {
        [
            Point2::new(50.0, 50.0),
            Point2::new(50.0, 950.0),
            Point2::new(950.0, 50.0),
        ]
    }

    #[test]
    fn test_exact_fit() {
        let src = [
            Point2::new(61.3, 48.9),
            Point2::new(47.2, 931.0),
            Point2::new(959.8, 72.4),
        ];
        let dst = template_points();
        let t = AffineTransform::from_correspondences(&src, &dst).unwrap();

        for (s, d) in src.iter().zip(dst.iter()) {
            let mapped = t.apply(s);
            assert_relative_eq!(mapped.x, d.x, epsilon = 1e-6);
            assert_relative_eq!(mapped.y, d.y, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_identity_scenario() {
        let pts = template_points();
        let t = AffineTransform::from_correspondences(&pts, &pts).unwrap();
        let m = t.matrix();
        let id = Matrix3::identity();
        for row in 0..3 {
            for col in 0..3 {
                assert_relative_eq!(m[(row, col)], id[(row, col)], epsilon = 1e-3);
            }
        }
    }

    #[test]
    fn test_rotation_and_shift() {
        let dst = template_points();
        let cx = (50.0 + 50.0 + 950.0) / 3.0;
        let cy = (50.0 + 950.0 + 50.0) / 3.0;
        let angle = 2.0_f64.to_radians();
        let (sin, cos) = angle.sin_cos();

        // Template points rotated 2 degrees about their centroid, then
        // translated by (10, 5): what a slightly skewed scan would report.
        let src: Vec<Point2<f64>> = dst
            .iter()
            .map(|p| {
                let (dx, dy) = (p.x - cx, p.y - cy);
                Point2::new(
                    cx + dx * cos - dy * sin + 10.0,
                    cy + dx * sin + dy * cos + 5.0,
                )
            })
            .collect();
        let src = [src[0], src[1], src[2]];

        let t = AffineTransform::from_correspondences(&src, &dst).unwrap();
        for (s, d) in src.iter().zip(dst.iter()) {
            let mapped = t.apply(s);
            assert!(dist(&mapped, d) < 1.0);
        }
    }

    #[test]
    fn test_collinear_points_fail() {
        let src = [
            Point2::new(0.0, 0.0),
            Point2::new(10.0, 10.0),
            Point2::new(20.0, 20.0),
        ];
        let dst = template_points();
        assert!(matches!(
            AffineTransform::from_correspondences(&src, &dst),
            Err(AlignError::Registration)
        ));
    }

    #[test]
    fn test_orientation_permutation_invariance() {
        let canonical = orient_markers(template_points());

        let [a, b, c] = template_points();
        let permutations = [
            [a, b, c],
            [a, c, b],
            [b, a, c],
            [b, c, a],
            [c, a, b],
            [c, b, a],
        ];
        for perm in permutations {
            let oriented = orient_markers(perm);
            for (got, want) in oriented.iter().zip(canonical.iter()) {
                assert_relative_eq!(got.x, want.x);
                assert_relative_eq!(got.y, want.y);
            }
        }
    }

    #[test]
    fn test_orientation_square_layout_ties_break_on_coordinates() {
        // Square layout: both non-origin points are exactly 900 px from the
        // origin, so the distance sort alone cannot order them. The point
        // with the smaller x must come second regardless of input order.
        let [a, b, c] = template_points();
        for perm in [[a, b, c], [c, b, a], [b, c, a]] {
            let oriented = orient_markers(perm);
            assert_relative_eq!(oriented[1].x, 50.0);
            assert_relative_eq!(oriented[1].y, 950.0);
            assert_relative_eq!(oriented[2].x, 950.0);
            assert_relative_eq!(oriented[2].y, 50.0);
        }
    }

    #[test]
    fn test_orientation_origin_is_corner() {
        // Top-left, top-right and bottom-left of a landscape rectangle; the
        // diagonal runs top-right to bottom-left, so (50, 50) is the origin.
        let oriented = orient_markers([
            Point2::new(1150.0, 50.0),
            Point2::new(50.0, 50.0),
            Point2::new(50.0, 850.0),
        ]);
        assert_relative_eq!(oriented[0].x, 50.0);
        assert_relative_eq!(oriented[0].y, 50.0);
        // Remaining two ascend by distance from the origin.
        assert!(dist(&oriented[0], &oriented[1]) <= dist(&oriented[0], &oriented[2]));
    }
}

//! Registration of a known piece outline onto the front scan.
//!
//! The front image is reduced to an edge-response map; a summed-area
//! table over (weight, weight · position) answers "weighted centroid
//! of edge response in a window" in O(1). The outline is then pulled
//! onto the edge ridge by iterated rigid alignment from 72 starting
//! rotations, followed by a small translational perturbation search.

use image::{GrayImage, RgbImage};
use imageproc::filter::median_filter;
use imageproc::gradients::{horizontal_sobel, vertical_sobel};
use nalgebra::{Point2, Vector2};

use jigsaw_core::{optimal_align, polygon_centroid, Curve, RigidTransform};

use crate::binarize::value_channel;

/// Refinement iterations per starting pose; iteration i samples at
/// radius 15 - i.
const REFINE_ITERS: usize = 10;
const START_RADIUS: i32 = 15;

pub struct PatternAlignOptimizer {
    /// Prefix sums over (weight, weight * position); entry (x+1, y+1)
    /// covers pixels [0..=x] x [0..=y].
    weights: Vec<f64>,
    moments: Vec<Vector2<f64>>,
    cols: usize,
    rows: usize,
}

/// Edge-response map: two denoising passes, Sobel magnitude.
fn edge_image(img: &RgbImage) -> Vec<Vec<f64>> {
    let gray: GrayImage = value_channel(img);
    let gray = median_filter(&gray, 1, 1);
    let gray = median_filter(&gray, 1, 1);
    let gx = horizontal_sobel(&gray);
    let gy = vertical_sobel(&gray);

    let (w, h) = gray.dimensions();
    let mut out = vec![vec![0.0; w as usize]; h as usize];
    for y in 0..h {
        for x in 0..w {
            let dx = gx.get_pixel(x, y).0[0] as f64;
            let dy = gy.get_pixel(x, y).0[0] as f64;
            // Normalize to roughly [0, 1] like a grayscale edge image.
            out[y as usize][x as usize] = (dx * dx + dy * dy).sqrt() / (4.0 * 255.0);
        }
    }
    out
}

impl PatternAlignOptimizer {
    pub fn new(front: &RgbImage) -> Self {
        let edge = edge_image(front);
        let rows = edge.len();
        let cols = if rows == 0 { 0 } else { edge[0].len() };

        let stride = cols + 1;
        let mut weights = vec![0.0; stride * (rows + 1)];
        let mut moments = vec![Vector2::zeros(); stride * (rows + 1)];
        for y in 0..rows {
            for x in 0..cols {
                let w = edge[y][x];
                let m = Vector2::new(w * x as f64, w * y as f64);
                weights[(y + 1) * stride + x + 1] = w
                    + weights[y * stride + x + 1]
                    + weights[(y + 1) * stride + x]
                    - weights[y * stride + x];
                moments[(y + 1) * stride + x + 1] = m
                    + moments[y * stride + x + 1]
                    + moments[(y + 1) * stride + x]
                    - moments[y * stride + x];
            }
        }

        Self {
            weights,
            moments,
            cols,
            rows,
        }
    }

    /// Weighted centroid of edge response in the square window of the
    /// given radius around `p`, together with the summed weight.
    ///
    /// A window with no edge response returns the query point itself.
    pub fn average_edge_point(&self, p: Point2<f64>, radius: i32) -> (f64, Point2<f64>) {
        let stride = self.cols + 1;
        let gx = ((p.x + 0.5).floor() as i32)
            .max(radius)
            .min(self.cols as i32 - radius - 2);
        let gy = ((p.y + 0.5).floor() as i32)
            .max(radius)
            .min(self.rows as i32 - radius - 2);

        let x0 = (gx - radius).max(0) as usize;
        let y0 = (gy - radius).max(0) as usize;
        let x1 = ((gx + radius + 1) as usize).min(self.cols);
        let y1 = ((gy + radius + 1) as usize).min(self.rows);

        let sum = self.weights[y1 * stride + x1] - self.weights[y1 * stride + x0]
            - self.weights[y0 * stride + x1]
            + self.weights[y0 * stride + x0];
        let moment = self.moments[y1 * stride + x1] - self.moments[y1 * stride + x0]
            - self.moments[y0 * stride + x1]
            + self.moments[y0 * stride + x0];

        if sum.abs() < 1e-9 {
            (sum, p)
        } else {
            (sum, Point2::from(moment / sum))
        }
    }

    /// Target curve of windowed edge centroids, one per pattern point.
    fn edge_points(&self, pattern: &[Point2<f64>], radius: i32) -> (Curve, f64) {
        let mut targets = Curve::with_capacity(pattern.len());
        let mut score = 0.0;
        for &p in pattern {
            let (w, target) = self.average_edge_point(p, radius);
            score += w;
            targets.push(target);
        }
        (targets, score)
    }

    /// Pull the pattern onto the edge ridge, shrinking the sampling
    /// window every iteration. Returns the final curve and its score.
    fn refine(&self, mut pattern: Curve) -> (f64, Curve) {
        let mut score = 0.0;
        for i in 0..REFINE_ITERS {
            let radius = START_RADIUS - i as i32;
            let (targets, s) = self.edge_points(&pattern, radius);
            let t = optimal_align(&targets, &pattern);
            pattern = t.apply_curve(&pattern);
            score = s;
        }
        (score, pattern)
    }

    /// Best registration of `pattern` near the detected `position`,
    /// over 72 starting rotations and a ±6 px perturbation grid.
    pub fn optimize_align(&self, pattern: &Curve, position: Point2<f64>) -> Curve {
        let center = polygon_centroid(pattern);
        let centered: Curve = pattern.iter().map(|p| p - center.coords).collect();

        let mut best_score = f64::NEG_INFINITY;
        let mut best_curve = centered.clone();

        for angle_deg in (0..360).step_by(5) {
            let start = RigidTransform::new((angle_deg as f64).to_radians(), position.coords);
            let (score, curve) = self.refine(start.apply_curve(&centered));
            if score > best_score {
                best_score = score;
                best_curve = curve;
            }
        }

        let anchor = best_curve.clone();
        for dx in (-6..=6).step_by(3) {
            for dy in (-6..=6).step_by(3) {
                let shifted: Curve = anchor
                    .iter()
                    .map(|p| Point2::new(p.x + dx as f64, p.y + dy as f64))
                    .collect();
                let (score, curve) = self.refine(shifted);
                if score > best_score {
                    best_score = score;
                    best_curve = curve;
                }
            }
        }

        self.refine(best_curve).1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    /// Dark square on a light background: the edge response rings the
    /// square boundary.
    fn square_image() -> RgbImage {
        let mut img = RgbImage::from_pixel(120, 120, Rgb([240, 240, 240]));
        for y in 40..80 {
            for x in 40..80 {
                img.put_pixel(x, y, Rgb([20, 20, 20]));
            }
        }
        img
    }

    fn square_outline(half: f64, n_per_side: usize) -> Curve {
        let mut outline = Curve::new();
        let step = 2.0 * half / n_per_side as f64;
        for i in 0..n_per_side {
            outline.push(Point2::new(-half + i as f64 * step, -half));
        }
        for i in 0..n_per_side {
            outline.push(Point2::new(half, -half + i as f64 * step));
        }
        for i in 0..n_per_side {
            outline.push(Point2::new(half - i as f64 * step, half));
        }
        for i in 0..n_per_side {
            outline.push(Point2::new(-half, half - i as f64 * step));
        }
        outline
    }

    #[test]
    fn summed_area_matches_brute_force() {
        let img = square_image();
        let opt = PatternAlignOptimizer::new(&img);
        let edge = edge_image(&img);

        let p = Point2::new(50.0, 60.0);
        let radius = 7;
        let (sum, _) = opt.average_edge_point(p, radius);

        let mut brute = 0.0;
        for y in (60 - radius)..=(60 + radius) {
            for x in (50 - radius)..=(50 + radius) {
                brute += edge[y as usize][x as usize];
            }
        }
        assert!((sum - brute).abs() < 1e-6, "{sum} vs {brute}");
    }

    #[test]
    fn empty_window_returns_query_point() {
        let img = RgbImage::from_pixel(80, 80, Rgb([100, 100, 100]));
        let opt = PatternAlignOptimizer::new(&img);
        let p = Point2::new(40.0, 40.0);
        let (sum, target) = opt.average_edge_point(p, 5);
        assert_eq!(sum, 0.0);
        assert_eq!(target, p);
    }

    #[test]
    fn registers_outline_onto_square_edges() {
        let img = square_image();
        let opt = PatternAlignOptimizer::new(&img);

        // Slightly offset starting position; true centre is (60, 60).
        let aligned = opt.optimize_align(
            &square_outline(20.0, 20),
            Point2::new(57.0, 62.0),
        );

        let centroid = polygon_centroid(&aligned);
        assert!((centroid.x - 60.0).abs() < 3.0, "centroid {centroid}");
        assert!((centroid.y - 60.0).abs() < 3.0, "centroid {centroid}");
    }
}

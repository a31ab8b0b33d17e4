//! Front-scan object detection: refine the expected piece centres by
//! K-means over the foreground pixels.

use image::{GrayImage, Luma, Rgb, RgbImage};
use nalgebra::{Point2, Vector2};

use crate::mask::{BG, FG};
use crate::params::ExtractParams;

/// Pixel where the background colour is sampled; scanners leave a
/// uniform margin there.
const BACKGROUND_PROBE: (u32, u32) = (20, 20);

/// K-means iteration cap; the centres settle long before this.
const MAX_ITERS: usize = 100;

pub struct ObjectDetector {
    foreground: GrayImage,
    avg_recluster_change: f64,
}

fn color_distance(a: Rgb<u8>, b: Rgb<u8>) -> f64 {
    let dr = a.0[0] as f64 - b.0[0] as f64;
    let dg = a.0[1] as f64 - b.0[1] as f64;
    let db = a.0[2] as f64 - b.0[2] as f64;
    ((dr * dr + dg * dg + db * db) / 3.0).sqrt() / 255.0 * 100.0
}

/// Separate the scan into background (the region connected to the
/// probe pixel within `color_fuzz` of its colour) and foreground.
fn binarize_front(img: &RgbImage, color_fuzz: f64) -> GrayImage {
    let mut mask = GrayImage::from_pixel(img.width(), img.height(), Luma([FG]));
    let (sx, sy) = BACKGROUND_PROBE;
    let sx = sx.min(img.width() - 1);
    let sy = sy.min(img.height() - 1);
    let seed = *img.get_pixel(sx, sy);

    let mut stack = vec![(sx as i32, sy as i32)];
    while let Some((x, y)) = stack.pop() {
        if x < 0 || y < 0 || x as u32 >= img.width() || y as u32 >= img.height() {
            continue;
        }
        let p = mask.get_pixel_mut(x as u32, y as u32);
        if p.0[0] == BG {
            continue;
        }
        if color_distance(*img.get_pixel(x as u32, y as u32), seed) > color_fuzz {
            continue;
        }
        p.0[0] = BG;
        stack.push((x + 1, y));
        stack.push((x - 1, y));
        stack.push((x, y + 1));
        stack.push((x, y - 1));
    }
    mask
}

impl ObjectDetector {
    pub fn new(front: &RgbImage, params: &ExtractParams) -> Self {
        Self {
            foreground: binarize_front(front, params.color_fuzz),
            avg_recluster_change: params.avg_recluster_change,
        }
    }

    /// One K-means step: assign every foreground pixel to its nearest
    /// centre and move each centre to the mean of its pixels.
    ///
    /// A centre that attracts no pixels keeps its previous position.
    fn recluster(&self, means: &[Point2<f64>]) -> Vec<Point2<f64>> {
        let mut sums = vec![Vector2::<f64>::zeros(); means.len()];
        let mut counts = vec![0usize; means.len()];

        for (x, y, p) in self.foreground.enumerate_pixels() {
            if p.0[0] == BG {
                continue;
            }
            let pixel = Point2::new(x as f64, y as f64);
            let nearest = jigsaw_core::closest_point(pixel, means);
            sums[nearest] += pixel.coords;
            counts[nearest] += 1;
        }

        means
            .iter()
            .enumerate()
            .map(|(i, &old)| {
                if counts[i] == 0 {
                    old
                } else {
                    Point2::from(sums[i] / counts[i] as f64)
                }
            })
            .collect()
    }

    fn mean_square_movement(a: &[Point2<f64>], b: &[Point2<f64>]) -> f64 {
        let sum: f64 = a
            .iter()
            .zip(b.iter())
            .map(|(p, q)| (p - q).norm_squared())
            .sum();
        sum / a.len() as f64
    }

    /// Iterate K-means from the expected positions until the centres
    /// settle; cluster order follows the seed order throughout.
    pub fn detect_positions(&self, mut positions: Vec<Point2<f64>>) -> Vec<Point2<f64>> {
        if positions.is_empty() {
            return positions;
        }
        for _ in 0..MAX_ITERS {
            let old = positions.clone();
            positions = self.recluster(&positions);
            if Self::mean_square_movement(&old, &positions) < self.avg_recluster_change {
                break;
            }
        }
        positions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// White background with two gray blobs, clear of the probe pixel.
    fn two_blob_image() -> RgbImage {
        let mut img = RgbImage::from_pixel(100, 60, Rgb([250, 250, 250]));
        for y in 10..30 {
            for x in 30..50 {
                img.put_pixel(x, y, Rgb([80, 90, 100]));
            }
        }
        for y in 25..45 {
            for x in 60..90 {
                img.put_pixel(x, y, Rgb([120, 40, 70]));
            }
        }
        img
    }

    #[test]
    fn kmeans_moves_centres_onto_blobs() {
        let img = two_blob_image();
        let detector = ObjectDetector::new(&img, &ExtractParams::default());

        let seeds = vec![Point2::new(36.0, 14.0), Point2::new(70.0, 40.0)];
        let centres = detector.detect_positions(seeds);

        // Blob pixel means: (39.5, 19.5) and (74.5, 34.5).
        assert_relative_eq!(centres[0].x, 39.5, epsilon = 1.5);
        assert_relative_eq!(centres[0].y, 19.5, epsilon = 1.5);
        assert_relative_eq!(centres[1].x, 74.5, epsilon = 1.5);
        assert_relative_eq!(centres[1].y, 34.5, epsilon = 1.5);
    }

    #[test]
    fn cluster_order_follows_seed_order() {
        let img = two_blob_image();
        let detector = ObjectDetector::new(&img, &ExtractParams::default());

        let seeds = vec![Point2::new(70.0, 40.0), Point2::new(15.0, 15.0)];
        let centres = detector.detect_positions(seeds);
        assert!(centres[0].x > centres[1].x);
    }

    #[test]
    fn empty_cluster_keeps_previous_centre() {
        let img = RgbImage::from_pixel(50, 50, Rgb([255, 255, 255]));
        let detector = ObjectDetector::new(&img, &ExtractParams::default());
        let seeds = vec![Point2::new(25.0, 25.0)];
        let centres = detector.detect_positions(seeds.clone());
        assert_eq!(centres, seeds);
    }
}

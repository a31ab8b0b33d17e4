//! Piece record construction: corners, edges, types and the per-edge
//! colour signature sampled from the front scan.

use image::{Rgb, RgbImage};
use imageproc::filter::gaussian_blur_f32;
use kiddo::{KdTree, SquaredEuclidean};
use nalgebra::{Point2, Vector2};
use std::path::{Path, PathBuf};

use jigsaw_core::{flip_curve, Curve, Hsl, RawEdge, RawPiece};

use crate::classify;
use crate::mask::{self, shape_mask};
use crate::morphology;
use crate::params::ExtractParams;
use crate::trace;
use crate::ExtractError;

pub struct PieceExtractor {
    /// Front scan blurred for colour sampling.
    image: RgbImage,
    path: PathBuf,
    params: ExtractParams,
}

pub fn rgb_to_hsl(rgb: Rgb<u8>) -> Hsl {
    let r = rgb.0[0] as f64 / 255.0;
    let g = rgb.0[1] as f64 / 255.0;
    let b = rgb.0[2] as f64 / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) / 2.0;
    let delta = max - min;

    if delta < 1e-12 {
        return Hsl { h: 0.0, s: 0.0, l };
    }

    let s = if l > 0.5 {
        delta / (2.0 - max - min)
    } else {
        delta / (max + min)
    };
    let h = if max == r {
        ((g - b) / delta).rem_euclid(6.0)
    } else if max == g {
        (b - r) / delta + 2.0
    } else {
        (r - g) / delta + 4.0
    } / 6.0;

    Hsl { h, s, l }
}

/// Cyclic interval of a colour signature, both endpoints inclusive.
fn color_interval(colors: &[Hsl], start: usize, end: usize) -> Vec<Hsl> {
    let n = colors.len();
    let mut out = Vec::new();
    let mut i = start;
    while i != end {
        out.push(colors[i]);
        i = (i + 1) % n;
    }
    out.push(colors[end]);
    out
}

impl PieceExtractor {
    pub fn new(front: &RgbImage, path: &Path, params: &ExtractParams) -> Self {
        Self {
            image: gaussian_blur_f32(front, params.color_blur_radius as f32),
            path: path.to_path_buf(),
            params: params.clone(),
        }
    }

    /// Outline of the piece region shrunk inwards by `radius` pixels.
    ///
    /// The curve is rasterized to a mask, morphologically eroded and
    /// re-traced; the erosion may split the region, in which case the
    /// traced parts are concatenated.
    fn erode_shape(&self, shape: &Curve, radius: f64) -> Curve {
        let (min, max) = mask::bounding_box(shape);
        let offset = Vector2::new(min.x as f64, min.y as f64);
        let shifted: Curve = shape.iter().map(|p| p - offset).collect();

        let width = (max.x - min.x + 1) as u32;
        let height = (max.y - min.y + 1) as u32;
        let piece_mask = shape_mask(&shifted, width, height);
        let eroded = morphology::erode(&piece_mask, radius);

        trace::extract_components(&eroded)
            .into_iter()
            .flatten()
            .map(|p| p + offset)
            .collect()
    }

    /// For every outline point, the front-scan colour at the nearest
    /// point of the inward-eroded outline.
    fn color_signature(&self, shape: &Curve) -> Vec<Hsl> {
        let inner = self.erode_shape(shape, self.params.edge_to_color_distance);
        if inner.is_empty() {
            // Degenerate sliver; sample on the outline itself.
            return shape.iter().map(|p| self.sample(p)).collect();
        }

        let coords: Vec<[f64; 2]> = inner.iter().map(|p| [p.x, p.y]).collect();
        let tree: KdTree<f64, 2> = (&coords).into();

        shape
            .iter()
            .map(|p| {
                let nearest = tree.nearest_one::<SquaredEuclidean>(&[p.x, p.y]);
                self.sample(&inner[nearest.item as usize])
            })
            .collect()
    }

    fn sample(&self, p: &Point2<f64>) -> Hsl {
        let x = ((p.x + 0.5) as i64).clamp(0, self.image.width() as i64 - 1) as u32;
        let y = ((p.y + 0.5) as i64).clamp(0, self.image.height() as i64 - 1) as u32;
        rgb_to_hsl(*self.image.get_pixel(x, y))
    }

    /// Build the piece record for one registered front-scan outline.
    pub fn extract_piece(&self, shape: &Curve) -> Result<RawPiece, ExtractError> {
        let colors = self.color_signature(shape);
        let corners = classify::identify_corners(&flip_curve(shape), self.params.min_edge_size)
            .ok_or_else(|| ExtractError::CornersNotFound {
                path: self.path.clone(),
            })?;

        let center_f = {
            let sum: Vector2<f64> = corners
                .iter()
                .map(|&c| shape[c].coords)
                .sum::<Vector2<f64>>();
            sum / 4.0
        };
        let center = Point2::new(
            (center_f.x + 0.5).floor() as i32,
            (center_f.y + 0.5).floor() as i32,
        );
        let center_v = Vector2::new(center.x as f64, center.y as f64);

        let edges: [RawEdge; 4] = std::array::from_fn(|i| {
            let begin = corners[i];
            let end = corners[(i + 1) % 4];
            let shape_local: Curve = classify::sub_segment(shape, begin, end)
                .into_iter()
                .map(|p| p - center_v)
                .collect();
            let ty = classify::shape_score(&shape_local, self.params.min_edge_size).1;
            RawEdge {
                ty,
                shape: shape_local,
                color: color_interval(&colors, begin, end),
            }
        });

        Ok(RawPiece {
            image: self.path.clone(),
            center,
            edges,
        })
    }
}

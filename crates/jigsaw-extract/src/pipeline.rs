//! End-to-end extraction: one task per (front, back) scan pair, run on
//! the rayon pool, results gathered in input order.

use image::RgbImage;
use log::{info, warn};
use nalgebra::Point2;
use rayon::prelude::*;
use std::path::{Path, PathBuf};

use jigsaw_core::{flip_curve, polygon_centroid, Curve, PieceSet, RawPiece};

use crate::binarize::binarize_back;
use crate::detect::ObjectDetector;
use crate::optimize::PatternAlignOptimizer;
use crate::piece::PieceExtractor;
use crate::trace;
use crate::{ExtractError, ExtractParams};

/// A front scan and the back scan of the same set of pieces, in
/// corresponding order.
#[derive(Clone, Debug)]
pub struct ImagePair {
    pub front: PathBuf,
    pub back: PathBuf,
}

fn load_rgb(path: &Path) -> Result<RgbImage, ExtractError> {
    image::open(path)
        .map(|img| img.to_rgb8())
        .map_err(|source| ExtractError::Image {
            path: path.to_path_buf(),
            source,
        })
}

/// Outlines of the pieces on one back scan, counter-clockwise, debris
/// filtered out.
fn back_shapes(path: &Path, params: &ExtractParams) -> Result<Vec<Curve>, ExtractError> {
    let back = load_rgb(path)?;
    let mask = binarize_back(&back);
    let components = trace::extract_components(&mask);
    Ok(trace::filter_small_components(
        components,
        params.min_max_piece_size_ratio,
    ))
}

fn extract_pair(pair: &ImagePair, params: &ExtractParams) -> Result<Vec<RawPiece>, ExtractError> {
    let shapes = back_shapes(&pair.back, params)?;
    if shapes.is_empty() {
        warn!("no piece outlines found on {}", pair.back.display());
        return Ok(Vec::new());
    }
    info!(
        "{}: {} piece outline(s)",
        pair.back.display(),
        shapes.len()
    );

    // Back scans mirror the pieces; flip them into front orientation.
    let front_shapes: Vec<Curve> = shapes.iter().map(|s| flip_curve(s)).collect();
    let expected: Vec<Point2<f64>> = shapes.iter().map(|s| polygon_centroid(s)).collect();

    let front = load_rgb(&pair.front)?;
    let detector = ObjectDetector::new(&front, params);
    let positions = detector.detect_positions(expected);

    let optimizer = PatternAlignOptimizer::new(&front);
    let registered: Vec<Curve> = front_shapes
        .iter()
        .zip(positions.iter())
        .map(|(shape, &pos)| optimizer.optimize_align(shape, pos))
        .collect();

    let extractor = PieceExtractor::new(&front, &pair.front, params);
    registered
        .iter()
        .map(|shape| extractor.extract_piece(shape))
        .collect()
}

/// Extract all pieces from the given scan pairs.
///
/// Pairs are processed in parallel; piece and edge ids are assigned
/// afterwards in input order, so results are deterministic.
pub fn extract_pieces(
    pairs: &[ImagePair],
    params: &ExtractParams,
) -> Result<PieceSet, ExtractError> {
    info!("extracting pieces from {} image pair(s)", pairs.len());
    let per_pair: Vec<Vec<RawPiece>> = pairs
        .par_iter()
        .map(|pair| extract_pair(pair, params))
        .collect::<Result<_, _>>()?;

    let raw: Vec<RawPiece> = per_pair.into_iter().flatten().collect();
    info!("extracted {} piece(s)", raw.len());
    Ok(PieceSet::assemble(raw))
}

//! Composite the solved puzzle onto the output canvas.
//!
//! Each piece is cut out of its source scan using its traced outline
//! (eroded a little so neighbouring pieces stay visually separated),
//! rotated to its solved orientation and added onto a black canvas.

use image::{GrayImage, Rgb, RgbImage};
use imageproc::geometric_transformations::{rotate_about_center, Interpolation};
use log::info;
use nalgebra::{Point2, Vector2};

use jigsaw_core::{Curve, PieceId, PieceSet, RigidTransform};
use jigsaw_extract::mask::{shape_mask, BG};
use jigsaw_extract::morphology;
use jigsaw_solve::PuzzleLayout;

use crate::layout::{compute_layout, GeometricLayout};
use crate::{RenderError, RenderParams};

/// Working border around the cropped piece so rotation never clips.
const CROP_BORDER: i64 = 50;

fn image_center(img: &RgbImage) -> Vector2<f64> {
    Vector2::new(
        0.5 * (img.width() as f64 - 1.0),
        0.5 * (img.height() as f64 - 1.0),
    )
}

/// Full piece outline: the four edge curves concatenated.
fn piece_outline(set: &PieceSet, piece: PieceId) -> Curve {
    let mut outline = Curve::new();
    for &edge in &set.piece(piece).edges {
        outline.extend_from_slice(&set.edge(edge).shape);
    }
    outline
}

fn load_rgb(path: &std::path::Path) -> Result<RgbImage, RenderError> {
    image::open(path)
        .map(|img| img.to_rgb8())
        .map_err(|source| RenderError::Image {
            path: path.to_path_buf(),
            source,
        })
}

/// Crop a window centred on `center` that covers the outline on both
/// sides, reading out-of-bounds pixels as black.
fn crop_centered(img: &RgbImage, center: Point2<i64>, half: i64) -> RgbImage {
    let size = (2 * half + 1) as u32;
    let mut out = RgbImage::new(size, size);
    for (x, y, p) in out.enumerate_pixels_mut() {
        let sx = center.x - half + x as i64;
        let sy = center.y - half + y as i64;
        if sx >= 0 && sy >= 0 && (sx as u32) < img.width() && (sy as u32) < img.height() {
            *p = *img.get_pixel(sx as u32, sy as u32);
        }
    }
    out
}

fn apply_mask(img: &mut RgbImage, mask: &GrayImage) {
    for (x, y, p) in img.enumerate_pixels_mut() {
        if mask.get_pixel(x, y).0[0] == BG {
            *p = Rgb([0, 0, 0]);
        }
    }
}

fn composite_add(canvas: &mut RgbImage, img: &RgbImage, offset: Point2<i64>) {
    for (x, y, p) in img.enumerate_pixels() {
        let cx = offset.x + x as i64;
        let cy = offset.y + y as i64;
        if cx < 0 || cy < 0 || (cx as u32) >= canvas.width() || (cy as u32) >= canvas.height() {
            continue;
        }
        let q = canvas.get_pixel_mut(cx as u32, cy as u32);
        for c in 0..3 {
            q.0[c] = q.0[c].saturating_add(p.0[c]);
        }
    }
}

fn draw_piece(
    canvas: &mut RgbImage,
    set: &PieceSet,
    piece: PieceId,
    pose: &RigidTransform,
    params: &RenderParams,
) -> Result<(), RenderError> {
    let source = load_rgb(&set.piece(piece).image)?;
    let outline = piece_outline(set, piece);

    // Window half-extent: outline reach with clearance so an
    // arbitrary rotation never clips the piece.
    let reach = outline
        .iter()
        .map(|p| p.x.abs().max(p.y.abs()))
        .fold(0.0f64, f64::max);
    let half = (reach * std::f64::consts::SQRT_2).ceil() as i64 + CROP_BORDER;

    let center = set.piece(piece).center;
    let mut pixels = crop_centered(&source, Point2::new(center.x as i64, center.y as i64), half);

    // Mask out everything outside the (slightly eroded) outline.
    let crop_center = image_center(&pixels);
    let local: Curve = outline
        .iter()
        .map(|p| Point2::new(p.x + crop_center.x, p.y + crop_center.y))
        .collect();
    let mask = shape_mask(&local, pixels.width(), pixels.height());
    let mask = morphology::erode(&mask, params.visualization_erode);
    apply_mask(&mut pixels, &mask);

    let rotated = rotate_about_center(
        &pixels,
        -pose.rotation as f32,
        Interpolation::Bilinear,
        Rgb([0, 0, 0]),
    );

    let target = pose.translation - image_center(&rotated);
    composite_add(
        canvas,
        &rotated,
        Point2::new(
            (target.x + 0.5).floor() as i64,
            (target.y + 0.5).floor() as i64,
        ),
    );
    Ok(())
}

/// Grow the layout by the visualization margin on every side.
fn add_frame(mut layout: GeometricLayout, frame: f64) -> GeometricLayout {
    for pose in layout.poses.values_mut() {
        pose.translation += Vector2::new(frame, frame);
    }
    layout.width += 2.0 * frame;
    layout.height += 2.0 * frame;
    layout
}

/// Render the solved puzzle into an image.
pub fn visualize(
    set: &PieceSet,
    layout: &PuzzleLayout,
    params: &RenderParams,
) -> Result<RgbImage, RenderError> {
    let geometric = compute_layout(set, layout)?;
    let geometric = add_frame(geometric, params.visualization_frame);
    info!(
        "rendering {:.0}x{:.0} canvas with {} piece(s)",
        geometric.width,
        geometric.height,
        geometric.poses.len()
    );

    let mut canvas = RgbImage::new(
        geometric.width.ceil() as u32,
        geometric.height.ceil() as u32,
    );
    for (&piece, pose) in &geometric.poses {
        draw_piece(&mut canvas, set, piece, pose, params)?;
    }
    Ok(canvas)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composite_add_saturates_and_clips() {
        let mut canvas = RgbImage::from_pixel(4, 4, Rgb([250, 0, 0]));
        let tile = RgbImage::from_pixel(2, 2, Rgb([10, 20, 30]));
        composite_add(&mut canvas, &tile, Point2::new(3, 3));

        assert_eq!(*canvas.get_pixel(3, 3), Rgb([255, 20, 30]));
        // Off-canvas parts are dropped silently.
        assert_eq!(*canvas.get_pixel(0, 0), Rgb([250, 0, 0]));
    }

    #[test]
    fn crop_centered_reads_out_of_bounds_as_black() {
        let mut img = RgbImage::from_pixel(5, 5, Rgb([9, 9, 9]));
        img.put_pixel(0, 0, Rgb([77, 0, 0]));
        let crop = crop_centered(&img, Point2::new(0, 0), 2);
        assert_eq!(crop.dimensions(), (5, 5));
        assert_eq!(*crop.get_pixel(0, 0), Rgb([0, 0, 0]));
        assert_eq!(*crop.get_pixel(2, 2), Rgb([77, 0, 0]));
    }

    #[test]
    fn apply_mask_blanks_background() {
        let mut img = RgbImage::from_pixel(3, 3, Rgb([50, 60, 70]));
        let mut mask = GrayImage::from_pixel(3, 3, image::Luma([255]));
        mask.put_pixel(1, 1, image::Luma([BG]));
        apply_mask(&mut img, &mask);
        assert_eq!(*img.get_pixel(1, 1), Rgb([0, 0, 0]));
        assert_eq!(*img.get_pixel(0, 0), Rgb([50, 60, 70]));
    }
}

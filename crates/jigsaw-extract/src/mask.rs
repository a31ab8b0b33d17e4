//! Binary mask helpers on top of `image::GrayImage`.
//!
//! Foreground is 255, background 0. These are the small raster
//! operations the tracer, the morphology pass and the visualizer share.

use image::{GrayImage, Luma};
use nalgebra::Point2;

use jigsaw_core::Curve;

pub const FG: u8 = 255;
pub const BG: u8 = 0;

#[inline]
pub fn is_fg(mask: &GrayImage, x: i32, y: i32) -> bool {
    x >= 0
        && y >= 0
        && (x as u32) < mask.width()
        && (y as u32) < mask.height()
        && mask.get_pixel(x as u32, y as u32).0[0] != BG
}

/// Copy the mask into a canvas grown by `border` pixels of `color` on
/// every side.
pub fn pad(mask: &GrayImage, border: u32, color: u8) -> GrayImage {
    let mut out = GrayImage::from_pixel(
        mask.width() + 2 * border,
        mask.height() + 2 * border,
        Luma([color]),
    );
    for (x, y, p) in mask.enumerate_pixels() {
        out.put_pixel(x + border, y + border, *p);
    }
    out
}

/// 4-connected flood fill of the region containing `(x, y)` with
/// `color`. A no-op when the seed already has the target colour.
pub fn flood_fill(mask: &mut GrayImage, x: u32, y: u32, color: u8) {
    let old = mask.get_pixel(x, y).0[0];
    if old == color {
        return;
    }
    let mut stack = vec![(x as i32, y as i32)];
    while let Some((cx, cy)) = stack.pop() {
        if cx < 0 || cy < 0 || cx as u32 >= mask.width() || cy as u32 >= mask.height() {
            continue;
        }
        let p = mask.get_pixel_mut(cx as u32, cy as u32);
        if p.0[0] != old {
            continue;
        }
        p.0[0] = color;
        stack.push((cx + 1, cy));
        stack.push((cx - 1, cy));
        stack.push((cx, cy + 1));
        stack.push((cx, cy - 1));
    }
}

/// Rasterize the region enclosed by a closed curve into a mask of the
/// given size.
///
/// The outline is drawn as background, the outside is flooded from the
/// frame, so the returned foreground is the strict interior.
pub fn shape_mask(shape: &Curve, width: u32, height: u32) -> GrayImage {
    let mut canvas = GrayImage::from_pixel(width + 2, height + 2, Luma([FG]));
    for p in shape {
        let x = (p.x + 0.5).floor() as i32 + 1;
        let y = (p.y + 0.5).floor() as i32 + 1;
        if x >= 0 && y >= 0 && (x as u32) < canvas.width() && (y as u32) < canvas.height() {
            canvas.put_pixel(x as u32, y as u32, Luma([BG]));
        }
    }
    flood_fill(&mut canvas, 0, 0, BG);

    let mut out = GrayImage::new(width, height);
    for (x, y, p) in out.enumerate_pixels_mut() {
        *p = *canvas.get_pixel(x + 1, y + 1);
    }
    out
}

/// Integer bounding box of a curve: `(min, max)` inclusive.
pub fn bounding_box(shape: &Curve) -> (Point2<i32>, Point2<i32>) {
    let mut min = Point2::new(i32::MAX, i32::MAX);
    let mut max = Point2::new(i32::MIN, i32::MIN);
    for p in shape {
        let x = (p.x + 0.5).floor() as i32;
        let y = (p.y + 0.5).floor() as i32;
        min.x = min.x.min(x);
        min.y = min.y.min(y);
        max.x = max.x.max(x);
        max.y = max.y.max(y);
    }
    (min, max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flood_fill_stops_at_barrier() {
        let mut mask = GrayImage::from_pixel(5, 5, Luma([FG]));
        for y in 0..5 {
            mask.put_pixel(2, y, Luma([BG]));
        }
        flood_fill(&mut mask, 0, 0, BG);
        // Left of the barrier is filled, right is untouched.
        assert_eq!(mask.get_pixel(1, 3).0[0], BG);
        assert_eq!(mask.get_pixel(4, 3).0[0], FG);
    }

    #[test]
    fn shape_mask_fills_interior_only() {
        // A 6x6 square outline inside a 10x10 canvas.
        let mut outline = Vec::new();
        for i in 2..=8 {
            outline.push(nalgebra::Point2::new(i as f64, 2.0));
            outline.push(nalgebra::Point2::new(i as f64, 8.0));
            outline.push(nalgebra::Point2::new(2.0, i as f64));
            outline.push(nalgebra::Point2::new(8.0, i as f64));
        }
        let mask = shape_mask(&outline, 11, 11);
        assert_eq!(mask.get_pixel(5, 5).0[0], FG);
        assert_eq!(mask.get_pixel(0, 0).0[0], BG);
        assert_eq!(mask.get_pixel(2, 5).0[0], BG);
    }

    #[test]
    fn pad_grows_symmetrically() {
        let mask = GrayImage::from_pixel(3, 2, Luma([FG]));
        let padded = pad(&mask, 2, BG);
        assert_eq!(padded.dimensions(), (7, 6));
        assert_eq!(padded.get_pixel(0, 0).0[0], BG);
        assert_eq!(padded.get_pixel(2, 2).0[0], FG);
    }
}

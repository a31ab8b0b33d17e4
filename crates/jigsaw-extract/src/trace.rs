//! Connected-component border tracing on a binarized back scan.
//!
//! Each white component is traced once along its border, yielding a
//! closed curve in counter-clockwise order (positive signed area in
//! image coordinates), then flooded away so it is never revisited.

use image::GrayImage;
use nalgebra::Point2;

use jigsaw_core::{polygon_area, Curve, DIRECTIONS};

use crate::mask::{self, BG};

/// A lattice point touches the shape when any cell of the 2x2 pixel
/// block anchored at it is foreground.
#[inline]
fn is_shape_point(mask: &GrayImage, p: Point2<i32>) -> bool {
    mask::is_fg(mask, p.x - 1, p.y - 1)
        || mask::is_fg(mask, p.x, p.y - 1)
        || mask::is_fg(mask, p.x - 1, p.y)
        || mask::is_fg(mask, p.x, p.y)
}

/// Walk the component border starting from a lattice point on it.
///
/// At every step the direction first turns left (+90°) and then backs
/// off clockwise until the next lattice point still touches the shape,
/// which follows the border counter-clockwise.
fn trace_component(mask: &GrayImage, start: Point2<i32>) -> Curve {
    let mut shape = Curve::new();
    let mut dir = 2usize;
    let mut p = start;

    loop {
        // 2 px of padding and half a pixel of block anchoring.
        shape.push(Point2::new(p.x as f64 - 2.5, p.y as f64 - 2.5));
        dir = (dir + 1) % 4;
        while !is_shape_point(mask, p + DIRECTIONS[dir]) {
            dir = (dir + 3) % 4;
        }
        p += DIRECTIONS[dir];
        if p == start {
            break;
        }
    }
    shape
}

/// Trace every foreground component of the mask.
///
/// The mask is padded by 2 background pixels first so no component
/// touches the canvas frame; output coordinates are in the original
/// (unpadded) pixel frame.
pub fn extract_components(mask: &GrayImage) -> Vec<Curve> {
    let mut work = mask::pad(mask, 2, BG);
    let mut components = Vec::new();

    for y in 0..work.height() {
        for x in 0..work.width() {
            if work.get_pixel(x, y).0[0] != BG {
                components.push(trace_component(&work, Point2::new(x as i32, y as i32)));
                mask::flood_fill(&mut work, x, y, BG);
            }
        }
    }
    components
}

/// Drop components whose polygon area is below `min_max_ratio` of the
/// largest one.
pub fn filter_small_components(shapes: Vec<Curve>, min_max_ratio: f64) -> Vec<Curve> {
    let max_area = shapes
        .iter()
        .map(|s| polygon_area(s))
        .fold(0.0f64, f64::max);
    shapes
        .into_iter()
        .filter(|s| polygon_area(s) >= min_max_ratio * max_area)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;
    use jigsaw_core::signed_area;

    fn blob(w: u32, h: u32, x0: u32, y0: u32, x1: u32, y1: u32) -> GrayImage {
        let mut mask = GrayImage::new(w, h);
        for y in y0..=y1 {
            for x in x0..=x1 {
                mask.put_pixel(x, y, Luma([mask::FG]));
            }
        }
        mask
    }

    #[test]
    fn traces_single_square_counter_clockwise() {
        let mask = blob(20, 20, 5, 5, 12, 12);
        let components = extract_components(&mask);
        assert_eq!(components.len(), 1);

        let shape = &components[0];
        assert!(signed_area(shape) > 0.0);
        // An 8x8 block has a 32-step border walk.
        assert_eq!(shape.len(), 32);
    }

    #[test]
    fn traced_outline_stays_on_component_border() {
        let mask = blob(20, 20, 5, 5, 12, 12);
        let shape = extract_components(&mask).pop().unwrap();
        for p in &shape {
            assert!(p.x >= 4.0 && p.x <= 13.0, "x out of range: {p}");
            assert!(p.y >= 4.0 && p.y <= 13.0, "y out of range: {p}");
        }
    }

    #[test]
    fn finds_separate_components() {
        let mut mask = blob(40, 20, 2, 2, 10, 10);
        for y in 5..=15 {
            for x in 20..=35 {
                mask.put_pixel(x, y, Luma([mask::FG]));
            }
        }
        let components = extract_components(&mask);
        assert_eq!(components.len(), 2);
    }

    #[test]
    fn small_components_are_filtered_by_area_ratio() {
        let mut mask = blob(40, 40, 2, 2, 21, 21); // 20x20
        mask.put_pixel(30, 30, Luma([mask::FG]));
        mask.put_pixel(31, 30, Luma([mask::FG]));

        let all = extract_components(&mask);
        assert_eq!(all.len(), 2);
        let kept = filter_small_components(all, 0.25);
        assert_eq!(kept.len(), 1);
        assert!(polygon_area(&kept[0]) > 300.0);
    }
}

//! Binary morphology with a disc structuring element.
//!
//! Pixels outside the image are treated as background by `dilate`, so
//! `erode` (its dual) never eats the mask inwards from the canvas
//! frame. Callers that need frame-safe behaviour pad first.

use image::{GrayImage, Luma};

use crate::mask::{BG, FG};

fn disc_offsets(radius: f64) -> Vec<(i32, i32)> {
    let half = (radius + 0.5) as i32;
    let mut offsets = Vec::new();
    for dy in -half..=half {
        for dx in -half..=half {
            if (dx * dx + dy * dy) as f64 <= radius * radius {
                offsets.push((dx, dy));
            }
        }
    }
    offsets
}

pub fn dilate(mask: &GrayImage, radius: f64) -> GrayImage {
    let offsets = disc_offsets(radius);
    let (w, h) = mask.dimensions();
    let mut out = GrayImage::new(w, h);
    for y in 0..h as i32 {
        for x in 0..w as i32 {
            let hit = offsets.iter().any(|&(dx, dy)| {
                let (nx, ny) = (x + dx, y + dy);
                nx >= 0
                    && ny >= 0
                    && (nx as u32) < w
                    && (ny as u32) < h
                    && mask.get_pixel(nx as u32, ny as u32).0[0] != BG
            });
            out.put_pixel(x as u32, y as u32, Luma([if hit { FG } else { BG }]));
        }
    }
    out
}

fn negate(mask: &GrayImage) -> GrayImage {
    let mut out = mask.clone();
    for p in out.pixels_mut() {
        p.0[0] = if p.0[0] == BG { FG } else { BG };
    }
    out
}

pub fn erode(mask: &GrayImage, radius: f64) -> GrayImage {
    negate(&dilate(&negate(mask), radius))
}

pub fn open(mask: &GrayImage, radius: f64) -> GrayImage {
    dilate(&erode(mask, radius), radius)
}

pub fn close(mask: &GrayImage, radius: f64) -> GrayImage {
    erode(&dilate(mask, radius), radius)
}

/// Opening followed by closing; removes isolated specks and seals
/// pinholes of up to roughly `radius` size.
pub fn smooth(mask: &GrayImage, radius: f64) -> GrayImage {
    close(&open(mask, radius), radius)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect_mask(w: u32, h: u32, x0: u32, y0: u32, x1: u32, y1: u32) -> GrayImage {
        let mut mask = GrayImage::new(w, h);
        for y in y0..=y1 {
            for x in x0..=x1 {
                mask.put_pixel(x, y, Luma([FG]));
            }
        }
        mask
    }

    fn count_fg(mask: &GrayImage) -> usize {
        mask.pixels().filter(|p| p.0[0] != BG).count()
    }

    #[test]
    fn erode_shrinks_each_side_by_radius() {
        let mask = rect_mask(20, 20, 5, 5, 14, 14);
        let eroded = erode(&mask, 2.0);
        assert_eq!(count_fg(&eroded), 6 * 6);
        assert_eq!(eroded.get_pixel(7, 7).0[0], FG);
        assert_eq!(eroded.get_pixel(6, 7).0[0], BG);
    }

    #[test]
    fn dilate_then_erode_restores_a_fat_rectangle() {
        let mask = rect_mask(30, 30, 8, 8, 21, 21);
        let closed = close(&mask, 2.0);
        assert_eq!(count_fg(&closed), count_fg(&mask));
    }

    #[test]
    fn smooth_removes_speck_and_fills_pinhole() {
        let mut mask = rect_mask(30, 30, 8, 8, 21, 21);
        mask.put_pixel(2, 2, Luma([FG])); // speck far from the piece
        mask.put_pixel(14, 14, Luma([BG])); // pinhole inside it
        let cleaned = smooth(&mask, 2.0);
        assert_eq!(cleaned.get_pixel(2, 2).0[0], BG);
        assert_eq!(cleaned.get_pixel(14, 14).0[0], FG);
    }
}

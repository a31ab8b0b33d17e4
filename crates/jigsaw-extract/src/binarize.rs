//! Back-scan binarization: grayscale conversion, automatic threshold
//! selection and morphological cleanup.

use image::{GrayImage, Luma, RgbImage};

use crate::morphology;

/// Grayscale by the maximum of the three colour channels.
///
/// Back scans light the pieces against a dark background; taking the
/// channel maximum keeps saturated piece colours bright.
pub fn value_channel(img: &RgbImage) -> GrayImage {
    let mut out = GrayImage::new(img.width(), img.height());
    for (x, y, p) in img.enumerate_pixels() {
        let v = p.0[0].max(p.0[1]).max(p.0[2]);
        out.put_pixel(x, y, Luma([v]));
    }
    out
}

pub fn histogram(gray: &GrayImage) -> [u64; 256] {
    let mut hist = [0u64; 256];
    for p in gray.pixels() {
        hist[p.0[0] as usize] += 1;
    }
    hist
}

/// Threshold selection by iterated class means.
///
/// Starts from the weighted mean of the histogram and refines five
/// times with `t' = (mean_below + mean_above) / 2`. Returns the
/// threshold on the histogram bin scale (0..255).
pub fn iterated_mean_threshold(hist: &[u64; 256]) -> f64 {
    let mut weighted = [0u64; 256];
    let mut counts = [0u64; 256];
    let mut wsum = 0u64;
    let mut csum = 0u64;
    for (i, &h) in hist.iter().enumerate() {
        wsum += i as u64 * h;
        csum += h;
        weighted[i] = wsum;
        counts[i] = csum;
    }

    let total_w = weighted[255];
    let total_c = counts[255];
    let mut threshold = total_w as f64 / total_c as f64;
    for _ in 0..5 {
        let t = threshold as usize;
        if counts[t] == 0 || counts[t] == total_c {
            break;
        }
        let mean_below = weighted[t] as f64 / counts[t] as f64;
        let mean_above = (total_w - weighted[t]) as f64 / (total_c - counts[t]) as f64;
        threshold = (mean_below + mean_above) / 2.0;
    }
    threshold
}

pub fn threshold(gray: &GrayImage, fraction: f64) -> GrayImage {
    let cut = (fraction * 255.0) as i32;
    let mut out = GrayImage::new(gray.width(), gray.height());
    for (x, y, p) in gray.enumerate_pixels() {
        let v = if (p.0[0] as i32) > cut { crate::mask::FG } else { crate::mask::BG };
        out.put_pixel(x, y, Luma([v]));
    }
    out
}

/// Full back-scan binarization: value channel, automatic threshold,
/// radius-2 morphological smoothing.
pub fn binarize_back(img: &RgbImage) -> GrayImage {
    let gray = value_channel(img);
    let t = iterated_mean_threshold(&histogram(&gray));
    let mask = threshold(&gray, t / 255.0);
    morphology::smooth(&mask, 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Discrete Gaussian-ish lobe centred at `mu`.
    fn lobe(hist: &mut [u64; 256], mu: i32, sigma: f64, amplitude: f64) {
        for i in 0..256i32 {
            let d = (i - mu) as f64;
            hist[i as usize] += (amplitude * (-d * d / (2.0 * sigma * sigma)).exp()) as u64;
        }
    }

    #[test]
    fn threshold_splits_two_separated_lobes() {
        let mut hist = [0u64; 256];
        lobe(&mut hist, 60, 12.0, 5000.0);
        lobe(&mut hist, 180, 12.0, 5000.0);
        let t = iterated_mean_threshold(&hist);
        assert!(t > 100.0 && t < 140.0, "threshold {t}");
    }

    #[test]
    fn threshold_of_uniform_histogram_stays_central() {
        let hist = [10u64; 256];
        let t = iterated_mean_threshold(&hist);
        assert!(t > 100.0 && t < 155.0, "threshold {t}");
    }

    #[test]
    fn value_channel_takes_max() {
        let mut img = RgbImage::new(1, 1);
        img.put_pixel(0, 0, image::Rgb([10, 200, 40]));
        assert_eq!(value_channel(&img).get_pixel(0, 0).0[0], 200);
    }
}

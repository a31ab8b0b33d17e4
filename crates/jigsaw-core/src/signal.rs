//! 1-D signal helpers shared by the shape classifier and the
//! compatibility scorer: resampling, circular smoothing and
//! local-extrema search. Signals are treated cyclically unless noted.

/// Nearest-index resampling of `signal` to exactly `n` samples.
pub fn resample_to<T: Copy>(signal: &[T], n: usize) -> Vec<T> {
    if n <= 1 {
        return signal.first().copied().into_iter().collect();
    }
    let len = signal.len();
    (0..n)
        .map(|i| {
            let j = (i as f64 * (len - 1) as f64 / (n - 1) as f64 + 0.5) as usize;
            signal[j.min(len - 1)]
        })
        .collect()
}

/// Resampling by a length factor; `scale` < 1 shortens the signal.
pub fn resample_scaled<T: Copy>(signal: &[T], scale: f64) -> Vec<T> {
    let n = (signal.len() as f64 * scale + 0.5) as usize;
    resample_to(signal, n)
}

/// Cyclic convolution; `out[i] = Σ_j signal[(i - j) mod n] · kernel[j]`.
pub fn circular_convolution(signal: &[f64], kernel: &[f64]) -> Vec<f64> {
    let n = signal.len() as isize;
    (0..n)
        .map(|i| {
            kernel
                .iter()
                .enumerate()
                .map(|(j, k)| signal[((i - j as isize).rem_euclid(n)) as usize] * k)
                .sum()
        })
        .collect()
}

/// Low-pass filter with a normalized Gaussian kernel spanning ±3σ,
/// re-centred so the output is phase-aligned with the input.
pub fn gaussian_blur(signal: &[f64], sigma: f64) -> Vec<f64> {
    let half = (3.0 * sigma) as isize;
    let mut kernel: Vec<f64> = (-half..=half)
        .map(|i| (-((i * i) as f64) / (2.0 * sigma * sigma)).exp())
        .collect();
    let sum: f64 = kernel.iter().sum();
    for k in &mut kernel {
        *k /= sum;
    }

    let mut blurred = circular_convolution(signal, &kernel);
    blurred.rotate_left(half as usize % signal.len().max(1));
    blurred
}

/// First difference with the cyclic closing term folded into slot 0.
pub fn cyclic_difference(signal: &[f64]) -> Vec<f64> {
    let n = signal.len();
    let mut diff = vec![0.0; n];
    diff[0] = signal[0];
    for i in 1..n {
        diff[i] = signal[i] - signal[i - 1];
    }
    let last = diff[n - 1];
    diff[0] -= last;
    diff
}

fn is_cyclic_maximum(pos: usize, signal: &[f64], radius: usize) -> bool {
    let n = signal.len() as isize;
    let p = pos as isize;
    for i in 1..=radius as isize {
        if signal[((p + i).rem_euclid(n)) as usize] >= signal[pos] {
            return false;
        }
        if signal[((p - i).rem_euclid(n)) as usize] >= signal[pos] {
            return false;
        }
    }
    true
}

/// Indices of all strict local maxima over a cyclic neighbourhood of
/// `radius`, strongest first.
pub fn find_local_maxima(signal: &[f64], radius: usize) -> Vec<usize> {
    let mut extrema: Vec<usize> = (0..signal.len())
        .filter(|&i| is_cyclic_maximum(i, signal, radius))
        .collect();
    extrema.sort_by(|&a, &b| signal[b].total_cmp(&signal[a]));
    extrema
}

pub fn find_local_minima(signal: &[f64], radius: usize) -> Vec<usize> {
    let negated: Vec<f64> = signal.iter().map(|v| -v).collect();
    find_local_maxima(&negated, radius)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn resample_round_trip_is_close() {
        let signal: Vec<f64> = (0..20).map(|i| i as f64).collect();
        let up = resample_to(&signal, 60);
        let down = resample_to(&up, 20);
        for (a, b) in signal.iter().zip(down.iter()) {
            assert!((a - b).abs() <= 1.0, "{a} vs {b}");
        }
    }

    #[test]
    fn resample_keeps_endpoints() {
        let signal = [3.0, 7.0, 1.0, 9.0];
        let out = resample_to(&signal, 9);
        assert_relative_eq!(out[0], 3.0);
        assert_relative_eq!(out[8], 9.0);
    }

    #[test]
    fn blur_preserves_mean_of_constant_signal() {
        let signal = vec![5.0; 40];
        let blurred = gaussian_blur(&signal, 3.0);
        for v in blurred {
            assert_relative_eq!(v, 5.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn blur_keeps_peak_centred() {
        let mut signal = vec![0.0; 64];
        signal[32] = 1.0;
        let blurred = gaussian_blur(&signal, 2.0);
        let peak = blurred
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(peak, 32);
    }

    #[test]
    fn local_maxima_found_in_order_of_strength() {
        let mut signal = vec![0.0; 50];
        signal[10] = 2.0;
        signal[30] = 5.0;
        let maxima = find_local_maxima(&signal, 5);
        assert_eq!(maxima, vec![30, 10]);
    }

    #[test]
    fn minima_are_negated_maxima() {
        let mut signal = vec![1.0; 30];
        signal[7] = -4.0;
        assert_eq!(find_local_minima(&signal, 3)[0], 7);
    }
}

//! Edge classification and corner identification on a piece outline.
//!
//! The outline is reduced to a smoothed curvature signature (blurred
//! second derivative of the tangent angle); its peaks are corner
//! candidates, and every 4-combination of candidates is scored by how
//! well the four sub-curves between them look like classic edge
//! profiles (flat, indent, outdent).

use nalgebra::Point2;

use jigsaw_core::{
    cyclic_difference, distance_from_line, find_local_maxima, gaussian_blur, Curve, EdgeType,
    SCORE_INF,
};

/// Smoothing of the angular signatures.
const SIGNATURE_BLUR_SIGMA: f64 = 10.0;
/// Neighbourhood radius for corner-candidate maxima.
const CANDIDATE_RADIUS: usize = 10;
/// Candidates weaker than this fraction of the strongest are dropped.
const CANDIDATE_MIN_RATIO: f64 = 0.25;
/// Sub-curves flatter than this chord distance are flat outright.
const FLAT_LIMIT: f64 = 10.0;

/// Per-segment tangent angles with 2π unwrapping.
fn tangent_angles(shape: &[Point2<f64>]) -> Vec<f64> {
    let mut angles = Vec::with_capacity(shape.len() - 1);
    let mut last = std::f64::consts::PI;
    for w in shape.windows(2) {
        let dir = w[1] - w[0];
        let mut angle = (-dir.y).atan2(dir.x);
        while angle < last - std::f64::consts::PI {
            angle += 2.0 * std::f64::consts::PI;
        }
        while angle > last + std::f64::consts::PI {
            angle -= 2.0 * std::f64::consts::PI;
        }
        angles.push(angle);
        last = angle;
    }
    angles
}

/// Smoothed curvature: blurred first difference of the tangent angles.
fn curvature_signature(shape: &[Point2<f64>]) -> Vec<f64> {
    let angles = tangent_angles(shape);
    let diff = cyclic_difference(&angles);
    gaussian_blur(&diff, SIGNATURE_BLUR_SIGMA)
}

/// Curvature signature of a closed curve.
///
/// The curve is tripled before differentiation and the middle copy is
/// kept, so the result is cyclic without boundary artefacts.
pub fn circular_signature(shape: &Curve) -> Vec<f64> {
    let n = shape.len();
    let mut extended = Curve::with_capacity(3 * n);
    for _ in 0..3 {
        extended.extend_from_slice(shape);
    }
    let mut signature = curvature_signature(&extended);
    signature.rotate_left(n);
    signature.truncate(n);
    signature
}

/// Blur-then-differentiate variant used for indent detection on open
/// segments; slot 0 carries no information and is zeroed.
fn angular_signature(segment: &[Point2<f64>]) -> Vec<f64> {
    let angles = tangent_angles(segment);
    let filtered = gaussian_blur(&angles, SIGNATURE_BLUR_SIGMA);
    let mut diff = cyclic_difference(&filtered);
    diff[0] = 0.0;
    diff
}

/// Local maximum over a clamped (non-cyclic) window; plateaus count.
fn is_bounded_maximum(pos: usize, signal: &[f64], radius: usize) -> bool {
    let start = pos.saturating_sub(radius);
    let end = (pos + radius).min(signal.len() - 1);
    (start..=end).all(|i| signal[i] <= signal[pos])
}

/// Greatest distance of any segment point from the chord between the
/// segment's endpoints.
pub fn flat_score(segment: &[Point2<f64>]) -> f64 {
    let l1 = segment[0];
    let l2 = *segment.last().unwrap();
    segment
        .iter()
        .map(|&p| distance_from_line(l1, l2, p))
        .fold(0.0, f64::max)
}

/// Longest run of the signature lying on or below zero, returned as
/// the (start, end) index pair delimiting it.
fn longest_peak(signature: &[f64]) -> (usize, usize) {
    let mut longest = (0usize, 0usize);
    let mut j = 0usize;
    for (i, &v) in signature.iter().enumerate() {
        if v > 0.0 {
            j = i;
        }
        if i - j > longest.1 - longest.0 {
            longest = (j, i);
        }
    }
    longest
}

/// Similarity of the segment to an edge with an indent: locate the
/// bump in the angular signature, widen it to the flanking local
/// maxima, cut it out and measure how flat the remainder is.
pub fn indent_score(segment: &[Point2<f64>], min_edge_size: usize) -> f64 {
    let length = segment.len();
    if length < min_edge_size {
        return SCORE_INF;
    }

    let signature = angular_signature(segment);
    let (mut lo, mut hi) = longest_peak(&signature);
    while lo > 0 && !is_bounded_maximum(lo, &signature, CANDIDATE_RADIUS) {
        lo -= 1;
    }
    while hi < length - 1 && !is_bounded_maximum(hi, &signature, CANDIDATE_RADIUS) {
        hi += 1;
    }

    let mut remainder = Curve::with_capacity(lo + 1 + length.saturating_sub(hi));
    remainder.extend_from_slice(&segment[..=lo]);
    if hi < length {
        remainder.extend_from_slice(&segment[hi..]);
    }
    flat_score(&remainder)
}

pub fn outdent_score(segment: &[Point2<f64>], min_edge_size: usize) -> f64 {
    let mirrored: Curve = segment.iter().map(|p| Point2::new(p.x, -p.y)).collect();
    indent_score(&mirrored, min_edge_size)
}

/// Best score over the three edge profiles, with the matching type.
pub fn shape_score(segment: &[Point2<f64>], min_edge_size: usize) -> (f64, EdgeType) {
    debug_assert!(segment.len() >= 2);

    let mut score = flat_score(segment);
    let mut ty = EdgeType::Flat;

    if score > FLAT_LIMIT {
        let indent = indent_score(segment, min_edge_size);
        if score > indent {
            score = indent;
            ty = EdgeType::Indent;
        }
        let outdent = outdent_score(segment, min_edge_size);
        if score > outdent {
            score = outdent;
            ty = EdgeType::Outdent;
        }
    }
    (score, ty)
}

/// Corner candidates: curvature maxima at least a quarter as strong as
/// the strongest, in curve order.
pub fn possible_corners(shape: &Curve) -> Vec<usize> {
    let signature = circular_signature(shape);
    let mut maxima = find_local_maxima(&signature, CANDIDATE_RADIUS);
    maxima.sort_unstable();

    let strongest = maxima
        .iter()
        .map(|&i| signature[i])
        .fold(f64::NEG_INFINITY, f64::max);
    maxima
        .into_iter()
        .filter(|&i| signature[i] >= CANDIDATE_MIN_RATIO * strongest)
        .collect()
}

/// Cyclic sub-curve from index `start` to `end`, both inclusive.
pub fn sub_segment(shape: &Curve, start: usize, end: usize) -> Curve {
    let n = shape.len();
    let mut segment = Curve::new();
    let mut i = start;
    while i != end {
        segment.push(shape[i]);
        i = (i + 1) % n;
    }
    segment.push(shape[end]);
    segment
}

fn combination_score(q: [usize; 4], table: &[Vec<f64>]) -> f64 {
    let mut worst = 0.0f64;
    let mut sum = 0.0;
    for i in 0..4 {
        let s = table[q[i]][q[(i + 1) % 4]];
        sum += s;
        worst = worst.max(s);
    }
    worst + sum
}

/// The four corner indices of a piece outline, or `None` when fewer
/// than four candidates survive filtering.
pub fn identify_corners(shape: &Curve, min_edge_size: usize) -> Option<[usize; 4]> {
    let candidates = possible_corners(shape);
    let n = candidates.len();
    if n < 4 {
        return None;
    }

    let mut table = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in 0..n {
            if i != j {
                let segment = sub_segment(shape, candidates[i], candidates[j]);
                table[i][j] = shape_score(&segment, min_edge_size).0;
            }
        }
    }

    let mut best = (f64::INFINITY, [0usize; 4]);
    for a in 0..n {
        for b in a + 1..n {
            for c in b + 1..n {
                for d in c + 1..n {
                    let q = [a, b, c, d];
                    let score = combination_score(q, &table);
                    if score < best.0 {
                        best = (score, q);
                    }
                }
            }
        }
    }

    let q = best.1;
    Some([
        candidates[q[0]],
        candidates[q[1]],
        candidates[q[2]],
        candidates[q[3]],
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Closed square outline with `side` points per side, traversed in
    /// the orientation the extractor produces.
    fn square_outline(side: usize) -> Curve {
        let s = side as f64;
        let mut outline = Curve::new();
        for i in 0..side {
            outline.push(Point2::new(0.0, i as f64));
        }
        for i in 0..side {
            outline.push(Point2::new(i as f64, s));
        }
        for i in 0..side {
            outline.push(Point2::new(s, s - i as f64));
        }
        for i in 0..side {
            outline.push(Point2::new(s - i as f64, 0.0));
        }
        outline
    }

    #[test]
    fn square_corners_are_found() {
        let side = 60;
        let shape = square_outline(side);
        let corners = identify_corners(&shape, 30).expect("four corners");

        let expected = [0, side, 2 * side, 3 * side];
        for (got, want) in corners.iter().zip(expected.iter()) {
            let d = (*got as i64 - *want as i64).abs().min(shape.len() as i64 - (*got as i64 - *want as i64).abs());
            assert!(d <= 3, "corner {got} too far from {want}");
        }
    }

    #[test]
    fn straight_segment_is_flat() {
        let segment: Curve = (0..50).map(|i| Point2::new(i as f64, 0.0)).collect();
        let (score, ty) = shape_score(&segment, 30);
        assert_eq!(ty, EdgeType::Flat);
        assert!(score < 1e-9);
    }

    #[test]
    fn flat_score_measures_chord_distance() {
        let mut segment: Curve = (0..50).map(|i| Point2::new(i as f64, 0.0)).collect();
        segment[25].y = 4.0;
        assert!((flat_score(&segment) - 4.0).abs() < 1e-9);
    }

    #[test]
    fn bump_edges_classify_as_indent_and_outdent() {
        // A straight run with a smooth half-circle bulge in the middle.
        let n = 120usize;
        let bump = |i: usize, sign: f64| -> Point2<f64> {
            let x = i as f64;
            let c = n as f64 / 2.0;
            let r = 14.0;
            let d = (x - c).abs();
            let y = if d < r { sign * (r * r - d * d).sqrt() } else { 0.0 };
            Point2::new(x, y)
        };

        let up: Curve = (0..n).map(|i| bump(i, -1.0)).collect();
        let down: Curve = (0..n).map(|i| bump(i, 1.0)).collect();

        let (_, ty_up) = shape_score(&up, 30);
        let (_, ty_down) = shape_score(&down, 30);
        assert_ne!(ty_up, EdgeType::Flat);
        assert_ne!(ty_down, EdgeType::Flat);
        assert_ne!(ty_up, ty_down);
    }

    #[test]
    fn short_segments_never_score_as_indent() {
        let segment: Curve = (0..10).map(|i| Point2::new(i as f64, (i % 2) as f64)).collect();
        assert_eq!(indent_score(&segment, 30), SCORE_INF);
    }

    #[test]
    fn sub_segment_wraps_cyclically() {
        let shape: Curve = (0..8).map(|i| Point2::new(i as f64, 0.0)).collect();
        let seg = sub_segment(&shape, 6, 2);
        assert_eq!(seg.len(), 5);
        assert_eq!(seg[0].x, 6.0);
        assert_eq!(seg[4].x, 2.0);
    }
}

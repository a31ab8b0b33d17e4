//! Rigid alignment of one sampled curve along another.
//!
//! The result carries both the transform and a bidirectional point
//! pairing, so a coarse alignment can be resumed at a finer sampling
//! of the same curves.

use nalgebra::Point2;

use crate::geometry::{self, angle_of, optimal_align, Curve, RigidTransform};

/// Pairing window when refining point correspondences.
const PAIR_WINDOW: usize = 5;
/// Fixed-point iteration cap; well-formed curves converge in a handful
/// of rounds.
const MAX_REFINE_ITERS: usize = 100;

/// Rigid transform of the second curve plus mutual nearest-point
/// pairings under that transform.
#[derive(Clone, Debug)]
pub struct ShapeAlign {
    /// For point i of curve 1, the paired index on curve 2.
    pub pairs12: Vec<usize>,
    /// For point i of curve 2, the paired index on curve 1.
    pub pairs21: Vec<usize>,
    pub t: RigidTransform,
}

/// `p[i] = round(i · (m - 1) / (n - 1))`, a uniform index sampling.
fn uniform_sample(n: usize, m: usize) -> Vec<usize> {
    (0..n)
        .map(|i| (i as f64 * (m - 1) as f64 / (n - 1).max(1) as f64 + 0.5) as usize)
        .collect()
}

/// Update each pairing to the nearest point of `shape2` within a
/// ±`PAIR_WINDOW` window around the previous value.
fn find_pairs(shape1: &[Point2<f64>], shape2: &[Point2<f64>], pairs: &mut [usize]) {
    let len2 = shape2.len();
    for (i, j) in pairs.iter_mut().enumerate() {
        *j = (*j).min(len2 - 1);
        let mut dist = (shape1[i] - shape2[*j]).norm_squared();

        let lo = j.saturating_sub(PAIR_WINDOW - 1);
        let hi = (*j + PAIR_WINDOW).min(len2);
        for k in lo..hi {
            let d = (shape1[i] - shape2[k]).norm_squared();
            if d < dist {
                dist = d;
                *j = k;
            }
        }
    }
}

/// Refine an existing alignment of `shape2` along `shape1` until the
/// incremental transform becomes the identity.
///
/// The seed alignment may come from a coarser resampling of the same
/// curves; indices out of range are clamped before refinement.
pub fn shape_align_from(shape1: &Curve, shape2: &Curve, mut align: ShapeAlign) -> ShapeAlign {
    for _ in 0..MAX_REFINE_ITERS {
        let shape2t = align.t.apply_curve(shape2);
        find_pairs(shape1, &shape2t, &mut align.pairs12);
        find_pairs(&shape2t, shape1, &mut align.pairs21);

        let mut s1 = Vec::with_capacity(align.pairs12.len() + align.pairs21.len());
        let mut s2 = Vec::with_capacity(s1.capacity());
        for (i, &j) in align.pairs12.iter().enumerate() {
            s1.push(shape1[i]);
            s2.push(shape2t[j]);
        }
        for (i, &j) in align.pairs21.iter().enumerate() {
            s2.push(shape2t[i]);
            s1.push(shape1[j]);
        }

        let t = optimal_align(&s1, &s2);
        align.t = align.t.then(&t);
        if t.is_identity() {
            break;
        }
    }
    align
}

/// Optimal alignment of `shape2` along `shape1` from scratch.
///
/// The curves are expected to run in opposite directions along the
/// common boundary, as two abutting piece edges do; the seed therefore
/// matches endpoints crosswise.
pub fn shape_align(shape1: &Curve, shape2: &Curve) -> ShapeAlign {
    let mut pairs12 = uniform_sample(shape1.len(), shape2.len());
    let mut pairs21 = uniform_sample(shape2.len(), shape1.len());
    pairs12.reverse();
    pairs21.reverse();

    let s1 = vec![shape1[0], *shape1.last().unwrap()];
    let s2 = vec![*shape2.last().unwrap(), shape2[0]];
    let t = optimal_align(&s1, &s2);

    shape_align_from(
        shape1,
        shape2,
        ShapeAlign {
            pairs12,
            pairs21,
            t,
        },
    )
}

fn optimize_line_align(shape: &[Point2<f64>]) -> RigidTransform {
    let line: Curve = shape.iter().map(|p| Point2::new(p.x, 0.0)).collect();
    optimal_align(&line, shape)
}

/// Transform placing the curve along a line at `target_angle` to the
/// x axis, fitted by alternating projection.
pub fn line_align(shape: &Curve, target_angle: f64) -> RigidTransform {
    let chord = shape.last().unwrap() - shape[0];
    let mut transform = RigidTransform::rotation(angle_of(chord));

    for _ in 0..MAX_REFINE_ITERS {
        let s = transform.apply_curve(shape);
        let t = optimize_line_align(&s);
        transform = transform.then(&t);
        if t.is_identity() {
            break;
        }
    }

    transform.then(&RigidTransform::rotation(target_angle))
}

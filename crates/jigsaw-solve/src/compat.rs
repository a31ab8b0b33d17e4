//! Pairwise edge scoring at multiple resolutions.
//!
//! Every edge carries a ladder of progressively shorter resamplings of
//! its curve and colour signature. A pair is first aligned at the
//! coarsest rung; surviving pairs are re-aligned one rung finer by
//! rescaling the stored point pairings and resuming the alignment,
//! which converges in a couple of iterations instead of from scratch.

use jigsaw_core::{
    resample_scaled, resample_to, shape_align, shape_align_from, Curve, Edge, EdgeId, Hsl,
    PieceSet, ShapeAlign, SCORE_INF,
};

/// Per-channel compatibility scores of one edge pair; lower is better.
#[derive(Clone, Copy, Debug)]
pub struct Score {
    pub shape: f64,
    pub h: f64,
    pub s: f64,
    pub l: f64,
}

impl Score {
    pub fn disabled() -> Self {
        Self {
            shape: SCORE_INF,
            h: SCORE_INF,
            s: SCORE_INF,
            l: SCORE_INF,
        }
    }
}

/// Resolution ladder of one edge; rung 0 is the full resolution.
#[derive(Clone, Debug)]
pub struct ScaledEdge {
    pub id: EdgeId,
    pub levels: Vec<(Curve, Vec<Hsl>)>,
}

pub fn scale_edge(edge: &Edge, depth: usize) -> ScaledEdge {
    let mut levels = vec![(edge.shape.clone(), edge.color.clone())];
    for i in 1..depth {
        let scale = 1.0 - i as f64 / depth as f64;
        levels.push((
            resample_scaled(&edge.shape, scale),
            resample_scaled(&edge.color, scale),
        ));
    }
    ScaledEdge {
        id: edge.id,
        levels,
    }
}

/// Logical compatibility: different pieces, mating types, and the
/// flatness pattern of the neighbouring edges must agree (a border
/// edge can only continue along the border).
pub fn compatible_types(set: &PieceSet, e1: &Edge, e2: &Edge) -> bool {
    e1.piece != e2.piece
        && e1.ty != e2.ty
        && e1.ty == e2.ty.mate()
        && set.edge(e1.next).ty.is_flat() == set.edge(e2.prev).ty.is_flat()
        && set.edge(e1.prev).ty.is_flat() == set.edge(e2.next).ty.is_flat()
}

/// Distance of two hue values on the unit circle.
#[inline]
fn circle_dist(a: f64, b: f64) -> f64 {
    let d = (a - b).abs();
    d.min(1.0 - d)
}

fn shape_score(shape1: &[nalgebra::Point2<f64>], shape2: &[nalgebra::Point2<f64>], pairs: &[usize]) -> f64 {
    pairs
        .iter()
        .enumerate()
        .map(|(i, &j)| (shape1[i] - shape2[j]).norm_squared())
        .sum()
}

fn color_score(color1: &[Hsl], color2: &[Hsl], pairs: &[usize]) -> (f64, f64, f64) {
    let mut h = 0.0;
    let mut s = 0.0;
    let mut l = 0.0;
    for (i, &j) in pairs.iter().enumerate() {
        let c1 = color1[i];
        let c2 = color2[j];
        h += circle_dist(c1.h, c2.h);
        s += (c1.s - c2.s) * (c1.s - c2.s);
        l += (c1.l - c2.l) * (c1.l - c2.l);
    }
    (h, s, l)
}

/// Incremental scorer for one candidate pair, walking the resolution
/// ladder from coarse to fine.
pub struct PairScorer<'a> {
    edge1: &'a ScaledEdge,
    edge2: &'a ScaledEdge,
    align: Option<ShapeAlign>,
    /// Rung used by the next `recompute_score` call; counts down.
    level: usize,
}

impl<'a> PairScorer<'a> {
    pub fn new(edge1: &'a ScaledEdge, edge2: &'a ScaledEdge) -> Self {
        debug_assert_eq!(edge1.levels.len(), edge2.levels.len());
        Self {
            edge1,
            edge2,
            align: None,
            level: edge1.levels.len(),
        }
    }

    /// Map the pairings of the previous (coarser) rung onto the sizes
    /// of the given rung.
    fn rescale_align(&self, mut align: ShapeAlign, to: usize) -> ShapeAlign {
        let from = to + 1;
        let len1b = self.edge1.levels[to].0.len();
        let len1a = self.edge1.levels[from].0.len();
        let len2b = self.edge2.levels[to].0.len();
        let len2a = self.edge2.levels[from].0.len();

        let r2 = (len2b - 1) as f64 / (len2a - 1) as f64;
        for j in &mut align.pairs12 {
            *j = (*j as f64 * r2) as usize;
        }
        let r1 = (len1b - 1) as f64 / (len1a - 1) as f64;
        for j in &mut align.pairs21 {
            *j = (*j as f64 * r1) as usize;
        }
        align.pairs12 = resample_to(&align.pairs12, len1b);
        align.pairs21 = resample_to(&align.pairs21, len2b);
        align
    }

    /// Score the pair one rung finer than the previous call.
    pub fn recompute_score(&mut self) -> Score {
        debug_assert!(self.level > 0, "resolution ladder exhausted");
        let level = self.level - 1;
        let (shape1, color1) = &self.edge1.levels[level];
        let (shape2, color2) = &self.edge2.levels[level];

        let align = match self.align.take() {
            None => shape_align(shape1, shape2),
            Some(prev) => {
                let seeded = self.rescale_align(prev, level);
                shape_align_from(shape1, shape2, seeded)
            }
        };

        let shape2t = align.t.apply_curve(shape2);
        let total = (align.pairs12.len() + align.pairs21.len()) as f64;

        let shape = (shape_score(shape1, &shape2t, &align.pairs12)
            + shape_score(&shape2t, shape1, &align.pairs21))
            / total;
        let (h1, s1, l1) = color_score(color1, color2, &align.pairs12);
        let (h2, s2, l2) = color_score(color2, color1, &align.pairs21);

        self.align = Some(align);
        self.level = level;

        Score {
            shape,
            h: (h1 + h2) / total,
            s: (s1 + s2) / total,
            l: (l1 + l2) / total,
        }
    }
}

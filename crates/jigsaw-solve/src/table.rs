//! The edge-compatibility table.
//!
//! Row e holds one [`Score`] per potential partner of edge e plus the
//! per-channel minima over the row; the public query normalizes each
//! channel against the row minimum, so a score of 0 means "this is the
//! best partner this edge has seen in every channel".

use rayon::prelude::*;

use jigsaw_core::{EdgeId, PieceSet};

use crate::compat::{compatible_types, scale_edge, PairScorer, ScaledEdge, Score};
use crate::params::CompatParams;

/// One row: scores of every partner for a fixed edge.
#[derive(Clone, Debug)]
pub struct EdgeScores {
    edge: EdgeId,
    best: Score,
    scores: Vec<Score>,
}

impl EdgeScores {
    fn new(edge: EdgeId, num_edges: usize) -> Self {
        Self {
            edge,
            best: Score::disabled(),
            scores: vec![Score::disabled(); num_edges],
        }
    }

    /// Multi-resolution fill of the row.
    ///
    /// All compatible partners are scored at the coarsest rung; after
    /// every rung the candidates are sorted by shape score and only a
    /// `(K / base_size)^(-1/depth)` fraction survives to the next,
    /// finer rung. Pruned partners keep their last (coarser) score.
    fn init(&mut self, set: &PieceSet, scaled: &[ScaledEdge], params: &CompatParams) {
        let me = set.edge(self.edge);

        struct Candidate<'a> {
            partner: EdgeId,
            scorer: PairScorer<'a>,
            score: Score,
        }

        let mut candidates: Vec<Candidate> = scaled
            .iter()
            .filter(|other| compatible_types(set, me, set.edge(other.id)))
            .map(|other| Candidate {
                partner: other.id,
                scorer: PairScorer::new(&scaled[self.edge.0], other),
                score: Score::disabled(),
            })
            .collect();

        let num = candidates.len();
        if num > 0 {
            let keep = (num as f64 / params.base_size as f64)
                .powf(-1.0 / params.resolution_depth as f64);
            let mut k = num;
            for _ in 0..params.resolution_depth {
                for cand in candidates[..k].iter_mut() {
                    cand.score = cand.scorer.recompute_score();
                }
                candidates[..k].sort_by(|a, b| a.score.shape.total_cmp(&b.score.shape));
                k = ((k as f64 * keep + 0.5) as usize).min(num);
            }
            for cand in candidates {
                self.scores[cand.partner.0] = cand.score;
            }
        }
        self.recompute_best();
    }

    fn recompute_best(&mut self) {
        let mut best = Score::disabled();
        for s in &self.scores {
            best.shape = best.shape.min(s.shape);
            best.h = best.h.min(s.h);
            best.s = best.s.min(s.s);
            best.l = best.l.min(s.l);
        }
        self.best = best;
    }

    fn disable(&mut self, edge: EdgeId) {
        self.scores[edge.0] = Score::disabled();
        self.recompute_best();
    }

    /// Channel-weighted score of `other` relative to the row minima;
    /// 0 is a perfect row-best match in every weighted channel.
    fn score_to(&self, other: EdgeId, params: &CompatParams) -> f64 {
        #[inline]
        fn term(best: f64, score: f64) -> f64 {
            if score > 0.0 {
                1.0 - best / score
            } else {
                0.0
            }
        }

        let s = &self.scores[other.0];
        let mut total = 0.0;
        if params.shape_weight != 0.0 {
            total += params.shape_weight * term(self.best.shape, s.shape);
        }
        if params.hue_weight != 0.0 {
            total += params.hue_weight * term(self.best.h, s.h);
        }
        if params.saturation_weight != 0.0 {
            total += params.saturation_weight * term(self.best.s, s.s);
        }
        if params.luminosity_weight != 0.0 {
            total += params.luminosity_weight * term(self.best.l, s.l);
        }
        total
    }
}

/// Symmetric compatibility lookup over all edge pairs.
pub struct CompatibilityTable {
    rows: Vec<EdgeScores>,
    params: CompatParams,
}

impl CompatibilityTable {
    /// Score every row, one parallel task per edge. The resolution
    /// ladders are shared read-only scratch and dropped afterwards.
    pub fn build(set: &PieceSet, params: &CompatParams) -> Self {
        let scaled: Vec<ScaledEdge> = set
            .edges()
            .iter()
            .map(|e| scale_edge(e, params.resolution_depth))
            .collect();

        let rows: Vec<EdgeScores> = (0..set.num_edges())
            .into_par_iter()
            .map(|i| {
                let mut row = EdgeScores::new(EdgeId(i), set.num_edges());
                row.init(set, &scaled, params);
                row
            })
            .collect();

        Self {
            rows,
            params: params.clone(),
        }
    }

    /// Combined directional scores of the pair; disabled pairs come
    /// out large but finite.
    pub fn score(&self, edge1: EdgeId, edge2: EdgeId) -> f64 {
        self.rows[edge1.0].score_to(edge2, &self.params)
            + self.rows[edge2.0].score_to(edge1, &self.params)
    }

    /// Remove an edge from consideration as anyone's best partner.
    pub fn disable(&mut self, edge: EdgeId) {
        self.rows
            .par_iter_mut()
            .for_each(|row| row.disable(edge));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jigsaw_core::{Curve, EdgeType, Hsl, RawEdge, RawPiece};
    use nalgebra::Point2;
    use std::path::PathBuf;

    /// Three single-tab pieces: edge 1 (indent) exactly mates edge 5
    /// (outdent); edge 9 is a differently-shaped outdent that fits
    /// only approximately.
    fn build_pair_table() -> (PieceSet, CompatibilityTable) {
        let n = 48;
        let bump: Curve = (0..n)
            .map(|i| {
                let x = i as f64;
                Point2::new(x, (x * 0.25).sin() * 5.0)
            })
            .collect();
        let mut reversed = bump.clone();
        reversed.reverse();
        let other: Curve = (0..n)
            .map(|i| {
                let x = i as f64;
                Point2::new(x, (x * 0.4).cos() * 7.0)
            })
            .collect();
        let line: Curve = (0..40).map(|i| Point2::new(i as f64, 0.0)).collect();

        let edge = |ty: EdgeType, shape: &Curve| RawEdge {
            ty,
            shape: shape.clone(),
            color: vec![Hsl { h: 0.1, s: 0.4, l: 0.6 }; shape.len()],
        };
        let tab_piece = |name: &str, ty: EdgeType, shape: &Curve| RawPiece {
            image: PathBuf::from(name),
            center: Point2::new(0, 0),
            edges: [
                edge(EdgeType::Flat, &line),
                edge(ty, shape),
                edge(EdgeType::Flat, &line),
                edge(EdgeType::Flat, &line),
            ],
        };

        let set = PieceSet::assemble(vec![
            tab_piece("a.png", EdgeType::Indent, &bump),
            tab_piece("b.png", EdgeType::Outdent, &reversed),
            tab_piece("c.png", EdgeType::Outdent, &other),
        ]);
        let table = CompatibilityTable::build(&set, &CompatParams::default());
        (set, table)
    }

    #[test]
    fn self_pairs_are_never_preferable() {
        let (set, table) = build_pair_table();
        // Edges 1 and 5 are the non-flat ones with real partners;
        // their self pair must sit at the row ceiling.
        for e in [EdgeId(1), EdgeId(5)] {
            assert!(table.score(e, e) > 1.9);
            for f in set.edges() {
                assert!(
                    table.score(e, e) >= table.score(e, f.id),
                    "self pair beats ({e:?}, {:?})",
                    f.id
                );
            }
        }
    }

    #[test]
    fn mated_edges_score_best() {
        let (_, table) = build_pair_table();
        let mated = table.score(EdgeId(1), EdgeId(5));
        assert!(mated < 1e-6, "mated score {mated}");
        assert!(table.score(EdgeId(1), EdgeId(4)) > mated);
    }

    #[test]
    fn disable_is_idempotent() {
        let (_, mut table) = build_pair_table();
        table.disable(EdgeId(5));
        let after_once: Vec<f64> = (0..12)
            .map(|i| table.score(EdgeId(1), EdgeId(i)))
            .collect();
        table.disable(EdgeId(5));
        let after_twice: Vec<f64> = (0..12)
            .map(|i| table.score(EdgeId(1), EdgeId(i)))
            .collect();
        assert_eq!(after_once, after_twice);
    }

    #[test]
    fn disabling_the_best_partner_raises_its_score() {
        let (_, mut table) = build_pair_table();
        let before = table.score(EdgeId(1), EdgeId(5));
        table.disable(EdgeId(5));
        let after = table.score(EdgeId(1), EdgeId(5));
        assert!(after > before);
    }
}

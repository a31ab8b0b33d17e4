//! Piece and edge records plus the central store that owns them.
//!
//! Pieces and edges are identified by dense indices into [`PieceSet`];
//! the cyclic prev/next structure of a piece's four edges is expressed
//! through ids, never through owning references.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::geometry::Curve;

/// Large finite sentinel used for disabled or unreachable scores.
///
/// Kept finite so ratio queries of the form `1 - best / score` stay
/// well-defined when an entire score row is disabled.
pub const SCORE_INF: f64 = 1e20;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PieceId(pub usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EdgeId(pub usize);

/// Logical edge class: the sign is chosen so matching edges satisfy
/// `a.ty == b.ty.mate()`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeType {
    Outdent,
    Flat,
    Indent,
}

impl EdgeType {
    pub fn sign(self) -> i8 {
        match self {
            EdgeType::Outdent => -1,
            EdgeType::Flat => 0,
            EdgeType::Indent => 1,
        }
    }

    /// The only type this one can be matched with.
    pub fn mate(self) -> EdgeType {
        match self {
            EdgeType::Outdent => EdgeType::Indent,
            EdgeType::Flat => EdgeType::Flat,
            EdgeType::Indent => EdgeType::Outdent,
        }
    }

    pub fn is_flat(self) -> bool {
        self == EdgeType::Flat
    }
}

/// Colour sample in HSL space, all channels in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Hsl {
    pub h: f64,
    pub s: f64,
    pub l: f64,
}

/// One side of a piece. Immutable after extraction.
#[derive(Clone, Debug)]
pub struct Edge {
    pub id: EdgeId,
    pub piece: PieceId,
    /// Previous edge of the same piece in clockwise order.
    pub prev: EdgeId,
    /// Next edge of the same piece in clockwise order.
    pub next: EdgeId,
    pub ty: EdgeType,
    /// Sample points relative to the piece centre.
    pub shape: Curve,
    /// Colour sampled just inside the outline, one entry per shape point.
    pub color: Vec<Hsl>,
}

/// One puzzle piece. Immutable after extraction.
#[derive(Clone, Debug)]
pub struct Piece {
    pub id: PieceId,
    /// Front-scan image the piece was extracted from.
    pub image: PathBuf,
    /// Pixel centre on the source image.
    pub center: Point2<i32>,
    /// The four edges in clockwise order.
    pub edges: [EdgeId; 4],
}

/// Per-edge record produced by the extractor before ids are assigned.
#[derive(Clone, Debug)]
pub struct RawEdge {
    pub ty: EdgeType,
    pub shape: Curve,
    pub color: Vec<Hsl>,
}

/// Per-piece record produced by the extractor before ids are assigned.
#[derive(Clone, Debug)]
pub struct RawPiece {
    pub image: PathBuf,
    pub center: Point2<i32>,
    /// Edges in clockwise order; `edges[i]` is followed by `edges[(i+1)%4]`.
    pub edges: [RawEdge; 4],
}

/// Central store owning every piece and edge of a puzzle.
#[derive(Clone, Debug, Default)]
pub struct PieceSet {
    pieces: Vec<Piece>,
    edges: Vec<Edge>,
}

impl PieceSet {
    /// Assign dense ids to raw extraction results, in input order.
    ///
    /// Ordering is deterministic no matter how the parallel extraction
    /// tasks interleaved: piece k gets id k and edge ids 4k..4k+3.
    pub fn assemble(raw: Vec<RawPiece>) -> PieceSet {
        let mut set = PieceSet::default();
        for rp in raw {
            set.push(rp);
        }
        set
    }

    fn push(&mut self, raw: RawPiece) {
        let piece_id = PieceId(self.pieces.len());
        let base = self.edges.len();
        let ids = [EdgeId(base), EdgeId(base + 1), EdgeId(base + 2), EdgeId(base + 3)];

        let [e0, e1, e2, e3] = raw.edges;
        for (i, re) in [e0, e1, e2, e3].into_iter().enumerate() {
            self.edges.push(Edge {
                id: ids[i],
                piece: piece_id,
                prev: ids[(i + 3) % 4],
                next: ids[(i + 1) % 4],
                ty: re.ty,
                shape: re.shape,
                color: re.color,
            });
        }
        self.pieces.push(Piece {
            id: piece_id,
            image: raw.image,
            center: raw.center,
            edges: ids,
        });
    }

    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn num_pieces(&self) -> usize {
        self.pieces.len()
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    #[inline]
    pub fn piece(&self, id: PieceId) -> &Piece {
        &self.pieces[id.0]
    }

    #[inline]
    pub fn edge(&self, id: EdgeId) -> &Edge {
        &self.edges[id.0]
    }

    /// Follow `next` pointers `steps` times.
    pub fn advance(&self, id: EdgeId, steps: usize) -> EdgeId {
        let mut e = id;
        for _ in 0..steps {
            e = self.edge(e).next;
        }
        e
    }

    /// Follow `prev` pointers `steps` times.
    pub fn retreat(&self, id: EdgeId, steps: usize) -> EdgeId {
        let mut e = id;
        for _ in 0..steps {
            e = self.edge(e).prev;
        }
        e
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_edge(ty: EdgeType) -> RawEdge {
        RawEdge {
            ty,
            shape: vec![Point2::new(0.0, 0.0), Point2::new(1.0, 0.0)],
            color: vec![Hsl { h: 0.0, s: 0.0, l: 0.5 }; 2],
        }
    }

    fn raw_piece() -> RawPiece {
        RawPiece {
            image: PathBuf::from("front.png"),
            center: Point2::new(10, 20),
            edges: [
                raw_edge(EdgeType::Flat),
                raw_edge(EdgeType::Indent),
                raw_edge(EdgeType::Outdent),
                raw_edge(EdgeType::Indent),
            ],
        }
    }

    #[test]
    fn assemble_wires_cyclic_edges() {
        let set = PieceSet::assemble(vec![raw_piece(), raw_piece()]);
        assert_eq!(set.num_pieces(), 2);
        assert_eq!(set.num_edges(), 8);

        for edge in set.edges() {
            assert_eq!(set.edge(edge.prev).next, edge.id);
            assert_eq!(set.edge(edge.next).prev, edge.id);
            assert_eq!(set.edge(edge.next).piece, edge.piece);
        }
        for (k, piece) in set.pieces().iter().enumerate() {
            assert_eq!(piece.id, PieceId(k));
            assert_eq!(piece.edges[0], EdgeId(4 * k));
        }
    }

    #[test]
    fn advance_and_retreat_are_inverse() {
        let set = PieceSet::assemble(vec![raw_piece()]);
        let e = EdgeId(1);
        assert_eq!(set.advance(e, 4), e);
        assert_eq!(set.retreat(set.advance(e, 3), 3), e);
    }

    #[test]
    fn edge_type_mates() {
        assert_eq!(EdgeType::Indent.mate(), EdgeType::Outdent);
        assert_eq!(EdgeType::Outdent.mate(), EdgeType::Indent);
        assert_eq!(EdgeType::Flat.mate(), EdgeType::Flat);
        assert_eq!(EdgeType::Indent.sign(), -EdgeType::Outdent.sign());
    }
}

//! Frame assembly: find the cheapest cyclic chain of border pieces
//! that closes into a rectangle, and seed the puzzle layout with it.

use log::{debug, info};
use nalgebra::Point2;

use jigsaw_core::{EdgeId, PieceId, PieceSet, DIRECTIONS};

use crate::murty::KBestMatchings;
use crate::table::CompatibilityTable;
use crate::{PuzzleLayout, SolveError};

/// The two non-flat edges of a frame piece that continue the border:
/// `out` follows a flat edge, `in` precedes one.
#[derive(Clone, Copy, Debug)]
struct BorderEdges {
    out: EdgeId,
    inc: EdgeId,
}

pub struct FrameSolver<'a> {
    table: &'a CompatibilityTable,
    set: &'a PieceSet,
    frame: Vec<PieceId>,
    /// Total piece count of the puzzle, frame and interior.
    num_pieces: usize,
}

impl<'a> FrameSolver<'a> {
    pub fn new(
        table: &'a CompatibilityTable,
        set: &'a PieceSet,
        frame: Vec<PieceId>,
        num_pieces: usize,
    ) -> Self {
        Self {
            table,
            set,
            frame,
            num_pieces,
        }
    }

    fn border_edges(&self, piece: PieceId) -> Option<BorderEdges> {
        let mut out = None;
        let mut inc = None;
        for &edge_id in &self.set.piece(piece).edges {
            let edge = self.set.edge(edge_id);
            if edge.ty.is_flat() {
                continue;
            }
            if self.set.edge(edge.prev).ty.is_flat() {
                out = Some(edge_id);
            }
            if self.set.edge(edge.next).ty.is_flat() {
                inc = Some(edge_id);
            }
        }
        Some(BorderEdges {
            out: out?,
            inc: inc?,
        })
    }

    /// Corner pieces carry two consecutive flat edges, so their border
    /// edges are adjacent.
    fn is_corner(&self, piece: PieceId) -> bool {
        self.border_edges(piece)
            .map(|b| self.set.edge(b.out).next == b.inc)
            .unwrap_or(false)
    }

    fn corner_positions(&self, chain: &[PieceId]) -> Vec<usize> {
        chain
            .iter()
            .enumerate()
            .filter(|(_, &p)| self.is_corner(p))
            .map(|(i, _)| i)
            .collect()
    }

    /// `(width, height)` of the rectangle a frame chain describes, or
    /// `None` when the corner spacing does not close one. The first
    /// inter-corner leg is laid out eastwards, so it fixes the width.
    fn dimensions(&self, chain: &[PieceId]) -> Option<(usize, usize)> {
        let corners = self.corner_positions(chain);
        if corners.len() != 4 {
            return None;
        }
        let east = corners[1] - corners[0];
        let south = corners[2] - corners[1];
        if corners[3] - corners[2] != east {
            return None;
        }
        if corners[0] + chain.len() - corners[3] != south {
            return None;
        }
        Some((east + 1, south + 1))
    }

    fn is_valid_frame(&self, chain: &[PieceId]) -> bool {
        if chain.len() != self.frame.len() {
            return false;
        }
        match self.dimensions(chain) {
            Some((w, h)) => w * h == self.num_pieces,
            None => false,
        }
    }

    /// The cycle of the permutation containing index 0, as pieces.
    fn trace_first_cycle(&self, perm: &[usize]) -> Vec<PieceId> {
        let mut chain = Vec::new();
        let mut i = 0;
        loop {
            chain.push(self.frame[i]);
            i = perm[i];
            if i == 0 {
                break;
            }
        }
        chain
    }

    /// Place a closed frame chain on the perimeter of a fresh layout,
    /// rotating every piece so its flat side faces outwards.
    fn build_layout(&self, chain: &[PieceId]) -> PuzzleLayout {
        let (cols, rows) = self.dimensions(chain).expect("validated chain");
        info!("frame configuration: {cols}x{rows}");
        let mut layout = PuzzleLayout::new(cols, rows);

        let first = self.corner_positions(chain)[0];
        let mut pos = Point2::new(0, 0);
        let mut dir = 3usize;

        for i in 0..chain.len() {
            let piece = chain[(first + i) % chain.len()];
            if self.is_corner(piece) {
                dir = (dir + 1) % 4;
            }
            let border = self.border_edges(piece).expect("frame piece");
            let north = self.set.retreat(border.out, 1 + dir);
            *layout.at_mut(pos) = Some(north);
            pos += DIRECTIONS[dir];
        }
        layout
    }

    /// Enumerate matchings of `out` edges to `in` edges in cost order
    /// until one closes into a valid rectangle.
    pub fn solve(&self) -> Result<PuzzleLayout, SolveError> {
        let borders: Vec<BorderEdges> = self
            .frame
            .iter()
            .map(|&p| self.border_edges(p))
            .collect::<Option<_>>()
            .ok_or(SolveError::MalformedFramePiece)?;

        let n = borders.len();
        let mut costs = vec![vec![0.0; n]; n];
        for i in 0..n {
            for j in 0..n {
                costs[i][j] = self.table.score(borders[i].out, borders[j].inc);
            }
        }

        let mut generator = KBestMatchings::new(costs);
        let mut step = 0usize;
        loop {
            let (cost, perm) = generator
                .next_matching()
                .ok_or(SolveError::FrameInfeasible)?;
            step += 1;
            debug!("frame candidate {step}: matching cost {cost:.9}");

            let chain = self.trace_first_cycle(&perm);
            if self.is_valid_frame(&chain) {
                return Ok(self.build_layout(&chain));
            }
        }
    }
}

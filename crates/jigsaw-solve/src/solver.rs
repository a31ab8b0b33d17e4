//! Top-level combinatorial solve: table build, frame, interior.

use log::info;

use jigsaw_core::{PieceId, PieceSet};

use crate::frame::FrameSolver;
use crate::interior::InteriorSolver;
use crate::table::CompatibilityTable;
use crate::{CompatParams, PuzzleLayout, SolveError};

fn is_frame_piece(set: &PieceSet, piece: PieceId) -> bool {
    set.piece(piece)
        .edges
        .iter()
        .any(|&e| set.edge(e).ty.is_flat())
}

/// Assemble the extracted pieces into a complete rectangular layout.
pub fn assemble_puzzle(set: &PieceSet, params: &CompatParams) -> Result<PuzzleLayout, SolveError> {
    info!(
        "computing compatibility table for {} edges",
        set.num_edges()
    );
    let mut table = CompatibilityTable::build(set, params);

    let (frame, interior): (Vec<PieceId>, Vec<PieceId>) = set
        .pieces()
        .iter()
        .map(|p| p.id)
        .partition(|&p| is_frame_piece(set, p));
    info!(
        "{} frame piece(s), {} interior piece(s)",
        frame.len(),
        interior.len()
    );

    info!("assembling the frame");
    let num_pieces = set.num_pieces();
    let frame_layout = FrameSolver::new(&table, set, frame, num_pieces).solve()?;

    info!("assembling the interior");
    InteriorSolver::new(&mut table, set, frame_layout, interior).solve()
}

//! Greedy interior filling of a frame-seeded layout.
//!
//! Every round scans for the open cells with the most placed
//! neighbours, tries every remaining piece in all four rotations
//! there, and commits the cheapest fit. The edges consumed by the
//! placement are disabled in the compatibility table so they stop
//! acting as anyone's best partner.

use log::debug;
use nalgebra::Point2;

use jigsaw_core::{EdgeId, PieceId, PieceSet, DIRECTIONS};

use crate::table::CompatibilityTable;
use crate::{PuzzleLayout, SolveError};

pub struct InteriorSolver<'a> {
    table: &'a mut CompatibilityTable,
    set: &'a PieceSet,
    layout: PuzzleLayout,
    pool: Vec<PieceId>,
}

impl<'a> InteriorSolver<'a> {
    pub fn new(
        table: &'a mut CompatibilityTable,
        set: &'a PieceSet,
        layout: PuzzleLayout,
        pool: Vec<PieceId>,
    ) -> Self {
        Self {
            table,
            set,
            layout,
            pool,
        }
    }

    /// The already-placed edges facing the given open cell, indexed by
    /// direction.
    fn facing_edges(&self, pos: Point2<i32>) -> [Option<EdgeId>; 4] {
        std::array::from_fn(|d| {
            let neighbour = pos + DIRECTIONS[d];
            if !self.layout.in_bounds(neighbour) {
                return None;
            }
            let north = (*self.layout.at(neighbour))?;
            // Rotate from the neighbour's north edge to the edge that
            // faces back towards `pos`.
            Some(self.set.advance(self.set.edge(north).prev, d))
        })
    }

    /// Total score of placing a piece with `north` facing up, against
    /// all already-placed neighbours of the cell.
    fn placement_score(&self, facing: &[Option<EdgeId>; 4], north: EdgeId) -> f64 {
        let mut candidate = self.set.edge(north).next;
        let mut score = 0.0;
        for placed in facing {
            if let Some(edge) = placed {
                score += self.table.score(*edge, candidate);
            }
            candidate = self.set.edge(candidate).next;
        }
        score
    }

    /// Open cells with the maximal number of placed neighbours, never
    /// fewer than `floor`.
    fn open_positions(&self, floor: usize) -> Vec<Point2<i32>> {
        let mut max_cardinality = floor;
        let mut positions = Vec::new();
        for pos in self.layout.coords() {
            if self.layout.at(pos).is_some() {
                continue;
            }
            let cardinality = self
                .facing_edges(pos)
                .iter()
                .filter(|e| e.is_some())
                .count();
            if cardinality > max_cardinality {
                max_cardinality = cardinality;
                positions.clear();
            }
            if cardinality == max_cardinality {
                positions.push(pos);
            }
        }
        positions
    }

    /// Cheapest (cell, piece, rotation) among the candidate cells.
    fn best_choice(&self) -> Option<(Point2<i32>, EdgeId)> {
        // Cells with fewer than two constraining neighbours are only
        // considered when nothing better exists anywhere.
        let mut positions = self.open_positions(2);
        if positions.is_empty() {
            positions = self.open_positions(1);
        }

        let mut best: Option<(f64, Point2<i32>, EdgeId)> = None;
        for &pos in &positions {
            let facing = self.facing_edges(pos);
            for &piece in &self.pool {
                for &north in &self.set.piece(piece).edges {
                    let score = self.placement_score(&facing, north);
                    if best.map(|(s, _, _)| score < s).unwrap_or(true) {
                        best = Some((score, pos, north));
                    }
                }
            }
        }
        best.map(|(_, pos, north)| (pos, north))
    }

    fn place(&mut self, pos: Point2<i32>, north: EdgeId) {
        *self.layout.at_mut(pos) = Some(north);
        let piece = self.set.edge(north).piece;
        self.pool.retain(|&p| p != piece);

        // Both sides of every new adjacency are consumed.
        let facing = self.facing_edges(pos);
        let mut candidate = self.set.edge(north).next;
        for placed in facing {
            if let Some(edge) = placed {
                self.table.disable(edge);
                self.table.disable(candidate);
            }
            candidate = self.set.edge(candidate).next;
        }
    }

    /// Place every pooled piece; the final layout has no open cells.
    pub fn solve(mut self) -> Result<PuzzleLayout, SolveError> {
        while !self.pool.is_empty() {
            let (pos, north) = self.best_choice().ok_or(SolveError::NoPlaceablePosition)?;
            debug!(
                "placing piece {:?} at ({}, {})",
                self.set.edge(north).piece,
                pos.x,
                pos.y
            );
            self.place(pos, north);
        }
        Ok(self.layout)
    }
}

//! Enumeration of perfect matchings in non-decreasing cost order
//! (Murty's algorithm).
//!
//! A priority queue holds restricted assignment problems, each with a
//! set of forced pairs and a set of forbidden pairs. Popping the
//! cheapest solved problem yields the next matching; its children
//! re-enter the queue with one additional constraint each.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::matching::{assignment_cost, min_cost_matching};

/// Cost used to mask out rows/columns when enforcing constraints.
/// Solutions that had to use a masked edge surface with this cost and
/// are never preferred over finite ones.
pub const RESTRICTED_INF: f64 = 1e7;

#[derive(Clone, Debug)]
struct RestrictedSolution {
    cost: f64,
    perm: Vec<usize>,
    forced: Vec<(usize, usize)>,
    forbidden: Vec<(usize, usize)>,
}

impl PartialEq for RestrictedSolution {
    fn eq(&self, other: &Self) -> bool {
        self.cost == other.cost
    }
}
impl Eq for RestrictedSolution {}
impl PartialOrd for RestrictedSolution {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for RestrictedSolution {
    // Reversed: the binary max-heap must pop the cheapest solution.
    fn cmp(&self, other: &Self) -> Ordering {
        other.cost.total_cmp(&self.cost)
    }
}

pub struct KBestMatchings {
    size: usize,
    costs: Vec<Vec<f64>>,
    queue: BinaryHeap<RestrictedSolution>,
}

impl KBestMatchings {
    /// Start the enumeration for the given cost matrix; the
    /// unconstrained optimum seeds the queue.
    pub fn new(costs: Vec<Vec<f64>>) -> Self {
        let size = costs.len();
        let mut this = Self {
            size,
            costs,
            queue: BinaryHeap::new(),
        };
        let root = this.solve(Vec::new(), Vec::new());
        this.queue.push(root);
        this
    }

    /// Solve one restricted problem. Forced pairs are enforced by
    /// masking their whole row and column and restoring the single
    /// allowed cell; forbidden pairs are masked directly.
    fn solve(
        &self,
        forced: Vec<(usize, usize)>,
        forbidden: Vec<(usize, usize)>,
    ) -> RestrictedSolution {
        let mut masked = self.costs.clone();
        for &(a, b) in &forced {
            for k in 0..self.size {
                masked[a][k] = RESTRICTED_INF;
                masked[k][b] = RESTRICTED_INF;
            }
            masked[a][b] = self.costs[a][b];
        }
        for &(a, b) in &forbidden {
            masked[a][b] = RESTRICTED_INF;
        }

        let (perm, cost) = match min_cost_matching(&masked) {
            Some(perm) => {
                let used_masked = perm
                    .iter()
                    .enumerate()
                    .any(|(i, &j)| masked[i][j] >= RESTRICTED_INF / 2.0);
                let cost = if used_masked {
                    RESTRICTED_INF
                } else {
                    assignment_cost(&self.costs, &perm)
                };
                (perm, cost)
            }
            None => (Vec::new(), RESTRICTED_INF),
        };

        RestrictedSolution {
            cost,
            perm,
            forced,
            forbidden,
        }
    }

    /// The next matching in cost order, or `None` once only masked or
    /// infeasible solutions remain.
    pub fn next_matching(&mut self) -> Option<(f64, Vec<usize>)> {
        let mut best = self.queue.pop()?;
        if best.cost >= RESTRICTED_INF || best.perm.is_empty() {
            return None;
        }

        // Children: forbid (i, perm[i]) while forcing all earlier
        // assignments of the popped solution.
        for i in 0..self.size.saturating_sub(1) {
            best.forbidden.push((i, best.perm[i]));
            let child = self.solve(best.forced.clone(), best.forbidden.clone());
            self.queue.push(child);
            best.forbidden.pop();
            best.forced.push((i, best.perm[i]));
        }

        Some((best.cost, best.perm))
    }
}

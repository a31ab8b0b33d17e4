//! Min-cost perfect matching on a dense bipartite cost matrix.
//!
//! Successive-shortest-paths min-cost max-flow: a super source feeds
//! every left vertex, every right vertex drains into a super sink, and
//! Dijkstra runs on reduced costs that are re-potentialized after each
//! augmentation so all residual weights stay non-negative.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

const DINF: f64 = 1e50;
const EPS: f64 = 1e-6;

#[derive(Clone, Debug)]
struct FlowEdge {
    to: usize,
    cap: i64,
    /// Index of the reverse edge in `adj[to]`.
    back: usize,
    cost: f64,
}

struct QueueEntry {
    dist: f64,
    vertex: usize,
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.dist == other.dist && self.vertex == other.vertex
    }
}
impl Eq for QueueEntry {}
impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for QueueEntry {
    // Reversed so the max-heap pops the smallest distance.
    fn cmp(&self, other: &Self) -> Ordering {
        other.dist.total_cmp(&self.dist)
    }
}

struct MinCostMaxFlow {
    adj: Vec<Vec<FlowEdge>>,
    dist: Vec<f64>,
    /// Index in `adj[v]` of the reverse edge of the shortest-path edge
    /// into v.
    from: Vec<usize>,
    /// Bottleneck capacity deliverable to v.
    push: Vec<i64>,
}

impl MinCostMaxFlow {
    fn new(num_vertices: usize) -> Self {
        Self {
            adj: vec![Vec::new(); num_vertices],
            dist: vec![DINF; num_vertices],
            from: vec![0; num_vertices],
            push: vec![0; num_vertices],
        }
    }

    fn add_edge(&mut self, src: usize, dst: usize, cap: i64, cost: f64) {
        let forward = FlowEdge {
            to: dst,
            cap,
            back: self.adj[dst].len(),
            cost,
        };
        let backward = FlowEdge {
            to: src,
            cap: 0,
            back: self.adj[src].len(),
            cost: -cost,
        };
        self.adj[src].push(forward);
        self.adj[dst].push(backward);
    }

    fn dijkstra(&mut self, src: usize, dst: usize) -> bool {
        self.dist.fill(DINF);
        self.dist[src] = 0.0;
        self.from[src] = usize::MAX;
        self.push[src] = i64::MAX;

        let mut queue = BinaryHeap::new();
        queue.push(QueueEntry {
            dist: 0.0,
            vertex: src,
        });

        while let Some(QueueEntry { dist, vertex }) = queue.pop() {
            if (dist - self.dist[vertex]).abs() > EPS {
                continue;
            }
            for i in 0..self.adj[vertex].len() {
                let edge = self.adj[vertex][i].clone();
                if edge.cap > 0 && self.dist[edge.to] > self.dist[vertex] + edge.cost + EPS {
                    self.dist[edge.to] = self.dist[vertex] + edge.cost;
                    self.from[edge.to] = edge.back;
                    self.push[edge.to] = self.push[vertex].min(edge.cap);
                    queue.push(QueueEntry {
                        dist: self.dist[edge.to],
                        vertex: edge.to,
                    });
                }
            }
        }
        (self.dist[dst] - DINF).abs() > EPS
    }

    /// Returns the achieved flow.
    fn run(&mut self, src: usize, dst: usize) -> i64 {
        let mut flow = 0;
        while self.dijkstra(src, dst) {
            // Re-potentialize so residual costs stay non-negative.
            for v in 0..self.adj.len() {
                for i in 0..self.adj[v].len() {
                    let to = self.adj[v][i].to;
                    self.adj[v][i].cost += self.dist[v] - self.dist[to];
                }
            }

            // Augment along the recorded path.
            let amount = self.push[dst];
            let mut v = dst;
            while v != src {
                let back_idx = self.from[v];
                self.adj[v][back_idx].cap += amount;
                let forward_idx = self.adj[v][back_idx].back;
                v = self.adj[v][back_idx].to;
                self.adj[v][forward_idx].cap -= amount;
            }
            flow += amount;
        }
        flow
    }
}

/// Minimum-cost perfect matching of an `n x n` cost matrix.
///
/// Costs must be non-negative. Returns `perm` with `perm[i]` the right
/// vertex assigned to left vertex i, or `None` when no perfect
/// matching saturates (only possible with infinite-cost edges pruned
/// upstream).
pub fn min_cost_matching(costs: &[Vec<f64>]) -> Option<Vec<usize>> {
    let n = costs.len();
    if n == 0 {
        return Some(Vec::new());
    }

    let source = 2 * n;
    let sink = 2 * n + 1;
    let mut flow = MinCostMaxFlow::new(2 * n + 2);
    for (u, row) in costs.iter().enumerate() {
        debug_assert_eq!(row.len(), n);
        for (v, &cost) in row.iter().enumerate() {
            debug_assert!(cost >= 0.0);
            flow.add_edge(u, n + v, 1, cost);
        }
    }
    for i in 0..n {
        flow.add_edge(source, i, 1, 0.0);
        flow.add_edge(n + i, sink, 1, 0.0);
    }

    if flow.run(source, sink) != n as i64 {
        return None;
    }

    let mut perm = vec![0usize; n];
    for u in 0..n {
        for edge in &flow.adj[u] {
            if edge.to < 2 * n && edge.to >= n && edge.cap == 0 {
                perm[u] = edge.to - n;
            }
        }
    }
    Some(perm)
}

/// Cost of an assignment under a cost matrix.
pub fn assignment_cost(costs: &[Vec<f64>], perm: &[usize]) -> f64 {
    perm.iter().enumerate().map(|(i, &j)| costs[i][j]).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brute_force_best(costs: &[Vec<f64>]) -> f64 {
        fn permutations(n: usize) -> Vec<Vec<usize>> {
            if n == 1 {
                return vec![vec![0]];
            }
            let mut out = Vec::new();
            for p in permutations(n - 1) {
                for i in 0..n {
                    let mut q: Vec<usize> = p.iter().map(|&x| if x >= i { x + 1 } else { x }).collect();
                    q.insert(0, i);
                    out.push(q);
                }
            }
            out
        }
        permutations(costs.len())
            .iter()
            .map(|p| assignment_cost(costs, p))
            .fold(f64::INFINITY, f64::min)
    }

    #[test]
    fn finds_optimal_assignment_on_small_matrices() {
        let costs = vec![
            vec![4.0, 1.0, 3.0],
            vec![2.0, 0.0, 5.0],
            vec![3.0, 2.0, 2.0],
        ];
        let perm = min_cost_matching(&costs).expect("feasible");
        assert_eq!(assignment_cost(&costs, &perm), brute_force_best(&costs));
    }

    #[test]
    fn matches_brute_force_on_pseudo_random_matrices() {
        // Deterministic pseudo-random costs.
        let mut seed = 0x2545F4914F6CDD1Du64;
        let mut next = move || {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            (seed % 1000) as f64 / 10.0
        };

        for n in 2..=5 {
            let costs: Vec<Vec<f64>> = (0..n).map(|_| (0..n).map(|_| next()).collect()).collect();
            let perm = min_cost_matching(&costs).expect("feasible");
            let optimal = brute_force_best(&costs);
            assert!(
                (assignment_cost(&costs, &perm) - optimal).abs() < 1e-6,
                "n={n}: {} vs {}",
                assignment_cost(&costs, &perm),
                optimal
            );
        }
    }

    #[test]
    fn permutation_is_a_bijection() {
        let costs = vec![
            vec![1.0, 9.0, 9.0, 9.0],
            vec![9.0, 9.0, 1.0, 9.0],
            vec![9.0, 1.0, 9.0, 9.0],
            vec![9.0, 9.0, 9.0, 1.0],
        ];
        let perm = min_cost_matching(&costs).expect("feasible");
        assert_eq!(perm, vec![0, 2, 1, 3]);
    }
}

//! Least-squares solver for sparse difference/value equation systems.
//!
//! The layout computer states its constraints as `x_a - x_b = d`
//! (relative pose between neighbouring pieces) and `x_a = v` (absolute
//! anchor against the canvas frame); the minimum-error solution of the
//! over-determined stack is found with an SVD solve.

use nalgebra::{DMatrix, DVector};
use std::collections::HashMap;
use std::hash::Hash;

/// Over-determined linear system over variables identified by `K`.
#[derive(Clone, Debug)]
pub struct LinearSystem<K> {
    index: HashMap<K, usize>,
    order: Vec<K>,
    differences: Vec<(usize, usize, f64)>,
    values: Vec<(usize, f64)>,
}

impl<K: Eq + Hash + Copy> Default for LinearSystem<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash + Copy> LinearSystem<K> {
    pub fn new() -> Self {
        Self {
            index: HashMap::new(),
            order: Vec::new(),
            differences: Vec::new(),
            values: Vec::new(),
        }
    }

    fn index_of(&mut self, var: K) -> usize {
        if let Some(&i) = self.index.get(&var) {
            return i;
        }
        let i = self.order.len();
        self.index.insert(var, i);
        self.order.push(var);
        i
    }

    /// Add the equation `var1 - var2 = d`.
    pub fn add_difference(&mut self, var1: K, var2: K, d: f64) {
        let i1 = self.index_of(var1);
        let i2 = self.index_of(var2);
        self.differences.push((i1, i2, d));
    }

    /// Add the equation `var = v`.
    pub fn add_value(&mut self, var: K, v: f64) {
        let i = self.index_of(var);
        self.values.push((i, v));
    }

    pub fn num_equations(&self) -> usize {
        self.differences.len() + self.values.len()
    }

    /// Solve for the assignment minimizing the summed squared residual.
    ///
    /// Returns `None` for an empty system; a rank-deficient one gets
    /// the minimum-norm solution from the SVD pseudo-inverse.
    pub fn solve(&self) -> Option<HashMap<K, f64>> {
        let rows = self.num_equations();
        let cols = self.order.len();
        if rows == 0 || cols == 0 {
            return None;
        }

        let mut a = DMatrix::<f64>::zeros(rows, cols);
        let mut b = DVector::<f64>::zeros(rows);
        let mut r = 0;
        for &(i1, i2, d) in &self.differences {
            a[(r, i1)] = 1.0;
            a[(r, i2)] = -1.0;
            b[r] = d;
            r += 1;
        }
        for &(i, v) in &self.values {
            a[(r, i)] = 1.0;
            b[r] = v;
            r += 1;
        }

        let svd = a.svd(true, true);
        let x = svd.solve(&b, 1e-12).ok()?;

        Some(
            self.order
                .iter()
                .enumerate()
                .map(|(i, &k)| (k, x[i]))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn exactly_determined_chain() {
        let mut sys: LinearSystem<&str> = LinearSystem::new();
        sys.add_value("a", 1.0);
        sys.add_difference("b", "a", 2.0);
        sys.add_difference("c", "b", 3.0);

        let sol = sys.solve().expect("solvable");
        assert_relative_eq!(sol["a"], 1.0, epsilon = 1e-9);
        assert_relative_eq!(sol["b"], 3.0, epsilon = 1e-9);
        assert_relative_eq!(sol["c"], 6.0, epsilon = 1e-9);
    }

    #[test]
    fn over_determined_system_averages_conflicts() {
        let mut sys: LinearSystem<u32> = LinearSystem::new();
        sys.add_value(0, 0.0);
        // Two conflicting measurements of x1 - x0.
        sys.add_difference(1, 0, 9.0);
        sys.add_difference(1, 0, 11.0);

        let sol = sys.solve().expect("solvable");
        assert_relative_eq!(sol[&1] - sol[&0], 10.0, epsilon = 1e-9);
    }

    #[test]
    fn empty_system_has_no_solution() {
        let sys: LinearSystem<u32> = LinearSystem::new();
        assert!(sys.solve().is_none());
    }
}

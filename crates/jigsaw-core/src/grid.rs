//! Row-major 2-D array used for the combinatorial puzzle layout.

use nalgebra::{Point2, Vector2};

/// Neighbour offsets in the fixed order east, south, west, north.
///
/// Index arithmetic relies on this order: `(d + 1) % 4` is a clockwise
/// quarter turn in image coordinates (y grows downwards).
pub const DIRECTIONS: [Vector2<i32>; 4] = [
    Vector2::new(1, 0),
    Vector2::new(0, 1),
    Vector2::new(-1, 0),
    Vector2::new(0, -1),
];

#[derive(Clone, Debug)]
pub struct Grid<T> {
    cols: usize,
    rows: usize,
    data: Vec<T>,
}

impl<T: Clone + Default> Grid<T> {
    pub fn new(cols: usize, rows: usize) -> Self {
        Self {
            cols,
            rows,
            data: vec![T::default(); cols * rows],
        }
    }
}

impl<T> Grid<T> {
    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn in_bounds(&self, p: Point2<i32>) -> bool {
        p.x >= 0 && (p.x as usize) < self.cols && p.y >= 0 && (p.y as usize) < self.rows
    }

    pub fn at(&self, p: Point2<i32>) -> &T {
        debug_assert!(self.in_bounds(p));
        &self.data[p.y as usize * self.cols + p.x as usize]
    }

    pub fn at_mut(&mut self, p: Point2<i32>) -> &mut T {
        debug_assert!(self.in_bounds(p));
        &mut self.data[p.y as usize * self.cols + p.x as usize]
    }

    /// All coordinates in row-major order.
    pub fn coords(&self) -> impl Iterator<Item = Point2<i32>> + '_ {
        (0..self.rows as i32)
            .flat_map(move |y| (0..self.cols as i32).map(move |x| Point2::new(x, y)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_and_indexing() {
        let mut grid: Grid<Option<u32>> = Grid::new(3, 2);
        assert!(grid.in_bounds(Point2::new(2, 1)));
        assert!(!grid.in_bounds(Point2::new(3, 0)));
        assert!(!grid.in_bounds(Point2::new(-1, 0)));

        *grid.at_mut(Point2::new(2, 1)) = Some(7);
        assert_eq!(*grid.at(Point2::new(2, 1)), Some(7));
        assert_eq!(*grid.at(Point2::new(0, 0)), None);
    }

    #[test]
    fn directions_turn_clockwise() {
        for d in 0..4 {
            let turned = DIRECTIONS[(d + 1) % 4];
            let v = DIRECTIONS[d];
            // In image coordinates a clockwise quarter turn maps (x, y) to (-y, x).
            assert_eq!(turned, Vector2::new(-v.y, v.x));
        }
    }

    #[test]
    fn coords_cover_grid_in_row_major_order() {
        let grid: Grid<u8> = Grid::new(2, 2);
        let coords: Vec<_> = grid.coords().collect();
        assert_eq!(
            coords,
            vec![
                Point2::new(0, 0),
                Point2::new(1, 0),
                Point2::new(0, 1),
                Point2::new(1, 1)
            ]
        );
    }
}

//! Plane geometry on piece outlines.
//!
//! Angles follow the raster convention used throughout the pipeline:
//! the y axis grows downwards, and `rotate_vec(v, a)` maps a vector
//! pointing in direction `a` onto the +x axis. All curve points are in
//! pixel units.

use nalgebra::{Complex, Point2, Vector2};
use serde::{Deserialize, Serialize};

/// Ordered sequence of 2-D sample points along a curve.
///
/// Closed piece outlines are traversed counter-clockwise and may be
/// indexed cyclically; edge sub-curves are open.
pub type Curve = Vec<Point2<f64>>;

/// Rotation followed by a translation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RigidTransform {
    pub rotation: f64,
    pub translation: Vector2<f64>,
}

impl Default for RigidTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl RigidTransform {
    pub fn new(rotation: f64, translation: Vector2<f64>) -> Self {
        Self {
            rotation,
            translation,
        }
    }

    pub fn identity() -> Self {
        Self::new(0.0, Vector2::zeros())
    }

    pub fn rotation(rotation: f64) -> Self {
        Self::new(rotation, Vector2::zeros())
    }

    #[inline]
    pub fn apply(&self, p: Point2<f64>) -> Point2<f64> {
        Point2::from(rotate_vec(p.coords, self.rotation) + self.translation)
    }

    pub fn apply_curve(&self, curve: &[Point2<f64>]) -> Curve {
        curve.iter().map(|&p| self.apply(p)).collect()
    }

    /// Composition: `other` is executed after `self`.
    pub fn then(&self, other: &RigidTransform) -> RigidTransform {
        RigidTransform::new(
            self.rotation + other.rotation,
            other.apply(Point2::from(self.translation)).coords,
        )
    }

    pub fn inverse(&self) -> RigidTransform {
        RigidTransform::new(
            -self.rotation,
            rotate_vec(-self.translation, -self.rotation),
        )
    }

    /// True when the transform moves nothing beyond numeric noise
    /// (1e-3 rad rotation, 1e-2 px translation).
    pub fn is_identity(&self) -> bool {
        self.rotation.abs() <= 1e-3
            && self.translation.x.abs() <= 1e-2
            && self.translation.y.abs() <= 1e-2
    }
}

/// Angle of `v` against the x axis.
#[inline]
pub fn angle_of(v: Vector2<f64>) -> f64 {
    v.y.atan2(v.x)
}

#[inline]
pub fn rotate_vec(v: Vector2<f64>, angle: f64) -> Vector2<f64> {
    let (sin, cos) = angle.sin_cos();
    Vector2::new(cos * v.x + sin * v.y, -sin * v.x + cos * v.y)
}

#[inline]
pub fn cross(a: Vector2<f64>, b: Vector2<f64>) -> f64 {
    a.x * b.y - a.y * b.x
}

/// Equivalent angle in `[orig - π, orig + π)`.
pub fn norm_angle(angle: f64, orig: f64) -> f64 {
    let mut a = angle;
    while a >= orig + std::f64::consts::PI {
        a -= 2.0 * std::f64::consts::PI;
    }
    while a < orig - std::f64::consts::PI {
        a += 2.0 * std::f64::consts::PI;
    }
    a
}

/// Difference `angle - orig` normalized to `[-π, π)`.
pub fn angle_diff(orig: f64, angle: f64) -> f64 {
    norm_angle(angle, orig) - orig
}

pub fn signed_distance_from_line(l1: Point2<f64>, l2: Point2<f64>, p: Point2<f64>) -> f64 {
    cross(l1 - l2, p - l2) / (l1 - l2).norm()
}

pub fn distance_from_line(l1: Point2<f64>, l2: Point2<f64>, p: Point2<f64>) -> f64 {
    signed_distance_from_line(l1, l2, p).abs()
}

/// Shoelace area, signed so counter-clockwise traversal in image
/// coordinates (y grows downwards) is positive.
pub fn signed_area(polygon: &[Point2<f64>]) -> f64 {
    let n = polygon.len();
    let mut sum = 0.0;
    for i in 0..n {
        sum += cross(polygon[(i + 1) % n].coords, polygon[i].coords);
    }
    sum / 2.0
}

pub fn polygon_area(polygon: &[Point2<f64>]) -> f64 {
    signed_area(polygon).abs()
}

/// Centre of mass of the polygon interior.
pub fn polygon_centroid(polygon: &[Point2<f64>]) -> Point2<f64> {
    let n = polygon.len();
    let mut sum_area = 0.0;
    let mut center = Vector2::zeros();
    for i in 0..n {
        let a = polygon[i].coords;
        let b = polygon[(i + 1) % n].coords;
        let area = cross(b, a);
        center += Vector2::new(area * (a.x + b.x), area * (a.y + b.y));
        sum_area += area;
    }
    Point2::from(center / (3.0 * sum_area))
}

pub fn mean_point(points: &[Point2<f64>]) -> Point2<f64> {
    let sum = points
        .iter()
        .fold(Vector2::zeros(), |acc: Vector2<f64>, p| acc + p.coords);
    Point2::from(sum / points.len() as f64)
}

/// Index of the closest point of `set` to `point`.
pub fn closest_point(point: Point2<f64>, set: &[Point2<f64>]) -> usize {
    let mut best = 0;
    for (i, p) in set.iter().enumerate() {
        if (p - point).norm_squared() < (set[best] - point).norm_squared() {
            best = i;
        }
    }
    best
}

/// For each point of `curve`, the index of the closest point of `to`.
pub fn closest_points(curve: &[Point2<f64>], to: &[Point2<f64>]) -> Vec<usize> {
    curve.iter().map(|&p| closest_point(p, to)).collect()
}

/// Mirror the curve across the y axis.
pub fn flip_curve(curve: &[Point2<f64>]) -> Curve {
    curve.iter().map(|p| Point2::new(-p.x, p.y)).collect()
}

/// Optimal rigid transform of `shape` onto `pattern` (Schwartz-Sharir).
///
/// Both curves must have the same length and the correspondence is
/// positional: point i of `shape` is matched with point i of `pattern`.
pub fn optimal_align(pattern: &[Point2<f64>], shape: &[Point2<f64>]) -> RigidTransform {
    debug_assert_eq!(pattern.len(), shape.len());

    let mean = mean_point(shape);
    let center = mean_point(pattern);

    // Mean phase of the point-wise complex cross-correlation gives the
    // rotation minimizing the summed squared distances.
    let mut sum = Complex::new(0.0, 0.0);
    for (p, q) in shape.iter().zip(pattern.iter()) {
        let u = Complex::new(p.x - mean.x, p.y - mean.y);
        let v = Complex::new(q.x, q.y);
        sum += u * v.conj();
    }
    let angle = sum.arg();

    let rotated_mean = rotate_vec(mean.coords, angle);
    RigidTransform::new(angle, center.coords - rotated_mean)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square() -> Curve {
        vec![
            Point2::new(0.0, 0.0),
            Point2::new(4.0, 0.0),
            Point2::new(4.0, 4.0),
            Point2::new(0.0, 4.0),
        ]
    }

    #[test]
    fn compose_with_inverse_is_identity() {
        let t = RigidTransform::new(0.7, Vector2::new(12.0, -3.5));
        let id = t.then(&t.inverse());
        assert!(id.is_identity());

        let p = Point2::new(31.0, -8.0);
        let back = t.inverse().apply(t.apply(p));
        assert_relative_eq!(back.x, p.x, epsilon = 1e-9);
        assert_relative_eq!(back.y, p.y, epsilon = 1e-9);
    }

    #[test]
    fn composition_order_matches_sequential_application() {
        let t1 = RigidTransform::new(0.3, Vector2::new(5.0, 1.0));
        let t2 = RigidTransform::new(-1.1, Vector2::new(-2.0, 7.0));
        let p = Point2::new(3.0, 4.0);
        let composed = t1.then(&t2).apply(p);
        let sequential = t2.apply(t1.apply(p));
        assert_relative_eq!(composed.x, sequential.x, epsilon = 1e-9);
        assert_relative_eq!(composed.y, sequential.y, epsilon = 1e-9);
    }

    #[test]
    fn square_area_and_centroid() {
        let sq = square();
        assert_relative_eq!(polygon_area(&sq), 16.0, epsilon = 1e-9);
        let c = polygon_centroid(&sq);
        assert_relative_eq!(c.x, 2.0, epsilon = 1e-9);
        assert_relative_eq!(c.y, 2.0, epsilon = 1e-9);
    }

    #[test]
    fn image_ccw_traversal_has_positive_signed_area() {
        // Down the left side, then right, up, and back: counter-clockwise
        // on screen with y growing downwards.
        let ccw = vec![
            Point2::new(0.0, 0.0),
            Point2::new(0.0, 4.0),
            Point2::new(4.0, 4.0),
            Point2::new(4.0, 0.0),
        ];
        assert!(signed_area(&ccw) > 0.0);
        let mut cw = ccw.clone();
        cw.reverse();
        assert!(signed_area(&cw) < 0.0);
    }

    #[test]
    fn flip_is_an_involution() {
        let sq = square();
        assert_eq!(flip_curve(&flip_curve(&sq)), sq);
    }

    #[test]
    fn optimal_align_recovers_known_transform() {
        let t = RigidTransform::new(0.4, Vector2::new(9.0, -2.0));
        let shape = square();
        let pattern = t.apply_curve(&shape);

        let recovered = optimal_align(&pattern, &shape);
        assert_relative_eq!(recovered.rotation, t.rotation, epsilon = 1e-9);
        assert_relative_eq!(recovered.translation.x, t.translation.x, epsilon = 1e-9);
        assert_relative_eq!(recovered.translation.y, t.translation.y, epsilon = 1e-9);
    }

    #[test]
    fn distance_from_line_is_perpendicular() {
        let d = distance_from_line(
            Point2::new(0.0, 0.0),
            Point2::new(10.0, 0.0),
            Point2::new(5.0, 3.0),
        );
        assert_relative_eq!(d, 3.0, epsilon = 1e-9);
    }
}

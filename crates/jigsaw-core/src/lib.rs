//! Core types and utilities for jigsaw puzzle reconstruction.
//!
//! This crate is intentionally small and purely geometric. It does *not*
//! depend on any raster-image library; pixel handling lives in the
//! extraction and rendering crates.

mod align;
mod geometry;
mod grid;
mod logger;
mod lstsq;
mod signal;
mod types;

pub use align::{line_align, shape_align, shape_align_from, ShapeAlign};
pub use geometry::{
    angle_diff, angle_of, closest_point, closest_points, cross, distance_from_line, flip_curve,
    mean_point, norm_angle, optimal_align, polygon_area, polygon_centroid, rotate_vec,
    signed_area, signed_distance_from_line, Curve, RigidTransform,
};
pub use grid::{Grid, DIRECTIONS};
pub use logger::init_with_level;
pub use lstsq::LinearSystem;
pub use signal::{
    circular_convolution, cyclic_difference, find_local_maxima, find_local_minima, gaussian_blur,
    resample_scaled, resample_to,
};
pub use types::{
    Edge, EdgeId, EdgeType, Hsl, Piece, PieceId, PieceSet, RawEdge, RawPiece, SCORE_INF,
};

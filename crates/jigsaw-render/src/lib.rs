//! From a combinatorial layout to pixels.
//!
//! [`layout`] turns the solved grid into exact per-piece poses by
//! stacking pairwise alignment constraints into three least-squares
//! systems (rotation, x, y); [`visualize`] then cuts every piece out
//! of its source scan and composites it at its pose onto the output
//! canvas.

pub mod layout;
pub mod visualize;

mod error;
mod params;

pub use error::RenderError;
pub use layout::{compute_layout, GeometricLayout};
pub use params::RenderParams;
pub use visualize::visualize;

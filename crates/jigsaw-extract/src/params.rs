use serde::{Deserialize, Serialize};

/// Tunable parameters of the extraction pipeline.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExtractParams {
    /// Colour-distance tolerance (0-100) separating the front-scan
    /// background from piece pixels.
    pub color_fuzz: f64,
    /// K-means stops once the mean squared centre movement per
    /// iteration drops below this value (px²).
    pub avg_recluster_change: f64,
    /// Gaussian blur applied to the front scan before colour sampling.
    pub color_blur_radius: f64,
    /// Distance (px) inside the outline at which edge colours are read.
    pub edge_to_color_distance: f64,
    /// Minimal edge length in samples for indent/outdent candidates.
    pub min_edge_size: usize,
    /// Components smaller than this fraction of the largest component
    /// are discarded as scanning debris.
    pub min_max_piece_size_ratio: f64,
}

impl Default for ExtractParams {
    fn default() -> Self {
        Self {
            color_fuzz: 20.0,
            avg_recluster_change: 1.0,
            color_blur_radius: 2.0,
            edge_to_color_distance: 6.0,
            min_edge_size: 30,
            min_max_piece_size_ratio: 0.25,
        }
    }
}

use serde::{Deserialize, Serialize};

/// Tunable parameters of the output rendering.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RenderParams {
    /// Black margin around the assembled puzzle, in pixels.
    pub visualization_frame: f64,
    /// Erosion of each piece mask before compositing; leaves a thin
    /// visible seam between neighbouring pieces.
    pub visualization_erode: f64,
}

impl Default for RenderParams {
    fn default() -> Self {
        Self {
            visualization_frame: 30.0,
            visualization_erode: 2.0,
        }
    }
}

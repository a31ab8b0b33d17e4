use serde::{Deserialize, Serialize};

/// Tunable parameters of the compatibility scorer.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CompatParams {
    /// Number of progressively finer resolutions per edge; scoring
    /// starts at the coarsest and prunes weak partners every round.
    pub resolution_depth: usize,
    /// Target number of partners still scored at full resolution.
    pub base_size: usize,
    /// Channel weights of the combined score.
    pub shape_weight: f64,
    pub hue_weight: f64,
    pub saturation_weight: f64,
    pub luminosity_weight: f64,
}

impl Default for CompatParams {
    fn default() -> Self {
        Self {
            resolution_depth: 3,
            base_size: 50,
            // Shape-only by default; colour channels are opt-in.
            shape_weight: 1.0,
            hue_weight: 0.0,
            saturation_weight: 0.0,
            luminosity_weight: 0.0,
        }
    }
}

//! Footprint-dependent height scaling
//!
//! Small footprints get squashed so a 30 m kiosk does not read as a tower
//! next to a block-sized mall.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeightScale {
    /// Footprint sizes at which the next scale step begins, ascending
    pub thresholds: [f64; 3],
    /// Scale for each band: below the first threshold, between each pair, above the last
    pub scales: [f64; 4],
}

impl Default for HeightScale {
    fn default() -> Self {
        Self {
            thresholds: [5.0, 15.0, 30.0],
            scales: [0.3, 0.5, 0.7, 1.0],
        }
    }
}

impl HeightScale {
    /// Scale factor for a footprint of size `footprint` (scene units)
    pub fn factor(&self, footprint: f64) -> f64 {
        let step = self
            .thresholds
            .iter()
            .take_while(|&&t| footprint >= t)
            .count();
        self.scales[step]
    }

    pub fn scaled_height(&self, height: f64, footprint: f64) -> f64 {
        height * self.factor(footprint)
    }
}

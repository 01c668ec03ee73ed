//! Unit conversion for stored summaries
//!
//! Samples carry instantaneous power, so sub-daily summaries store the mean
//! power over the slot. Daily records are already energy (kWh) and pass
//! through unchanged.

use serde::{Deserialize, Serialize};

/// How an accumulated slot sum becomes the stored value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Conversion {
    /// Average power: `sum / samples`, zero when the slot had no samples
    MeanPower,
    /// Energy totals stored as summed
    Energy,
}

impl Conversion {
    pub fn apply(self, sum: f64, samples: usize) -> f64 {
        match self {
            Conversion::MeanPower if samples > 0 => sum / samples as f64,
            Conversion::MeanPower => 0.0,
            Conversion::Energy => sum,
        }
    }
}

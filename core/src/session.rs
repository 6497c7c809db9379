use serde::{Deserialize, Serialize};

/// State carried from ray to ray within one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SweepSession {
    /// First good unfolded velocity of the previous ray.
    pub last_good_v0: Option<f32>,
}

impl SweepSession {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

use serde::{Deserialize, Serialize};

/// Orientation convention of the platform's primary rotation axis.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum PrimaryAxis {
    #[default]
    Z,
    Y,
    X,
    /// Airborne tail radar: the beam rotates about the longitudinal axis.
    YPrime,
}

/// Gate layout along a ray.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RangeGeometry {
    pub start_range_km: f32,
    pub gate_spacing_km: f32,
}

impl RangeGeometry {
    pub fn new(start_range_km: f32, gate_spacing_km: f32) -> Self {
        Self {
            start_range_km,
            gate_spacing_km,
        }
    }

    pub fn gate_range_km(&self, gate: usize) -> f64 {
        self.start_range_km as f64 + gate as f64 * self.gate_spacing_km as f64
    }

    /// Gate index nearest to `range_km`, clamped to `[0, n_gates - 1]`.
    pub fn cell_at(&self, range_km: f64, n_gates: usize) -> usize {
        if n_gates == 0 {
            return 0;
        }
        let cell =
            ((range_km - self.start_range_km as f64) / self.gate_spacing_km as f64 + 0.5).floor();
        if cell < 0.0 {
            0
        } else {
            (cell as usize).min(n_gates - 1)
        }
    }
}

impl Default for RangeGeometry {
    fn default() -> Self {
        Self::new(0.0, 1.0)
    }
}

/// Georeference of a ray: platform attitude, motion and measured wind.
/// Angles are degrees, velocities m/s.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct SensorPose {
    pub tilt: f32,
    pub roll: f32,
    pub pitch: f32,
    pub drift: f32,
    pub rotation: f32,
    pub heading: f32,
    pub track: f32,
    pub ew_velocity: f32,
    pub ns_velocity: f32,
    pub vert_velocity: f32,
    pub ew_wind: f32,
    pub ns_wind: f32,
    pub vert_wind: f32,
    pub ew_ground_speed_correction: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_at_rounds_to_nearest_gate_and_clamps() {
        let geometry = RangeGeometry::new(0.0, 1.0);
        assert_eq!(geometry.cell_at(2.0, 10), 2);
        assert_eq!(geometry.cell_at(2.4, 10), 2);
        assert_eq!(geometry.cell_at(2.6, 10), 3);
        assert_eq!(geometry.cell_at(-5.0, 10), 0);
        assert_eq!(geometry.cell_at(50.0, 10), 9);
    }

    #[test]
    fn gate_range_follows_start_and_spacing() {
        let geometry = RangeGeometry::new(0.5, 0.25);
        assert!((geometry.gate_range_km(4) - 1.5).abs() < 1e-9);
    }
}

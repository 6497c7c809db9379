pub struct StatsHelper;

impl StatsHelper {
    pub fn mean(samples: &[f32]) -> Option<f32> {
        if samples.is_empty() {
            return None;
        }
        let sum: f64 = samples.iter().map(|&v| v as f64).sum();
        Some((sum / samples.len() as f64) as f32)
    }

    /// Wraps `angle` into `[0, 360)`.
    pub fn fmod360(angle: f64) -> f64 {
        let wrapped = angle % 360.0;
        if wrapped < 0.0 {
            // tiny negatives round up to exactly 360
            (wrapped + 360.0) % 360.0
        } else {
            wrapped
        }
    }
}

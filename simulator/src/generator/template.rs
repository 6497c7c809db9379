/// Radial component of a horizontal wind blowing toward `direction_deg`.
pub fn radial_wind(speed: f32, direction_deg: f32, azimuth_deg: f32, elevation_deg: f32) -> f32 {
    let relative = (azimuth_deg - direction_deg).to_radians();
    speed * relative.cos() * elevation_deg.to_radians().cos()
}

/// Aliases `velocity` into `[-nyquist, nyquist]` the way a radar would.
pub fn fold_velocity(velocity: f32, nyquist: f32) -> f32 {
    if nyquist <= 0.0 {
        return velocity;
    }
    let interval = 2.0 * nyquist;
    velocity - interval * (velocity / interval).round()
}

/// Reflectivity falling off with range, dBZ.
pub fn reflectivity(range_km: f32) -> f32 {
    45.0 - 20.0 * range_km.max(0.1).log10()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folding_stays_within_nyquist() {
        for v in [-47.0, -12.0, 0.0, 9.5, 31.0, 64.0] {
            let folded = fold_velocity(v, 10.0);
            assert!(folded.abs() <= 10.0, "{} folded to {}", v, folded);
            let folds = (v - folded) / 20.0;
            assert!((folds - folds.round()).abs() < 1e-4);
        }
    }

    #[test]
    fn wind_along_the_beam_is_full_speed() {
        assert!((radial_wind(20.0, 90.0, 90.0, 0.0) - 20.0).abs() < 1e-4);
        assert!(radial_wind(20.0, 90.0, 0.0, 0.0).abs() < 1e-4);
    }
}

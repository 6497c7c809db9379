use crate::kernels::GateSpan;
use crate::prelude::EditResult;
use crate::volume::SensorPose;

/// Platform velocity seen along the beam, m/s.
pub fn aircraft_velocity_along_beam(pose: &SensorPose, elevation_deg: f64) -> f32 {
    let horizontal = ((pose.ew_velocity - pose.ew_ground_speed_correction) as f64)
        .hypot(pose.ns_velocity as f64);
    let projected = (pose.tilt as f64).to_radians().sin() * horizontal
        + elevation_deg.to_radians().sin() * pose.vert_velocity as f64;
    projected as f32
}

/// Removes the platform's own motion from a radial velocity field.
/// A positive `nyquist` folds the corrected values back into `[-nyquist, nyquist]`.
pub fn remove_aircraft_motion(
    data: &[f32],
    span: &GateSpan<'_>,
    pose: &SensorPose,
    elevation_deg: f64,
    nyquist: f32,
) -> EditResult<Vec<f32>> {
    span.check("velocity", data.len())?;
    let correction = aircraft_velocity_along_beam(pose, elevation_deg);
    let interval = 2.0 * nyquist;

    let mut out = data.to_vec();
    for (gate, value) in out.iter_mut().enumerate() {
        if !span.editable(gate) || !span.is_good(*value) {
            continue;
        }
        let mut corrected = *value - correction;
        if nyquist > 0.0 {
            corrected -= interval * (corrected / interval).round();
        }
        *value = corrected;
    }
    Ok(out)
}

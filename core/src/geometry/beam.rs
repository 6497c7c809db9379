use crate::math::StatsHelper;
use crate::prelude::{EditError, EditResult};
use crate::volume::{PrimaryAxis, RangeGeometry, SensorPose};

/// Pointing and gate layout of the ray being masked.
#[derive(Debug, Clone, Copy)]
pub struct BeamGeometry<'a> {
    pub n_gates: usize,
    pub range: RangeGeometry,
    pub azimuth_deg: f64,
    pub elevation_deg: f64,
    pub axis: PrimaryAxis,
    pub pose: Option<&'a SensorPose>,
}

/// Azimuth used to place gates on the ground, in degrees `[0, 360)`.
///
/// Tail radars (`YPrime`) point relative to the aircraft track, so the
/// azimuth comes from `track + rotation` and requires a georeference.
pub fn effective_azimuth(beam: &BeamGeometry<'_>) -> EditResult<f64> {
    match beam.axis {
        PrimaryAxis::YPrime => {
            let pose = beam.pose.ok_or_else(|| {
                EditError::PoseUnavailable("y-prime beam needs track and rotation".into())
            })?;
            Ok(StatsHelper::fmod360(pose.track as f64 + pose.rotation as f64))
        }
        _ => Ok(StatsHelper::fmod360(beam.azimuth_deg)),
    }
}

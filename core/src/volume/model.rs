use crate::prelude::{EditError, EditResult};
use crate::volume::pose::{PrimaryAxis, RangeGeometry, SensorPose};
use crate::volume::ray::{Field, Ray};
use serde::{Deserialize, Serialize};

/// Operations consumed from the external volume collaborator.
pub trait VolumeModel {
    fn ray_count(&self) -> usize;
    fn ray(&self, index: usize) -> EditResult<&Ray>;
    fn field(&self, ray_index: usize, name: &str) -> EditResult<&Field>;
    fn georeference(&self, ray_index: usize) -> EditResult<SensorPose>;
    fn predominant_range_geometry(&self) -> RangeGeometry;
    fn primary_axis(&self) -> PrimaryAxis;
    /// Used only when a field is committed.
    fn add_field(&mut self, ray_index: usize, field: Field) -> EditResult<()>;
}

/// In-memory volume used by the simulator and by tests.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryVolume {
    pub axis: PrimaryAxis,
    pub rays: Vec<Ray>,
}

impl MemoryVolume {
    pub fn new(axis: PrimaryAxis) -> Self {
        Self {
            axis,
            rays: Vec::new(),
        }
    }

    pub fn push_ray(&mut self, ray: Ray) {
        self.rays.push(ray);
    }

    pub fn rays(&self) -> &[Ray] {
        &self.rays
    }
}

impl VolumeModel for MemoryVolume {
    fn ray_count(&self) -> usize {
        self.rays.len()
    }

    fn ray(&self, index: usize) -> EditResult<&Ray> {
        self.rays.get(index).ok_or(EditError::RayOutOfRange(index))
    }

    fn field(&self, ray_index: usize, name: &str) -> EditResult<&Field> {
        self.ray(ray_index)?.field(name)
    }

    fn georeference(&self, ray_index: usize) -> EditResult<SensorPose> {
        self.ray(ray_index)?
            .georeference
            .clone()
            .ok_or_else(|| EditError::PoseUnavailable(format!("ray {} has no georeference", ray_index)))
    }

    /// Geometry shared by the most rays; the first ray wins ties.
    fn predominant_range_geometry(&self) -> RangeGeometry {
        let mut tally: Vec<(RangeGeometry, usize)> = Vec::new();
        for ray in &self.rays {
            match tally.iter_mut().find(|(geometry, _)| *geometry == ray.range) {
                Some((_, count)) => *count += 1,
                None => tally.push((ray.range, 1)),
            }
        }
        let mut best: Option<(RangeGeometry, usize)> = None;
        for (geometry, count) in tally {
            if best.map_or(true, |(_, top)| count > top) {
                best = Some((geometry, count));
            }
        }
        best.map(|(geometry, _)| geometry).unwrap_or_default()
    }

    fn primary_axis(&self) -> PrimaryAxis {
        self.axis
    }

    fn add_field(&mut self, ray_index: usize, field: Field) -> EditResult<()> {
        self.rays
            .get_mut(ray_index)
            .ok_or(EditError::RayOutOfRange(ray_index))?
            .put_field(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ray_with(index: usize, range: RangeGeometry) -> Ray {
        Ray::new(index, 0, 4, range)
    }

    #[test]
    fn predominant_geometry_is_the_most_common_one() {
        let mut volume = MemoryVolume::new(PrimaryAxis::Z);
        volume.push_ray(ray_with(0, RangeGeometry::new(0.0, 0.5)));
        volume.push_ray(ray_with(1, RangeGeometry::new(0.0, 0.25)));
        volume.push_ray(ray_with(2, RangeGeometry::new(0.0, 0.25)));
        assert_eq!(
            volume.predominant_range_geometry(),
            RangeGeometry::new(0.0, 0.25)
        );
    }

    #[test]
    fn missing_georeference_is_pose_unavailable() {
        let mut volume = MemoryVolume::new(PrimaryAxis::YPrime);
        volume.push_ray(ray_with(0, RangeGeometry::default()));
        assert!(matches!(
            volume.georeference(0),
            Err(EditError::PoseUnavailable(_))
        ));
        assert_eq!(volume.ray(3).unwrap_err(), EditError::RayOutOfRange(3));
    }

    #[test]
    fn add_field_writes_through_to_the_ray() {
        let mut volume = MemoryVolume::new(PrimaryAxis::Z);
        volume.push_ray(ray_with(0, RangeGeometry::default()));
        volume
            .add_field(0, Field::values("VEL", "m/s", -9999.0, vec![0.0; 4]))
            .unwrap();
        assert!(volume.field(0, "VEL").is_ok());
        assert!(matches!(
            volume.field(0, "DBZ"),
            Err(EditError::FieldNotFound(_))
        ));
    }
}

use crate::kernels::GateSpan;
use crate::lifecycle::{FieldHandle, FieldLifecycle};
use crate::mask::{BadFlagMask, BoundaryMask};
use crate::prelude::{EditError, EditResult, MISSING_FL32};
use crate::session::SweepSession;
use crate::volume::{FieldData, RangeGeometry, Ray, SensorPose};

/// Base name of the masks written by the flag generators. Each call gets
/// its own provisional; the name resolves to the newest.
pub const BAD_FLAGS_FIELD: &str = "BAD_FLAGS";

/// Everything a script evaluation may see and produce for one ray.
#[derive(Debug, Clone, Default)]
pub struct RayWorkspace {
    pub ray_index: usize,
    pub azimuth_deg: f64,
    pub elevation_deg: f64,
    pub n_gates: usize,
    pub nyquist_mps: Option<f32>,
    pub pose: Option<SensorPose>,
    /// Predominant range geometry of the volume, used by range-based kernels.
    pub range: RangeGeometry,
    pub boundary: BoundaryMask,
    pub lifecycle: FieldLifecycle,
    pub session: SweepSession,
    kernel_error: Option<EditError>,
}

/// Values of a resolved field, detached from the lifecycle.
#[derive(Debug, Clone)]
pub struct KernelInput {
    pub name: String,
    pub units: String,
    pub missing: f32,
    pub values: Vec<f32>,
}

impl RayWorkspace {
    pub fn for_ray(
        ray: &Ray,
        range: RangeGeometry,
        boundary: BoundaryMask,
        session: SweepSession,
    ) -> EditResult<Self> {
        let lifecycle = FieldLifecycle::new(ray.n_gates, ray.fields.clone());
        for field in lifecycle.committed() {
            crate::prelude::ensure_gates(&field.name, ray.n_gates, field.n_gates())?;
        }
        Ok(Self {
            ray_index: ray.index,
            azimuth_deg: ray.azimuth_deg as f64,
            elevation_deg: ray.elevation_deg as f64,
            n_gates: ray.n_gates,
            nyquist_mps: ray.nyquist_mps,
            pose: ray.georeference.clone(),
            range,
            boundary,
            lifecycle,
            session,
            kernel_error: None,
        })
    }

    pub fn span(&self, clip_gate: usize, missing: f32) -> EditResult<GateSpan<'_>> {
        GateSpan::new(self.n_gates, clip_gate, missing, &self.boundary)
    }

    /// Resolves a value field; `missing` overrides the field's own sentinel.
    pub fn values_input(&self, handle: &FieldHandle, missing: Option<f32>) -> EditResult<KernelInput> {
        let field = self.lifecycle.resolve(handle)?;
        Ok(KernelInput {
            name: field.name.clone(),
            units: field.units.clone(),
            missing: missing.unwrap_or(field.missing),
            values: field.as_values()?.to_vec(),
        })
    }

    /// Resolves a bad-flag field, returning its base name and gates.
    pub fn flags_input(&self, handle: &FieldHandle) -> EditResult<(String, BadFlagMask)> {
        let field = self.lifecycle.resolve(handle)?;
        Ok((
            field.name.clone(),
            BadFlagMask::from_gates(field.as_flags()?.to_vec()),
        ))
    }

    pub fn emit_values(&mut self, input: KernelInput, values: Vec<f32>) -> EditResult<FieldHandle> {
        self.lifecycle.create_provisional(
            &input.name,
            &input.units,
            input.missing,
            FieldData::Values(values),
        )
    }

    /// Publishes a newly generated mask as its own provisional.
    pub fn emit_flags(&mut self, name: &str, flags: BadFlagMask) -> EditResult<FieldHandle> {
        self.lifecycle.create_fresh(
            name,
            "",
            MISSING_FL32,
            FieldData::Flags(flags.into_inner()),
        )
    }

    /// Writes `flags` back into the mask `target` refers to.
    pub fn emit_flags_into(
        &mut self,
        target: &FieldHandle,
        name: &str,
        flags: BadFlagMask,
    ) -> EditResult<FieldHandle> {
        self.lifecycle.rewrite(
            target,
            name,
            "",
            MISSING_FL32,
            FieldData::Flags(flags.into_inner()),
        )
    }

    /// A requested nyquist of zero means the ray's own.
    pub fn nyquist(&self, requested: f32) -> EditResult<f32> {
        if requested != 0.0 {
            return Ok(requested);
        }
        self.nyquist_mps.filter(|&n| n > 0.0).ok_or_else(|| {
            EditError::InvalidParameter(format!(
                "ray {} carries no nyquist velocity",
                self.ray_index
            ))
        })
    }

    pub fn pose(&self) -> EditResult<&SensorPose> {
        self.pose.as_ref().ok_or_else(|| {
            EditError::PoseUnavailable(format!("ray {} has no georeference", self.ray_index))
        })
    }

    /// Keeps the first kernel failure of an evaluation so the host can
    /// surface it with its typed kind.
    pub fn record_error(&mut self, error: EditError) -> EditError {
        if self.kernel_error.is_none() {
            self.kernel_error = Some(error.clone());
        }
        error
    }

    pub fn take_kernel_error(&mut self) -> Option<EditError> {
        self.kernel_error.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::volume::Field;

    fn sample_ray() -> Ray {
        let mut ray = Ray::new(4, 0, 5, RangeGeometry::new(0.0, 1.0));
        ray.nyquist_mps = Some(12.0);
        ray.fields
            .push(Field::values("VEL", "m/s", -9999.0, vec![1.0, 6.0, 3.0, 7.0, 2.0]));
        ray
    }

    #[test]
    fn nyquist_zero_falls_back_to_the_ray() {
        let ws = RayWorkspace::for_ray(
            &sample_ray(),
            RangeGeometry::default(),
            BoundaryMask::unrestricted(5),
            SweepSession::default(),
        )
        .unwrap();
        assert_eq!(ws.nyquist(0.0).unwrap(), 12.0);
        assert_eq!(ws.nyquist(8.0).unwrap(), 8.0);
        assert!(matches!(ws.pose(), Err(EditError::PoseUnavailable(_))));
    }

    #[test]
    fn first_recorded_error_wins() {
        let mut ws = RayWorkspace::default();
        ws.record_error(EditError::FieldNotFound("A".into()));
        ws.record_error(EditError::Script("later".into()));
        assert_eq!(
            ws.take_kernel_error(),
            Some(EditError::FieldNotFound("A".into()))
        );
        assert_eq!(ws.take_kernel_error(), None);
    }

    #[test]
    fn field_longer_than_the_ray_is_rejected() {
        let mut ray = sample_ray();
        ray.fields.push(Field::values("DBZ", "dBZ", -9999.0, vec![0.0; 7]));
        let err = RayWorkspace::for_ray(
            &ray,
            RangeGeometry::default(),
            BoundaryMask::unrestricted(5),
            SweepSession::default(),
        )
        .unwrap_err();
        assert_eq!(err, EditError::mismatch("DBZ", 5, 7));
    }
}

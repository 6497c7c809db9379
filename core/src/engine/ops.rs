//! Kernel entry points as seen by scripts: resolve handles, run the kernel
//! over the current ray, and publish the result as a provisional field.
//!
//! `clip_gate` bounds the gates a call may modify. `bad` overrides the input
//! field's missing sentinel when given.

use crate::engine::workspace::{RayWorkspace, BAD_FLAGS_FIELD};
use crate::kernels::{self, Comparison, FlagOp, GateSpan, UnfoldParams};
use crate::lifecycle::FieldHandle;
use crate::mask::BadFlagMask;
use crate::prelude::{ensure_gates, EditResult};

/// Unfolding reference source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnfoldReference {
    FirstGoodGate,
    AircraftWind,
    LocalWind { ew_wind: f32, ns_wind: f32 },
}

impl RayWorkspace {
    fn map_values(
        &mut self,
        field: &FieldHandle,
        clip_gate: usize,
        bad: Option<f32>,
        kernel: impl FnOnce(&[f32], &GateSpan<'_>, &Self) -> EditResult<Vec<f32>>,
    ) -> EditResult<FieldHandle> {
        let input = self.values_input(field, bad)?;
        let out = {
            let span = self.span(clip_gate, input.missing)?;
            kernel(&input.values, &span, self)?
        };
        self.emit_values(input, out)
    }

    fn generate_flags(
        &mut self,
        field: &FieldHandle,
        clip_gate: usize,
        bad: Option<f32>,
        kernel: impl FnOnce(&[f32], &GateSpan<'_>) -> EditResult<BadFlagMask>,
    ) -> EditResult<FieldHandle> {
        let input = self.values_input(field, bad)?;
        let flags = {
            let span = self.span(clip_gate, input.missing)?;
            kernel(&input.values, &span)?
        };
        self.emit_flags(BAD_FLAGS_FIELD, flags)
    }

    pub fn remove_aircraft_motion(
        &mut self,
        field: &FieldHandle,
        nyquist: f32,
        clip_gate: usize,
        bad: Option<f32>,
    ) -> EditResult<FieldHandle> {
        let pose = self.pose()?.clone();
        let nyquist = if nyquist == 0.0 {
            self.nyquist_mps.unwrap_or(0.0)
        } else {
            nyquist
        };
        let elevation = self.elevation_deg;
        self.map_values(field, clip_gate, bad, |data, span, _| {
            kernels::remove_aircraft_motion(data, span, &pose, elevation, nyquist)
        })
    }

    pub fn bb_unfold(
        &mut self,
        field: &FieldHandle,
        reference: UnfoldReference,
        params: UnfoldParams,
        clip_gate: usize,
        bad: Option<f32>,
    ) -> EditResult<FieldHandle> {
        let params = UnfoldParams {
            nyquist: self.nyquist(params.nyquist)?,
            ..params
        };
        let input = self.values_input(field, bad)?;
        let span = GateSpan::new(self.n_gates, clip_gate, input.missing, &self.boundary)?;
        let (azimuth, elevation) = (self.azimuth_deg, self.elevation_deg);
        let out = match reference {
            UnfoldReference::FirstGoodGate => {
                kernels::unfold_first_good_gate(&input.values, &span, &params, &mut self.session)?
            }
            UnfoldReference::AircraftWind => {
                let pose = self.pose.as_ref().ok_or_else(|| {
                    crate::prelude::EditError::PoseUnavailable(format!(
                        "ray {} has no aircraft wind",
                        self.ray_index
                    ))
                })?;
                kernels::unfold_ac_wind(&input.values, &span, &params, pose, azimuth, elevation)?
            }
            UnfoldReference::LocalWind { ew_wind, ns_wind } => kernels::unfold_local_wind(
                &input.values,
                &span,
                &params,
                ew_wind,
                ns_wind,
                azimuth,
                elevation,
            )?,
        };
        self.emit_values(input, out)
    }

    pub fn force_unfold(
        &mut self,
        field: &FieldHandle,
        nyquist: f32,
        center: f32,
        clip_gate: usize,
        bad: Option<f32>,
    ) -> EditResult<FieldHandle> {
        let nyquist = self.nyquist(nyquist)?;
        self.map_values(field, clip_gate, bad, |data, span, _| {
            kernels::force_unfold(data, span, nyquist, center)
        })
    }

    pub fn despeckle(
        &mut self,
        field: &FieldHandle,
        speckle_length: usize,
        clip_gate: usize,
        bad: Option<f32>,
    ) -> EditResult<FieldHandle> {
        self.map_values(field, clip_gate, bad, |data, span, _| {
            kernels::despeckle(data, span, speckle_length)
        })
    }

    pub fn remove_ring(
        &mut self,
        field: &FieldHandle,
        from_km: f64,
        to_km: f64,
        clip_gate: usize,
        bad: Option<f32>,
    ) -> EditResult<FieldHandle> {
        self.map_values(field, clip_gate, bad, |data, span, ws| {
            kernels::remove_ring(data, span, &ws.range, from_km, to_km)
        })
    }

    pub fn set_bad_flags(
        &mut self,
        field: &FieldHandle,
        comparison: Comparison,
        clip_gate: usize,
        bad: Option<f32>,
    ) -> EditResult<FieldHandle> {
        self.generate_flags(field, clip_gate, bad, |data, span| {
            kernels::set_bad_flags(data, span, comparison)
        })
    }

    /// Combines into the mask referenced by `mask`, keeping its name.
    pub fn combine_bad_flags(
        &mut self,
        field: &FieldHandle,
        comparison: Comparison,
        op: FlagOp,
        clip_gate: usize,
        bad: Option<f32>,
        mask: &FieldHandle,
    ) -> EditResult<FieldHandle> {
        let (mask_name, prior) = self.flags_input(mask)?;
        let input = self.values_input(field, bad)?;
        let flags = {
            let span = self.span(clip_gate, input.missing)?;
            kernels::combine_bad_flags(&input.values, &span, comparison, op, &prior)?
        };
        self.emit_flags_into(mask, &mask_name, flags)
    }

    pub fn assert_bad_flags(
        &mut self,
        field: &FieldHandle,
        clip_gate: usize,
        bad: Option<f32>,
        mask: &FieldHandle,
    ) -> EditResult<FieldHandle> {
        let (_, flags) = self.flags_input(mask)?;
        self.map_values(field, clip_gate, bad, |data, span, _| {
            kernels::assert_bad_flags(data, span, &flags)
        })
    }

    pub fn clear_bad_flags(&mut self, mask: &FieldHandle) -> EditResult<FieldHandle> {
        let (mask_name, flags) = self.flags_input(mask)?;
        ensure_gates(&mask_name, self.n_gates, flags.len())?;
        let cleared = kernels::clear_bad_flags(self.n_gates);
        self.emit_flags_into(mask, &mask_name, cleared)
    }

    pub fn complement_bad_flags(&mut self, mask: &FieldHandle) -> EditResult<FieldHandle> {
        let (mask_name, flags) = self.flags_input(mask)?;
        ensure_gates(&mask_name, self.n_gates, flags.len())?;
        self.emit_flags_into(mask, &mask_name, kernels::complement_bad_flags(&flags))
    }

    pub fn copy_bad_flags(
        &mut self,
        field: &FieldHandle,
        clip_gate: usize,
        bad: Option<f32>,
    ) -> EditResult<FieldHandle> {
        self.generate_flags(field, clip_gate, bad, kernels::copy_bad_flags)
    }

    pub fn flagged_add(
        &mut self,
        field: &FieldHandle,
        constant: f32,
        clip_gate: usize,
        bad: Option<f32>,
        mask: &FieldHandle,
    ) -> EditResult<FieldHandle> {
        let (_, flags) = self.flags_input(mask)?;
        self.map_values(field, clip_gate, bad, |data, span, _| {
            kernels::flagged_add(data, span, &flags, constant)
        })
    }

    pub fn flagged_multiply(
        &mut self,
        field: &FieldHandle,
        constant: f32,
        clip_gate: usize,
        bad: Option<f32>,
        mask: &FieldHandle,
    ) -> EditResult<FieldHandle> {
        let (_, flags) = self.flags_input(mask)?;
        self.map_values(field, clip_gate, bad, |data, span, _| {
            kernels::flagged_multiply(data, span, &flags, constant)
        })
    }

    pub fn flagged_assign(
        &mut self,
        field: &FieldHandle,
        constant: f32,
        clip_gate: usize,
        mask: &FieldHandle,
    ) -> EditResult<FieldHandle> {
        let (_, flags) = self.flags_input(mask)?;
        self.map_values(field, clip_gate, None, |data, span, _| {
            kernels::flagged_assign(data, span, &flags, constant)
        })
    }

    /// Result is published under the target's name.
    pub fn flagged_copy(
        &mut self,
        source: &FieldHandle,
        target: &FieldHandle,
        clip_gate: usize,
        mask: &FieldHandle,
    ) -> EditResult<FieldHandle> {
        let (_, flags) = self.flags_input(mask)?;
        let source = self.values_input(source, None)?;
        self.map_values(target, clip_gate, None, |data, span, _| {
            kernels::flagged_copy(&source.values, data, span, &flags)
        })
    }

    pub fn flag_freckles(
        &mut self,
        field: &FieldHandle,
        threshold: f32,
        avg_count: usize,
        clip_gate: usize,
        bad: Option<f32>,
    ) -> EditResult<FieldHandle> {
        self.generate_flags(field, clip_gate, bad, |data, span| {
            kernels::flag_freckles(data, span, threshold, avg_count)
        })
    }

    pub fn flag_glitches(
        &mut self,
        field: &FieldHandle,
        threshold: f32,
        radius: usize,
        min_gates: usize,
        clip_gate: usize,
        bad: Option<f32>,
    ) -> EditResult<FieldHandle> {
        self.generate_flags(field, clip_gate, bad, |data, span| {
            kernels::flag_glitches(data, span, threshold, radius, min_gates)
        })
    }

    /// The threshold field is judged against its own missing sentinel.
    pub fn threshold(
        &mut self,
        field: &FieldHandle,
        threshold_field: &FieldHandle,
        comparison: Comparison,
        first_good_gate: usize,
        clip_gate: usize,
        bad: Option<f32>,
    ) -> EditResult<FieldHandle> {
        let reference = self.values_input(threshold_field, None)?;
        self.map_values(field, clip_gate, bad, |data, span, _| {
            kernels::threshold_field(
                data,
                span,
                &reference.values,
                reference.missing,
                comparison,
                first_good_gate,
            )
        })
    }

    pub fn zero_inside_boundary(
        &mut self,
        field: &FieldHandle,
        clip_gate: usize,
    ) -> EditResult<FieldHandle> {
        self.map_values(field, clip_gate, None, |data, span, _| {
            kernels::zero_inside_boundary(data, span)
        })
    }

    pub fn unconditional_delete(
        &mut self,
        field: &FieldHandle,
        clip_gate: usize,
        bad: Option<f32>,
    ) -> EditResult<FieldHandle> {
        self.map_values(field, clip_gate, bad, |data, span, _| {
            kernels::unconditional_delete(data, span)
        })
    }
}

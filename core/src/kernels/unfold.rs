use std::collections::VecDeque;

use crate::kernels::GateSpan;
use crate::math::StatsHelper;
use crate::prelude::{EditError, EditResult};
use crate::session::SweepSession;
use crate::volume::SensorPose;

/// Scalar controls shared by the Bargen-Brown unfolding kernels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnfoldParams {
    pub nyquist: f32,
    pub max_pos_folds: i32,
    pub max_neg_folds: i32,
    /// Width of the running-mean window that tracks the reference velocity.
    pub ngates_averaged: usize,
}

impl UnfoldParams {
    pub fn validate(&self) -> EditResult<()> {
        if !(self.nyquist > 0.0) {
            return Err(EditError::InvalidParameter(format!(
                "nyquist velocity must be positive, got {}",
                self.nyquist
            )));
        }
        if self.max_pos_folds < 0 || self.max_neg_folds < 0 {
            return Err(EditError::InvalidParameter(
                "fold limits must not be negative".into(),
            ));
        }
        if self.ngates_averaged == 0 {
            return Err(EditError::InvalidParameter(
                "ngates_averaged must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Unfolds against a reference carried from the previous ray of the sweep.
/// The session keeps this ray's first good unfolded gate for the next ray.
pub fn unfold_first_good_gate(
    data: &[f32],
    span: &GateSpan<'_>,
    params: &UnfoldParams,
    session: &mut SweepSession,
) -> EditResult<Vec<f32>> {
    let (out, first_good) = unfold_with_reference(data, span, params, session.last_good_v0)?;
    if first_good.is_some() {
        session.last_good_v0 = first_good;
    }
    Ok(out)
}

/// Unfolds against the aircraft-measured wind projected onto the beam.
pub fn unfold_ac_wind(
    data: &[f32],
    span: &GateSpan<'_>,
    params: &UnfoldParams,
    pose: &SensorPose,
    azimuth_deg: f64,
    elevation_deg: f64,
) -> EditResult<Vec<f32>> {
    let reference = project_wind(
        pose.ew_wind as f64,
        pose.ns_wind as f64,
        pose.vert_wind as f64,
        azimuth_deg,
        elevation_deg,
    );
    unfold_with_reference(data, span, params, Some(reference)).map(|(out, _)| out)
}

/// Unfolds against a caller-supplied horizontal wind.
pub fn unfold_local_wind(
    data: &[f32],
    span: &GateSpan<'_>,
    params: &UnfoldParams,
    ew_wind: f32,
    ns_wind: f32,
    azimuth_deg: f64,
    elevation_deg: f64,
) -> EditResult<Vec<f32>> {
    let reference = project_wind(ew_wind as f64, ns_wind as f64, 0.0, azimuth_deg, elevation_deg);
    unfold_with_reference(data, span, params, Some(reference)).map(|(out, _)| out)
}

/// Folds every good gate into `[center - nyquist, center + nyquist]`.
pub fn force_unfold(
    data: &[f32],
    span: &GateSpan<'_>,
    nyquist: f32,
    center: f32,
) -> EditResult<Vec<f32>> {
    span.check("velocity", data.len())?;
    if !(nyquist > 0.0) {
        return Err(EditError::InvalidParameter(format!(
            "nyquist velocity must be positive, got {}",
            nyquist
        )));
    }
    let interval = 2.0 * nyquist;
    let mut out = data.to_vec();
    for (gate, value) in out.iter_mut().enumerate() {
        if span.editable(gate) && span.is_good(*value) {
            let folds = ((center - *value) / interval).round();
            *value += folds * interval;
        }
    }
    Ok(out)
}

/// Radial component of a wind vector along the beam, m/s.
pub(crate) fn project_wind(ew: f64, ns: f64, vert: f64, azimuth_deg: f64, elevation_deg: f64) -> f32 {
    let (az, el) = (azimuth_deg.to_radians(), elevation_deg.to_radians());
    (el.cos() * (ew * az.sin() + ns * az.cos()) + el.sin() * vert) as f32
}

fn unfold_with_reference(
    data: &[f32],
    span: &GateSpan<'_>,
    params: &UnfoldParams,
    initial: Option<f32>,
) -> EditResult<(Vec<f32>, Option<f32>)> {
    span.check("velocity", data.len())?;
    params.validate()?;

    let interval = 2.0 * params.nyquist;
    let mut reference = initial;
    let mut window: VecDeque<f32> = VecDeque::with_capacity(params.ngates_averaged + 1);
    let mut first_good = None;
    let mut out = data.to_vec();

    for (gate, value) in out.iter_mut().enumerate() {
        if !span.editable(gate) || !span.is_good(*value) {
            continue;
        }
        let anchor = reference.unwrap_or(*value);
        let folds = (((anchor - *value) / interval).round() as i32)
            .clamp(-params.max_neg_folds, params.max_pos_folds);
        *value += folds as f32 * interval;
        first_good.get_or_insert(*value);

        window.push_back(*value);
        if window.len() > params.ngates_averaged {
            window.pop_front();
        }
        reference = StatsHelper::mean(window.make_contiguous());
    }
    Ok((out, first_good))
}

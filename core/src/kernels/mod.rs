//! Per-ray numeric kernels.
//!
//! Every kernel reads one or more gate arrays of the current ray and returns
//! a new array or bad-flag mask. Gates at or beyond the clip gate, and gates
//! outside the boundary mask, are copied through unchanged. Missing gates
//! never count as samples.

pub mod deglitch;
pub mod despeckle;
pub mod erase;
pub mod flagged;
pub mod flags;
pub mod motion;
pub mod ring;
pub mod threshold;
pub mod unfold;

pub use deglitch::{flag_freckles, flag_glitches};
pub use despeckle::despeckle;
pub use erase::{unconditional_delete, zero_inside_boundary};
pub use flagged::{flagged_add, flagged_assign, flagged_copy, flagged_multiply};
pub use flags::{
    assert_bad_flags, clear_bad_flags, combine_bad_flags, combine_masks, complement_bad_flags,
    copy_bad_flags, set_bad_flags, Comparison, FlagOp,
};
pub use motion::remove_aircraft_motion;
pub use ring::remove_ring;
pub use threshold::threshold_field;
pub use unfold::{
    force_unfold, unfold_ac_wind, unfold_first_good_gate, unfold_local_wind, UnfoldParams,
};

use crate::mask::BoundaryMask;
use crate::prelude::{ensure_gates, EditResult};

/// Which gates of a ray a kernel may touch, and how missing data looks.
#[derive(Debug, Clone, Copy)]
pub struct GateSpan<'a> {
    pub n_gates: usize,
    pub clip_gate: usize,
    pub missing: f32,
    boundary: &'a [bool],
}

impl<'a> GateSpan<'a> {
    pub fn new(
        n_gates: usize,
        clip_gate: usize,
        missing: f32,
        boundary: &'a BoundaryMask,
    ) -> EditResult<Self> {
        ensure_gates("boundary mask", n_gates, boundary.len())?;
        Ok(Self {
            n_gates,
            clip_gate,
            missing,
            boundary,
        })
    }

    /// Same span with a different missing sentinel.
    pub fn with_missing(self, missing: f32) -> Self {
        Self { missing, ..self }
    }

    pub fn editable(&self, gate: usize) -> bool {
        gate < self.clip_gate && gate < self.n_gates && self.boundary[gate]
    }

    pub fn is_good(&self, value: f32) -> bool {
        value != self.missing
    }

    pub fn check(&self, what: &str, len: usize) -> EditResult<()> {
        ensure_gates(what, self.n_gates, len)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    pub const BAD: f32 = -9999.0;

    pub fn open_mask(n: usize) -> BoundaryMask {
        BoundaryMask::unrestricted(n)
    }

    pub fn span(mask: &BoundaryMask, clip_gate: usize) -> GateSpan<'_> {
        GateSpan::new(mask.len(), clip_gate, BAD, mask).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use crate::prelude::EditError;

    #[test]
    fn short_boundary_mask_is_rejected() {
        let mask = BoundaryMask::unrestricted(3);
        let err = GateSpan::new(5, 5, BAD, &mask).unwrap_err();
        assert_eq!(err, EditError::mismatch("boundary mask", 5, 3));
    }

    #[test]
    fn editable_honours_clip_and_boundary() {
        let mask = BoundaryMask::from_gates(vec![true, false, true, true]);
        let span = GateSpan::new(4, 3, BAD, &mask).unwrap();
        let editable: Vec<bool> = (0..4).map(|g| span.editable(g)).collect();
        assert_eq!(editable, vec![true, false, true, false]);
    }

    #[test]
    fn clip_gate_tail_is_untouched_by_every_kernel() {
        let data = vec![1.0, 9.0, BAD, 4.0, 7.0, 12.0, 3.0, 8.0];
        let other = vec![-3.0; 8];
        let bad = crate::mask::BadFlagMask::from_gates(vec![true; 8]);
        let prior = crate::mask::BadFlagMask::from_gates(
            (0..8).map(|g| g % 3 == 0).collect(),
        );
        let mask = open_mask(8);
        let span = span(&mask, 4);
        let params = UnfoldParams {
            nyquist: 2.0,
            max_pos_folds: 3,
            max_neg_folds: 3,
            ngates_averaged: 2,
        };
        let pose = crate::volume::SensorPose {
            tilt: 20.0,
            ew_velocity: 120.0,
            ns_velocity: 30.0,
            ew_wind: 6.0,
            ns_wind: -4.0,
            ..Default::default()
        };
        let range = crate::volume::RangeGeometry::new(0.0, 1.0);
        let mut session = crate::session::SweepSession::default();
        let outputs = vec![
            despeckle(&data, &span, 2).unwrap(),
            unconditional_delete(&data, &span).unwrap(),
            zero_inside_boundary(&data, &span).unwrap(),
            remove_ring(&data, &span, &range, 0.0, 8.0).unwrap(),
            flagged_add(&data, &span, &bad, 5.0).unwrap(),
            flagged_multiply(&data, &span, &bad, 5.0).unwrap(),
            flagged_assign(&data, &span, &bad, 5.0).unwrap(),
            flagged_copy(&other, &data, &span, &bad).unwrap(),
            assert_bad_flags(&data, &span, &bad).unwrap(),
            remove_aircraft_motion(&data, &span, &pose, 1.0, 2.0).unwrap(),
            force_unfold(&data, &span, 2.0, 0.0).unwrap(),
            unfold_first_good_gate(&data, &span, &params, &mut session).unwrap(),
            unfold_ac_wind(&data, &span, &params, &pose, 45.0, 1.0).unwrap(),
            unfold_local_wind(&data, &span, &params, 6.0, -4.0, 45.0, 1.0).unwrap(),
            threshold_field(&data, &span, &data, BAD, Comparison::Above(0.0), 0).unwrap(),
        ];
        for out in outputs {
            assert_eq!(&out[4..], &data[4..]);
        }

        let generated = vec![
            set_bad_flags(&data, &span, Comparison::Above(0.0)).unwrap(),
            copy_bad_flags(&[BAD; 8], &span).unwrap(),
            flag_freckles(&data, &span, 1.0, 1).unwrap(),
            flag_glitches(&data, &span, 1.0, 2, 1).unwrap(),
        ];
        for flags in generated {
            assert!(flags[4..].iter().all(|&f| !f));
        }
        let combined =
            combine_bad_flags(&data, &span, Comparison::Above(0.0), FlagOp::Xor, &prior).unwrap();
        assert_eq!(&combined[4..], &prior[4..]);
    }
}

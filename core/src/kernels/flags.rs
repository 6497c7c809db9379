//! Bad-flag generation and flag algebra.
//!
//! All threshold flaggers share one pass parameterized by a [`Comparison`]
//! and, for the combinators, a [`FlagOp`].

use crate::kernels::GateSpan;
use crate::mask::BadFlagMask;
use crate::prelude::{EditError, EditResult};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Comparison {
    Above(f32),
    Below(f32),
    /// Inclusive on both ends.
    Between(f32, f32),
}

impl Comparison {
    pub fn validate(&self) -> EditResult<()> {
        match *self {
            Comparison::Between(lower, upper) if lower > upper => {
                Err(EditError::InvalidParameter(format!(
                    "lower threshold {} exceeds upper threshold {}",
                    lower, upper
                )))
            }
            _ => Ok(()),
        }
    }

    pub fn holds(&self, value: f32) -> bool {
        match *self {
            Comparison::Above(threshold) => value > threshold,
            Comparison::Below(threshold) => value < threshold,
            Comparison::Between(lower, upper) => lower <= value && value <= upper,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagOp {
    And,
    Or,
    Xor,
}

impl FlagOp {
    pub fn apply(self, prior: bool, condition: bool) -> bool {
        match self {
            FlagOp::And => prior && condition,
            FlagOp::Or => prior || condition,
            FlagOp::Xor => prior ^ condition,
        }
    }
}

/// Shared gate loop: editable gates take `on_editable(gate, condition)`,
/// the others `otherwise(gate)`. `condition` is false for missing data.
fn flag_pass(
    data: &[f32],
    span: &GateSpan<'_>,
    comparison: Comparison,
    on_editable: impl Fn(usize, bool) -> bool,
    otherwise: impl Fn(usize) -> bool,
) -> EditResult<BadFlagMask> {
    span.check("flag input", data.len())?;
    comparison.validate()?;
    let gates = data
        .iter()
        .enumerate()
        .map(|(gate, &value)| {
            if span.editable(gate) {
                on_editable(gate, span.is_good(value) && comparison.holds(value))
            } else {
                otherwise(gate)
            }
        })
        .collect();
    Ok(BadFlagMask::from_gates(gates))
}

/// New mask flagging good editable gates that satisfy `comparison`.
pub fn set_bad_flags(
    data: &[f32],
    span: &GateSpan<'_>,
    comparison: Comparison,
) -> EditResult<BadFlagMask> {
    flag_pass(data, span, comparison, |_, condition| condition, |_| false)
}

/// Combines `prior` with the comparison result; non-editable gates keep `prior`.
pub fn combine_bad_flags(
    data: &[f32],
    span: &GateSpan<'_>,
    comparison: Comparison,
    op: FlagOp,
    prior: &BadFlagMask,
) -> EditResult<BadFlagMask> {
    span.check("bad flag mask", prior.len())?;
    flag_pass(
        data,
        span,
        comparison,
        |gate, condition| op.apply(prior[gate], condition),
        |gate| prior[gate],
    )
}

/// Flags every editable gate that holds missing data.
pub fn copy_bad_flags(data: &[f32], span: &GateSpan<'_>) -> EditResult<BadFlagMask> {
    span.check("flag input", data.len())?;
    let gates = data
        .iter()
        .enumerate()
        .map(|(gate, &value)| span.editable(gate) && !span.is_good(value))
        .collect();
    Ok(BadFlagMask::from_gates(gates))
}

/// Replaces flagged editable gates with the missing sentinel.
pub fn assert_bad_flags(
    data: &[f32],
    span: &GateSpan<'_>,
    flags: &BadFlagMask,
) -> EditResult<Vec<f32>> {
    span.check("assert input", data.len())?;
    span.check("bad flag mask", flags.len())?;
    Ok(data
        .iter()
        .enumerate()
        .map(|(gate, &value)| {
            if span.editable(gate) && flags[gate] {
                span.missing
            } else {
                value
            }
        })
        .collect())
}

pub fn clear_bad_flags(n_gates: usize) -> BadFlagMask {
    BadFlagMask::cleared(n_gates)
}

pub fn complement_bad_flags(flags: &BadFlagMask) -> BadFlagMask {
    flags.complement()
}

/// Gate-by-gate `op` of two masks.
pub fn combine_masks(a: &BadFlagMask, b: &BadFlagMask, op: FlagOp) -> EditResult<BadFlagMask> {
    a.combine(b, |x, y| op.apply(x, y))
}

use crate::kernels::GateSpan;
use crate::mask::BadFlagMask;
use crate::prelude::EditResult;

fn flagged_pass(
    data: &[f32],
    span: &GateSpan<'_>,
    flags: &BadFlagMask,
    skip_missing: bool,
    edit: impl Fn(usize, f32) -> f32,
) -> EditResult<Vec<f32>> {
    span.check("flagged input", data.len())?;
    span.check("bad flag mask", flags.len())?;
    Ok(data
        .iter()
        .enumerate()
        .map(|(gate, &value)| {
            let eligible = span.editable(gate) && flags[gate];
            if eligible && !(skip_missing && !span.is_good(value)) {
                edit(gate, value)
            } else {
                value
            }
        })
        .collect())
}

pub fn flagged_add(
    data: &[f32],
    span: &GateSpan<'_>,
    flags: &BadFlagMask,
    constant: f32,
) -> EditResult<Vec<f32>> {
    flagged_pass(data, span, flags, true, |_, value| value + constant)
}

pub fn flagged_multiply(
    data: &[f32],
    span: &GateSpan<'_>,
    flags: &BadFlagMask,
    constant: f32,
) -> EditResult<Vec<f32>> {
    flagged_pass(data, span, flags, true, |_, value| value * constant)
}

/// Flagged gates take `constant`, including gates that were missing.
pub fn flagged_assign(
    data: &[f32],
    span: &GateSpan<'_>,
    flags: &BadFlagMask,
    constant: f32,
) -> EditResult<Vec<f32>> {
    flagged_pass(data, span, flags, false, |_, _| constant)
}

/// Copies `source` into `target` on flagged gates.
pub fn flagged_copy(
    source: &[f32],
    target: &[f32],
    span: &GateSpan<'_>,
    flags: &BadFlagMask,
) -> EditResult<Vec<f32>> {
    span.check("copy source", source.len())?;
    flagged_pass(target, span, flags, false, |gate, _| source[gate])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernels::testing::*;

    fn flags() -> BadFlagMask {
        BadFlagMask::from_gates(vec![true, true, false, true])
    }

    #[test]
    fn add_and_multiply_touch_flagged_good_gates() {
        let data = vec![1.0, BAD, 3.0, 4.0];
        let mask = open_mask(4);
        let span = span(&mask, 4);
        assert_eq!(
            flagged_add(&data, &span, &flags(), 10.0).unwrap(),
            vec![11.0, BAD, 3.0, 14.0]
        );
        assert_eq!(
            flagged_multiply(&data, &span, &flags(), 2.0).unwrap(),
            vec![2.0, BAD, 3.0, 8.0]
        );
    }

    #[test]
    fn assign_and_copy_replace_flagged_gates_before_the_clip() {
        let data = vec![1.0, BAD, 3.0, 4.0];
        let mask = open_mask(4);
        let span = span(&mask, 3);
        assert_eq!(
            flagged_assign(&data, &span, &flags(), 0.5).unwrap(),
            vec![0.5, 0.5, 3.0, 4.0]
        );
        let source = vec![7.0, 8.0, 9.0, 10.0];
        assert_eq!(
            flagged_copy(&source, &data, &span, &flags()).unwrap(),
            vec![7.0, 8.0, 3.0, 4.0]
        );
    }

    #[test]
    fn short_mask_is_a_dimension_mismatch() {
        let mask = open_mask(4);
        let short = BadFlagMask::cleared(2);
        assert!(flagged_add(&[0.0; 4], &span(&mask, 4), &short, 1.0).is_err());
    }
}

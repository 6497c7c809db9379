use crate::kernels::GateSpan;
use crate::prelude::{EditError, EditResult};

/// Blanks isolated runs of good gates no longer than `speckle_length`.
///
/// Missing gates and gates the span forbids end a run.
pub fn despeckle(data: &[f32], span: &GateSpan<'_>, speckle_length: usize) -> EditResult<Vec<f32>> {
    span.check("despeckle input", data.len())?;
    if speckle_length == 0 {
        return Err(EditError::InvalidParameter(
            "speckle length must be at least 1".into(),
        ));
    }

    let mut out = data.to_vec();
    let mut run_start = None;
    for gate in 0..=data.len() {
        let in_run = gate < data.len() && span.editable(gate) && span.is_good(data[gate]);
        match (in_run, run_start) {
            (true, None) => run_start = Some(gate),
            (false, Some(start)) => {
                if gate - start <= speckle_length {
                    out[start..gate].fill(span.missing);
                }
                run_start = None;
            }
            _ => {}
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernels::testing::*;
    use crate::mask::BoundaryMask;

    #[test]
    fn short_runs_are_removed_long_runs_kept() {
        let data = vec![1.0, BAD, 2.0, 3.0, BAD, 4.0, 5.0, 6.0, BAD, 7.0];
        let mask = open_mask(10);
        let out = despeckle(&data, &span(&mask, 10), 2).unwrap();
        assert_eq!(
            out,
            vec![BAD, BAD, BAD, BAD, BAD, 4.0, 5.0, 6.0, BAD, BAD]
        );
    }

    #[test]
    fn despeckle_is_idempotent() {
        let data = vec![3.0, 3.5, BAD, 1.0, BAD, BAD, 2.0, 2.0, 2.0, 8.0, BAD, 4.0];
        let mask = BoundaryMask::from_gates(vec![
            true, true, true, true, true, false, true, true, true, true, true, true,
        ]);
        let span = span(&mask, 11);
        let once = despeckle(&data, &span, 2).unwrap();
        let twice = despeckle(&once, &span, 2).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn masked_gate_breaks_a_run_without_being_touched() {
        let data = vec![1.0, 2.0, 3.0];
        let mask = BoundaryMask::from_gates(vec![true, false, true]);
        let out = despeckle(&data, &span(&mask, 3), 1).unwrap();
        assert_eq!(out, vec![BAD, 2.0, BAD]);
    }
}

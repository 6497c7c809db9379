use crate::kernels::flags::Comparison;
use crate::kernels::GateSpan;
use crate::prelude::EditResult;

/// Blanks gates of `data` according to a second field.
///
/// From `first_good_gate` on, a good editable gate becomes missing when the
/// threshold field is missing there (by its own sentinel) or satisfies
/// `comparison`.
pub fn threshold_field(
    data: &[f32],
    span: &GateSpan<'_>,
    threshold: &[f32],
    threshold_missing: f32,
    comparison: Comparison,
    first_good_gate: usize,
) -> EditResult<Vec<f32>> {
    span.check("threshold input", data.len())?;
    span.check("threshold field", threshold.len())?;
    comparison.validate()?;

    let mut out = data.to_vec();
    for gate in first_good_gate..data.len() {
        if !span.editable(gate) || !span.is_good(data[gate]) {
            continue;
        }
        let reference = threshold[gate];
        if reference == threshold_missing || comparison.holds(reference) {
            out[gate] = span.missing;
        }
    }
    Ok(out)
}

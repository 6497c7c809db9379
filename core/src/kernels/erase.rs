use crate::kernels::GateSpan;
use crate::prelude::EditResult;

fn fill_editable(data: &[f32], span: &GateSpan<'_>, fill: f32) -> EditResult<Vec<f32>> {
    span.check("erase input", data.len())?;
    Ok(data
        .iter()
        .enumerate()
        .map(|(gate, &value)| if span.editable(gate) { fill } else { value })
        .collect())
}

pub fn zero_inside_boundary(data: &[f32], span: &GateSpan<'_>) -> EditResult<Vec<f32>> {
    fill_editable(data, span, 0.0)
}

pub fn unconditional_delete(data: &[f32], span: &GateSpan<'_>) -> EditResult<Vec<f32>> {
    fill_editable(data, span, span.missing)
}

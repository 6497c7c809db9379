use crate::kernels::GateSpan;
use crate::prelude::{EditError, EditResult};
use crate::volume::RangeGeometry;

/// Blanks every editable gate between two ranges, inclusive of both end cells.
pub fn remove_ring(
    data: &[f32],
    span: &GateSpan<'_>,
    geometry: &RangeGeometry,
    from_km: f64,
    to_km: f64,
) -> EditResult<Vec<f32>> {
    span.check("ring input", data.len())?;
    if geometry.gate_spacing_km <= 0.0 {
        return Err(EditError::InvalidParameter(format!(
            "gate spacing must be positive, got {}",
            geometry.gate_spacing_km
        )));
    }
    if from_km > to_km {
        return Err(EditError::InvalidParameter(format!(
            "ring starts at {} km but ends at {} km",
            from_km, to_km
        )));
    }

    let mut out = data.to_vec();
    if data.is_empty() {
        return Ok(out);
    }
    let first = geometry.cell_at(from_km, data.len());
    let last = (geometry.cell_at(to_km, data.len()) + 1).min(span.clip_gate);
    for gate in first..last {
        if span.editable(gate) {
            out[gate] = span.missing;
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernels::testing::*;

    #[test]
    fn ring_from_two_to_four_km_blanks_gates_two_to_four() {
        let data: Vec<f32> = (0..10).map(|g| g as f32 * 1.5).collect();
        let mask = open_mask(10);
        let out = remove_ring(&data, &span(&mask, 10), &RangeGeometry::new(0.0, 1.0), 2.0, 4.0)
            .unwrap();
        for gate in 0..10 {
            if (2..=4).contains(&gate) {
                assert_eq!(out[gate], BAD);
            } else {
                assert_eq!(out[gate], data[gate]);
            }
        }
    }

    #[test]
    fn ring_stops_at_the_clip_gate() {
        let data = vec![1.0; 6];
        let mask = open_mask(6);
        let out =
            remove_ring(&data, &span(&mask, 3), &RangeGeometry::new(0.0, 1.0), 1.0, 5.0).unwrap();
        assert_eq!(out, vec![1.0, BAD, BAD, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn reversed_interval_is_invalid() {
        let mask = open_mask(2);
        let err = remove_ring(&[1.0, 1.0], &span(&mask, 2), &RangeGeometry::default(), 3.0, 1.0)
            .unwrap_err();
        assert!(matches!(err, EditError::InvalidParameter(_)));
    }
}

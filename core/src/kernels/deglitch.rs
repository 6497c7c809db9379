use std::collections::VecDeque;

use crate::kernels::GateSpan;
use crate::mask::BadFlagMask;
use crate::math::StatsHelper;
use crate::prelude::{EditError, EditResult};

fn positive_threshold(threshold: f32) -> EditResult<()> {
    if threshold >= 0.0 {
        Ok(())
    } else {
        Err(EditError::InvalidParameter(format!(
            "deviation threshold must not be negative, got {}",
            threshold
        )))
    }
}

/// Flags gates that jump away from the mean of the preceding `avg_count`
/// good gates. The window restarts after any missing or non-editable gate.
pub fn flag_freckles(
    data: &[f32],
    span: &GateSpan<'_>,
    threshold: f32,
    avg_count: usize,
) -> EditResult<BadFlagMask> {
    span.check("freckle input", data.len())?;
    positive_threshold(threshold)?;
    if avg_count == 0 {
        return Err(EditError::InvalidParameter("average count must be at least 1".into()));
    }

    let mut window: VecDeque<f32> = VecDeque::with_capacity(avg_count + 1);
    let mut flags = vec![false; data.len()];
    for (gate, &value) in data.iter().enumerate() {
        if !span.editable(gate) || !span.is_good(value) {
            window.clear();
            continue;
        }
        if window.len() == avg_count {
            let mean = StatsHelper::mean(window.make_contiguous()).unwrap_or(value);
            if (value - mean).abs() > threshold {
                flags[gate] = true;
                continue;
            }
        }
        window.push_back(value);
        if window.len() > avg_count {
            window.pop_front();
        }
    }
    Ok(BadFlagMask::from_gates(flags))
}

/// Flags gates that differ from the mean of their good neighbours within
/// `radius` gates by more than `threshold`. Gates with fewer than
/// `min_gates` good neighbours are left unflagged.
pub fn flag_glitches(
    data: &[f32],
    span: &GateSpan<'_>,
    threshold: f32,
    radius: usize,
    min_gates: usize,
) -> EditResult<BadFlagMask> {
    span.check("glitch input", data.len())?;
    positive_threshold(threshold)?;
    if radius == 0 || min_gates == 0 || min_gates > 2 * radius {
        return Err(EditError::InvalidParameter(format!(
            "need 1 <= min_gates ({}) <= 2 * radius ({})",
            min_gates, radius
        )));
    }

    let mut neighbours = Vec::with_capacity(2 * radius);
    let mut flags = vec![false; data.len()];
    for (gate, &value) in data.iter().enumerate() {
        if !span.editable(gate) || !span.is_good(value) {
            continue;
        }
        neighbours.clear();
        let lo = gate.saturating_sub(radius);
        let hi = (gate + radius + 1).min(data.len());
        neighbours.extend(
            (lo..hi)
                .filter(|&other| other != gate && span.is_good(data[other]))
                .map(|other| data[other]),
        );
        if neighbours.len() < min_gates {
            continue;
        }
        if let Some(mean) = StatsHelper::mean(&neighbours) {
            flags[gate] = (value - mean).abs() > threshold;
        }
    }
    Ok(BadFlagMask::from_gates(flags))
}

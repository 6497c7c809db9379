//! Rasterizes an authored boundary polygon onto the gates of one ray.
//!
//! The polygon is given in kilometers relative to the sensor. Each gate is
//! projected onto the ground plane along the beam's effective azimuth and
//! kept iff it falls inside the polygon.

mod beam;

pub use beam::{effective_azimuth, BeamGeometry};

use crate::mask::BoundaryMask;
use crate::math::Polygon;
use crate::prelude::EditResult;
use serde::{Deserialize, Serialize};

/// User-drawn boundary, vertices in kilometers `(east, north)` of the sensor.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundaryPolygon {
    pub vertices_km: Vec<(f64, f64)>,
}

impl BoundaryPolygon {
    pub fn new(vertices_km: Vec<(f64, f64)>) -> Self {
        Self { vertices_km }
    }

    /// Fewer than three vertices means no restriction.
    pub fn is_degenerate(&self) -> bool {
        self.vertices_km.len() < 3
    }

    fn in_meters(&self) -> Polygon {
        Polygon::new(self.vertices_km.clone()).scaled(1000.0)
    }
}

pub fn compute_boundary_mask(
    polygon: &BoundaryPolygon,
    beam: &BeamGeometry<'_>,
) -> EditResult<BoundaryMask> {
    if polygon.is_degenerate() {
        return Ok(BoundaryMask::unrestricted(beam.n_gates));
    }
    let azimuth = effective_azimuth(beam)?.to_radians();
    let ground = beam.elevation_deg.to_radians().cos();
    let meters = polygon.in_meters();

    let gates = (0..beam.n_gates)
        .map(|gate| {
            let range_m = beam.range.gate_range_km(gate) * 1000.0 * ground;
            meters.contains(range_m * azimuth.sin(), range_m * azimuth.cos())
        })
        .collect();
    Ok(BoundaryMask::from_gates(gates))
}

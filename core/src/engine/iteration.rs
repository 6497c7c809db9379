use std::collections::HashMap;

use crate::engine::report::{RayFailure, RunReport};
use crate::engine::workspace::RayWorkspace;
use crate::geometry::{compute_boundary_mask, effective_azimuth, BeamGeometry, BoundaryPolygon};
use crate::lifecycle::{FieldHandle, FieldLifecycle, FieldState, ProvisionalId};
use crate::mask::BoundaryMask;
use crate::prelude::{EditError, EditResult, MISSING_FL32};
use crate::script::{ScriptHost, ScriptOutput, ScriptOutputs};
use crate::session::SweepSession;
use crate::telemetry::{LogManager, MetricsRecorder, MetricsSnapshot};
use crate::volume::{FieldData, PrimaryAxis, RangeGeometry, VolumeModel};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    MaskReady,
    ScriptRunning,
    Harvesting,
    Done,
}

/// Memo key of the last boundary mask. Holds every beam input the mask
/// depends on; all but the gate count are zero while the boundary is off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct MaskKey {
    applies: bool,
    n_gates: usize,
    azimuth_bits: u64,
    elevation_bits: u64,
    start_range_bits: u32,
    gate_spacing_bits: u32,
}

impl MaskKey {
    fn unrestricted(n_gates: usize) -> Self {
        Self {
            applies: false,
            n_gates,
            azimuth_bits: 0,
            elevation_bits: 0,
            start_range_bits: 0,
            gate_spacing_bits: 0,
        }
    }

    fn for_beam(beam: &BeamGeometry<'_>, azimuth: f64) -> Self {
        Self {
            applies: true,
            n_gates: beam.n_gates,
            azimuth_bits: azimuth.to_bits(),
            elevation_bits: beam.elevation_deg.to_bits(),
            start_range_bits: beam.range.start_range_km.to_bits(),
            gate_spacing_bits: beam.range.gate_spacing_km.to_bits(),
        }
    }
}

/// Runs one script per ray over a volume, committing what each evaluation
/// produces back into the volume.
pub struct RayIterationEngine<H: ScriptHost> {
    host: H,
    polygon: BoundaryPolygon,
    use_boundary: bool,
    mask_cache: Option<(MaskKey, BoundaryMask)>,
    session: SweepSession,
    state: EngineState,
    logger: LogManager,
    metrics: MetricsRecorder,
}

impl<H: ScriptHost> RayIterationEngine<H> {
    pub fn new(host: H) -> Self {
        Self {
            host,
            polygon: BoundaryPolygon::default(),
            use_boundary: false,
            mask_cache: None,
            session: SweepSession::default(),
            state: EngineState::Idle,
            logger: LogManager::new("engine"),
            metrics: MetricsRecorder::new(),
        }
    }

    pub fn set_boundary(&mut self, polygon: BoundaryPolygon, enabled: bool) {
        self.polygon = polygon;
        self.use_boundary = enabled;
        self.mask_cache = None;
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Evaluates a setup script with no ray bound.
    pub fn run_once(&mut self, script: &str) -> EditResult<()> {
        self.logger.record("running one-time script");
        self.host.run_once(script)
    }

    /// Evaluates `script` once per ray, in volume order.
    ///
    /// A script that fails to compile aborts the run. Any failure inside a
    /// ray is recorded in the report and the loop moves on.
    pub fn run_for_each_ray<V: VolumeModel>(
        &mut self,
        volume: &mut V,
        script: &str,
    ) -> EditResult<RunReport> {
        self.host.load(script)?;
        self.metrics.reset();
        self.session.reset();
        self.state = EngineState::Idle;

        let axis = volume.primary_axis();
        let range = volume.predominant_range_geometry();
        let mut current_sweep = None;
        let mut report = RunReport::default();
        self.logger.record(&format!(
            "processing {} rays, boundary {}",
            volume.ray_count(),
            if self.boundary_applies() { "on" } else { "off" }
        ));

        for ray_index in 0..volume.ray_count() {
            match self.process_ray(volume, ray_index, axis, range, &mut current_sweep) {
                Ok(names) => {
                    self.metrics.record_processed();
                    self.metrics.record_committed(names.len());
                    report.rays_processed += 1;
                    report.committed_fields.extend(names);
                }
                Err(error) => {
                    self.logger
                        .warn(&format!("ray {} skipped: {}", ray_index, error));
                    self.metrics.record_error();
                    report.rays_failed += 1;
                    report.failures.push(RayFailure {
                        ray_index,
                        kind: error.kind(),
                        message: error.to_string(),
                    });
                }
            }
            self.state = EngineState::Idle;
        }

        self.state = EngineState::Done;
        let snapshot = self.metrics.snapshot();
        report.fields_committed = snapshot.fields_committed;
        report.masks_computed = snapshot.masks_computed;
        self.logger.record(&format!(
            "done: {} processed, {} failed, {} fields committed",
            report.rays_processed, report.rays_failed, report.fields_committed
        ));
        Ok(report)
    }

    fn boundary_applies(&self) -> bool {
        self.use_boundary && !self.polygon.is_degenerate()
    }

    fn process_ray<V: VolumeModel>(
        &mut self,
        volume: &mut V,
        ray_index: usize,
        axis: PrimaryAxis,
        range: RangeGeometry,
        current_sweep: &mut Option<usize>,
    ) -> EditResult<Vec<String>> {
        let pose = volume.georeference(ray_index).ok();
        let ray = volume.ray(ray_index)?;
        if *current_sweep != Some(ray.sweep_index) {
            self.logger
                .detail(&format!("sweep {} starts at ray {}", ray.sweep_index, ray_index));
            self.session.reset();
            *current_sweep = Some(ray.sweep_index);
        }

        let beam = BeamGeometry {
            n_gates: ray.n_gates,
            range: ray.range,
            azimuth_deg: ray.azimuth_deg as f64,
            elevation_deg: ray.elevation_deg as f64,
            axis,
            pose: pose.as_ref(),
        };
        let boundary = self.boundary_for(&beam)?;
        self.state = EngineState::MaskReady;

        let mut workspace = RayWorkspace::for_ray(ray, range, boundary, self.session)?;
        workspace.pose = pose;

        self.state = EngineState::ScriptRunning;
        let outputs = self.host.evaluate_ray(&mut workspace)?;

        self.state = EngineState::Harvesting;
        harvest(&mut workspace.lifecycle, outputs)?;
        let staged: Vec<_> = workspace.lifecycle.staged().cloned().collect();
        let names: Vec<String> = staged.iter().map(|field| field.name.clone()).collect();
        for field in staged {
            volume.add_field(ray_index, field)?;
        }
        let discarded = workspace.lifecycle.discard_uncommitted();
        if discarded > 0 {
            self.logger.detail(&format!(
                "ray {}: discarded {} uncommitted fields",
                ray_index, discarded
            ));
        }
        self.session = workspace.session;
        Ok(names)
    }

    fn boundary_for(&mut self, beam: &BeamGeometry<'_>) -> EditResult<BoundaryMask> {
        let applies = self.boundary_applies();
        let key = if applies {
            MaskKey::for_beam(beam, effective_azimuth(beam)?)
        } else {
            MaskKey::unrestricted(beam.n_gates)
        };
        if let Some((cached, mask)) = &self.mask_cache {
            if *cached == key {
                return Ok(mask.clone());
            }
        }

        let mask = if applies {
            compute_boundary_mask(&self.polygon, beam)?
        } else {
            BoundaryMask::unrestricted(beam.n_gates)
        };
        self.metrics.record_mask();
        self.mask_cache = Some((key, mask.clone()));
        Ok(mask)
    }
}

/// Commits every script output under the name the script gave it.
fn harvest(lifecycle: &mut FieldLifecycle, outputs: ScriptOutputs) -> EditResult<()> {
    let mut committed_as: HashMap<ProvisionalId, String> = HashMap::new();
    for (name, output) in outputs {
        match output {
            ScriptOutput::Values(values) => {
                commit_new(lifecycle, &name, FieldData::Values(values))?;
            }
            ScriptOutput::Flags(flags) => {
                commit_new(lifecycle, &name, FieldData::Flags(flags))?;
            }
            ScriptOutput::Handle(FieldHandle::Provisional(id)) => match lifecycle.state(id) {
                Some(FieldState::Provisional) => {
                    lifecycle.commit(id, &name)?;
                    committed_as.insert(id, name);
                }
                Some(FieldState::Committed) => {
                    let first = committed_as.get(&id).cloned().ok_or_else(|| {
                        EditError::StaleHandle(format!("{} was committed elsewhere", name))
                    })?;
                    lifecycle.duplicate(&FieldHandle::Committed(first), &name)?;
                }
                _ => {
                    return Err(EditError::StaleHandle(format!(
                        "{} refers to a discarded field",
                        name
                    )))
                }
            },
            ScriptOutput::Handle(FieldHandle::Committed(source)) => {
                if source != name {
                    lifecycle.duplicate(&FieldHandle::Committed(source), &name)?;
                }
            }
        }
    }
    Ok(())
}

fn commit_new(lifecycle: &mut FieldLifecycle, name: &str, data: FieldData) -> EditResult<()> {
    let handle = lifecycle.create_provisional(name, "", MISSING_FL32, data)?;
    if let Some(id) = handle.provisional_id() {
        lifecycle.commit(id, name)?;
    }
    Ok(())
}

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use rhai::{Array, Dynamic, Engine, OptimizationLevel, Scope, AST};

use crate::engine::RayWorkspace;
use crate::lifecycle::FieldHandle;
use crate::prelude::{EditError, EditResult};
use crate::script::args::{gate_array, GateArray};
use crate::script::bindings::{register_kernels, SharedWorkspace};
use crate::script::{ScriptHost, ScriptOutput, ScriptOutputs};
use crate::telemetry::LogManager;
use crate::volume::FieldData;

/// Name under which the ray's boundary mask is exposed.
pub const BOUNDARY_BINDING: &str = "BOUNDARY";

/// [`ScriptHost`] backed by an embedded rhai engine.
///
/// Field arrays are bound as script variables for each ray. After the
/// evaluation, every variable the script introduced that holds an array,
/// and every variable holding a provisional handle, becomes an output.
pub struct RhaiScriptHost {
    engine: Engine,
    shared: SharedWorkspace,
    globals: Scope<'static>,
    ast: Option<AST>,
    logger: LogManager,
}

impl RhaiScriptHost {
    pub fn new() -> Self {
        let mut engine = Engine::new();
        // kernel calls mutate the workspace even when their result is unused
        engine.set_optimization_level(OptimizationLevel::None);
        let shared: SharedWorkspace = Rc::new(RefCell::new(RayWorkspace::default()));
        register_kernels(&mut engine, &shared);
        engine.on_print(|text| log::info!("[script] {}", text));
        engine.on_debug(|text, _, position| log::debug!("[script] {} at {}", text, position));
        Self {
            engine,
            shared,
            globals: Scope::new(),
            ast: None,
            logger: LogManager::new("script"),
        }
    }

    /// Names of the global values defined so far by one-time scripts.
    pub fn global_names(&self) -> Vec<String> {
        self.globals.iter().map(|(name, _, _)| name.to_string()).collect()
    }

    /// Runs `body` with `workspace` installed as the kernels' target.
    fn with_workspace<T>(
        &mut self,
        workspace: &mut RayWorkspace,
        body: impl FnOnce(&Engine) -> T,
    ) -> T {
        std::mem::swap(&mut *self.shared.borrow_mut(), workspace);
        let result = body(&self.engine);
        std::mem::swap(&mut *self.shared.borrow_mut(), workspace);
        result
    }

    fn ray_scope(&self, workspace: &RayWorkspace) -> Scope<'static> {
        let mut scope = Scope::new();
        for (name, constant, value) in self.globals.iter() {
            if constant {
                scope.push_constant_dynamic(name, value);
            } else {
                scope.push_dynamic(name, value);
            }
        }
        for field in workspace.lifecycle.committed() {
            let array: Array = match &field.data {
                FieldData::Values(values) => {
                    values.iter().map(|&v| Dynamic::from(v as f64)).collect()
                }
                FieldData::Flags(flags) => flags.iter().map(|&f| Dynamic::from(f)).collect(),
            };
            scope.push(field.name.clone(), array);
        }
        let boundary: Array = workspace.boundary.iter().map(|&g| Dynamic::from(g)).collect();
        scope.push_constant(BOUNDARY_BINDING, boundary);
        scope
    }
}

impl Default for RhaiScriptHost {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptHost for RhaiScriptHost {
    fn run_once(&mut self, script: &str) -> EditResult<()> {
        let mut idle = RayWorkspace::default();
        let mut globals = std::mem::take(&mut self.globals);
        let result =
            self.with_workspace(&mut idle, |engine| engine.run_with_scope(&mut globals, script));
        self.globals = globals;
        result.map_err(|err| {
            idle.take_kernel_error()
                .unwrap_or_else(|| EditError::Script(err.to_string()))
        })?;
        self.logger
            .detail(&format!("globals after one-time script: {:?}", self.global_names()));
        Ok(())
    }

    fn load(&mut self, script: &str) -> EditResult<()> {
        let ast = self
            .engine
            .compile(script)
            .map_err(|err| EditError::Script(err.to_string()))?;
        self.ast = Some(ast);
        Ok(())
    }

    fn evaluate_ray(&mut self, workspace: &mut RayWorkspace) -> EditResult<ScriptOutputs> {
        let ast = self
            .ast
            .take()
            .ok_or_else(|| EditError::Script("no per-ray script loaded".into()))?;
        let mut scope = self.ray_scope(workspace);
        let baseline = scope.len();
        workspace.take_kernel_error();

        let result =
            self.with_workspace(workspace, |engine| engine.run_ast_with_scope(&mut scope, &ast));
        self.ast = Some(ast);
        let kernel_error = workspace.take_kernel_error();
        if let Err(err) = result {
            return Err(kernel_error.unwrap_or_else(|| EditError::Script(err.to_string())));
        }
        collect_outputs(&scope, baseline)
    }
}

/// Bindings the script introduced past `baseline`, plus older bindings now
/// holding a provisional handle. A name bound twice keeps its last value.
fn collect_outputs(scope: &Scope<'_>, baseline: usize) -> EditResult<ScriptOutputs> {
    let entries: Vec<(String, Dynamic)> = scope
        .iter()
        .map(|(name, _, value)| (name.to_string(), value))
        .collect();
    let mut seen = HashSet::new();
    let mut outputs = Vec::new();
    for (position, (name, value)) in entries.into_iter().enumerate().rev() {
        if name == BOUNDARY_BINDING || !seen.insert(name.clone()) {
            continue;
        }
        let introduced = position >= baseline;
        if value.is::<FieldHandle>() {
            let handle = value.clone_cast::<FieldHandle>();
            if introduced || handle.provisional_id().is_some() {
                outputs.push((name, ScriptOutput::Handle(handle)));
            }
        } else if introduced && value.is_array() {
            let array = value
                .into_array()
                .map_err(|kind| EditError::Script(format!("{}: {}", name, kind)))?;
            let output = match gate_array(&name, array)? {
                GateArray::Values(values) => ScriptOutput::Values(values),
                GateArray::Flags(flags) => ScriptOutput::Flags(flags),
            };
            outputs.push((name, output));
        }
    }
    outputs.reverse();
    Ok(outputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::RayIterationEngine;
    use crate::geometry::BoundaryPolygon;
    use crate::mask::BoundaryMask;
    use crate::prelude::ErrorKind;
    use crate::session::SweepSession;
    use crate::volume::{Field, MemoryVolume, PrimaryAxis, RangeGeometry, Ray, VolumeModel};

    const BAD: f32 = -9999.0;

    fn ten_gate_volume(rays: usize) -> MemoryVolume {
        let mut volume = MemoryVolume::new(PrimaryAxis::Z);
        for index in 0..rays {
            let mut ray = Ray::new(index, 0, 10, RangeGeometry::new(0.0, 1.0));
            ray.nyquist_mps = Some(10.0);
            ray.fields.push(Field::values(
                "VEL",
                "m/s",
                BAD,
                (0..10).map(|g| g as f32).collect(),
            ));
            volume.push_ray(ray);
        }
        volume
    }

    fn workspace(volume: &MemoryVolume) -> RayWorkspace {
        RayWorkspace::for_ray(
            volume.ray(0).unwrap(),
            RangeGeometry::new(0.0, 1.0),
            BoundaryMask::unrestricted(10),
            SweepSession::default(),
        )
        .unwrap()
    }

    #[test]
    fn ring_removal_end_to_end() {
        let mut volume = ten_gate_volume(1);
        let mut engine = RayIterationEngine::new(RhaiScriptHost::new());
        let report = engine
            .run_for_each_ray(&mut volume, r#"let VEL_RING = REMOVE_RING("VEL", 2.0, 4.0, 10, -9999.0);"#)
            .unwrap();
        assert!(report.is_clean());
        let ring = volume.field(0, "VEL_RING").unwrap().as_values().unwrap().to_vec();
        let expected: Vec<f32> = (0..10)
            .map(|g| if (2..=4).contains(&g) { BAD } else { g as f32 })
            .collect();
        assert_eq!(ring, expected);
        assert_eq!(
            volume.field(0, "VEL").unwrap().as_values().unwrap()[3],
            3.0
        );
    }

    #[test]
    fn provisional_is_visible_by_name_within_the_same_script() {
        let volume = ten_gate_volume(1);
        let mut ws = workspace(&volume);
        let mut host = RhaiScriptHost::new();
        host.load(
            r#"
            UNCONDITIONAL_DELETE("VEL", 3, ());
            let CLEAN = DESPECKLE("VEL", 2, 10, ());
            "#,
        )
        .unwrap();
        let outputs = host.evaluate_ray(&mut ws).unwrap();
        assert_eq!(outputs.len(), 1);
        let (name, output) = &outputs[0];
        assert_eq!(name, "CLEAN");
        let handle = match output {
            ScriptOutput::Handle(handle) => handle.clone(),
            other => panic!("unexpected output {:?}", other),
        };
        let values = ws.lifecycle.resolve(&handle).unwrap().as_values().unwrap().to_vec();
        assert_eq!(&values[..3], &[BAD, BAD, BAD]);
        assert_eq!(&values[3..], &[3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
    }

    #[test]
    fn new_arrays_and_flag_arrays_are_outputs() {
        let volume = ten_gate_volume(1);
        let mut ws = workspace(&volume);
        let mut host = RhaiScriptHost::new();
        host.load(
            r#"
            let DOUBLED = [];
            for v in VEL { DOUBLED.push(v * 2.0); }
            let INSIDE = BOUNDARY;
            let scratch = 3;
            "#,
        )
        .unwrap();
        let outputs = host.evaluate_ray(&mut ws).unwrap();
        let names: Vec<&str> = outputs.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["DOUBLED", "INSIDE"]);
        assert_eq!(outputs[0].1, ScriptOutput::Values((0..10).map(|g| g as f32 * 2.0).collect()));
        assert_eq!(outputs[1].1, ScriptOutput::Flags(vec![true; 10]));
    }

    #[test]
    fn kernel_errors_keep_their_kind() {
        let volume = ten_gate_volume(1);
        let mut ws = workspace(&volume);
        let mut host = RhaiScriptHost::new();
        host.load(r#"let X = DESPECKLE("DBZ", 2, 10, ());"#).unwrap();
        let err = host.evaluate_ray(&mut ws).unwrap_err();
        assert!(matches!(err, EditError::FieldNotFound(_)));

        host.load("let y = undefined_thing + 1;").unwrap();
        let err = host.evaluate_ray(&mut ws).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Script);
    }

    #[test]
    fn syntax_error_fails_to_load() {
        let mut host = RhaiScriptHost::new();
        assert!(matches!(host.load("let = ;"), Err(EditError::Script(_))));
    }

    #[test]
    fn one_time_globals_reach_every_ray() {
        let mut volume = ten_gate_volume(3);
        let mut engine = RayIterationEngine::new(RhaiScriptHost::new());
        engine.run_once("let threshold = 5.0;").unwrap();
        assert_eq!(engine.host().global_names(), vec!["threshold".to_string()]);
        let report = engine
            .run_for_each_ray(
                &mut volume,
                r#"let HIGH = SET_BAD_FLAGS_ABOVE("VEL", threshold, 10, ());"#,
            )
            .unwrap();
        assert_eq!(report.rays_processed, 3);
        let flags = volume.field(2, "HIGH").unwrap().as_flags().unwrap().to_vec();
        let expected: Vec<bool> = (0..10).map(|g| g > 5).collect();
        assert_eq!(flags, expected);
    }

    #[test]
    fn boundary_restricts_script_edits() {
        let mut volume = ten_gate_volume(1);
        let mut engine = RayIterationEngine::new(RhaiScriptHost::new());
        engine.set_boundary(
            BoundaryPolygon::new(vec![(-1.0, 2.5), (1.0, 2.5), (1.0, 5.5), (-1.0, 5.5)]),
            true,
        );
        engine
            .run_for_each_ray(&mut volume, r#"let Z = ZERO_INSIDE_BOUNDARY("VEL", 10);"#)
            .unwrap();
        let zeroed = volume.field(0, "Z").unwrap().as_values().unwrap().to_vec();
        assert_eq!(zeroed, vec![0.0, 1.0, 2.0, 0.0, 0.0, 0.0, 6.0, 7.0, 8.0, 9.0]);
    }

    #[test]
    fn two_masks_in_one_script_commit_independently() {
        let mut volume = ten_gate_volume(1);
        let mut engine = RayIterationEngine::new(RhaiScriptHost::new());
        let report = engine
            .run_for_each_ray(
                &mut volume,
                r#"
                let HIGH = SET_BAD_FLAGS_ABOVE("VEL", 5.0, 10, ());
                let LOW = SET_BAD_FLAGS_BELOW("VEL", 2.5, 10, ());
                OR_BAD_FLAGS_ABOVE("VEL", 8.5, 10, (), LOW);
                "#,
            )
            .unwrap();
        assert!(report.is_clean());
        let high = volume.field(0, "HIGH").unwrap().as_flags().unwrap().to_vec();
        let low = volume.field(0, "LOW").unwrap().as_flags().unwrap().to_vec();
        assert_eq!(high, (0..10).map(|g| g > 5).collect::<Vec<_>>());
        assert_eq!(low, (0..10).map(|g| g < 3 || g > 8).collect::<Vec<_>>());
    }

    #[test]
    fn flag_algebra_from_a_script() {
        let volume = ten_gate_volume(1);
        let mut ws = workspace(&volume);
        let mut host = RhaiScriptHost::new();
        host.load(
            r#"
            let flags = SET_BAD_FLAGS_ABOVE("VEL", 7.0, 10, ());
            OR_BAD_FLAGS_BELOW("VEL", 2.0, 10, (), flags);
            let KEPT = ASSERT_BAD_FLAGS("VEL", 10, (), "BAD_FLAGS");
            "#,
        )
        .unwrap();
        let outputs = host.evaluate_ray(&mut ws).unwrap();
        let kept = outputs
            .iter()
            .find(|(name, _)| name == "KEPT")
            .map(|(_, output)| output.clone())
            .unwrap();
        let handle = match kept {
            ScriptOutput::Handle(handle) => handle,
            other => panic!("unexpected output {:?}", other),
        };
        let values = ws.lifecycle.resolve(&handle).unwrap().as_values().unwrap().to_vec();
        assert_eq!(
            values,
            vec![BAD, BAD, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, BAD, BAD]
        );
    }
}

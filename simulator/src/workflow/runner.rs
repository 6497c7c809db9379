use crate::generator::profile::build_volume;
use crate::workflow::config::WorkflowConfig;
use anyhow::Context;
use rayedit::engine::{RayIterationEngine, RunReport};
use rayedit::script::RhaiScriptHost;
use rayedit::volume::MemoryVolume;

pub struct WorkflowResult {
    pub report: RunReport,
    pub volume: MemoryVolume,
}

#[derive(Clone)]
pub struct Runner {
    config: WorkflowConfig,
}

impl Runner {
    pub fn new(config: WorkflowConfig) -> Self {
        Self { config }
    }

    /// Generates the volume, runs the one-time script, then the per-ray pass.
    pub fn execute(&self) -> anyhow::Result<WorkflowResult> {
        let mut volume =
            build_volume(&self.config.generator).context("generating synthetic volume")?;
        let ray_script = self.config.ray_script()?;

        let mut engine = RayIterationEngine::new(RhaiScriptHost::new());
        engine.set_boundary(self.config.boundary_polygon(), self.config.use_boundary);

        if let Some(once) = self.config.once_script()? {
            engine
                .run_once(&once)
                .context("running one-time script")?;
        }
        let report = engine
            .run_for_each_ray(&mut volume, &ray_script)
            .context("running per-ray script")?;

        Ok(WorkflowResult { report, volume })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::config::ScriptSource;
    use rayedit::volume::VolumeModel;

    #[test]
    fn runner_executes_default_script() {
        let cfg = WorkflowConfig::from_args(2, 12, 40, 5);
        let result = Runner::new(cfg).execute().unwrap();
        assert_eq!(result.report.rays_processed, 24);
        assert!(result.report.is_clean());
        assert!(result.report.committed_fields.contains("VEL_UNF"));
        assert!(result.volume.field(23, "DBZ_CLEAN").is_ok());
    }

    #[test]
    fn airborne_volume_supports_masking_and_motion_removal() {
        let mut cfg = WorkflowConfig::from_args(1, 8, 30, 1);
        cfg.generator.airborne = true;
        cfg.boundary = vec![(-3.0, -3.0), (3.0, -3.0), (3.0, 3.0), (-3.0, 3.0)];
        cfg.use_boundary = true;
        cfg.once = ScriptSource {
            inline: Some("let clip = 20;".into()),
            path: None,
        };
        cfg.for_each_ray = ScriptSource {
            inline: Some(r#"let VG = REMOVE_AIRCRAFT_MOTION("VEL", 0, clip, ());"#.into()),
            path: None,
        };
        let result = Runner::new(cfg).execute().unwrap();
        assert!(result.report.is_clean(), "{:?}", result.report.failures);
        assert!(result.report.masks_computed >= 1);
        assert!(result.volume.field(0, "VG").is_ok());
    }

    #[test]
    fn syntax_error_is_reported_with_context() {
        let mut cfg = WorkflowConfig::from_args(1, 2, 10, 0);
        cfg.for_each_ray.inline = Some("let = ;".into());
        let err = Runner::new(cfg).execute().err().unwrap();
        assert!(format!("{:#}", err).contains("running per-ray script"));
    }
}

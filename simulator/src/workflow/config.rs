use anyhow::Context;
use rayedit::geometry::BoundaryPolygon;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::generator::profile::GeneratorConfig;

/// Editing pass used when the workflow names no script.
pub const DEFAULT_RAY_SCRIPT: &str = r#"
let VEL_UNF = BB_UNFOLDING_FIRST_GOOD_GATE("VEL", 0, 3, 3, 5, 100000, ());
let DBZ_CLEAN = DESPECKLE("DBZ", 2, 100000, ());
"#;

/// Where a script comes from: inline text or a file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptSource {
    pub inline: Option<String>,
    pub path: Option<PathBuf>,
}

impl ScriptSource {
    pub fn from_path(path: PathBuf) -> Self {
        Self {
            inline: None,
            path: Some(path),
        }
    }

    /// File contents win over inline text.
    pub fn read(&self) -> anyhow::Result<Option<String>> {
        if let Some(path) = &self.path {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading script {}", path.display()))?;
            return Ok(Some(text));
        }
        Ok(self.inline.clone())
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    pub generator: GeneratorConfig,
    /// Boundary polygon in km east and north of the sensor.
    pub boundary: Vec<(f64, f64)>,
    pub use_boundary: bool,
    pub once: ScriptSource,
    pub for_each_ray: ScriptSource,
}

impl WorkflowConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading workflow config {}", path_ref.display()))?;
        let config: WorkflowConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing workflow config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn from_args(sweeps: usize, rays: usize, gates: usize, seed: u64) -> Self {
        Self {
            generator: GeneratorConfig {
                sweeps,
                rays_per_sweep: rays,
                gates,
                seed,
                ..GeneratorConfig::default()
            },
            ..Self::default()
        }
    }

    pub fn boundary_polygon(&self) -> BoundaryPolygon {
        BoundaryPolygon::new(self.boundary.clone())
    }

    pub fn ray_script(&self) -> anyhow::Result<String> {
        Ok(self
            .for_each_ray
            .read()?
            .unwrap_or_else(|| DEFAULT_RAY_SCRIPT.to_string()))
    }

    pub fn once_script(&self) -> anyhow::Result<Option<String>> {
        self.once.read()
    }
}

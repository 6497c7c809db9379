//! Seam between the iteration engine and an embedded interpreter.

mod args;
mod bindings;
mod rhai_host;

pub use rhai_host::{RhaiScriptHost, BOUNDARY_BINDING};

use crate::engine::RayWorkspace;
use crate::lifecycle::FieldHandle;
use crate::prelude::EditResult;

/// One value a script left behind for the engine to commit.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptOutput {
    Values(Vec<f32>),
    Flags(Vec<bool>),
    Handle(FieldHandle),
}

/// Output name to value, in the order the script introduced them.
pub type ScriptOutputs = Vec<(String, ScriptOutput)>;

pub trait ScriptHost {
    /// Evaluates `script` once with no ray bound. Values it defines stay
    /// visible to later per-ray evaluations.
    fn run_once(&mut self, script: &str) -> EditResult<()>;

    /// Compiles the per-ray script. Called once before the first ray.
    fn load(&mut self, script: &str) -> EditResult<()>;

    /// Evaluates the loaded script against one ray's workspace.
    fn evaluate_ray(&mut self, workspace: &mut RayWorkspace) -> EditResult<ScriptOutputs>;
}

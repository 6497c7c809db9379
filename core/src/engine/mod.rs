//! Per-ray execution loop and the workspace scripts operate on.

mod iteration;
mod ops;
mod report;
mod workspace;

pub use iteration::{EngineState, RayIterationEngine};
pub use ops::UnfoldReference;
pub use report::{RayFailure, RunReport};
pub use workspace::{KernelInput, RayWorkspace, BAD_FLAGS_FIELD};

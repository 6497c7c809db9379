//! Per-ray field-transform core for scripted radar and lidar editing.
//!
//! A boundary polygon is rasterized onto each ray, a user script calls the
//! numeric kernels against that ray's fields, and whatever the script leaves
//! behind is committed back into the volume as new fields.

pub mod engine;
pub mod geometry;
pub mod kernels;
pub mod lifecycle;
pub mod mask;
pub mod math;
pub mod prelude;
pub mod script;
pub mod session;
pub mod telemetry;
pub mod volume;

pub use engine::{RayIterationEngine, RayWorkspace, RunReport};
pub use geometry::{compute_boundary_mask, BoundaryPolygon};
pub use lifecycle::{FieldHandle, FieldLifecycle};
pub use prelude::{EditError, EditResult};
pub use script::{RhaiScriptHost, ScriptHost};
pub use volume::{MemoryVolume, VolumeModel};

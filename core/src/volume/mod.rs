//! Interface to the externally owned volume model.
//!
//! Rays and fields are created by the volume readers; this crate only borrows
//! them for one script evaluation and writes committed fields back through
//! [`VolumeModel::add_field`].

pub mod model;
pub mod pose;
pub mod ray;

pub use model::{MemoryVolume, VolumeModel};
pub use pose::{PrimaryAxis, RangeGeometry, SensorPose};
pub use ray::{Field, FieldData, Ray};

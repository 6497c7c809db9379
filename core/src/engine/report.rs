use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::prelude::ErrorKind;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RayFailure {
    pub ray_index: usize,
    pub kind: ErrorKind,
    pub message: String,
}

/// Outcome of one pass over a volume.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub rays_processed: usize,
    pub rays_failed: usize,
    pub failures: Vec<RayFailure>,
    pub committed_fields: BTreeSet<String>,
    pub fields_committed: usize,
    pub masks_computed: usize,
}

impl RunReport {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn is_clean(&self) -> bool {
        self.rays_failed == 0
    }
}

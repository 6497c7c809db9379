use crate::prelude::{ensure_gates, EditResult};
use serde::{Deserialize, Serialize};
use std::ops::Deref;

/// Per-gate permission derived from the user's boundary polygon.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BoundaryMask(Vec<bool>);

impl BoundaryMask {
    /// Mask that restricts nothing.
    pub fn unrestricted(n_gates: usize) -> Self {
        Self(vec![true; n_gates])
    }

    pub fn from_gates(gates: Vec<bool>) -> Self {
        Self(gates)
    }

    pub fn into_inner(self) -> Vec<bool> {
        self.0
    }
}

impl Deref for BoundaryMask {
    type Target = [bool];

    fn deref(&self) -> &[bool] {
        &self.0
    }
}

/// Per-gate suspect-data flags produced by the flagging kernels.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BadFlagMask(Vec<bool>);

impl BadFlagMask {
    pub fn cleared(n_gates: usize) -> Self {
        Self(vec![false; n_gates])
    }

    pub fn from_gates(gates: Vec<bool>) -> Self {
        Self(gates)
    }

    pub fn into_inner(self) -> Vec<bool> {
        self.0
    }

    pub fn flagged_count(&self) -> usize {
        self.0.iter().filter(|&&flag| flag).count()
    }

    pub fn complement(&self) -> Self {
        Self(self.0.iter().map(|flag| !flag).collect())
    }

    /// Gate-by-gate combination of two masks of equal length.
    pub fn combine(&self, other: &BadFlagMask, op: impl Fn(bool, bool) -> bool) -> EditResult<Self> {
        ensure_gates("bad flag mask", self.len(), other.len())?;
        Ok(Self(
            self.0
                .iter()
                .zip(other.0.iter())
                .map(|(&a, &b)| op(a, b))
                .collect(),
        ))
    }
}

impl Deref for BadFlagMask {
    type Target = [bool];

    fn deref(&self) -> &[bool] {
        &self.0
    }
}

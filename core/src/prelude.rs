use serde::{Deserialize, Serialize};

/// Sentinel used for arrays created by scripts and for fields without their own.
pub const MISSING_FL32: f32 = -9999.0;

/// Common error type for geometry, kernel, lifecycle and script failures.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum EditError {
    /// Geometry error: the georeference needed for the boundary mask or a
    /// motion kernel is absent.
    #[error("pose unavailable: {0}")]
    PoseUnavailable(String),
    #[error("dimension mismatch: {what} has {actual} gates, expected {expected}")]
    DimensionMismatch {
        what: String,
        expected: usize,
        actual: usize,
    },
    #[error("field not found: {0}")]
    FieldNotFound(String),
    #[error("script error: {0}")]
    Script(String),
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("stale field handle: {0}")]
    StaleHandle(String),
    #[error("ray index {0} out of range")]
    RayOutOfRange(usize),
}

impl EditError {
    pub fn mismatch(what: impl Into<String>, expected: usize, actual: usize) -> Self {
        EditError::DimensionMismatch {
            what: what.into(),
            expected,
            actual,
        }
    }

    /// Short stable tag used in run reports.
    pub fn kind(&self) -> ErrorKind {
        match self {
            EditError::PoseUnavailable(_) => ErrorKind::Geometry,
            EditError::DimensionMismatch { .. } => ErrorKind::DimensionMismatch,
            EditError::FieldNotFound(_) => ErrorKind::FieldNotFound,
            EditError::Script(_) => ErrorKind::Script,
            EditError::InvalidParameter(_) => ErrorKind::InvalidParameter,
            EditError::StaleHandle(_) => ErrorKind::Lifecycle,
            EditError::RayOutOfRange(_) => ErrorKind::Volume,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Geometry,
    DimensionMismatch,
    FieldNotFound,
    Script,
    InvalidParameter,
    Lifecycle,
    Volume,
}

pub type EditResult<T> = Result<T, EditError>;

/// Fails with `DimensionMismatch` unless `actual == expected`.
pub fn ensure_gates(what: &str, expected: usize, actual: usize) -> EditResult<()> {
    if actual == expected {
        Ok(())
    } else {
        Err(EditError::mismatch(what, expected, actual))
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProvisionalId(pub(crate) u64);

/// Reference to a field from a script: a kernel result not yet committed,
/// or a field the ray already carries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldHandle {
    Provisional(ProvisionalId),
    Committed(String),
}

impl FieldHandle {
    pub fn committed(name: impl Into<String>) -> Self {
        FieldHandle::Committed(name.into())
    }

    pub fn provisional_id(&self) -> Option<ProvisionalId> {
        match self {
            FieldHandle::Provisional(id) => Some(*id),
            FieldHandle::Committed(_) => None,
        }
    }
}

impl fmt::Display for FieldHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldHandle::Provisional(id) => write!(f, "provisional#{}", id.0),
            FieldHandle::Committed(name) => write!(f, "{}", name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldState {
    Provisional,
    Committed,
    Discarded,
}

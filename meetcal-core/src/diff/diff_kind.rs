use std::fmt;

use serde::{Deserialize, Serialize};

/// The kind of calendar mutation an apply plan entry represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffKind {
    Create,
    Update,
    Delete,
}

impl fmt::Display for DiffKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl DiffKind {
    pub fn symbol(&self) -> &'static str {
        match self {
            DiffKind::Create => "+",
            DiffKind::Update => "~",
            DiffKind::Delete => "-",
        }
    }

    /// Lowercase verb used in log lines and error messages.
    pub fn verb(&self) -> &'static str {
        match self {
            DiffKind::Create => "create",
            DiffKind::Update => "update",
            DiffKind::Delete => "delete",
        }
    }
}

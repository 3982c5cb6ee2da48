//! Rundown change type definitions

use serde::{Deserialize, Serialize};

/// Why the rundown changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum RundownChangeTrigger {
    Load,
    Insert,
    Edit,
    BatchEdit,
    Delete,
    DeleteAll,
    Reorder,
    Swap,
    ApplyDelay,
}

impl std::fmt::Display for RundownChangeTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RundownChangeTrigger::Load => write!(f, "Load"),
            RundownChangeTrigger::Insert => write!(f, "Insert"),
            RundownChangeTrigger::Edit => write!(f, "Edit"),
            RundownChangeTrigger::BatchEdit => write!(f, "BatchEdit"),
            RundownChangeTrigger::Delete => write!(f, "Delete"),
            RundownChangeTrigger::DeleteAll => write!(f, "DeleteAll"),
            RundownChangeTrigger::Reorder => write!(f, "Reorder"),
            RundownChangeTrigger::Swap => write!(f, "Swap"),
            RundownChangeTrigger::ApplyDelay => write!(f, "ApplyDelay"),
        }
    }
}

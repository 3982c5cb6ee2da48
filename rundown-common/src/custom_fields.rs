//! Custom field schema
//!
//! Custom field keys are defined outside the engine. Callers validate drafts and
//! patches against the schema before handing them to the engine, so unknown keys
//! are rejected at the boundary and never reach the rundown.

use crate::entry::{CustomFields, EntryDraft, EntryPatch};
use crate::{Error, Result};
use std::collections::BTreeSet;

/// Set of custom field keys accepted by the current project
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomFieldSchema {
    keys: BTreeSet<String>,
}

impl CustomFieldSchema {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Reject any key not declared in the schema
    pub fn validate(&self, fields: &CustomFields) -> Result<()> {
        let unknown: Vec<&str> = fields
            .keys()
            .filter(|key| !self.keys.contains(key.as_str()))
            .map(String::as_str)
            .collect();

        if unknown.is_empty() {
            Ok(())
        } else {
            Err(Error::InvalidInput(format!(
                "Unknown custom field keys: {}",
                unknown.join(", ")
            )))
        }
    }

    pub fn check_draft(&self, draft: &EntryDraft) -> Result<()> {
        self.validate(&draft.custom_fields)
    }

    pub fn check_patch(&self, patch: &EntryPatch) -> Result<()> {
        match &patch.custom_fields {
            Some(fields) => self.validate(fields),
            None => Ok(()),
        }
    }
}

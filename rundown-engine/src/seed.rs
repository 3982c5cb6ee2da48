//! Rundown seed files
//!
//! A seed file is a JSON array of entry drafts in playback order, used by the
//! command-line driver to populate the engine at startup.

use crate::error::Result;
use rundown_common::{CustomFieldSchema, EntryDraft};
use std::path::Path;
use tracing::info;

/// Parse drafts from JSON text, rejecting custom fields outside `schema`
pub fn parse_drafts(content: &str, schema: &CustomFieldSchema) -> Result<Vec<EntryDraft>> {
    let drafts: Vec<EntryDraft> = serde_json::from_str(content).map_err(|e| {
        rundown_common::Error::InvalidInput(format!("Invalid rundown file: {}", e))
    })?;

    for draft in &drafts {
        schema.check_draft(draft)?;
    }
    Ok(drafts)
}

/// Read and parse a seed file
pub fn read_drafts(path: &Path, schema: &CustomFieldSchema) -> Result<Vec<EntryDraft>> {
    let content = std::fs::read_to_string(path).map_err(rundown_common::Error::from)?;
    let drafts = parse_drafts(&content, schema)?;
    info!("Read {} entries from {}", drafts.len(), path.display());
    Ok(drafts)
}

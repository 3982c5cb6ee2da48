//! # Rundown Common Library
//!
//! Shared code for the rundown engine and its collaborators:
//! - Entry model (rundown entries, drafts, patches)
//! - Custom field schema used at the request boundary
//! - Event types (RundownEvent enum) and the EventBus
//! - Published timer/offset snapshot types
//! - Wall clock abstraction
//! - Configuration loading
//! - Time formatting utilities

pub mod config;
pub mod custom_fields;
pub mod entry;
pub mod error;
pub mod events;
pub mod human_time;
pub mod id_utils;
pub mod time;

pub use custom_fields::CustomFieldSchema;
pub use entry::{CustomFields, EntryDraft, EntryKind, EntryPatch, RundownEntry};
pub use error::{Error, Result};
pub use time::{Clock, ManualClock, SystemClock};

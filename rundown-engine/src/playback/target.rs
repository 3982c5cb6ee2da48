//! Playback targeting
//!
//! Ways a caller can name the entry to arm or start.

use crate::error::{Error, Result};
use crate::rundown::NormalisedRundown;
use rundown_common::RundownEntry;
use serde::{Deserialize, Serialize};

/// Entry selector for arm and start
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "by", content = "value", rename_all = "lowercase")]
pub enum PlaybackTarget {
    Id(String),
    /// 0-based position in the order
    Index(usize),
    Cue(String),
    /// Next playable entry after the active one (first when nothing is active)
    Next,
    /// Last playable entry before the active one
    Previous,
}

impl PlaybackTarget {
    /// Resolve to a playable entry of `rundown`
    pub fn resolve<'a>(
        &self,
        rundown: &'a NormalisedRundown,
        active_entry_id: Option<&str>,
    ) -> Result<&'a RundownEntry> {
        if rundown.is_empty() {
            return Err(Error::InvalidState("Rundown is empty".to_string()));
        }

        let active_index = active_entry_id.and_then(|id| rundown.index_of(id));
        let entry = match self {
            PlaybackTarget::Id(id) => rundown
                .get(id)
                .ok_or_else(|| Error::NotFound(format!("Entry {}", id)))?,
            PlaybackTarget::Index(index) => rundown.entry_at(*index).ok_or_else(|| {
                Error::InvalidRange(format!(
                    "Index {} outside rundown of length {}",
                    index,
                    rundown.len()
                ))
            })?,
            PlaybackTarget::Cue(cue) => rundown
                .find_by_cue(cue)
                .ok_or_else(|| Error::NotFound(format!("Cue {}", cue)))?,
            PlaybackTarget::Next => {
                let next = match active_index {
                    Some(index) => rundown.next_playable_after(index),
                    None => rundown.first_playable(),
                };
                next.ok_or_else(|| Error::NotFound("No next entry".to_string()))?
            }
            PlaybackTarget::Previous => active_index
                .and_then(|index| rundown.previous_playable_before(index))
                .ok_or_else(|| Error::NotFound("No previous entry".to_string()))?,
        };

        if !entry.is_playable() {
            return Err(Error::Validation(format!(
                "Entry {} ({}) is not playable",
                entry.id, entry.kind
            )));
        }
        Ok(entry)
    }
}

impl From<&str> for PlaybackTarget {
    fn from(id: &str) -> Self {
        PlaybackTarget::Id(id.to_string())
    }
}

impl std::fmt::Display for PlaybackTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaybackTarget::Id(id) => write!(f, "id {}", id),
            PlaybackTarget::Index(index) => write!(f, "index {}", index),
            PlaybackTarget::Cue(cue) => write!(f, "cue {}", cue),
            PlaybackTarget::Next => write!(f, "next"),
            PlaybackTarget::Previous => write!(f, "previous"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rundown::store::tests::{block, build, delay, event};

    fn rundown() -> NormalisedRundown {
        build(vec![event("e1", 10), block("b"), delay("d", 5), event("e2", 10)])
    }

    #[test]
    fn test_resolve_each_form() {
        let rundown = rundown();

        assert_eq!(PlaybackTarget::from("e2").resolve(&rundown, None).unwrap().id, "e2");
        assert_eq!(PlaybackTarget::Index(3).resolve(&rundown, None).unwrap().id, "e2");
        assert_eq!(
            PlaybackTarget::Cue("E1".to_string()).resolve(&rundown, None).unwrap().id,
            "e1"
        );
        assert_eq!(PlaybackTarget::Next.resolve(&rundown, None).unwrap().id, "e1");
        assert_eq!(PlaybackTarget::Next.resolve(&rundown, Some("e1")).unwrap().id, "e2");
        assert_eq!(
            PlaybackTarget::Previous.resolve(&rundown, Some("e2")).unwrap().id,
            "e1"
        );
    }

    #[test]
    fn test_resolve_errors() {
        let rundown = rundown();

        assert!(matches!(
            PlaybackTarget::Index(4).resolve(&rundown, None),
            Err(Error::InvalidRange(_))
        ));
        assert!(matches!(
            PlaybackTarget::Index(1).resolve(&rundown, None),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            PlaybackTarget::Cue("X".to_string()).resolve(&rundown, None),
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            PlaybackTarget::Next.resolve(&rundown, Some("e2")),
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            PlaybackTarget::Previous.resolve(&rundown, None),
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            PlaybackTarget::Next.resolve(&NormalisedRundown::default(), None),
            Err(Error::InvalidState(_))
        ));
    }

    #[test]
    fn test_target_json_shape() {
        let json = serde_json::to_value(PlaybackTarget::Index(2)).unwrap();
        assert_eq!(json, serde_json::json!({"by": "index", "value": 2}));
        let next: PlaybackTarget = serde_json::from_str(r#"{"by":"next"}"#).unwrap();
        assert_eq!(next, PlaybackTarget::Next);
    }
}

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::{AttributeKey, TrackedKey, ValidTime};

/// Distinguishes ordinary edits from metadata-only events and from marker
/// events that must never produce a version of their own.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A recorded edit: note, attribute diff, or both.
    Edit,
    /// Sets the entity creation time; carries its time in `noted_at` only.
    CreationStamp,
    /// Sets the version author retroactively; never yields a version.
    AuthorStamp,
}

/// One `(old, new)` attribute change as reported by the source changelog.
/// Values are raw JSON; the snapshot builder coerces them per key.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    pub old: JsonValue,
    pub new: JsonValue,
}

/// One recorded edit from the source system's changelog.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub kind: EventKind,
    /// Who made the change; non-positive or absent falls back to the
    /// entity's author.
    #[serde(default)]
    pub actor_id: Option<i64>,
    /// Primary time source.
    #[serde(default)]
    pub occurred_at: Option<ValidTime>,
    /// Secondary time source, used when the primary is unset.
    #[serde(default)]
    pub noted_at: Option<ValidTime>,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub diff: Option<BTreeMap<AttributeKey, FieldChange>>,
    /// When present, replaces the running state wholesale instead of
    /// folding `diff` onto it.
    #[serde(default)]
    pub snapshot: Option<BTreeMap<AttributeKey, JsonValue>>,
    /// Full point-in-time values of the tracked attributes, not deltas.
    #[serde(default)]
    pub tracked: Option<BTreeMap<TrackedKey, Option<String>>>,
}

impl ChangeEvent {
    pub fn edit() -> Self {
        Self {
            kind: EventKind::Edit,
            actor_id: None,
            occurred_at: None,
            noted_at: None,
            note: String::new(),
            diff: None,
            snapshot: None,
            tracked: None,
        }
    }

    /// An event with an empty note, an empty or absent diff, and no explicit
    /// snapshot carries nothing a version could record.
    pub fn has_content(&self) -> bool {
        if !self.note.trim().is_empty() {
            return true;
        }
        if self.diff.as_ref().is_some_and(|diff| !diff.is_empty()) {
            return true;
        }
        self.snapshot.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::{ChangeEvent, FieldChange};
    use crate::AttributeKey;
    use serde_json::json;

    #[test]
    fn empty_event_has_no_content() {
        let event = ChangeEvent::edit();
        assert!(!event.has_content());
    }

    #[test]
    fn note_or_diff_counts_as_content() {
        let mut event = ChangeEvent::edit();
        event.note = "moved to review".to_string();
        assert!(event.has_content());

        let mut event = ChangeEvent::edit();
        event.diff = Some(
            [(
                AttributeKey::Subject,
                FieldChange {
                    old: json!("a"),
                    new: json!("b"),
                },
            )]
            .into_iter()
            .collect(),
        );
        assert!(event.has_content());
    }

    #[test]
    fn empty_diff_map_is_not_content() {
        let mut event = ChangeEvent::edit();
        event.diff = Some(Default::default());
        assert!(!event.has_content());
    }
}

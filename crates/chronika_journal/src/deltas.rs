use chronika_core::{DeltaRow, TrackedKey, TrackedState, VersionRecord};

use crate::normalize::OrderedEvent;

/// Full tracked-attribute state per retained event. An event that omits the
/// tracked snapshot carries the previous state forward; `None` values
/// normalize to the empty string.
pub fn tracked_states(events: &[OrderedEvent]) -> Vec<TrackedState> {
    let mut current = TrackedState::new();
    let mut states = Vec::with_capacity(events.len());
    for entry in events {
        if let Some(tracked) = &entry.event.tracked {
            for (key, value) in tracked {
                current.insert(*key, value.clone().unwrap_or_default());
            }
        }
        states.push(current.clone());
    }
    states
}

/// Emits one change-only record per tracked key whose value differs from
/// the previous version. The first version's tracked state is the
/// comparison baseline and never yields records of its own.
pub fn record_changes(first_tracked: &TrackedState, rest: &[VersionRecord]) -> Vec<DeltaRow> {
    let mut deltas = Vec::new();
    let mut previous = first_tracked;
    for version in rest {
        for key in TrackedKey::ALL {
            let new_value = version.tracked.get(&key).cloned().unwrap_or_default();
            let old_value = previous.get(&key).cloned().unwrap_or_default();
            if new_value != old_value {
                deltas.push(DeltaRow {
                    ordinal: version.ordinal,
                    key,
                    new_value,
                });
            }
        }
        previous = &version.tracked;
    }
    deltas
}

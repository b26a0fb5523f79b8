use log::debug;

use chronika_core::{ChangeEvent, EventKind, ValidTime};

/// A change event paired with its original input index, kept for
/// diagnostics after sorting and filtering.
#[derive(Clone, Debug, PartialEq)]
pub struct OrderedEvent {
    pub source_index: usize,
    pub event: ChangeEvent,
}

/// The time an event is taken to have happened. Primary wins; the secondary
/// source wins only for kinds listed in `noted_at_overrides`.
pub fn effective_timestamp(event: &ChangeEvent, overrides: &[EventKind]) -> Option<ValidTime> {
    if overrides.contains(&event.kind) {
        event.noted_at.or(event.occurred_at)
    } else {
        event.occurred_at.or(event.noted_at)
    }
}

/// Orders and filters one entity's raw change events.
///
/// Events sort by effective timestamp; events with no timestamp sort last,
/// and the stable sort preserves input order among ties. Author-stamp
/// markers never yield a version. Of the rest, normalized position 0 always
/// survives; later positions are dropped when they are pure metadata
/// setters or carry no content.
pub fn normalize(events: Vec<ChangeEvent>, overrides: &[EventKind]) -> Vec<OrderedEvent> {
    let mut ordered: Vec<OrderedEvent> = events
        .into_iter()
        .enumerate()
        .map(|(source_index, event)| OrderedEvent {
            source_index,
            event,
        })
        .collect();
    ordered.sort_by_key(|entry| {
        effective_timestamp(&entry.event, overrides)
            .map(ValidTime::as_micros)
            .unwrap_or(i64::MAX)
    });

    let mut retained = Vec::with_capacity(ordered.len());
    for entry in ordered {
        if entry.event.kind == EventKind::AuthorStamp {
            debug!(
                "normalize: dropping author-stamp event at source index {}",
                entry.source_index
            );
            continue;
        }
        if retained.is_empty() {
            retained.push(entry);
            continue;
        }
        if entry.event.kind == EventKind::CreationStamp {
            debug!(
                "normalize: dropping metadata event at source index {}",
                entry.source_index
            );
            continue;
        }
        if !entry.event.has_content() {
            debug!(
                "normalize: dropping no-op event at source index {}",
                entry.source_index
            );
            continue;
        }
        retained.push(entry);
    }
    retained
}

#[cfg(test)]
mod tests {
    use super::{effective_timestamp, normalize};
    use chronika_core::{ChangeEvent, EventKind, ValidTime};

    fn event_at(micros: i64) -> ChangeEvent {
        let mut event = ChangeEvent::edit();
        event.occurred_at = Some(ValidTime(micros));
        event.note = "edit".to_string();
        event
    }

    #[test]
    fn sorts_by_timestamp_with_missing_last() {
        let mut untimed = ChangeEvent::edit();
        untimed.note = "untimed".to_string();
        let events = vec![event_at(30), untimed, event_at(10)];
        let retained = normalize(events, &[]);
        assert_eq!(
            retained
                .iter()
                .map(|entry| entry.source_index)
                .collect::<Vec<_>>(),
            vec![2, 0, 1]
        );
    }

    #[test]
    fn ties_keep_input_order() {
        let mut a = event_at(10);
        a.note = "a".to_string();
        let mut b = event_at(10);
        b.note = "b".to_string();
        let retained = normalize(vec![a, b], &[]);
        assert_eq!(retained[0].event.note, "a");
        assert_eq!(retained[1].event.note, "b");
    }

    #[test]
    fn position_zero_survives_even_without_content() {
        let empty = ChangeEvent::edit();
        let retained = normalize(vec![empty, event_at(10)], &[]);
        assert_eq!(retained.len(), 2);
        assert_eq!(retained[0].source_index, 1);
        assert_eq!(retained[1].source_index, 0);
    }

    #[test]
    fn later_noops_and_metadata_are_dropped() {
        let mut creation = ChangeEvent::edit();
        creation.kind = EventKind::CreationStamp;
        creation.noted_at = Some(ValidTime(50));
        let noop = ChangeEvent::edit();
        let retained = normalize(vec![event_at(10), creation, noop], &[]);
        assert_eq!(retained.len(), 1);
        assert_eq!(retained[0].source_index, 0);
    }

    #[test]
    fn metadata_event_can_anchor_position_zero() {
        let mut creation = ChangeEvent::edit();
        creation.kind = EventKind::CreationStamp;
        creation.noted_at = Some(ValidTime(5));
        let retained = normalize(vec![event_at(10), creation], &[]);
        assert_eq!(retained.len(), 2);
        assert_eq!(retained[0].event.kind, EventKind::CreationStamp);
    }

    #[test]
    fn author_stamps_never_survive() {
        let mut stamp = ChangeEvent::edit();
        stamp.kind = EventKind::AuthorStamp;
        stamp.occurred_at = Some(ValidTime(1));
        let retained = normalize(vec![stamp, event_at(10)], &[]);
        assert_eq!(retained.len(), 1);
        assert_eq!(retained[0].source_index, 1);
    }

    #[test]
    fn override_prefers_secondary_source() {
        let mut event = ChangeEvent::edit();
        event.occurred_at = Some(ValidTime(100));
        event.noted_at = Some(ValidTime(40));
        assert_eq!(effective_timestamp(&event, &[]), Some(ValidTime(100)));
        assert_eq!(
            effective_timestamp(&event, &[EventKind::Edit]),
            Some(ValidTime(40))
        );
    }
}

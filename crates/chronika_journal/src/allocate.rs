use log::debug;

use chronika_core::{EntityBaseline, ValidTime};

use crate::normalize::{effective_timestamp, OrderedEvent};
use crate::replay::ReplayOptions;

/// A half-open validity interval. `end == None` means right-unbounded; only
/// the last version of an entity carries it.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Interval {
    pub start: ValidTime,
    pub end: Option<ValidTime>,
}

/// Assigns each retained event a non-overlapping interval.
///
/// The cursor is threaded explicitly through the fold: it holds the last
/// assigned start, and every interval ends exactly at the next start, so a
/// strictly increasing start sequence keeps the intervals disjoint even
/// when consecutive source timestamps are identical.
pub fn allocate(
    events: &[OrderedEvent],
    baseline: &EntityBaseline,
    options: &ReplayOptions,
) -> Vec<Interval> {
    let tick = options.tick_micros;
    let mut starts: Vec<ValidTime> = Vec::with_capacity(events.len());
    let mut cursor: Option<ValidTime> = None;
    for entry in events {
        let mut candidate = effective_timestamp(&entry.event, &options.noted_at_overrides)
            .unwrap_or_else(|| match cursor {
                Some(last) => last.plus_micros(tick),
                None => baseline.created_at,
            });
        if let Some(last) = cursor {
            if candidate <= last {
                debug!(
                    "allocate: bumping colliding start for source index {} from {} to {}",
                    entry.source_index,
                    candidate.as_micros(),
                    last.as_micros() + tick
                );
                candidate = last.plus_micros(tick);
            }
        }
        starts.push(candidate);
        cursor = Some(candidate);
    }

    let mut intervals = Vec::with_capacity(starts.len());
    for (index, start) in starts.iter().enumerate() {
        intervals.push(Interval {
            start: *start,
            end: starts.get(index + 1).copied(),
        });
    }
    intervals
}

#[cfg(test)]
mod tests {
    use super::allocate;
    use crate::normalize::OrderedEvent;
    use crate::replay::ReplayOptions;
    use chronika_core::{AttributeKey, ChangeEvent, EntityBaseline, ValidTime, Value};

    fn baseline() -> EntityBaseline {
        EntityBaseline {
            entity_id: 1,
            author_id: 1,
            created_at: ValidTime(1_000),
            state: [
                (AttributeKey::ContainerId, Value::I64(1)),
                (AttributeKey::KindId, Value::I64(1)),
                (AttributeKey::StatusId, Value::I64(1)),
            ]
            .into_iter()
            .collect(),
        }
    }

    fn entry(index: usize, at: Option<i64>) -> OrderedEvent {
        let mut event = ChangeEvent::edit();
        event.occurred_at = at.map(ValidTime);
        OrderedEvent {
            source_index: index,
            event,
        }
    }

    #[test]
    fn ends_chain_to_next_start_and_last_is_open() {
        let events = vec![entry(0, Some(10)), entry(1, Some(20)), entry(2, Some(30))];
        let intervals = allocate(&events, &baseline(), &ReplayOptions::default());
        assert_eq!(intervals[0].start, ValidTime(10));
        assert_eq!(intervals[0].end, Some(ValidTime(20)));
        assert_eq!(intervals[1].end, Some(ValidTime(30)));
        assert_eq!(intervals[2].end, None);
    }

    #[test]
    fn identical_timestamps_bump_by_one_tick() {
        let events = vec![entry(0, Some(10)), entry(1, Some(10))];
        let intervals = allocate(&events, &baseline(), &ReplayOptions::default());
        assert_eq!(intervals[0].start, ValidTime(10));
        assert_eq!(intervals[1].start, ValidTime(11));
        assert_eq!(intervals[0].end, Some(intervals[1].start));
    }

    #[test]
    fn out_of_order_candidate_is_bumped_past_cursor() {
        let events = vec![entry(0, Some(50)), entry(1, Some(20))];
        let intervals = allocate(&events, &baseline(), &ReplayOptions::default());
        assert_eq!(intervals[1].start, ValidTime(51));
    }

    #[test]
    fn missing_timestamp_synthesizes_from_cursor_or_baseline() {
        let events = vec![entry(0, None), entry(1, None)];
        let intervals = allocate(&events, &baseline(), &ReplayOptions::default());
        assert_eq!(intervals[0].start, ValidTime(1_000));
        assert_eq!(intervals[1].start, ValidTime(1_001));
    }

    #[test]
    fn configurable_tick_scales_the_bump() {
        let events = vec![entry(0, Some(10)), entry(1, Some(10))];
        let options = ReplayOptions {
            tick_micros: 1_000_000,
            ..ReplayOptions::default()
        };
        let intervals = allocate(&events, &baseline(), &options);
        assert_eq!(intervals[1].start, ValidTime(1_000_010));
    }
}

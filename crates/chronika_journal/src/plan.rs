use log::debug;

use chronika_core::{
    ChangeEvent, ChronikaResult, EntityBaseline, EntityInput, EntityPlan, RefLookup, VersionRecord,
    VersionSeed,
};

use crate::allocate::allocate;
use crate::dedup::dedup_candidates;
use crate::deltas::{record_changes, tracked_states};
use crate::normalize::normalize;
use crate::replay::ReplayOptions;
use crate::snapshot::{backfill_required, build_snapshots};

/// Runs the pure pipeline for one entity: normalize, allocate, fold state,
/// deduplicate, and record tracked deltas. The result is everything the
/// persistence writer needs, and nothing else.
pub fn build_plan(
    input: &EntityInput,
    lookup: &RefLookup,
    options: &ReplayOptions,
) -> ChronikaResult<EntityPlan> {
    input.baseline.validate()?;
    let baseline = &input.baseline;

    let events = normalize(input.events.clone(), &options.noted_at_overrides);
    if events.is_empty() {
        // The first version always exists; with no surviving events it is
        // refreshed from the baseline alone.
        let mut state = baseline.state.clone();
        backfill_required(&mut state, baseline);
        return Ok(EntityPlan {
            first: VersionSeed {
                actor_id: baseline.author_id,
                note: String::new(),
                valid_from: baseline.created_at,
                valid_to: None,
                state,
                tracked: Default::default(),
            },
            rest: Vec::new(),
            deltas: Vec::new(),
        });
    }

    let intervals = allocate(&events, baseline, options);
    let snapshots = build_snapshots(&events, baseline, lookup);
    let tracked = tracked_states(&events);

    let first = VersionSeed {
        actor_id: resolve_actor(&events[0].event, baseline),
        note: events[0].event.note.clone(),
        valid_from: intervals[0].start,
        valid_to: intervals[0].end,
        state: snapshots[0].clone(),
        tracked: tracked[0].clone(),
    };

    let candidates: Vec<VersionRecord> = events
        .iter()
        .enumerate()
        .skip(1)
        .map(|(index, entry)| VersionRecord {
            ordinal: (index + 1) as u32,
            actor_id: resolve_actor(&entry.event, baseline),
            note: entry.event.note.clone(),
            valid_from: intervals[index].start,
            valid_to: intervals[index].end,
            state: snapshots[index].clone(),
            tracked: tracked[index].clone(),
        })
        .collect();
    let (rest, discarded) = dedup_candidates(candidates);
    if discarded > 0 {
        debug!(
            "plan: entity {} lost {discarded} duplicate versions",
            baseline.entity_id
        );
    }

    let deltas = record_changes(&first.tracked, &rest);
    Ok(EntityPlan {
        first,
        rest,
        deltas,
    })
}

fn resolve_actor(event: &ChangeEvent, baseline: &EntityBaseline) -> i64 {
    event
        .actor_id
        .filter(|actor| *actor > 0)
        .unwrap_or(baseline.author_id)
}

#[cfg(test)]
mod tests {
    use super::build_plan;
    use crate::replay::ReplayOptions;
    use chronika_core::{
        AttributeKey, ChangeEvent, EntityBaseline, EntityInput, FieldChange, RefLookup, ValidTime,
        Value,
    };
    use serde_json::json;

    fn baseline() -> EntityBaseline {
        EntityBaseline {
            entity_id: 5,
            author_id: 2,
            created_at: ValidTime(100),
            state: [
                (AttributeKey::ContainerId, Value::I64(1)),
                (AttributeKey::KindId, Value::I64(1)),
                (AttributeKey::StatusId, Value::I64(10)),
            ]
            .into_iter()
            .collect(),
        }
    }

    fn status_event(at: i64, status: i64) -> ChangeEvent {
        let mut event = ChangeEvent::edit();
        event.occurred_at = Some(ValidTime(at));
        event.diff = Some(
            [(
                AttributeKey::StatusId,
                FieldChange {
                    old: json!(null),
                    new: json!(status),
                },
            )]
            .into_iter()
            .collect(),
        );
        event
    }

    #[test]
    fn no_events_still_yields_the_first_version() {
        let input = EntityInput {
            baseline: baseline(),
            events: vec![],
        };
        let plan = build_plan(&input, &RefLookup::default(), &ReplayOptions::default())
            .expect("plan");
        assert_eq!(plan.versions(), 1);
        assert_eq!(plan.first.valid_from, ValidTime(100));
        assert_eq!(plan.first.valid_to, None);
        assert_eq!(plan.first.actor_id, 2);
        assert!(plan
            .first
            .state
            .contains_key(&AttributeKey::ManualScheduling));
    }

    #[test]
    fn ordinals_are_contiguous_and_intervals_chain() {
        let input = EntityInput {
            baseline: baseline(),
            events: vec![status_event(10, 11), status_event(20, 12), status_event(30, 13)],
        };
        let plan = build_plan(&input, &RefLookup::default(), &ReplayOptions::default())
            .expect("plan");
        assert_eq!(plan.versions(), 3);
        assert_eq!(
            plan.rest.iter().map(|v| v.ordinal).collect::<Vec<_>>(),
            vec![2, 3]
        );
        assert_eq!(plan.first.valid_to, Some(plan.rest[0].valid_from));
        assert_eq!(plan.rest[0].valid_to, Some(plan.rest[1].valid_from));
        assert_eq!(plan.rest[1].valid_to, None);
    }

    #[test]
    fn non_positive_actor_falls_back_to_author() {
        let mut event = status_event(10, 11);
        event.actor_id = Some(-1);
        let input = EntityInput {
            baseline: baseline(),
            events: vec![event],
        };
        let plan = build_plan(&input, &RefLookup::default(), &ReplayOptions::default())
            .expect("plan");
        assert_eq!(plan.first.actor_id, 2);
    }

    #[test]
    fn invalid_baseline_fails_the_plan() {
        let mut bad = baseline();
        bad.entity_id = 0;
        let input = EntityInput {
            baseline: bad,
            events: vec![],
        };
        assert!(
            build_plan(&input, &RefLookup::default(), &ReplayOptions::default()).is_err()
        );
    }
}

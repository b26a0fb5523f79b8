use chronika_journal::{
    replay_entity, AttributeKey, ChangeEvent, EntityBaseline, EntityInput, JournalSink,
    JournalStore, RefLookup, ReplayOptions, TrackedKey, ValidTime, Value,
};
use tempfile::tempdir;

fn baseline() -> EntityBaseline {
    EntityBaseline {
        entity_id: 8,
        author_id: 3,
        created_at: ValidTime(100),
        state: [
            (AttributeKey::ContainerId, Value::I64(1)),
            (AttributeKey::KindId, Value::I64(1)),
            (AttributeKey::StatusId, Value::I64(1)),
        ]
        .into_iter()
        .collect(),
    }
}

fn tracked_event(at: i64, workflow: &str) -> ChangeEvent {
    let mut event = ChangeEvent::edit();
    event.occurred_at = Some(ValidTime(at));
    event.note = format!("workflow {workflow}");
    event.tracked = Some(
        [(TrackedKey::Workflow, Some(workflow.to_string()))]
            .into_iter()
            .collect(),
    );
    event
}

#[tokio::test]
async fn unchanged_tracked_values_emit_no_deltas() -> chronika_journal::ChronikaResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = JournalStore::connect_sqlite(&dir.path().join("journal.sqlite")).await?;
    let input = EntityInput {
        baseline: baseline(),
        events: vec![
            tracked_event(1_000, "a"),
            tracked_event(2_000, "a"),
            tracked_event(3_000, "b"),
        ],
    };
    store.seed_entity(&input.baseline).await?;
    let outcome =
        replay_entity(&store, &RefLookup::default(), &ReplayOptions::default(), &input).await;
    assert_eq!(outcome.error, None);
    assert_eq!(outcome.versions_written, 3);

    let deltas = store.list_deltas(8).await?;
    // [a, a, b]: no delta at version 2, one delta at version 3.
    assert_eq!(deltas.len(), 1);
    assert_eq!(deltas[0].ordinal, 3);
    assert_eq!(deltas[0].key, TrackedKey::Workflow);
    assert_eq!(deltas[0].new_value, "b");
    Ok(())
}

#[tokio::test]
async fn deltas_reference_existing_ordinals_only() -> chronika_journal::ChronikaResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = JournalStore::connect_sqlite(&dir.path().join("journal.sqlite")).await?;
    let mut resolution = tracked_event(2_000, "active");
    resolution.tracked.as_mut().expect("tracked").insert(
        TrackedKey::Resolution,
        Some("fixed".to_string()),
    );
    let input = EntityInput {
        baseline: baseline(),
        events: vec![tracked_event(1_000, "active"), resolution],
    };
    store.seed_entity(&input.baseline).await?;
    replay_entity(&store, &RefLookup::default(), &ReplayOptions::default(), &input).await;

    let versions = store.list_versions(8).await?;
    let ordinals: Vec<u32> = versions.iter().map(|v| v.ordinal).collect();
    let deltas = store.list_deltas(8).await?;
    assert!(!deltas.is_empty());
    for delta in &deltas {
        assert!(ordinals.contains(&delta.ordinal));
        assert!(delta.ordinal > 1);
    }
    Ok(())
}

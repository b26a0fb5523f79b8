use chronika_journal::{
    replay_entity, AttributeKey, ChangeEvent, EntityBaseline, EntityInput, FieldChange,
    JournalSink, JournalStore, RefLookup, ReplayOptions, TrackedKey, ValidTime, Value,
};
use serde_json::json;
use tempfile::tempdir;

fn baseline() -> EntityBaseline {
    EntityBaseline {
        entity_id: 42,
        author_id: 7,
        created_at: ValidTime(1_000),
        state: [
            (AttributeKey::ContainerId, Value::I64(5)),
            (AttributeKey::KindId, Value::I64(2)),
            (AttributeKey::StatusId, Value::I64(1)),
            (AttributeKey::Subject, Value::Str("crate loader".to_string())),
        ]
        .into_iter()
        .collect(),
    }
}

fn events() -> Vec<ChangeEvent> {
    let mut first = ChangeEvent::edit();
    first.occurred_at = Some(ValidTime(2_000));
    first.note = "created".to_string();
    first.tracked = Some(
        [(TrackedKey::Workflow, Some("triage".to_string()))]
            .into_iter()
            .collect(),
    );

    let mut second = ChangeEvent::edit();
    second.occurred_at = Some(ValidTime(3_000));
    second.actor_id = Some(9);
    second.diff = Some(
        [(
            AttributeKey::StatusId,
            FieldChange {
                old: json!(1),
                new: json!(4),
            },
        )]
        .into_iter()
        .collect(),
    );
    second.tracked = Some(
        [(TrackedKey::Workflow, Some("active".to_string()))]
            .into_iter()
            .collect(),
    );

    let mut third = ChangeEvent::edit();
    third.occurred_at = Some(ValidTime(3_000));
    third.note = "burst edit".to_string();
    vec![first, second, third]
}

#[tokio::test]
async fn replaying_twice_produces_identical_history() -> chronika_journal::ChronikaResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = JournalStore::connect_sqlite(&dir.path().join("journal.sqlite")).await?;
    let input = EntityInput {
        baseline: baseline(),
        events: events(),
    };
    store.seed_entity(&input.baseline).await?;
    let lookup = RefLookup::default();
    let options = ReplayOptions::default();

    let first_run = replay_entity(&store, &lookup, &options, &input).await;
    assert_eq!(first_run.error, None);
    let versions_a = store.list_versions(42).await?;
    let deltas_a = store.list_deltas(42).await?;

    let second_run = replay_entity(&store, &lookup, &options, &input).await;
    assert_eq!(second_run.error, None);
    assert_eq!(second_run.versions_written, first_run.versions_written);
    let versions_b = store.list_versions(42).await?;
    let deltas_b = store.list_deltas(42).await?;

    assert_eq!(versions_a, versions_b);
    assert_eq!(deltas_a, deltas_b);
    assert_eq!(versions_a.len(), 3);
    Ok(())
}

#[tokio::test]
async fn rebuilt_rows_do_not_accumulate_across_replays(
) -> chronika_journal::ChronikaResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = JournalStore::connect_sqlite(&dir.path().join("journal.sqlite")).await?;
    let input = EntityInput {
        baseline: baseline(),
        events: events(),
    };
    store.seed_entity(&input.baseline).await?;
    for _ in 0..3 {
        let outcome =
            replay_entity(&store, &RefLookup::default(), &ReplayOptions::default(), &input).await;
        assert_eq!(outcome.error, None);
    }
    let versions = store.list_versions(42).await?;
    assert_eq!(versions.len(), 3);
    assert_eq!(
        versions.iter().map(|v| v.ordinal).collect::<Vec<_>>(),
        vec![1, 2, 3]
    );
    Ok(())
}

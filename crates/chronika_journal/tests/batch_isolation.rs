use std::sync::Arc;

use chronika_journal::{
    run_batch, AttributeKey, ChangeEvent, EntityBaseline, EntityInput, FieldChange, JournalSink,
    JournalStore, RefLookup, ReplayOptions, ValidTime, Value,
};
use serde_json::json;
use tempfile::tempdir;

fn baseline(entity_id: i64) -> EntityBaseline {
    EntityBaseline {
        entity_id,
        author_id: 2,
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

fn input(entity_id: i64) -> EntityInput {
    EntityInput {
        baseline: baseline(entity_id),
        events: vec![status_event(2_000, 3), status_event(4_000, 5)],
    }
}

#[tokio::test]
async fn malformed_entity_fails_alone() -> chronika_journal::ChronikaResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = JournalStore::connect_sqlite(&dir.path().join("journal.sqlite")).await?;

    let good_one = input(1);
    let mut bad = input(2);
    bad.baseline.author_id = -5;
    let good_two = input(3);
    store.seed_entity(&good_one.baseline).await?;
    store.seed_entity(&good_two.baseline).await?;

    let outcomes = run_batch(
        store.clone(),
        Arc::new(RefLookup::default()),
        &ReplayOptions::default(),
        vec![good_one, bad, good_two],
    )
    .await;

    assert_eq!(outcomes.len(), 3);
    assert_eq!(outcomes[0].entity_id, 1);
    assert_eq!(outcomes[0].error, None);
    assert_eq!(outcomes[1].entity_id, 2);
    assert!(outcomes[1].error.is_some());
    assert_eq!(outcomes[1].versions_written, 0);
    assert_eq!(outcomes[2].entity_id, 3);
    assert_eq!(outcomes[2].error, None);

    // The failed entity never reached the store.
    assert!(store.list_versions(2).await?.is_empty());
    assert_eq!(store.list_versions(3).await?.len(), 3);
    Ok(())
}

#[tokio::test]
async fn parallel_batches_preserve_input_order() -> chronika_journal::ChronikaResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = JournalStore::connect_sqlite(&dir.path().join("journal.sqlite")).await?;
    let ids: Vec<i64> = (1..=6).collect();
    let mut entities = Vec::new();
    for id in &ids {
        let entity = input(*id);
        store.seed_entity(&entity.baseline).await?;
        entities.push(entity);
    }
    let options = ReplayOptions {
        max_parallel: 3,
        ..ReplayOptions::default()
    };
    let outcomes = run_batch(
        store.clone(),
        Arc::new(RefLookup::default()),
        &options,
        entities,
    )
    .await;
    assert_eq!(
        outcomes.iter().map(|o| o.entity_id).collect::<Vec<_>>(),
        ids
    );
    for outcome in &outcomes {
        assert_eq!(outcome.error, None);
        assert_eq!(outcome.versions_written, 3);
    }
    Ok(())
}

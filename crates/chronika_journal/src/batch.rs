use std::sync::Arc;

use log::{info, warn};
use tokio::task::JoinSet;

use chronika_core::{EntityInput, JournalSink, RefLookup, ReplayOutcome};

use crate::replay::{replay_entity, ReplayOptions};

/// Replays a batch of entities, one outcome per input entity in input
/// order, regardless of individual failures. Entities run sequentially
/// unless `options.max_parallel > 1`, in which case at most that many are
/// in flight at once. The lookup tables are shared read-only; the only
/// shared mutable resource is the sink's backing store.
pub async fn run_batch<S>(
    sink: S,
    lookup: Arc<RefLookup>,
    options: &ReplayOptions,
    entities: Vec<EntityInput>,
) -> Vec<ReplayOutcome>
where
    S: JournalSink + Clone + Send + Sync + 'static,
{
    info!(
        "batch: replaying {} entities (max_parallel {})",
        entities.len(),
        options.max_parallel
    );
    if options.max_parallel <= 1 {
        let mut outcomes = Vec::with_capacity(entities.len());
        for input in &entities {
            outcomes.push(replay_entity(&sink, &lookup, options, input).await);
        }
        return outcomes;
    }

    let entity_ids: Vec<i64> = entities
        .iter()
        .map(|input| input.baseline.entity_id)
        .collect();
    let mut slots: Vec<Option<ReplayOutcome>> = vec![None; entities.len()];
    let mut pending = entities.into_iter().enumerate();
    let mut in_flight = JoinSet::new();

    loop {
        while in_flight.len() < options.max_parallel {
            let Some((index, input)) = pending.next() else {
                break;
            };
            let sink = sink.clone();
            let lookup = Arc::clone(&lookup);
            let options = options.clone();
            in_flight.spawn(async move {
                let outcome = replay_entity(&sink, &lookup, &options, &input).await;
                (index, outcome)
            });
        }
        match in_flight.join_next().await {
            Some(Ok((index, outcome))) => {
                slots[index] = Some(outcome);
            }
            Some(Err(join_err)) => {
                // A panicked worker leaves its slot empty; the fill below
                // still produces one result row per input entity.
                warn!("batch: replay task aborted: {join_err}");
            }
            None => break,
        }
    }

    slots
        .into_iter()
        .enumerate()
        .map(|(index, slot)| {
            slot.unwrap_or_else(|| ReplayOutcome {
                entity_id: entity_ids[index],
                versions_written: 0,
                error: Some("replay task aborted before reporting".to_string()),
            })
        })
        .collect()
}

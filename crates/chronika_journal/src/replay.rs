use log::{error, info};

use chronika_core::{
    ChronikaResult, EntityInput, EventKind, JournalSink, RefLookup, ReplayOutcome,
};

use crate::plan::build_plan;

/// Replay tuning shared by the pipeline stages and the batch orchestrator.
#[derive(Clone, Debug)]
pub struct ReplayOptions {
    /// Smallest representable time increment of the storage backend, in
    /// microseconds.
    pub tick_micros: i64,
    /// Upper bound on concurrently replayed entities.
    pub max_parallel: usize,
    /// Event kinds whose secondary time source wins over the primary.
    pub noted_at_overrides: Vec<EventKind>,
}

impl Default for ReplayOptions {
    fn default() -> Self {
        Self {
            tick_micros: 1,
            max_parallel: 1,
            noted_at_overrides: Vec::new(),
        }
    }
}

/// Replays one entity against the sink, capturing any failure at the entity
/// boundary. The sink's `persist_entity` deletes every version with
/// ordinal > 1 before rebuilding; ordinal 1 is updated in place and never a
/// delete target.
pub async fn replay_entity<S>(
    sink: &S,
    lookup: &RefLookup,
    options: &ReplayOptions,
    input: &EntityInput,
) -> ReplayOutcome
where
    S: JournalSink + ?Sized,
{
    let entity_id = input.baseline.entity_id;
    match replay_inner(sink, lookup, options, input).await {
        Ok(versions_written) => {
            info!("replay: entity {entity_id} rebuilt with {versions_written} versions");
            ReplayOutcome {
                entity_id,
                versions_written,
                error: None,
            }
        }
        Err(err) => {
            error!("replay: entity {entity_id} failed: {err}");
            ReplayOutcome {
                entity_id,
                versions_written: 0,
                error: Some(err.to_string()),
            }
        }
    }
}

async fn replay_inner<S>(
    sink: &S,
    lookup: &RefLookup,
    options: &ReplayOptions,
    input: &EntityInput,
) -> ChronikaResult<u32>
where
    S: JournalSink + ?Sized,
{
    let plan = build_plan(input, lookup, options)?;
    sink.persist_entity(input.baseline.entity_id, &plan).await
}

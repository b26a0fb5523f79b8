use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{AttributeKey, ChronikaResult, TrackedKey, ValidTime, Value};

/// Full tracked-attribute state carried by one version.
pub type TrackedState = BTreeMap<TrackedKey, String>;

/// Content of the entity's first version, which is owned by the target
/// system's entity-creation step and updated in place, never inserted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VersionSeed {
    pub actor_id: i64,
    pub note: String,
    pub valid_from: ValidTime,
    pub valid_to: Option<ValidTime>,
    pub state: BTreeMap<AttributeKey, Value>,
    /// Comparison baseline for tracked deltas; not persisted as rows.
    pub tracked: TrackedState,
}

/// A rebuilt non-initial version, ordinal ≥ 2.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VersionRecord {
    pub ordinal: u32,
    pub actor_id: i64,
    pub note: String,
    pub valid_from: ValidTime,
    pub valid_to: Option<ValidTime>,
    pub state: BTreeMap<AttributeKey, Value>,
    pub tracked: TrackedState,
}

/// A change-only record for one tracked attribute, referencing a version
/// ordinal that exists after deduplication.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeltaRow {
    pub ordinal: u32,
    pub key: TrackedKey,
    pub new_value: String,
}

/// Everything the persistence writer needs for one entity: the in-place
/// first-version update, the ordinal 2..N rebuild set, and the tracked
/// deltas keyed by surviving ordinals.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EntityPlan {
    pub first: VersionSeed,
    pub rest: Vec<VersionRecord>,
    pub deltas: Vec<DeltaRow>,
}

impl EntityPlan {
    pub fn versions(&self) -> u32 {
        1 + self.rest.len() as u32
    }
}

/// One version as read back from storage.
#[derive(Clone, Debug, PartialEq)]
pub struct StoredVersion {
    pub ordinal: u32,
    pub actor_id: i64,
    pub note: String,
    pub valid_from: ValidTime,
    pub valid_to: Option<ValidTime>,
    pub state: BTreeMap<AttributeKey, Value>,
}

/// One tracked delta as read back from storage.
#[derive(Clone, Debug, PartialEq)]
pub struct StoredDelta {
    pub ordinal: u32,
    pub key: TrackedKey,
    pub new_value: String,
}

/// Per-entity replay result; one entry per input entity, never a failure
/// propagated past the entity boundary.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReplayOutcome {
    pub entity_id: i64,
    pub versions_written: u32,
    pub error: Option<String>,
}

/// Persistence seam for the replay controller. One `persist_entity` call
/// covers the wipe, the in-place first-version update, and the three bulk
/// phases, atomically per entity.
#[async_trait]
pub trait JournalSink {
    async fn persist_entity(&self, entity_id: i64, plan: &EntityPlan) -> ChronikaResult<u32>;

    async fn list_versions(&self, entity_id: i64) -> ChronikaResult<Vec<StoredVersion>>;

    async fn list_deltas(&self, entity_id: i64) -> ChronikaResult<Vec<StoredDelta>>;
}

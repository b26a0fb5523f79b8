use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use sea_orm::sea_query;
use sea_orm::sea_query::{
    Expr, ExprTrait, MysqlQueryBuilder, OnConflict, Order, PostgresQueryBuilder, Query,
    QueryStatementWriter, SimpleExpr, SqliteQueryBuilder, Value as SeaValue,
};
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, QueryResult,
    Statement, TransactionTrait,
};
use uuid::Uuid;

use chronika_core::{
    AttributeKey, ChronikaError, ChronikaResult, DataId, EntityBaseline, EntityPlan, EntryId, Id,
    JournalSink, StoredDelta, StoredVersion, TrackedKey, ValidTime, Value, VersionSeed,
};

use crate::config::JournalConfig;
use crate::db::{ChronikaEntries, ChronikaEntryData, ChronikaTrackedDeltas};
use crate::migration::Migrator;
use sea_orm_migration::MigratorTrait;

#[derive(Clone)]
pub struct JournalStore {
    conn: DatabaseConnection,
    backend: DatabaseBackend,
}

/// What the connected backend can enforce for the journal tables.
/// `range_exclusion` marks backends with a native no-overlap constraint for
/// validity ranges; elsewhere the allocator's strictly increasing starts
/// plus the unique `(entity_id, valid_from)` index carry the invariant.
#[derive(Clone, Copy, Debug)]
pub struct BackendCapabilities {
    pub transactional_ddl: bool,
    pub range_exclusion: bool,
    pub json_types: bool,
}

impl JournalStore {
    pub async fn connect(config: &JournalConfig, base_dir: &Path) -> ChronikaResult<Self> {
        let url = build_connection_url(config, base_dir)?;
        let mut options = ConnectOptions::new(url);
        if let Some(pool) = &config.pool {
            if let Some(max) = pool.max_connections {
                options.max_connections(max);
            }
            if let Some(min) = pool.min_connections {
                options.min_connections(min);
            }
            if let Some(timeout_ms) = pool.connect_timeout_ms {
                options.connect_timeout(Duration::from_millis(timeout_ms));
            }
            if let Some(timeout_ms) = pool.acquire_timeout_ms {
                options.acquire_timeout(Duration::from_millis(timeout_ms));
            }
            if let Some(timeout_ms) = pool.idle_timeout_ms {
                options.idle_timeout(Duration::from_millis(timeout_ms));
            }
        }
        let conn = Database::connect(options).await.map_err(ChronikaError::from)?;
        let backend = conn.get_database_backend();
        let store = Self { conn, backend };
        Migrator::up(&store.conn, None)
            .await
            .map_err(ChronikaError::from)?;
        Ok(store)
    }

    pub async fn connect_sqlite(path: &Path) -> ChronikaResult<Self> {
        let config = JournalConfig::default_sqlite(path.to_string_lossy());
        Self::connect(&config, path.parent().unwrap_or_else(|| Path::new("."))).await
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }

    pub fn capabilities(&self) -> BackendCapabilities {
        match self.backend {
            DatabaseBackend::Sqlite => BackendCapabilities {
                transactional_ddl: false,
                range_exclusion: false,
                json_types: false,
            },
            DatabaseBackend::Postgres => BackendCapabilities {
                transactional_ddl: true,
                range_exclusion: true,
                json_types: true,
            },
            DatabaseBackend::MySql => BackendCapabilities {
                transactional_ddl: false,
                range_exclusion: false,
                json_types: true,
            },
            _ => BackendCapabilities {
                transactional_ddl: false,
                range_exclusion: false,
                json_types: false,
            },
        }
    }

    /// Creates the entity's version-1 envelope the way the target system's
    /// entity-creation step would. Idempotent; returns the envelope id.
    pub async fn seed_entity(&self, baseline: &EntityBaseline) -> ChronikaResult<EntryId> {
        let insert = Query::insert()
            .into_table(ChronikaEntries::Table)
            .columns([
                ChronikaEntries::EntryId,
                ChronikaEntries::EntityId,
                ChronikaEntries::Ordinal,
                ChronikaEntries::ValidFrom,
                ChronikaEntries::ValidTo,
                ChronikaEntries::ActorId,
                ChronikaEntries::Notes,
                ChronikaEntries::DataId,
            ])
            .values_panic([
                id_value(self.backend, Id::new()).into(),
                baseline.entity_id.into(),
                1i32.into(),
                baseline.created_at.as_micros().into(),
                SeaValue::BigInt(None).into(),
                baseline.author_id.into(),
                SeaValue::String(None).into(),
                none_id_value(self.backend).into(),
            ])
            .on_conflict(
                OnConflict::columns([ChronikaEntries::EntityId, ChronikaEntries::Ordinal])
                    .do_nothing()
                    .to_owned(),
            )
            .to_owned();
        exec(&self.conn, &insert).await?;

        let (entry_id, _) = self
            .first_version_row(&self.conn, baseline.entity_id)
            .await?
            .ok_or_else(|| ChronikaError::storage("seeded version 1 not found"))?;
        Ok(entry_id)
    }

    async fn first_version_row<C: ConnectionTrait>(
        &self,
        conn: &C,
        entity_id: i64,
    ) -> ChronikaResult<Option<(EntryId, Option<DataId>)>> {
        let select = Query::select()
            .from(ChronikaEntries::Table)
            .column(ChronikaEntries::EntryId)
            .column(ChronikaEntries::DataId)
            .and_where(Expr::col(ChronikaEntries::EntityId).eq(entity_id))
            .and_where(Expr::col(ChronikaEntries::Ordinal).eq(1i32))
            .limit(1)
            .to_owned();
        let row = query_one(conn, &select).await?;
        let Some(row) = row else {
            return Ok(None);
        };
        let entry_id = EntryId(read_id(&row, ChronikaEntries::EntryId)?);
        let data_id = read_opt_id(&row, ChronikaEntries::DataId)?.map(DataId);
        Ok(Some((entry_id, data_id)))
    }

    /// Deletes every rebuilt row for the entity: tracked deltas, data rows
    /// not referenced by version 1, and envelopes with ordinal > 1.
    /// Ordinal 1 and its data row are never delete targets.
    async fn wipe_rebuilt(
        &self,
        tx: &sea_orm::DatabaseTransaction,
        entity_id: i64,
    ) -> ChronikaResult<()> {
        let keep_data = self
            .first_version_row(tx, entity_id)
            .await?
            .and_then(|(_, data_id)| data_id);

        let delete_deltas = Query::delete()
            .from_table(ChronikaTrackedDeltas::Table)
            .and_where(Expr::col(ChronikaTrackedDeltas::EntityId).eq(entity_id))
            .to_owned();
        exec(tx, &delete_deltas).await?;

        let mut delete_data = Query::delete()
            .from_table(ChronikaEntryData::Table)
            .and_where(Expr::col(ChronikaEntryData::EntityId).eq(entity_id))
            .to_owned();
        if let Some(keep) = keep_data {
            delete_data.and_where(Expr::col(ChronikaEntryData::DataId).ne(id_value(self.backend, keep.0)));
        }
        exec(tx, &delete_data).await?;

        let delete_entries = Query::delete()
            .from_table(ChronikaEntries::Table)
            .and_where(Expr::col(ChronikaEntries::EntityId).eq(entity_id))
            .and_where(Expr::col(ChronikaEntries::Ordinal).gt(1i32))
            .to_owned();
        exec(tx, &delete_entries).await?;
        Ok(())
    }

    /// Overwrites the externally-owned version 1 in place: its data row is
    /// upserted and the envelope updated. A missing envelope (entity
    /// creation not landed yet) is inserted instead, so replays converge.
    async fn update_first_version(
        &self,
        tx: &sea_orm::DatabaseTransaction,
        entity_id: i64,
        first: &VersionSeed,
    ) -> ChronikaResult<EntryId> {
        let existing = self.first_version_row(tx, entity_id).await?;
        let data_id = existing
            .as_ref()
            .and_then(|(_, data_id)| *data_id)
            .unwrap_or_else(|| DataId(Id::new()));

        let mut upsert_data = Query::insert()
            .into_table(ChronikaEntryData::Table)
            .columns(data_columns())
            .to_owned();
        upsert_data.values_panic(data_values(self.backend, data_id, entity_id, &first.state)?);
        upsert_data.on_conflict(
            OnConflict::column(ChronikaEntryData::DataId)
                .update_columns(data_update_columns())
                .to_owned(),
        );
        exec(tx, &upsert_data).await?;

        match existing {
            Some((entry_id, _)) => {
                let update = Query::update()
                    .table(ChronikaEntries::Table)
                    .values([
                        (
                            ChronikaEntries::ValidFrom,
                            first.valid_from.as_micros().into(),
                        ),
                        (
                            ChronikaEntries::ValidTo,
                            SeaValue::BigInt(first.valid_to.map(ValidTime::as_micros)).into(),
                        ),
                        (ChronikaEntries::ActorId, first.actor_id.into()),
                        (
                            ChronikaEntries::Notes,
                            SeaValue::String(Some(Box::new(first.note.clone()))).into(),
                        ),
                        (
                            ChronikaEntries::DataId,
                            id_value(self.backend, data_id.0).into(),
                        ),
                    ])
                    .and_where(
                        Expr::col(ChronikaEntries::EntryId).eq(id_value(self.backend, entry_id.0)),
                    )
                    .to_owned();
                exec(tx, &update).await?;
                Ok(entry_id)
            }
            None => {
                let entry_id = EntryId(Id::new());
                let insert = Query::insert()
                    .into_table(ChronikaEntries::Table)
                    .columns([
                        ChronikaEntries::EntryId,
                        ChronikaEntries::EntityId,
                        ChronikaEntries::Ordinal,
                        ChronikaEntries::ValidFrom,
                        ChronikaEntries::ValidTo,
                        ChronikaEntries::ActorId,
                        ChronikaEntries::Notes,
                        ChronikaEntries::DataId,
                    ])
                    .values_panic([
                        id_value(self.backend, entry_id.0).into(),
                        entity_id.into(),
                        1i32.into(),
                        first.valid_from.as_micros().into(),
                        SeaValue::BigInt(first.valid_to.map(ValidTime::as_micros)).into(),
                        first.actor_id.into(),
                        SeaValue::String(Some(Box::new(first.note.clone()))).into(),
                        id_value(self.backend, data_id.0).into(),
                    ])
                    .to_owned();
                exec(tx, &insert).await?;
                Ok(entry_id)
            }
        }
    }

    /// Phase 1: one grouped insert of all version-data rows, correlated to
    /// the input by explicit `(input_index, id)` pairs, never by row order.
    async fn insert_version_data(
        &self,
        tx: &sea_orm::DatabaseTransaction,
        entity_id: i64,
        rest: &[chronika_core::VersionRecord],
    ) -> ChronikaResult<Vec<(usize, DataId)>> {
        if rest.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<(usize, DataId)> = rest
            .iter()
            .enumerate()
            .map(|(index, _)| (index, DataId(Id::new())))
            .collect();
        let mut insert = Query::insert()
            .into_table(ChronikaEntryData::Table)
            .columns(data_columns())
            .to_owned();
        for (index, version) in rest.iter().enumerate() {
            insert.values_panic(data_values(
                self.backend,
                ids[index].1,
                entity_id,
                &version.state,
            )?);
        }
        exec(tx, &insert).await?;
        Ok(ids)
    }

    /// Phase 2: one grouped insert of the version envelopes, referencing the
    /// phase-1 data ids; returns the `(ordinal, id)` correlation map.
    async fn insert_version_envelopes(
        &self,
        tx: &sea_orm::DatabaseTransaction,
        entity_id: i64,
        rest: &[chronika_core::VersionRecord],
        data_ids: &[(usize, DataId)],
    ) -> ChronikaResult<HashMap<u32, EntryId>> {
        if rest.is_empty() {
            return Ok(HashMap::new());
        }
        let entry_ids: Vec<EntryId> = rest.iter().map(|_| EntryId(Id::new())).collect();
        let mut insert = Query::insert()
            .into_table(ChronikaEntries::Table)
            .columns([
                ChronikaEntries::EntryId,
                ChronikaEntries::EntityId,
                ChronikaEntries::Ordinal,
                ChronikaEntries::ValidFrom,
                ChronikaEntries::ValidTo,
                ChronikaEntries::ActorId,
                ChronikaEntries::Notes,
                ChronikaEntries::DataId,
            ])
            .to_owned();
        for (index, version) in rest.iter().enumerate() {
            let data_id = data_ids
                .iter()
                .find(|(data_index, _)| *data_index == index)
                .map(|(_, id)| *id)
                .ok_or_else(|| {
                    ChronikaError::processing(format!(
                        "no data id correlated to version index {index}"
                    ))
                })?;
            insert.values_panic([
                id_value(self.backend, entry_ids[index].0).into(),
                entity_id.into(),
                (version.ordinal as i32).into(),
                version.valid_from.as_micros().into(),
                SeaValue::BigInt(version.valid_to.map(ValidTime::as_micros)).into(),
                version.actor_id.into(),
                SeaValue::String(Some(Box::new(version.note.clone()))).into(),
                id_value(self.backend, data_id.0).into(),
            ]);
        }
        exec(tx, &insert).await?;
        Ok(rest
            .iter()
            .zip(entry_ids)
            .map(|(version, entry_id)| (version.ordinal, entry_id))
            .collect())
    }

    /// Phase 3: one grouped insert of the tracked deltas, referencing the
    /// phase-2 envelope ids.
    async fn insert_tracked_deltas(
        &self,
        tx: &sea_orm::DatabaseTransaction,
        entity_id: i64,
        deltas: &[chronika_core::DeltaRow],
        entry_ids: &HashMap<u32, EntryId>,
    ) -> ChronikaResult<()> {
        if deltas.is_empty() {
            return Ok(());
        }
        let mut insert = Query::insert()
            .into_table(ChronikaTrackedDeltas::Table)
            .columns([
                ChronikaTrackedDeltas::DeltaId,
                ChronikaTrackedDeltas::EntryId,
                ChronikaTrackedDeltas::EntityId,
                ChronikaTrackedDeltas::TrackedKey,
                ChronikaTrackedDeltas::NewValue,
            ])
            .to_owned();
        for delta in deltas {
            let entry_id = entry_ids.get(&delta.ordinal).ok_or_else(|| {
                ChronikaError::processing(format!(
                    "delta references unknown ordinal {}",
                    delta.ordinal
                ))
            })?;
            insert.values_panic([
                id_value(self.backend, Id::new()).into(),
                id_value(self.backend, entry_id.0).into(),
                entity_id.into(),
                (delta.key.as_i16() as i64).into(),
                delta.new_value.clone().into(),
            ]);
        }
        exec(tx, &insert).await?;
        Ok(())
    }
}

#[async_trait]
impl JournalSink for JournalStore {
    async fn persist_entity(&self, entity_id: i64, plan: &EntityPlan) -> ChronikaResult<u32> {
        let tx = self.conn.begin().await?;
        self.wipe_rebuilt(&tx, entity_id)
            .await
            .map_err(|err| phase_err(entity_id, "wipe phase", err))?;
        self.update_first_version(&tx, entity_id, &plan.first)
            .await
            .map_err(|err| phase_err(entity_id, "first-version phase", err))?;
        let data_ids = self
            .insert_version_data(&tx, entity_id, &plan.rest)
            .await
            .map_err(|err| phase_err(entity_id, "version-data phase", err))?;
        let entry_ids = self
            .insert_version_envelopes(&tx, entity_id, &plan.rest, &data_ids)
            .await
            .map_err(|err| phase_err(entity_id, "envelope phase", err))?;
        self.insert_tracked_deltas(&tx, entity_id, &plan.deltas, &entry_ids)
            .await
            .map_err(|err| phase_err(entity_id, "delta phase", err))?;
        tx.commit().await?;
        Ok(plan.versions())
    }

    async fn list_versions(&self, entity_id: i64) -> ChronikaResult<Vec<StoredVersion>> {
        let select = Query::select()
            .from(ChronikaEntries::Table)
            .columns([
                (ChronikaEntries::Table, ChronikaEntries::Ordinal),
                (ChronikaEntries::Table, ChronikaEntries::ValidFrom),
                (ChronikaEntries::Table, ChronikaEntries::ValidTo),
                (ChronikaEntries::Table, ChronikaEntries::ActorId),
                (ChronikaEntries::Table, ChronikaEntries::Notes),
            ])
            .columns([
                (ChronikaEntryData::Table, ChronikaEntryData::Subject),
                (ChronikaEntryData::Table, ChronikaEntryData::Description),
                (ChronikaEntryData::Table, ChronikaEntryData::ContainerId),
                (ChronikaEntryData::Table, ChronikaEntryData::KindId),
                (ChronikaEntryData::Table, ChronikaEntryData::StatusId),
                (ChronikaEntryData::Table, ChronikaEntryData::PriorityId),
                (ChronikaEntryData::Table, ChronikaEntryData::AuthorId),
                (ChronikaEntryData::Table, ChronikaEntryData::AssigneeId),
                (ChronikaEntryData::Table, ChronikaEntryData::CategoryId),
                (ChronikaEntryData::Table, ChronikaEntryData::MilestoneId),
                (ChronikaEntryData::Table, ChronikaEntryData::StartDate),
                (ChronikaEntryData::Table, ChronikaEntryData::DueDate),
                (ChronikaEntryData::Table, ChronikaEntryData::EstimatedHours),
                (ChronikaEntryData::Table, ChronikaEntryData::DoneRatio),
                (ChronikaEntryData::Table, ChronikaEntryData::IsPrivate),
                (ChronikaEntryData::Table, ChronikaEntryData::ManualScheduling),
            ])
            .left_join(
                ChronikaEntryData::Table,
                Expr::col((ChronikaEntries::Table, ChronikaEntries::DataId))
                    .equals((ChronikaEntryData::Table, ChronikaEntryData::DataId)),
            )
            .and_where(Expr::col((ChronikaEntries::Table, ChronikaEntries::EntityId)).eq(entity_id))
            .order_by(
                (ChronikaEntries::Table, ChronikaEntries::Ordinal),
                Order::Asc,
            )
            .to_owned();
        let rows = query_all(&self.conn, &select).await?;
        let mut versions = Vec::with_capacity(rows.len());
        for row in rows {
            let ordinal: i32 = row.try_get("", &col_name(ChronikaEntries::Ordinal))?;
            let valid_from: i64 = row.try_get("", &col_name(ChronikaEntries::ValidFrom))?;
            let valid_to: Option<i64> = row.try_get("", &col_name(ChronikaEntries::ValidTo))?;
            let actor_id: i64 = row.try_get("", &col_name(ChronikaEntries::ActorId))?;
            let note: Option<String> = row.try_get("", &col_name(ChronikaEntries::Notes))?;
            versions.push(StoredVersion {
                ordinal: ordinal as u32,
                actor_id,
                note: note.unwrap_or_default(),
                valid_from: ValidTime(valid_from),
                valid_to: valid_to.map(ValidTime),
                state: read_state(&row)?,
            });
        }
        Ok(versions)
    }

    async fn list_deltas(&self, entity_id: i64) -> ChronikaResult<Vec<StoredDelta>> {
        let select = Query::select()
            .from(ChronikaTrackedDeltas::Table)
            .columns([
                (ChronikaTrackedDeltas::Table, ChronikaTrackedDeltas::TrackedKey),
                (ChronikaTrackedDeltas::Table, ChronikaTrackedDeltas::NewValue),
            ])
            .column((ChronikaEntries::Table, ChronikaEntries::Ordinal))
            .inner_join(
                ChronikaEntries::Table,
                Expr::col((ChronikaTrackedDeltas::Table, ChronikaTrackedDeltas::EntryId))
                    .equals((ChronikaEntries::Table, ChronikaEntries::EntryId)),
            )
            .and_where(
                Expr::col((ChronikaTrackedDeltas::Table, ChronikaTrackedDeltas::EntityId))
                    .eq(entity_id),
            )
            .order_by(
                (ChronikaEntries::Table, ChronikaEntries::Ordinal),
                Order::Asc,
            )
            .order_by(
                (ChronikaTrackedDeltas::Table, ChronikaTrackedDeltas::TrackedKey),
                Order::Asc,
            )
            .to_owned();
        let rows = query_all(&self.conn, &select).await?;
        let mut deltas = Vec::with_capacity(rows.len());
        for row in rows {
            let ordinal: i32 = row.try_get("", &col_name(ChronikaEntries::Ordinal))?;
            let key_raw: i16 = row.try_get("", &col_name(ChronikaTrackedDeltas::TrackedKey))?;
            let new_value: String = row.try_get("", &col_name(ChronikaTrackedDeltas::NewValue))?;
            let key = TrackedKey::from_i16(key_raw)
                .ok_or_else(|| ChronikaError::storage("invalid tracked key"))?;
            deltas.push(StoredDelta {
                ordinal: ordinal as u32,
                key,
                new_value,
            });
        }
        Ok(deltas)
    }
}

fn phase_err(entity_id: i64, phase: &str, err: ChronikaError) -> ChronikaError {
    ChronikaError::storage(format!("entity {entity_id}: {phase}: {err}"))
}

fn data_columns() -> [ChronikaEntryData; 18] {
    [
        ChronikaEntryData::DataId,
        ChronikaEntryData::EntityId,
        ChronikaEntryData::Subject,
        ChronikaEntryData::Description,
        ChronikaEntryData::ContainerId,
        ChronikaEntryData::KindId,
        ChronikaEntryData::StatusId,
        ChronikaEntryData::PriorityId,
        ChronikaEntryData::AuthorId,
        ChronikaEntryData::AssigneeId,
        ChronikaEntryData::CategoryId,
        ChronikaEntryData::MilestoneId,
        ChronikaEntryData::StartDate,
        ChronikaEntryData::DueDate,
        ChronikaEntryData::EstimatedHours,
        ChronikaEntryData::DoneRatio,
        ChronikaEntryData::IsPrivate,
        ChronikaEntryData::ManualScheduling,
    ]
}

fn data_update_columns() -> [ChronikaEntryData; 17] {
    [
        ChronikaEntryData::EntityId,
        ChronikaEntryData::Subject,
        ChronikaEntryData::Description,
        ChronikaEntryData::ContainerId,
        ChronikaEntryData::KindId,
        ChronikaEntryData::StatusId,
        ChronikaEntryData::PriorityId,
        ChronikaEntryData::AuthorId,
        ChronikaEntryData::AssigneeId,
        ChronikaEntryData::CategoryId,
        ChronikaEntryData::MilestoneId,
        ChronikaEntryData::StartDate,
        ChronikaEntryData::DueDate,
        ChronikaEntryData::EstimatedHours,
        ChronikaEntryData::DoneRatio,
        ChronikaEntryData::IsPrivate,
        ChronikaEntryData::ManualScheduling,
    ]
}

fn data_values(
    backend: DatabaseBackend,
    data_id: DataId,
    entity_id: i64,
    state: &BTreeMap<AttributeKey, Value>,
) -> ChronikaResult<Vec<SimpleExpr>> {
    let required_i64 = |key: AttributeKey| -> ChronikaResult<i64> {
        state
            .get(&key)
            .and_then(Value::as_i64)
            .ok_or_else(|| ChronikaError::processing(format!("snapshot missing required {key:?}")))
    };
    let required_bool = |key: AttributeKey| -> ChronikaResult<bool> {
        state
            .get(&key)
            .and_then(Value::as_bool)
            .ok_or_else(|| ChronikaError::processing(format!("snapshot missing required {key:?}")))
    };
    let opt_i64 = |key: AttributeKey| state.get(&key).and_then(Value::as_i64);
    let opt_str = |key: AttributeKey| {
        state
            .get(&key)
            .and_then(Value::as_str)
            .map(str::to_string)
    };
    let opt_time = |key: AttributeKey| match state.get(&key) {
        Some(Value::Time(time)) => Some(time.as_micros()),
        _ => None,
    };
    let opt_f64 = |key: AttributeKey| match state.get(&key) {
        Some(Value::F64(value)) => Some(*value),
        _ => None,
    };

    Ok(vec![
        id_value(backend, data_id.0).into(),
        entity_id.into(),
        SeaValue::String(opt_str(AttributeKey::Subject).map(Box::new)).into(),
        SeaValue::String(opt_str(AttributeKey::Description).map(Box::new)).into(),
        required_i64(AttributeKey::ContainerId)?.into(),
        required_i64(AttributeKey::KindId)?.into(),
        required_i64(AttributeKey::StatusId)?.into(),
        SeaValue::BigInt(opt_i64(AttributeKey::PriorityId)).into(),
        required_i64(AttributeKey::AuthorId)?.into(),
        SeaValue::BigInt(opt_i64(AttributeKey::AssigneeId)).into(),
        SeaValue::BigInt(opt_i64(AttributeKey::CategoryId)).into(),
        SeaValue::BigInt(opt_i64(AttributeKey::MilestoneId)).into(),
        SeaValue::BigInt(opt_time(AttributeKey::StartDate)).into(),
        SeaValue::BigInt(opt_time(AttributeKey::DueDate)).into(),
        SeaValue::Double(opt_f64(AttributeKey::EstimatedHours)).into(),
        SeaValue::BigInt(opt_i64(AttributeKey::DoneRatio)).into(),
        required_bool(AttributeKey::IsPrivate)?.into(),
        required_bool(AttributeKey::ManualScheduling)?.into(),
    ])
}

fn read_state(row: &QueryResult) -> ChronikaResult<BTreeMap<AttributeKey, Value>> {
    let mut state = BTreeMap::new();
    let str_cols = [
        (AttributeKey::Subject, ChronikaEntryData::Subject),
        (AttributeKey::Description, ChronikaEntryData::Description),
    ];
    for (key, col) in str_cols {
        let value: Option<String> = row.try_get("", &col_name(col))?;
        if let Some(value) = value {
            state.insert(key, Value::Str(value));
        }
    }
    let i64_cols = [
        (AttributeKey::ContainerId, ChronikaEntryData::ContainerId),
        (AttributeKey::KindId, ChronikaEntryData::KindId),
        (AttributeKey::StatusId, ChronikaEntryData::StatusId),
        (AttributeKey::PriorityId, ChronikaEntryData::PriorityId),
        (AttributeKey::AuthorId, ChronikaEntryData::AuthorId),
        (AttributeKey::AssigneeId, ChronikaEntryData::AssigneeId),
        (AttributeKey::CategoryId, ChronikaEntryData::CategoryId),
        (AttributeKey::MilestoneId, ChronikaEntryData::MilestoneId),
        (AttributeKey::DoneRatio, ChronikaEntryData::DoneRatio),
    ];
    for (key, col) in i64_cols {
        let value: Option<i64> = row.try_get("", &col_name(col))?;
        if let Some(value) = value {
            state.insert(key, Value::I64(value));
        }
    }
    let time_cols = [
        (AttributeKey::StartDate, ChronikaEntryData::StartDate),
        (AttributeKey::DueDate, ChronikaEntryData::DueDate),
    ];
    for (key, col) in time_cols {
        let value: Option<i64> = row.try_get("", &col_name(col))?;
        if let Some(value) = value {
            state.insert(key, Value::Time(ValidTime(value)));
        }
    }
    let hours: Option<f64> = row.try_get("", &col_name(ChronikaEntryData::EstimatedHours))?;
    if let Some(hours) = hours {
        state.insert(AttributeKey::EstimatedHours, Value::F64(hours));
    }
    let bool_cols = [
        (AttributeKey::IsPrivate, ChronikaEntryData::IsPrivate),
        (
            AttributeKey::ManualScheduling,
            ChronikaEntryData::ManualScheduling,
        ),
    ];
    for (key, col) in bool_cols {
        let value: Option<bool> = row.try_get("", &col_name(col))?;
        if let Some(value) = value {
            state.insert(key, Value::Bool(value));
        }
    }
    Ok(state)
}

fn id_value(backend: DatabaseBackend, id: Id) -> SeaValue {
    match backend {
        DatabaseBackend::Postgres => {
            let uuid = Uuid::from_bytes(id.as_bytes());
            SeaValue::Uuid(Some(Box::new(uuid)))
        }
        DatabaseBackend::MySql => SeaValue::Bytes(Some(Box::new(id.as_vec()))),
        DatabaseBackend::Sqlite => SeaValue::String(Some(Box::new(id.to_uuid_string()))),
        _ => SeaValue::String(Some(Box::new(id.to_uuid_string()))),
    }
}

fn none_id_value(backend: DatabaseBackend) -> SeaValue {
    match backend {
        DatabaseBackend::Postgres => SeaValue::Uuid(None),
        DatabaseBackend::MySql => SeaValue::Bytes(None),
        DatabaseBackend::Sqlite => SeaValue::String(None),
        _ => SeaValue::String(None),
    }
}

fn bytes_to_id(bytes: Vec<u8>) -> Option<Id> {
    if bytes.len() == 16 {
        let mut buf = [0u8; 16];
        buf.copy_from_slice(&bytes);
        Some(Id::from_bytes(buf))
    } else {
        None
    }
}

fn read_id(row: &QueryResult, column: impl sea_query::Iden) -> ChronikaResult<Id> {
    let name = col_name(column);
    if let Ok(value) = row.try_get::<String>("", &name) {
        return Id::from_uuid_str(&value);
    }
    if let Ok(value) = row.try_get::<Uuid>("", &name) {
        return Ok(Id::from_bytes(*value.as_bytes()));
    }
    if let Ok(value) = row.try_get::<Vec<u8>>("", &name) {
        return bytes_to_id(value).ok_or_else(|| ChronikaError::storage("invalid id length"));
    }
    Err(ChronikaError::storage("unsupported id format"))
}

fn read_opt_id(row: &QueryResult, column: impl sea_query::Iden) -> ChronikaResult<Option<Id>> {
    let name = col_name(column);
    if let Ok(value) = row.try_get::<Option<String>>("", &name) {
        return value.map(|value| Id::from_uuid_str(&value)).transpose();
    }
    if let Ok(value) = row.try_get::<Option<Uuid>>("", &name) {
        return Ok(value.map(|value| Id::from_bytes(*value.as_bytes())));
    }
    if let Ok(value) = row.try_get::<Option<Vec<u8>>>("", &name) {
        return Ok(value.and_then(bytes_to_id));
    }
    Ok(None)
}

fn col_name(column: impl sea_query::Iden) -> String {
    column.to_string()
}

fn build_stmt<S: QueryStatementWriter>(
    backend: DatabaseBackend,
    stmt: &S,
) -> (String, sea_orm::sea_query::Values) {
    match backend {
        DatabaseBackend::Sqlite => stmt.build(SqliteQueryBuilder),
        DatabaseBackend::Postgres => stmt.build(PostgresQueryBuilder),
        DatabaseBackend::MySql => stmt.build(MysqlQueryBuilder),
        _ => stmt.build(SqliteQueryBuilder),
    }
}

async fn exec<C, S>(conn: &C, stmt: &S) -> ChronikaResult<()>
where
    C: ConnectionTrait,
    S: QueryStatementWriter,
{
    let backend = conn.get_database_backend();
    let (sql, values) = build_stmt(backend, stmt);
    conn.execute(Statement::from_sql_and_values(backend, sql, values))
        .await?;
    Ok(())
}

async fn query_all<C, S>(conn: &C, stmt: &S) -> ChronikaResult<Vec<QueryResult>>
where
    C: ConnectionTrait,
    S: QueryStatementWriter,
{
    let backend = conn.get_database_backend();
    let (sql, values) = build_stmt(backend, stmt);
    let rows = conn
        .query_all(Statement::from_sql_and_values(backend, sql, values))
        .await?;
    Ok(rows)
}

async fn query_one<C, S>(conn: &C, stmt: &S) -> ChronikaResult<Option<QueryResult>>
where
    C: ConnectionTrait,
    S: QueryStatementWriter,
{
    let backend = conn.get_database_backend();
    let (sql, values) = build_stmt(backend, stmt);
    let row = conn
        .query_one(Statement::from_sql_and_values(backend, sql, values))
        .await?;
    Ok(row)
}

fn build_connection_url(config: &JournalConfig, base_dir: &Path) -> ChronikaResult<String> {
    match &config.database {
        crate::config::DatabaseConfig::Sqlite { .. } => {
            let path = config.sqlite_path(base_dir)?;
            Ok(format!("sqlite://{}?mode=rwc", path.display()))
        }
        crate::config::DatabaseConfig::Postgres { url } => Ok(url.clone()),
        crate::config::DatabaseConfig::Mysql { url } => Ok(url.clone()),
    }
}

use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::DatabaseBackend;

use crate::db::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();

        manager
            .create_table(
                Table::create()
                    .table(ChronikaEntries::Table)
                    .if_not_exists()
                    .col(id_col(backend, ChronikaEntries::EntryId, false))
                    .col(
                        ColumnDef::new(ChronikaEntries::EntityId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ChronikaEntries::Ordinal)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ChronikaEntries::ValidFrom)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ChronikaEntries::ValidTo).big_integer())
                    .col(
                        ColumnDef::new(ChronikaEntries::ActorId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ChronikaEntries::Notes).text())
                    .col(id_col(backend, ChronikaEntries::DataId, true))
                    .primary_key(
                        Index::create()
                            .name("pk_chronika_entries")
                            .col(ChronikaEntries::EntryId),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ChronikaEntryData::Table)
                    .if_not_exists()
                    .col(id_col(backend, ChronikaEntryData::DataId, false))
                    .col(
                        ColumnDef::new(ChronikaEntryData::EntityId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ChronikaEntryData::Subject).string())
                    .col(ColumnDef::new(ChronikaEntryData::Description).text())
                    .col(
                        ColumnDef::new(ChronikaEntryData::ContainerId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ChronikaEntryData::KindId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ChronikaEntryData::StatusId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ChronikaEntryData::PriorityId).big_integer())
                    .col(
                        ColumnDef::new(ChronikaEntryData::AuthorId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ChronikaEntryData::AssigneeId).big_integer())
                    .col(ColumnDef::new(ChronikaEntryData::CategoryId).big_integer())
                    .col(ColumnDef::new(ChronikaEntryData::MilestoneId).big_integer())
                    .col(ColumnDef::new(ChronikaEntryData::StartDate).big_integer())
                    .col(ColumnDef::new(ChronikaEntryData::DueDate).big_integer())
                    .col(ColumnDef::new(ChronikaEntryData::EstimatedHours).double())
                    .col(ColumnDef::new(ChronikaEntryData::DoneRatio).big_integer())
                    .col(
                        ColumnDef::new(ChronikaEntryData::IsPrivate)
                            .boolean()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ChronikaEntryData::ManualScheduling)
                            .boolean()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .name("pk_chronika_entry_data")
                            .col(ChronikaEntryData::DataId),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ChronikaTrackedDeltas::Table)
                    .if_not_exists()
                    .col(id_col(backend, ChronikaTrackedDeltas::DeltaId, false))
                    .col(id_col(backend, ChronikaTrackedDeltas::EntryId, false))
                    .col(
                        ColumnDef::new(ChronikaTrackedDeltas::EntityId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ChronikaTrackedDeltas::TrackedKey)
                            .small_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ChronikaTrackedDeltas::NewValue)
                            .string()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .name("pk_chronika_tracked_deltas")
                            .col(ChronikaTrackedDeltas::DeltaId),
                    )
                    .to_owned(),
            )
            .await?;

        create_indexes(manager).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ChronikaTrackedDeltas::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ChronikaEntryData::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ChronikaEntries::Table).to_owned())
            .await?;
        Ok(())
    }
}

async fn create_indexes(manager: &SchemaManager<'_>) -> Result<(), DbErr> {
    manager
        .create_index(
            Index::create()
                .name("chronika_entries_entity_ordinal_idx")
                .table(ChronikaEntries::Table)
                .col(ChronikaEntries::EntityId)
                .col(ChronikaEntries::Ordinal)
                .unique()
                .to_owned(),
        )
        .await?;
    manager
        .create_index(
            Index::create()
                .name("chronika_entries_entity_valid_from_idx")
                .table(ChronikaEntries::Table)
                .col(ChronikaEntries::EntityId)
                .col(ChronikaEntries::ValidFrom)
                .unique()
                .to_owned(),
        )
        .await?;
    manager
        .create_index(
            Index::create()
                .name("chronika_entry_data_entity_idx")
                .table(ChronikaEntryData::Table)
                .col(ChronikaEntryData::EntityId)
                .to_owned(),
        )
        .await?;
    manager
        .create_index(
            Index::create()
                .name("chronika_tracked_deltas_entity_idx")
                .table(ChronikaTrackedDeltas::Table)
                .col(ChronikaTrackedDeltas::EntityId)
                .to_owned(),
        )
        .await?;
    manager
        .create_index(
            Index::create()
                .name("chronika_tracked_deltas_entry_idx")
                .table(ChronikaTrackedDeltas::Table)
                .col(ChronikaTrackedDeltas::EntryId)
                .to_owned(),
        )
        .await?;
    Ok(())
}

fn id_col(backend: DatabaseBackend, col: impl Iden + 'static, nullable: bool) -> ColumnDef {
    let mut col_def = ColumnDef::new(col);
    match backend {
        DatabaseBackend::Postgres => {
            col_def.uuid();
        }
        DatabaseBackend::MySql => {
            col_def.binary_len(16);
        }
        DatabaseBackend::Sqlite => {
            col_def.string_len(36);
        }
        _ => {
            col_def.string_len(36);
        }
    }
    if nullable {
        col_def.null();
    } else {
        col_def.not_null();
    }
    col_def.to_owned()
}

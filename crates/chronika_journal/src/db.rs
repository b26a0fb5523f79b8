use sea_orm::sea_query;
use sea_orm_migration::prelude::Iden;

#[derive(Iden, Clone, Copy)]
pub enum ChronikaEntries {
    Table,
    EntryId,
    EntityId,
    Ordinal,
    ValidFrom,
    ValidTo,
    ActorId,
    Notes,
    DataId,
}

#[derive(Iden, Clone, Copy)]
pub enum ChronikaEntryData {
    Table,
    DataId,
    EntityId,
    Subject,
    Description,
    ContainerId,
    KindId,
    StatusId,
    PriorityId,
    AuthorId,
    AssigneeId,
    CategoryId,
    MilestoneId,
    StartDate,
    DueDate,
    EstimatedHours,
    DoneRatio,
    IsPrivate,
    ManualScheduling,
}

#[derive(Iden, Clone, Copy)]
pub enum ChronikaTrackedDeltas {
    Table,
    DeltaId,
    EntryId,
    EntityId,
    TrackedKey,
    NewValue,
}

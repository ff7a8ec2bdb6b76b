use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(EscalationLogs::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(EscalationLogs::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(EscalationLogs::AlarmId).uuid().not_null())
                    .col(ColumnDef::new(EscalationLogs::Layer).string().not_null())
                    .col(ColumnDef::new(EscalationLogs::Action).string().not_null())
                    .col(ColumnDef::new(EscalationLogs::RecipientType).string().not_null())
                    .col(ColumnDef::new(EscalationLogs::Channel).string().not_null())
                    .col(ColumnDef::new(EscalationLogs::SentAt).date_time().not_null())
                    .col(ColumnDef::new(EscalationLogs::ResponseAt).date_time())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-escalation-logs-alarm")
                            .from(EscalationLogs::Table, EscalationLogs::AlarmId)
                            .to(Alerts::Table, Alerts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // The idempotency lookup is per (alarm, layer) on every tick
        manager
            .create_index(
                Index::create()
                    .name("idx-escalation-logs-alarm-layer")
                    .table(EscalationLogs::Table)
                    .col(EscalationLogs::AlarmId)
                    .col(EscalationLogs::Layer)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(EscalationLogs::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum EscalationLogs {
    Table,
    Id,
    AlarmId,
    Layer,
    Action,
    RecipientType,
    Channel,
    SentAt,
    ResponseAt,
}

#[derive(DeriveIden)]
enum Alerts {
    Table,
    Id,
}

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Alerts::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Alerts::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Alerts::ColdCellId).uuid().not_null())
                    .col(ColumnDef::new(Alerts::AlertType).string().not_null())
                    .col(ColumnDef::new(Alerts::Status).string().not_null())
                    .col(ColumnDef::new(Alerts::Layer).string().not_null())
                    .col(ColumnDef::new(Alerts::TimeSlot).string())
                    .col(ColumnDef::new(Alerts::Value).double())
                    .col(ColumnDef::new(Alerts::Threshold).double())
                    .col(ColumnDef::new(Alerts::TriggeredAt).date_time().not_null())
                    .col(ColumnDef::new(Alerts::LastTriggeredAt).date_time().not_null())
                    .col(ColumnDef::new(Alerts::Layer2At).date_time())
                    .col(ColumnDef::new(Alerts::Layer3At).date_time())
                    .col(ColumnDef::new(Alerts::AcknowledgedAt).date_time())
                    .col(ColumnDef::new(Alerts::AcknowledgedBy).string())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-alerts-cold-cell")
                            .from(Alerts::Table, Alerts::ColdCellId)
                            .to(ColdCells::Table, ColdCells::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // The tick scans open alerts every minute
        manager
            .create_index(
                Index::create()
                    .name("idx-alerts-status")
                    .table(Alerts::Table)
                    .col(Alerts::Status)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Alerts::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Alerts {
    Table,
    Id,
    ColdCellId,
    AlertType,
    Status,
    Layer,
    TimeSlot,
    Value,
    Threshold,
    TriggeredAt,
    LastTriggeredAt,
    Layer2At,
    Layer3At,
    AcknowledgedAt,
    AcknowledgedBy,
}

#[derive(DeriveIden)]
enum ColdCells {
    Table,
    Id,
}

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Technicians::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Technicians::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Technicians::Name).string().not_null())
                    .col(ColumnDef::new(Technicians::Email).string().not_null())
                    .col(ColumnDef::new(Technicians::Phone).string())
                    .col(ColumnDef::new(Technicians::CreatedAt).date_time().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Customers::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Customers::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Customers::CompanyName).string().not_null())
                    .col(ColumnDef::new(Customers::Email).string().not_null())
                    .col(ColumnDef::new(Customers::Phone).string())
                    .col(ColumnDef::new(Customers::BackupPhone).string())
                    .col(ColumnDef::new(Customers::BackupContacts).json())
                    .col(ColumnDef::new(Customers::OpeningTime).string().not_null())
                    .col(ColumnDef::new(Customers::ClosingTime).string().not_null())
                    .col(ColumnDef::new(Customers::NightStart).string().not_null())
                    .col(ColumnDef::new(Customers::EscalationConfig).json())
                    .col(ColumnDef::new(Customers::LinkedTechnicianId).uuid())
                    .col(ColumnDef::new(Customers::CreatedAt).date_time().not_null())
                    .col(ColumnDef::new(Customers::UpdatedAt).date_time().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-customers-linked-technician")
                            .from(Customers::Table, Customers::LinkedTechnicianId)
                            .to(Technicians::Table, Technicians::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Locations::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Locations::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Locations::CustomerId).uuid().not_null())
                    .col(ColumnDef::new(Locations::Name).string().not_null())
                    .col(ColumnDef::new(Locations::Address).text())
                    .col(ColumnDef::new(Locations::CreatedAt).date_time().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-locations-customer")
                            .from(Locations::Table, Locations::CustomerId)
                            .to(Customers::Table, Customers::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ColdCells::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(ColdCells::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(ColdCells::LocationId).uuid().not_null())
                    .col(ColumnDef::new(ColdCells::Name).string().not_null())
                    .col(ColumnDef::new(ColdCells::TemperatureMinThreshold).double().not_null())
                    .col(ColumnDef::new(ColdCells::TemperatureMaxThreshold).double().not_null())
                    .col(ColumnDef::new(ColdCells::CreatedAt).date_time().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-cold-cells-location")
                            .from(ColdCells::Table, ColdCells::LocationId)
                            .to(Locations::Table, Locations::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ColdCells::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Locations::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Customers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Technicians::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Technicians {
    Table,
    Id,
    Name,
    Email,
    Phone,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Customers {
    Table,
    Id,
    CompanyName,
    Email,
    Phone,
    BackupPhone,
    BackupContacts,
    OpeningTime,
    ClosingTime,
    NightStart,
    EscalationConfig,
    LinkedTechnicianId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Locations {
    Table,
    Id,
    CustomerId,
    Name,
    Address,
    CreatedAt,
}

#[derive(DeriveIden)]
enum ColdCells {
    Table,
    Id,
    LocationId,
    Name,
    TemperatureMinThreshold,
    TemperatureMaxThreshold,
    CreatedAt,
}

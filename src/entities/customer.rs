use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "customers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub company_name: String,
    pub email: String,
    pub phone: Option<String>,
    /// Legacy single backup number, superseded by `backup_contacts`.
    pub backup_phone: Option<String>,
    /// JSON array of `{ "name": ..., "phone": ... }` entries.
    pub backup_contacts: Option<Json>,
    /// Business hours as "HH:MM" in the deployment's local time zone.
    pub opening_time: String,
    pub closing_time: String,
    pub night_start: String,
    /// Sparse per-slot layer-enable overrides, see
    /// `escalation::policy::EscalationOverrides`.
    pub escalation_config: Option<Json>,
    pub linked_technician_id: Option<Uuid>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::technician::Entity",
        from = "Column::LinkedTechnicianId",
        to = "super::technician::Column::Id",
        on_update = "Cascade",
        on_delete = "SetNull"
    )]
    Technician,
    #[sea_orm(has_many = "super::location::Entity")]
    Location,
}

impl Related<super::technician::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Technician.def()
    }
}

impl Related<super::location::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Location.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

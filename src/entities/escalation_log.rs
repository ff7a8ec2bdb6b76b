use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::alert::AlarmLayer;

/// Append-only record of one dispatch attempt. Doubles as the idempotency
/// guard: a row at (alarm_id, layer) means that layer was already entered.
/// Rows are never updated or deleted.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "escalation_logs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub alarm_id: Uuid,
    pub layer: AlarmLayer,
    pub action: String,
    pub recipient_type: RecipientType,
    pub channel: EscalationChannel,
    pub sent_at: DateTime,
    pub response_at: Option<DateTime>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Deserialize, Serialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum RecipientType {
    #[sea_orm(string_value = "CLIENT")]
    #[serde(rename = "CLIENT")]
    Client,
    #[sea_orm(string_value = "TECHNICIAN")]
    #[serde(rename = "TECHNICIAN")]
    Technician,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Deserialize, Serialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum EscalationChannel {
    #[sea_orm(string_value = "EMAIL")]
    #[serde(rename = "EMAIL")]
    Email,
    #[sea_orm(string_value = "SMS")]
    #[serde(rename = "SMS")]
    Sms,
    #[sea_orm(string_value = "PUSH")]
    #[serde(rename = "PUSH")]
    Push,
    #[sea_orm(string_value = "PHONE")]
    #[serde(rename = "PHONE")]
    Phone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::alert::Entity",
        from = "Column::AlarmId",
        to = "super::alert::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Alert,
}

impl Related<super::alert::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Alert.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Abnormal condition detected on a cold cell, pending acknowledgement.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "alerts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub cold_cell_id: Uuid,
    pub alert_type: AlertType,
    pub status: AlertStatus,
    pub layer: AlarmLayer,
    /// Captured at creation; recomputed from customer hours when absent
    /// (legacy rows).
    pub time_slot: Option<TimeSlot>,
    pub value: Option<f64>,
    pub threshold: Option<f64>,
    pub triggered_at: DateTime,
    pub last_triggered_at: DateTime,
    pub layer2_at: Option<DateTime>,
    pub layer3_at: Option<DateTime>,
    pub acknowledged_at: Option<DateTime>,
    pub acknowledged_by: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Deserialize, Serialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum AlertType {
    #[sea_orm(string_value = "HIGH_TEMP")]
    #[serde(rename = "HIGH_TEMP")]
    HighTemp,
    #[sea_orm(string_value = "LOW_TEMP")]
    #[serde(rename = "LOW_TEMP")]
    LowTemp,
    #[sea_orm(string_value = "POWER_LOSS")]
    #[serde(rename = "POWER_LOSS")]
    PowerLoss,
    #[sea_orm(string_value = "DOOR_OPEN")]
    #[serde(rename = "DOOR_OPEN")]
    DoorOpen,
    #[sea_orm(string_value = "SENSOR_ERROR")]
    #[serde(rename = "SENSOR_ERROR")]
    SensorError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Deserialize, Serialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum AlertStatus {
    #[sea_orm(string_value = "ACTIVE")]
    #[serde(rename = "ACTIVE")]
    Active,
    #[sea_orm(string_value = "ESCALATING")]
    #[serde(rename = "ESCALATING")]
    Escalating,
    #[sea_orm(string_value = "RESOLVED")]
    #[serde(rename = "RESOLVED")]
    Resolved,
}

/// Escalation tier. `Ord` follows escalation order: the layer of a live alert
/// only ever moves forward.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, EnumIter, DeriveActiveEnum, Deserialize, Serialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum AlarmLayer {
    #[sea_orm(string_value = "LAYER_1")]
    #[serde(rename = "LAYER_1")]
    Layer1,
    #[sea_orm(string_value = "LAYER_2")]
    #[serde(rename = "LAYER_2")]
    Layer2,
    #[sea_orm(string_value = "LAYER_3")]
    #[serde(rename = "LAYER_3")]
    Layer3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Deserialize, Serialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum TimeSlot {
    #[sea_orm(string_value = "OPEN_HOURS")]
    #[serde(rename = "OPEN_HOURS")]
    OpenHours,
    #[sea_orm(string_value = "AFTER_HOURS")]
    #[serde(rename = "AFTER_HOURS")]
    AfterHours,
    #[sea_orm(string_value = "NIGHT")]
    #[serde(rename = "NIGHT")]
    Night,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::cold_cell::Entity",
        from = "Column::ColdCellId",
        to = "super::cold_cell::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    ColdCell,
    #[sea_orm(has_many = "super::escalation_log::Entity")]
    EscalationLog,
}

impl Related<super::cold_cell::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ColdCell.def()
    }
}

impl Related<super::escalation_log::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::EscalationLog.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

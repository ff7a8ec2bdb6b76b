use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use crate::entities::{
    alert::AlarmLayer,
    escalation_log::{self, EscalationChannel, RecipientType},
    EscalationLog,
};

/// Append one dispatch-attempt row. The row records intent, not delivery:
/// it is written whether or not the underlying channel send succeeded.
pub async fn record<C: ConnectionTrait>(
    db: &C,
    alarm_id: Uuid,
    layer: AlarmLayer,
    action: &str,
    recipient_type: RecipientType,
    channel: EscalationChannel,
) -> Result<escalation_log::Model, sea_orm::DbErr> {
    let entry = escalation_log::ActiveModel {
        id: Set(Uuid::new_v4()),
        alarm_id: Set(alarm_id),
        layer: Set(layer),
        action: Set(action.to_string()),
        recipient_type: Set(recipient_type),
        channel: Set(channel),
        sent_at: Set(Utc::now().naive_utc()),
        response_at: Set(None),
    };
    entry.insert(db).await
}

/// Durable idempotency check: has any dispatch row been written for this
/// alert at this layer? Required before every fan-out, see the engine.
pub async fn layer_entered<C: ConnectionTrait>(
    db: &C,
    alarm_id: Uuid,
    layer: AlarmLayer,
) -> Result<bool, sea_orm::DbErr> {
    let existing = EscalationLog::find()
        .filter(escalation_log::Column::AlarmId.eq(alarm_id))
        .filter(escalation_log::Column::Layer.eq(layer))
        .one(db)
        .await?;
    Ok(existing.is_some())
}

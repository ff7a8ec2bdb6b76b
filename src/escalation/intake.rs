//! Threshold checking for incoming temperature readings and creation of new
//! alerts at the correct initial escalation state.

use chrono::{DateTime, Local, NaiveDateTime, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use tracing::{debug, warn};
use uuid::Uuid;

use super::policy::{self, EscalationOverrides};
use super::time_slot::{self, BusinessHours};
use super::AlertContext;
use crate::entities::alert::{self, AlarmLayer, AlertStatus, AlertType, TimeSlot};
use crate::entities::{cold_cell, Alert, ColdCell, Customer, Location, Technician};
use crate::notifications::{layers, AlertNotifier};

fn classify(temperature: f64, cell: &cold_cell::Model) -> Option<(AlertType, f64)> {
    if temperature > cell.temperature_max_threshold {
        Some((AlertType::HighTemp, cell.temperature_max_threshold))
    } else if temperature < cell.temperature_min_threshold {
        Some((AlertType::LowTemp, cell.temperature_min_threshold))
    } else {
        None
    }
}

/// Layer, status and transition timestamps for a brand-new alert: the first
/// enabled layer for the slot, ESCALATING when layer 1 is skipped.
fn initial_state(
    slot: TimeSlot,
    overrides: Option<&EscalationOverrides>,
    now: NaiveDateTime,
) -> (AlarmLayer, AlertStatus, Option<NaiveDateTime>, Option<NaiveDateTime>) {
    let layer = policy::initial_layer_for(slot, overrides);
    match layer {
        AlarmLayer::Layer1 => (layer, AlertStatus::Active, None, None),
        AlarmLayer::Layer2 => (layer, AlertStatus::Escalating, Some(now), None),
        AlarmLayer::Layer3 => (layer, AlertStatus::Escalating, None, Some(now)),
    }
}

/// Check one temperature reading against the cell's thresholds. Creates a new
/// alert (and dispatches its entry layer) on a fresh crossing; refreshes
/// `value`/`last_triggered_at` when an open alert of the same type already
/// exists, so a persisting condition does not spawn duplicates.
pub async fn process_temperature_reading(
    db: &DatabaseConnection,
    notifier: &AlertNotifier,
    cold_cell_id: Uuid,
    temperature: f64,
    now: DateTime<Utc>,
) -> Result<Option<alert::Model>, sea_orm::DbErr> {
    let Some(cell) = ColdCell::find_by_id(cold_cell_id).one(db).await? else {
        warn!("Cold cell {} not found for reading", cold_cell_id);
        return Ok(None);
    };

    let Some((alert_type, threshold)) = classify(temperature, &cell) else {
        return Ok(None);
    };

    let existing = Alert::find()
        .filter(alert::Column::ColdCellId.eq(cell.id))
        .filter(alert::Column::AlertType.eq(alert_type))
        .filter(alert::Column::Status.is_in([AlertStatus::Active, AlertStatus::Escalating]))
        .one(db)
        .await?;

    if let Some(open_alert) = existing {
        // Don't spam duplicate alerts; refresh the reading instead
        let alert_id = open_alert.id;
        let mut active: alert::ActiveModel = open_alert.into();
        active.last_triggered_at = Set(now.naive_utc());
        active.value = Set(Some(temperature));
        let updated = active.update(db).await?;
        debug!("Refreshed open alert {} with value {}", alert_id, temperature);
        return Ok(Some(updated));
    }

    let Some(location) = Location::find_by_id(cell.location_id).one(db).await? else {
        warn!("Location missing for cold cell {}; alert not created", cell.id);
        return Ok(None);
    };
    let Some(customer) = Customer::find_by_id(location.customer_id).one(db).await? else {
        warn!("Customer missing for location {}; alert not created", location.id);
        return Ok(None);
    };
    let technician = match customer.linked_technician_id {
        Some(id) => Technician::find_by_id(id).one(db).await?,
        None => None,
    };

    let overrides = EscalationOverrides::of(&customer);
    let slot = time_slot::resolve(
        &BusinessHours::of(&customer),
        now.with_timezone(&Local).time(),
    );
    let (layer, status, layer2_at, layer3_at) = initial_state(slot, overrides.as_ref(), now.naive_utc());

    let new_alert = alert::ActiveModel {
        id: Set(Uuid::new_v4()),
        cold_cell_id: Set(cell.id),
        alert_type: Set(alert_type),
        status: Set(status),
        layer: Set(layer),
        time_slot: Set(Some(slot)),
        value: Set(Some(temperature)),
        threshold: Set(Some(threshold)),
        triggered_at: Set(now.naive_utc()),
        last_triggered_at: Set(now.naive_utc()),
        layer2_at: Set(layer2_at),
        layer3_at: Set(layer3_at),
        acknowledged_at: Set(None),
        acknowledged_by: Set(None),
    };
    let created = new_alert.insert(db).await?;

    let ctx = AlertContext {
        alert: created.clone(),
        cold_cell: cell,
        customer,
        technician,
    };
    layers::dispatch_layer(db, notifier, layer, &ctx).await;

    Ok(Some(created))
}

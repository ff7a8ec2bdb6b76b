use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter};

use crate::entities::alert::{self, AlarmLayer, AlertStatus};
use crate::entities::{Alert, ColdCell, Customer};

pub async fn init_metrics(db: &DatabaseConnection) {
    let customer_count = Customer::find().count(db).await.unwrap_or(0);
    metrics::gauge!("intellifrost_customers_total").set(customer_count as f64);

    let cell_count = ColdCell::find().count(db).await.unwrap_or(0);
    metrics::gauge!("intellifrost_cold_cells_total").set(cell_count as f64);

    refresh_open_alerts(db).await;

    tracing::info!(
        "Initialized metrics: Customers={}, ColdCells={}",
        customer_count,
        cell_count
    );
}

/// Gauge of unacknowledged ACTIVE/ESCALATING alerts; refreshed periodically
/// by the worker.
pub async fn refresh_open_alerts(db: &DatabaseConnection) {
    let open = Alert::find()
        .filter(alert::Column::Status.is_in([AlertStatus::Active, AlertStatus::Escalating]))
        .filter(alert::Column::AcknowledgedAt.is_null())
        .count(db)
        .await
        .unwrap_or(0);
    metrics::gauge!("intellifrost_open_alerts").set(open as f64);
}

pub fn increment_layer_dispatches(layer: AlarmLayer) {
    let label = match layer {
        AlarmLayer::Layer1 => "layer_1",
        AlarmLayer::Layer2 => "layer_2",
        AlarmLayer::Layer3 => "layer_3",
    };
    metrics::counter!("intellifrost_layer_dispatches_total", "layer" => label).increment(1);
}

pub fn increment_notifications_sent(channel: &str) {
    metrics::counter!("intellifrost_notifications_sent_total", "channel" => channel.to_string()).increment(1);
}

pub fn increment_notifications_failed(channel: &str) {
    metrics::counter!("intellifrost_notifications_failed_total", "channel" => channel.to_string()).increment(1);
}

pub fn record_tick_duration(seconds: f64) {
    metrics::histogram!("intellifrost_escalation_tick_duration_seconds").record(seconds);
}

pub fn record_acknowledgment_time(seconds: f64) {
    metrics::histogram!("intellifrost_alert_acknowledgment_duration_seconds").record(seconds);
}

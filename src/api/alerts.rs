use axum::{
    extract::{Extension, Path},
    response::IntoResponse,
    Json,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use tracing::error;
use uuid::Uuid;

use crate::entities::alert::{self, AlertStatus};
use crate::entities::{escalation_log, prelude::*};

#[derive(Deserialize)]
pub struct AcknowledgeRequest {
    pub acknowledged_by: String,
}

// GET /alerts
pub async fn list_open_alerts(Extension(db): Extension<DatabaseConnection>) -> impl IntoResponse {
    let alerts_result = Alert::find()
        .filter(alert::Column::Status.is_in([AlertStatus::Active, AlertStatus::Escalating]))
        .filter(alert::Column::AcknowledgedAt.is_null())
        .order_by_desc(alert::Column::TriggeredAt)
        .all(&db)
        .await;

    match alerts_result {
        Ok(alerts) => (axum::http::StatusCode::OK, Json(alerts)).into_response(),
        Err(e) => {
            error!("Failed to fetch open alerts: {}", e);
            (axum::http::StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch alerts").into_response()
        }
    }
}

// GET /alerts/:id
pub async fn get_alert(
    Extension(db): Extension<DatabaseConnection>,
    Path(alert_id): Path<Uuid>,
) -> impl IntoResponse {
    match Alert::find_by_id(alert_id).one(&db).await {
        Ok(Some(a)) => (axum::http::StatusCode::OK, Json(a)).into_response(),
        Ok(None) => (axum::http::StatusCode::NOT_FOUND, "Alert not found").into_response(),
        Err(e) => {
            error!("Failed to fetch alert: {}", e);
            (axum::http::StatusCode::INTERNAL_SERVER_ERROR, "Database error").into_response()
        }
    }
}

// POST /alerts/:id/acknowledge
//
// The acknowledgement path: a human (dashboard, phone DTMF relay) confirms
// the alert. Freezes every further escalation tick for this alert.
pub async fn acknowledge_alert(
    Extension(db): Extension<DatabaseConnection>,
    Path(alert_id): Path<Uuid>,
    Json(payload): Json<AcknowledgeRequest>,
) -> impl IntoResponse {
    let alert = match Alert::find_by_id(alert_id).one(&db).await {
        Ok(Some(a)) => a,
        Ok(None) => return (axum::http::StatusCode::NOT_FOUND, "Alert not found").into_response(),
        Err(e) => {
            error!("Failed to fetch alert: {}", e);
            return (axum::http::StatusCode::INTERNAL_SERVER_ERROR, "Database error").into_response();
        }
    };

    if alert.acknowledged_at.is_some() {
        return (
            axum::http::StatusCode::OK,
            Json(serde_json::json!({"status": "already_acknowledged"})),
        )
            .into_response();
    }

    let now = chrono::Utc::now().naive_utc();
    let triggered_at = alert.triggered_at;

    let mut active_model: alert::ActiveModel = alert.into();
    active_model.acknowledged_at = Set(Some(now));
    active_model.acknowledged_by = Set(Some(payload.acknowledged_by));
    active_model.status = Set(AlertStatus::Resolved);

    match active_model.update(&db).await {
        Ok(_) => {
            let waited = (now - triggered_at).num_seconds().max(0) as f64;
            crate::metrics::record_acknowledgment_time(waited);
            (
                axum::http::StatusCode::OK,
                Json(serde_json::json!({"status": "acknowledged"})),
            )
                .into_response()
        }
        Err(e) => {
            error!("Failed to acknowledge alert: {}", e);
            (axum::http::StatusCode::INTERNAL_SERVER_ERROR, "Failed to update alert").into_response()
        }
    }
}

// GET /alerts/:id/escalations
//
// Audit view over the append-only escalation log.
pub async fn list_alert_escalations(
    Extension(db): Extension<DatabaseConnection>,
    Path(alert_id): Path<Uuid>,
) -> impl IntoResponse {
    let entries = EscalationLog::find()
        .filter(escalation_log::Column::AlarmId.eq(alert_id))
        .order_by_asc(escalation_log::Column::SentAt)
        .all(&db)
        .await;

    match entries {
        Ok(entries) => (axum::http::StatusCode::OK, Json(entries)).into_response(),
        Err(e) => {
            error!("Failed to fetch escalation log: {}", e);
            (axum::http::StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch escalation log").into_response()
        }
    }
}

use axum::{extract::Extension, response::IntoResponse, Json};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use tracing::error;
use uuid::Uuid;

use crate::escalation::intake;
use crate::notifications::AlertNotifier;

#[derive(Deserialize)]
pub struct ReadingRequest {
    pub cold_cell_id: Uuid,
    pub temperature: f64,
}

// POST /readings
//
// Device-reported temperature reading. Threshold crossings open (or refresh)
// an alert; in-range readings are accepted and dropped.
pub async fn ingest_reading(
    Extension(db): Extension<DatabaseConnection>,
    Extension(notifier): Extension<AlertNotifier>,
    Json(payload): Json<ReadingRequest>,
) -> impl IntoResponse {
    let result = intake::process_temperature_reading(
        &db,
        &notifier,
        payload.cold_cell_id,
        payload.temperature,
        chrono::Utc::now(),
    )
    .await;

    match result {
        Ok(alert) => (
            axum::http::StatusCode::ACCEPTED,
            Json(serde_json::json!({
                "alert_id": alert.map(|a| a.id),
            })),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to process reading: {}", e);
            (axum::http::StatusCode::INTERNAL_SERVER_ERROR, "Failed to process reading").into_response()
        }
    }
}

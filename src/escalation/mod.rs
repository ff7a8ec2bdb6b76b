pub mod engine;
pub mod intake;
pub mod log;
pub mod policy;
pub mod time_slot;

pub use engine::{EscalationEngine, TickStats};

use crate::entities::{alert, cold_cell, customer, technician};

/// Everything dispatch needs to know about one alert: the alert row plus the
/// owning cold cell, customer and (optionally) linked technician.
#[derive(Debug, Clone)]
pub struct AlertContext {
    pub alert: alert::Model,
    pub cold_cell: cold_cell::Model,
    pub customer: customer::Model,
    pub technician: Option<technician::Model>,
}

impl AlertContext {
    /// All backup phone numbers for the customer: the `backup_contacts` JSON
    /// list when present, else the legacy single `backup_phone` field.
    pub fn backup_phones(&self) -> Vec<String> {
        let from_list: Vec<String> = self
            .customer
            .backup_contacts
            .as_ref()
            .and_then(|v| v.as_array())
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|e| e.get("phone").and_then(|p| p.as_str()))
                    .filter(|p| !p.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        if !from_list.is_empty() {
            return from_list;
        }
        self.customer.backup_phone.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn context(
        backup_contacts: Option<serde_json::Value>,
        backup_phone: Option<&str>,
    ) -> AlertContext {
        let now = Utc::now().naive_utc();
        AlertContext {
            alert: alert::Model {
                id: Uuid::new_v4(),
                cold_cell_id: Uuid::new_v4(),
                alert_type: alert::AlertType::HighTemp,
                status: alert::AlertStatus::Active,
                layer: alert::AlarmLayer::Layer1,
                time_slot: None,
                value: Some(9.5),
                threshold: Some(7.0),
                triggered_at: now,
                last_triggered_at: now,
                layer2_at: None,
                layer3_at: None,
                acknowledged_at: None,
                acknowledged_by: None,
            },
            cold_cell: cold_cell::Model {
                id: Uuid::new_v4(),
                location_id: Uuid::new_v4(),
                name: "Cell A".to_string(),
                temperature_min_threshold: -2.0,
                temperature_max_threshold: 7.0,
                created_at: now,
            },
            customer: customer::Model {
                id: Uuid::new_v4(),
                company_name: "Fresh Foods BV".to_string(),
                email: "ops@freshfoods.example".to_string(),
                phone: Some("0470111111".to_string()),
                backup_phone: backup_phone.map(str::to_string),
                backup_contacts,
                opening_time: "07:00".to_string(),
                closing_time: "17:00".to_string(),
                night_start: "23:00".to_string(),
                escalation_config: None,
                linked_technician_id: None,
                created_at: now,
                updated_at: now,
            },
            technician: None,
        }
    }

    #[test]
    fn backup_contacts_list_wins_over_legacy_field() {
        let ctx = context(
            Some(serde_json::json!([
                { "name": "Jan", "phone": "0470222222" },
                { "phone": "0470333333" },
                { "name": "no phone" }
            ])),
            Some("0470999999"),
        );
        assert_eq!(ctx.backup_phones(), vec!["0470222222", "0470333333"]);
    }

    #[test]
    fn legacy_backup_phone_used_when_list_absent() {
        let ctx = context(None, Some("0470999999"));
        assert_eq!(ctx.backup_phones(), vec!["0470999999"]);

        let ctx = context(Some(serde_json::json!([])), None);
        assert!(ctx.backup_phones().is_empty());
    }
}

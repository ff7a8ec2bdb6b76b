use crate::entities::alert::AlertType;

pub struct NotificationTemplates;

impl NotificationTemplates {
    pub fn alert_type_label(alert_type: AlertType) -> &'static str {
        match alert_type {
            AlertType::HighTemp => "temperature too high",
            AlertType::LowTemp => "temperature too low",
            AlertType::PowerLoss => "power loss",
            AlertType::DoorOpen => "door open",
            AlertType::SensorError => "sensor error",
        }
    }

    /// Layer 1 client email with reading, threshold and a dashboard link.
    pub fn client_alert_email(
        cold_cell_name: &str,
        type_label: &str,
        value: f64,
        threshold: f64,
        dashboard_url: &str,
    ) -> String {
        format!(
            r#"
<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto; line-height: 1.6; color: #333;">
  <h2 style="color: #00c8ff;">IntelliFrost – Cold Cell Alert</h2>
  <p>Your cold cell <strong>{cold_cell_name}</strong> has raised an alert.</p>
  <p><strong>Type:</strong> {type_label}<br>
  <strong>Current value:</strong> {value}°C<br>
  <strong>Threshold:</strong> {threshold}°C</p>
  <p><a href="{dashboard_url}" style="display: inline-block; padding: 12px 24px; background: #00c8ff; color: #060d18; text-decoration: none; border-radius: 6px; font-weight: bold;">Open dashboard</a></p>
  <p style="color: #666; font-size: 12px;">Acknowledge the alert in the dashboard to stop further escalation.</p>
</div>
"#
        )
    }

    /// Layer 1 technician email: raised priority, links to the technician view.
    pub fn technician_alert_email(
        company_name: &str,
        cold_cell_name: &str,
        type_label: &str,
        value: f64,
        technician_url: &str,
    ) -> String {
        format!(
            r#"
<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto; line-height: 1.6; color: #333;">
  <h2 style="color: #ff9500;">IntelliFrost – Alert (priority raised)</h2>
  <p>Customer <strong>{company_name}</strong> – cold cell <strong>{cold_cell_name}</strong>.</p>
  <p><strong>Type:</strong> {type_label}<br>
  <strong>Value:</strong> {value}°C</p>
  <p><a href="{technician_url}" style="display: inline-block; padding: 12px 24px; background: #0080ff; color: white; text-decoration: none; border-radius: 6px;">Technician dashboard</a></p>
</div>
"#
        )
    }

    /// Layer 2 repeat email to the client.
    pub fn escalation_repeat_email(
        cold_cell_name: &str,
        type_label: &str,
        value: f64,
        dashboard_url: &str,
    ) -> String {
        format!(
            r#"
<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto; line-height: 1.6; color: #333;">
  <h2 style="color: #ff9500;">IntelliFrost – Alert escalated</h2>
  <p>The alert for <strong>{cold_cell_name}</strong> has escalated. Please acknowledge as soon as possible.</p>
  <p><strong>Type:</strong> {type_label} – <strong>Value:</strong> {value}°C</p>
  <p><a href="{dashboard_url}">Open dashboard</a></p>
</div>
"#
        )
    }

    pub fn client_alert_sms(cold_cell_name: &str, type_label: &str, value: f64) -> String {
        format!(
            "IntelliFrost: Alert {} – {} ({}°C). Acknowledge in the app.",
            cold_cell_name, type_label, value
        )
    }

    pub fn backup_contact_sms(company_name: &str, cold_cell_name: &str) -> String {
        format!(
            "IntelliFrost: {} – Alert on {}. Please get in touch.",
            company_name, cold_cell_name
        )
    }

    pub fn technician_sms(
        company_name: &str,
        cold_cell_name: &str,
        type_label: &str,
        alert_code: &str,
    ) -> String {
        format!(
            "IntelliFrost alert: {} – {} ({}). Code: {}",
            company_name, cold_cell_name, type_label, alert_code
        )
    }

    pub fn urgent_technician_sms(company_name: &str, cold_cell_name: &str, value: f64) -> String {
        format!(
            "IntelliFrost URGENT: {} – {}. Temperature {}°C. You are being dispatched.",
            company_name, cold_cell_name, value
        )
    }
}

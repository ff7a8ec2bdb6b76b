//! Per-layer notification fan-out.
//!
//! Every attempt is independent: one failing channel never blocks the others,
//! and every attempt is followed by an escalation-log row whether or not the
//! underlying send succeeded (the log records intent, not delivery).

use sea_orm::ConnectionTrait;
use tracing::{error, info};

use super::channels::AlertNotifier;
use super::templates::NotificationTemplates;
use crate::entities::alert::AlarmLayer;
use crate::entities::escalation_log::{EscalationChannel, RecipientType};
use crate::escalation::{log, AlertContext};

/// Run the fan-out plan for one layer. Returns the number of dispatch
/// attempts made (sends are best-effort; attempts are what gets logged).
pub async fn dispatch_layer<C: ConnectionTrait>(
    db: &C,
    notifier: &AlertNotifier,
    layer: AlarmLayer,
    ctx: &AlertContext,
) -> u32 {
    let attempts = match layer {
        AlarmLayer::Layer1 => send_layer1_notifications(db, notifier, ctx).await,
        AlarmLayer::Layer2 => send_layer2_notifications(db, notifier, ctx).await,
        AlarmLayer::Layer3 => send_layer3_notifications(db, notifier, ctx).await,
    };
    crate::metrics::increment_layer_dispatches(layer);
    attempts
}

fn frontend_url() -> String {
    std::env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

fn api_base_url() -> String {
    let url = std::env::var("API_BASE_URL").unwrap_or_else(|_| "http://localhost:8000".to_string());
    url.trim_end_matches('/').to_string()
}

/// Short reference the technician can read back over the phone: the last six
/// hex digits of the alert id, taken from its hyphen-free form.
fn alert_code(id: uuid::Uuid) -> String {
    let hex = id.simple().to_string();
    hex[hex.len() - 6..].to_string()
}

async fn log_attempt<C: ConnectionTrait>(
    db: &C,
    ctx: &AlertContext,
    layer: AlarmLayer,
    action: &str,
    recipient: RecipientType,
    channel: EscalationChannel,
) {
    if let Err(e) = log::record(db, ctx.alert.id, layer, action, recipient, channel).await {
        error!("Failed to write escalation log for alert {}: {}", ctx.alert.id, e);
    }
}

/// Layer 1: client email + app push, technician email. Returns the number of
/// dispatch attempts made.
pub async fn send_layer1_notifications<C: ConnectionTrait>(
    db: &C,
    notifier: &AlertNotifier,
    ctx: &AlertContext,
) -> u32 {
    let mut attempts = 0;
    let cell = &ctx.cold_cell.name;
    let label = NotificationTemplates::alert_type_label(ctx.alert.alert_type);
    let value = ctx.alert.value.unwrap_or(0.0);
    let threshold = ctx.alert.threshold.unwrap_or(0.0);

    // Client: email
    let dashboard_url = format!("{}/dashboard", frontend_url());
    let html = NotificationTemplates::client_alert_email(cell, label, value, threshold, &dashboard_url);
    let _ = notifier
        .send_email(
            &ctx.customer.email,
            &format!("IntelliFrost – Cold cell alert: {}", cell),
            &html,
        )
        .await;
    log_attempt(db, ctx, AlarmLayer::Layer1, "Email sent to client", RecipientType::Client, EscalationChannel::Email).await;
    attempts += 1;

    // Push: log only (no FCM/OneSignal integration yet)
    info!(
        "Layer 1: push notification (app alert) for alert {} to customer {}",
        ctx.alert.id, ctx.customer.id
    );
    log_attempt(db, ctx, AlarmLayer::Layer1, "App alert to client", RecipientType::Client, EscalationChannel::Push).await;
    attempts += 1;

    // Technician: email + dashboard priority
    if let Some(tech) = &ctx.technician {
        let technician_url = format!("{}/technician", frontend_url());
        let html = NotificationTemplates::technician_alert_email(
            &ctx.customer.company_name,
            cell,
            label,
            value,
            &technician_url,
        );
        let _ = notifier
            .send_email(
                &tech.email,
                &format!("IntelliFrost – Alert: {} ({})", cell, ctx.customer.company_name),
                &html,
            )
            .await;
        log_attempt(db, ctx, AlarmLayer::Layer1, "Email to technician", RecipientType::Technician, EscalationChannel::Email).await;
        attempts += 1;
    }

    attempts
}

/// Layer 2: client SMS + repeat email, backup contacts SMS, technician SMS.
pub async fn send_layer2_notifications<C: ConnectionTrait>(
    db: &C,
    notifier: &AlertNotifier,
    ctx: &AlertContext,
) -> u32 {
    let mut attempts = 0;
    let cell = &ctx.cold_cell.name;
    let label = NotificationTemplates::alert_type_label(ctx.alert.alert_type);
    let value = ctx.alert.value.unwrap_or(0.0);

    // Client: SMS
    if let Some(phone) = &ctx.customer.phone {
        let sms = NotificationTemplates::client_alert_sms(cell, label, value);
        let _ = notifier.send_sms(phone, &sms).await;
        log_attempt(db, ctx, AlarmLayer::Layer2, "SMS to client", RecipientType::Client, EscalationChannel::Sms).await;
        attempts += 1;
    }

    // Client: repeat email
    let dashboard_url = format!("{}/dashboard", frontend_url());
    let html = NotificationTemplates::escalation_repeat_email(cell, label, value, &dashboard_url);
    let _ = notifier
        .send_email(
            &ctx.customer.email,
            &format!("[Escalated] IntelliFrost – {}", cell),
            &html,
        )
        .await;
    log_attempt(db, ctx, AlarmLayer::Layer2, "Repeat email to client", RecipientType::Client, EscalationChannel::Email).await;
    attempts += 1;

    // Backup contacts: SMS each
    for phone in ctx.backup_phones() {
        let sms = NotificationTemplates::backup_contact_sms(&ctx.customer.company_name, cell);
        let _ = notifier.send_sms(&phone, &sms).await;
        log_attempt(db, ctx, AlarmLayer::Layer2, "SMS to backup contact", RecipientType::Client, EscalationChannel::Sms).await;
        attempts += 1;
    }

    // Technician: SMS with alert code
    if let Some(tech) = &ctx.technician {
        if let Some(phone) = &tech.phone {
            let code = alert_code(ctx.alert.id);
            let sms = NotificationTemplates::technician_sms(&ctx.customer.company_name, cell, label, &code);
            let _ = notifier.send_sms(phone, &sms).await;
            log_attempt(db, ctx, AlarmLayer::Layer2, "SMS to technician", RecipientType::Technician, EscalationChannel::Sms).await;
            attempts += 1;
        }
    }

    info!("Layer 2 notifications dispatched for alert {}", ctx.alert.id);
    attempts
}

/// Layer 3: voice call to client, voice call to each backup contact,
/// technician SMS + voice call.
pub async fn send_layer3_notifications<C: ConnectionTrait>(
    db: &C,
    notifier: &AlertNotifier,
    ctx: &AlertContext,
) -> u32 {
    let mut attempts = 0;
    let cell = &ctx.cold_cell.name;
    let value = ctx.alert.value.unwrap_or(0.0);
    let voice_url = format!("{}/api/voice/{}", api_base_url(), ctx.alert.id);

    // Voice call to client
    if let Some(phone) = &ctx.customer.phone {
        let _ = notifier.start_call(phone, &voice_url).await;
        log_attempt(db, ctx, AlarmLayer::Layer3, "Voice call to client", RecipientType::Client, EscalationChannel::Phone).await;
        attempts += 1;
    }

    // Backup contacts called as well
    for phone in ctx.backup_phones() {
        let backup_voice_url = format!("{}?backup=1", voice_url);
        let _ = notifier.start_call(&phone, &backup_voice_url).await;
        log_attempt(db, ctx, AlarmLayer::Layer3, "Voice call to backup contact", RecipientType::Client, EscalationChannel::Phone).await;
        attempts += 1;
    }

    // Technician: SMS + voice call
    if let Some(tech) = &ctx.technician {
        if let Some(phone) = &tech.phone {
            let sms = NotificationTemplates::urgent_technician_sms(&ctx.customer.company_name, cell, value);
            let _ = notifier.send_sms(phone, &sms).await;
            log_attempt(db, ctx, AlarmLayer::Layer3, "SMS to technician", RecipientType::Technician, EscalationChannel::Sms).await;
            attempts += 1;

            let tech_voice_url = format!("{}?technician=1", voice_url);
            let _ = notifier.start_call(phone, &tech_voice_url).await;
            log_attempt(db, ctx, AlarmLayer::Layer3, "Voice call to technician", RecipientType::Technician, EscalationChannel::Phone).await;
            attempts += 1;
        }
    }

    info!("Layer 3 notifications dispatched for alert {}", ctx.alert.id);
    attempts
}

use sendgrid::SGClient;
use sendgrid::{Destination, Mail};
use std::env;
use std::time::Duration;
use tracing::{error, info, warn};

/// Upper bound on a single external send so one stuck recipient cannot block
/// a whole escalation tick.
const DISPATCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Fire-and-log send primitives for the three escalation channels: SendGrid
/// email, Twilio SMS and Twilio outbound voice calls. When credentials are
/// missing the notifier runs in mock mode and logs the would-be send.
#[derive(Clone)]
pub struct AlertNotifier {
    sendgrid_client: Option<SGClient>,
    twilio_client: Option<twilio::Client>,
    sms_from: String,
    email_from: String,
    dial_prefix: String,
}

impl AlertNotifier {
    pub fn new() -> Self {
        let sendgrid_api_key = env::var("TWILIO_SENDGRID_API_KEY").ok();
        let twilio_account_sid = env::var("TWILIO_ACCOUNT_SID").ok();
        let twilio_auth_token = env::var("TWILIO_AUTH_TOKEN").ok();
        let sms_from = env::var("TWILIO_SMS_FROM_NUMBER").unwrap_or_default();
        let email_from = env::var("NOTIFICATION_EMAIL_FROM")
            .unwrap_or_else(|_| "alerts@intellifrost.io".to_string());
        let dial_prefix = env::var("DEFAULT_DIAL_PREFIX").unwrap_or_else(|_| "+32".to_string());

        let sendgrid_client = sendgrid_api_key.map(SGClient::new);

        let twilio_client = if let (Some(sid), Some(token)) = (twilio_account_sid, twilio_auth_token)
        {
            Some(twilio::Client::new(&sid, &token))
        } else {
            None
        };

        if sendgrid_client.is_none() {
            warn!("⚠️ SendGrid API key not found. Email notifications will be mocked.");
        }
        if twilio_client.is_none() {
            warn!("⚠️ Twilio credentials not found. SMS/voice notifications will be mocked.");
        }

        Self {
            sendgrid_client,
            twilio_client,
            sms_from,
            email_from,
            dial_prefix,
        }
    }

    /// Normalize to E.164: strip whitespace, replace a leading 0 with the
    /// deployment's default country prefix.
    fn normalize_number(&self, number: &str) -> String {
        let trimmed: String = number.chars().filter(|c| !c.is_whitespace()).collect();
        if trimmed.starts_with('+') {
            trimmed
        } else {
            format!("{}{}", self.dial_prefix, trimmed.trim_start_matches('0'))
        }
    }

    pub async fn send_email(&self, to_email: &str, subject: &str, body: &str) -> Result<(), String> {
        if let Some(client) = &self.sendgrid_client {
            // Must own data to move into the blocking closure
            let to_email = to_email.to_string();
            let subject = subject.to_string();
            let body = body.to_string();
            let email_from = self.email_from.clone();
            let client = client.clone();
            let to_email_log = to_email.clone();

            let send = tokio::task::spawn_blocking(move || {
                let mail_info = Mail::new()
                    .add_to(Destination {
                        address: &to_email,
                        name: "IntelliFrost",
                    })
                    .add_from(&email_from)
                    .add_subject(&subject)
                    .add_html(&body);

                client.send(mail_info)
            });

            match tokio::time::timeout(DISPATCH_TIMEOUT, send).await {
                Ok(Ok(Ok(_))) => {
                    info!("✅ Email sent successfully to {}", to_email_log);
                    crate::metrics::increment_notifications_sent("email");
                    Ok(())
                }
                Ok(Ok(Err(e))) => {
                    error!("❌ Failed to send email: {}", e);
                    crate::metrics::increment_notifications_failed("email");
                    Err(format!("SendGrid Error: {}", e))
                }
                Ok(Err(e)) => Err(format!("Task Join Error: {}", e)),
                Err(_) => {
                    error!("❌ Email to {} timed out", to_email_log);
                    crate::metrics::increment_notifications_failed("email");
                    Err("SendGrid Error: send timed out".to_string())
                }
            }
        } else {
            // Mock mode
            info!("(Mock) 📧 Would send email to: {}", to_email);
            info!("(Mock) Subject: {}", subject);
            crate::metrics::increment_notifications_sent("email");
            Ok(())
        }
    }

    pub async fn send_sms(&self, to_number: &str, body: &str) -> Result<(), String> {
        if let Some(client) = &self.twilio_client {
            if self.sms_from.is_empty() {
                return Err("TWILIO_SMS_FROM_NUMBER not set".to_string());
            }

            let to = self.normalize_number(to_number);
            let send = client.send_message(twilio::OutboundMessage::new(&self.sms_from, &to, body));

            match tokio::time::timeout(DISPATCH_TIMEOUT, send).await {
                Ok(Ok(_)) => {
                    info!("✅ SMS sent successfully to {}", to);
                    crate::metrics::increment_notifications_sent("sms");
                    Ok(())
                }
                Ok(Err(e)) => {
                    error!("❌ Failed to send SMS: {}", e);
                    crate::metrics::increment_notifications_failed("sms");
                    Err(format!("Twilio Error: {}", e))
                }
                Err(_) => {
                    error!("❌ SMS to {} timed out", to);
                    crate::metrics::increment_notifications_failed("sms");
                    Err("Twilio Error: send timed out".to_string())
                }
            }
        } else {
            // Mock mode
            info!("(Mock) 📱 Would send SMS to: {}", to_number);
            info!("(Mock) Body: {}", body);
            crate::metrics::increment_notifications_sent("sms");
            Ok(())
        }
    }

    /// Start an outbound call. `voice_url` must return the TwiML for the call
    /// (the voice webhook lives outside this service).
    pub async fn start_call(&self, to_number: &str, voice_url: &str) -> Result<(), String> {
        if let Some(client) = &self.twilio_client {
            if self.sms_from.is_empty() {
                return Err("TWILIO_SMS_FROM_NUMBER not set".to_string());
            }

            let to = self.normalize_number(to_number);
            let call = client.make_call(twilio::OutboundCall::new(&self.sms_from, &to, voice_url));

            match tokio::time::timeout(DISPATCH_TIMEOUT, call).await {
                Ok(Ok(_)) => {
                    info!("✅ Voice call started to {}", to);
                    crate::metrics::increment_notifications_sent("phone");
                    Ok(())
                }
                Ok(Err(e)) => {
                    error!("❌ Failed to start voice call: {}", e);
                    crate::metrics::increment_notifications_failed("phone");
                    Err(format!("Twilio Error: {}", e))
                }
                Err(_) => {
                    error!("❌ Voice call to {} timed out", to);
                    crate::metrics::increment_notifications_failed("phone");
                    Err("Twilio Error: call setup timed out".to_string())
                }
            }
        } else {
            // Mock mode
            info!("(Mock) 📞 Would call: {} with TwiML at {}", to_number, voice_url);
            crate::metrics::increment_notifications_sent("phone");
            Ok(())
        }
    }
}

impl Default for AlertNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notifier() -> AlertNotifier {
        AlertNotifier {
            sendgrid_client: None,
            twilio_client: None,
            sms_from: String::new(),
            email_from: "alerts@intellifrost.io".to_string(),
            dial_prefix: "+32".to_string(),
        }
    }

    #[test]
    fn normalizes_local_numbers_to_e164() {
        let n = notifier();
        assert_eq!(n.normalize_number("0470 12 34 56"), "+32470123456");
        assert_eq!(n.normalize_number("+31 6 1234 5678"), "+31612345678");
    }

    #[tokio::test]
    async fn mock_mode_reports_success() {
        let n = notifier();
        assert!(n.send_email("a@b.c", "s", "<p>b</p>").await.is_ok());
        assert!(n.send_sms("0470123456", "hi").await.is_ok());
        assert!(n.start_call("0470123456", "http://x/voice").await.is_ok());
    }
}

//! Periodic escalation driver.
//!
//! One tick loads every open alert, resolves its time slot and layer policy,
//! evaluates the elapsed-time timers and advances alerts through the layers.
//! The escalation log is the durable idempotency guard: a layer is dispatched
//! at most once per alert, even across overlapping ticks or restarts. The
//! transition itself is additionally guarded by a filtered UPDATE on the
//! current layer, so two racing ticks cannot both win it.

use chrono::{DateTime, Duration, Local, NaiveTime, Utc};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use tracing::{debug, error, info, warn};

use super::policy::{self, EscalationOverrides};
use super::time_slot::{self, BusinessHours};
use super::{log, AlertContext};
use crate::entities::alert::{self, AlarmLayer, AlertStatus, TimeSlot};
use crate::entities::{Alert, ColdCell, Customer, Location, Technician};
use crate::notifications::{layers, AlertNotifier};

/// Minutes an OPEN_HOURS alert stays at layer 1 before escalating.
const LAYER_1_TO_2_WAIT_MIN: i64 = 20;
/// Minutes at layer 2 before escalating, in every slot.
const LAYER_2_TO_3_WAIT_MIN: i64 = 15;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickStats {
    /// Open alerts examined this tick.
    pub scanned: usize,
    /// Layer transitions persisted this tick.
    pub escalated: usize,
    /// Notification dispatch attempts made this tick.
    pub dispatched: u32,
    /// Alerts skipped for missing customer/settings data.
    pub skipped: usize,
    /// Alerts that errored; processing continued with the rest.
    pub failed: usize,
}

enum Outcome {
    Escalated { layer: AlarmLayer, attempts: u32 },
    EntryDispatched { layer: AlarmLayer, attempts: u32 },
    NoChange,
    Skipped,
}

pub struct EscalationEngine {
    db: DatabaseConnection,
    notifier: AlertNotifier,
}

impl EscalationEngine {
    pub fn new(db: DatabaseConnection, notifier: AlertNotifier) -> Self {
        Self { db, notifier }
    }

    /// One escalation pass over all open alerts. Per-alert failures are
    /// logged and never abort the rest of the tick.
    pub async fn run_tick(&self, now: DateTime<Utc>) -> Result<TickStats, sea_orm::DbErr> {
        let started = std::time::Instant::now();
        let local_time = now.with_timezone(&Local).time();

        let open_alerts = Alert::find()
            .filter(alert::Column::Status.is_in([AlertStatus::Active, AlertStatus::Escalating]))
            .filter(alert::Column::AcknowledgedAt.is_null())
            .all(&self.db)
            .await?;

        let mut stats = TickStats::default();

        for alert_row in open_alerts {
            stats.scanned += 1;
            let alert_id = alert_row.id;

            match self.process_alert(alert_row, now, local_time).await {
                Ok(Outcome::Escalated { layer, attempts }) => {
                    stats.escalated += 1;
                    stats.dispatched += attempts;
                    info!("Alert {} escalated to {:?}", alert_id, layer);
                }
                Ok(Outcome::EntryDispatched { layer, attempts }) => {
                    stats.dispatched += attempts;
                    info!("Alert {} entry layer {:?} dispatched", alert_id, layer);
                }
                Ok(Outcome::NoChange) => {}
                Ok(Outcome::Skipped) => stats.skipped += 1,
                Err(e) => {
                    stats.failed += 1;
                    error!("Escalation error for alert {}: {}", alert_id, e);
                }
            }
        }

        crate::metrics::record_tick_duration(started.elapsed().as_secs_f64());
        debug!(
            "Escalation tick done: scanned={} escalated={} dispatched={} skipped={} failed={}",
            stats.scanned, stats.escalated, stats.dispatched, stats.skipped, stats.failed
        );
        Ok(stats)
    }

    async fn process_alert(
        &self,
        alert_row: alert::Model,
        now: DateTime<Utc>,
        local_time: NaiveTime,
    ) -> Result<Outcome, sea_orm::DbErr> {
        let Some(ctx) = self.load_context(alert_row).await? else {
            return Ok(Outcome::Skipped);
        };

        let overrides = EscalationOverrides::of(&ctx.customer);
        let slot = ctx.alert.time_slot.unwrap_or_else(|| {
            time_slot::resolve(&BusinessHours::of(&ctx.customer), local_time)
        });

        // An alert's current layer may never have been dispatched: direct
        // LAYER_2/LAYER_3 entries from intake, or creation-time dispatch lost
        // to a crash. The log decides; an enabled, never-entered layer is
        // dispatched before any timer evaluation.
        if ctx.alert.acknowledged_at.is_none()
            && policy::is_layer_enabled(slot, ctx.alert.layer, overrides.as_ref())
            && !log::layer_entered(&self.db, ctx.alert.id, ctx.alert.layer).await?
        {
            let attempts = layers::dispatch_layer(&self.db, &self.notifier, ctx.alert.layer, &ctx).await;
            return Ok(Outcome::EntryDispatched {
                layer: ctx.alert.layer,
                attempts,
            });
        }

        match plan_transition(&ctx.alert, slot, overrides.as_ref(), now) {
            Some(target) => self.escalate_to(&ctx, target, now).await,
            None => Ok(Outcome::NoChange),
        }
    }

    async fn escalate_to(
        &self,
        ctx: &AlertContext,
        target: AlarmLayer,
        now: DateTime<Utc>,
    ) -> Result<Outcome, sea_orm::DbErr> {
        let alert_id = ctx.alert.id;

        // Idempotency guard: a log row at the target layer means an earlier
        // or concurrent tick already dispatched it. Persist the bookkeeping
        // if it is missing, but never dispatch twice.
        if log::layer_entered(&self.db, alert_id, target).await? {
            debug!("{:?} already dispatched for alert {}", target, alert_id);
            self.apply_transition(ctx, target, now).await?;
            return Ok(Outcome::NoChange);
        }

        if !self.apply_transition(ctx, target, now).await? {
            debug!("Alert {} transition to {:?} lost to a concurrent tick", alert_id, target);
            return Ok(Outcome::NoChange);
        }

        let attempts = layers::dispatch_layer(&self.db, &self.notifier, target, ctx).await;
        Ok(Outcome::Escalated {
            layer: target,
            attempts,
        })
    }

    /// Guarded transition: only applies while the alert still sits at the
    /// layer this tick observed and is unacknowledged. Returns false when a
    /// concurrent tick or an acknowledgement got there first.
    async fn apply_transition(
        &self,
        ctx: &AlertContext,
        target: AlarmLayer,
        now: DateTime<Utc>,
    ) -> Result<bool, sea_orm::DbErr> {
        let mut change = alert::ActiveModel {
            layer: Set(target),
            status: Set(AlertStatus::Escalating),
            ..Default::default()
        };
        match target {
            AlarmLayer::Layer2 => change.layer2_at = Set(Some(now.naive_utc())),
            AlarmLayer::Layer3 => change.layer3_at = Set(Some(now.naive_utc())),
            AlarmLayer::Layer1 => {}
        }

        let result = Alert::update_many()
            .set(change)
            .filter(alert::Column::Id.eq(ctx.alert.id))
            .filter(alert::Column::Layer.eq(ctx.alert.layer))
            .filter(alert::Column::AcknowledgedAt.is_null())
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected > 0)
    }

    async fn load_context(
        &self,
        alert_row: alert::Model,
    ) -> Result<Option<AlertContext>, sea_orm::DbErr> {
        let Some(cold_cell) = ColdCell::find_by_id(alert_row.cold_cell_id).one(&self.db).await?
        else {
            warn!("Cold cell missing for alert {}; skipping", alert_row.id);
            return Ok(None);
        };
        let Some(location) = Location::find_by_id(cold_cell.location_id).one(&self.db).await?
        else {
            warn!("Location missing for cold cell {}; skipping alert {}", cold_cell.id, alert_row.id);
            return Ok(None);
        };
        let Some(customer) = Customer::find_by_id(location.customer_id).one(&self.db).await? else {
            warn!("Customer missing for location {}; skipping alert {}", location.id, alert_row.id);
            return Ok(None);
        };
        let technician = match customer.linked_technician_id {
            Some(id) => Technician::find_by_id(id).one(&self.db).await?,
            None => None,
        };

        Ok(Some(AlertContext {
            alert: alert_row,
            cold_cell,
            customer,
            technician,
        }))
    }
}

/// Pure transition decision for one alert. Layer 3 is terminal; a disabled
/// target layer freezes the alert at its current layer; acknowledged alerts
/// never move.
pub(crate) fn plan_transition(
    alert: &alert::Model,
    slot: TimeSlot,
    overrides: Option<&EscalationOverrides>,
    now: DateTime<Utc>,
) -> Option<AlarmLayer> {
    if alert.acknowledged_at.is_some() {
        return None;
    }
    let now = now.naive_utc();

    match alert.layer {
        AlarmLayer::Layer1 if policy::is_layer_enabled(slot, AlarmLayer::Layer2, overrides) => {
            if slot == TimeSlot::OpenHours {
                let waited = now - alert.triggered_at >= Duration::minutes(LAYER_1_TO_2_WAIT_MIN);
                waited.then_some(AlarmLayer::Layer2)
            } else {
                // Outside open hours layer 1 was silent, so escalate at once.
                Some(AlarmLayer::Layer2)
            }
        }
        AlarmLayer::Layer2 if policy::is_layer_enabled(slot, AlarmLayer::Layer3, overrides) => {
            let since = alert.layer2_at.unwrap_or(alert.triggered_at);
            let waited = now - since >= Duration::minutes(LAYER_2_TO_3_WAIT_MIN);
            waited.then_some(AlarmLayer::Layer3)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{cold_cell, customer, escalation_log, location};
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use uuid::Uuid;

    fn utc(s: &str) -> DateTime<Utc> {
        format!("{}Z", s).parse().unwrap()
    }

    fn base_alert(layer: AlarmLayer, slot: TimeSlot, triggered_at: &str) -> alert::Model {
        let triggered = utc(triggered_at).naive_utc();
        alert::Model {
            id: Uuid::new_v4(),
            cold_cell_id: Uuid::new_v4(),
            alert_type: alert::AlertType::HighTemp,
            status: if layer == AlarmLayer::Layer1 {
                AlertStatus::Active
            } else {
                AlertStatus::Escalating
            },
            layer,
            time_slot: Some(slot),
            value: Some(9.5),
            threshold: Some(7.0),
            triggered_at: triggered,
            last_triggered_at: triggered,
            layer2_at: None,
            layer3_at: None,
            acknowledged_at: None,
            acknowledged_by: None,
        }
    }

    #[test]
    fn open_hours_waits_twenty_minutes() {
        let alert = base_alert(AlarmLayer::Layer1, TimeSlot::OpenHours, "2026-03-02T09:00:00");

        assert_eq!(
            plan_transition(&alert, TimeSlot::OpenHours, None, utc("2026-03-02T09:19:00")),
            None
        );
        assert_eq!(
            plan_transition(&alert, TimeSlot::OpenHours, None, utc("2026-03-02T09:20:00")),
            Some(AlarmLayer::Layer2)
        );
    }

    #[test]
    fn after_hours_escalates_immediately() {
        let alert = base_alert(AlarmLayer::Layer1, TimeSlot::AfterHours, "2026-03-02T18:00:00");
        assert_eq!(
            plan_transition(&alert, TimeSlot::AfterHours, None, utc("2026-03-02T18:01:00")),
            Some(AlarmLayer::Layer2)
        );
    }

    #[test]
    fn layer2_waits_fifteen_minutes_from_layer2_at() {
        let mut alert = base_alert(AlarmLayer::Layer2, TimeSlot::OpenHours, "2026-03-02T09:00:00");
        alert.layer2_at = Some(utc("2026-03-02T09:20:00").naive_utc());

        assert_eq!(
            plan_transition(&alert, TimeSlot::OpenHours, None, utc("2026-03-02T09:34:00")),
            None
        );
        assert_eq!(
            plan_transition(&alert, TimeSlot::OpenHours, None, utc("2026-03-02T09:35:00")),
            Some(AlarmLayer::Layer3)
        );
    }

    #[test]
    fn layer2_falls_back_to_triggered_at() {
        // Legacy rows may lack layer2_at
        let alert = base_alert(AlarmLayer::Layer2, TimeSlot::AfterHours, "2026-03-02T18:00:00");
        assert_eq!(
            plan_transition(&alert, TimeSlot::AfterHours, None, utc("2026-03-02T18:15:00")),
            Some(AlarmLayer::Layer3)
        );
    }

    #[test]
    fn layer3_is_terminal() {
        let alert = base_alert(AlarmLayer::Layer3, TimeSlot::Night, "2026-03-02T03:00:00");
        assert_eq!(
            plan_transition(&alert, TimeSlot::Night, None, utc("2026-03-02T09:00:00")),
            None
        );
    }

    #[test]
    fn acknowledged_alerts_never_move() {
        let mut alert = base_alert(AlarmLayer::Layer1, TimeSlot::AfterHours, "2026-03-02T18:00:00");
        alert.acknowledged_at = Some(utc("2026-03-02T18:05:00").naive_utc());
        assert_eq!(
            plan_transition(&alert, TimeSlot::AfterHours, None, utc("2026-03-02T19:00:00")),
            None
        );
    }

    #[test]
    fn disabled_target_layer_freezes_the_alert() {
        let overrides: EscalationOverrides = serde_json::from_value(serde_json::json!({
            "afterHours": { "layer2": false, "layer3": false }
        }))
        .unwrap();
        let alert = base_alert(AlarmLayer::Layer1, TimeSlot::AfterHours, "2026-03-02T18:00:00");
        assert_eq!(
            plan_transition(&alert, TimeSlot::AfterHours, Some(&overrides), utc("2026-03-02T23:00:00")),
            None
        );
    }

    // --- tick tests against a mock store -----------------------------------

    struct Fixture {
        alert: alert::Model,
        cold_cell: cold_cell::Model,
        location: location::Model,
        customer: customer::Model,
    }

    fn fixture(alert: alert::Model) -> Fixture {
        let now = Utc::now().naive_utc();
        let cold_cell = cold_cell::Model {
            id: alert.cold_cell_id,
            location_id: Uuid::new_v4(),
            name: "Cell A".to_string(),
            temperature_min_threshold: -2.0,
            temperature_max_threshold: 7.0,
            created_at: now,
        };
        let location = location::Model {
            id: cold_cell.location_id,
            customer_id: Uuid::new_v4(),
            name: "Main site".to_string(),
            address: None,
            created_at: now,
        };
        let customer = customer::Model {
            id: location.customer_id,
            company_name: "Fresh Foods BV".to_string(),
            email: "ops@freshfoods.example".to_string(),
            phone: Some("0470111111".to_string()),
            backup_phone: None,
            backup_contacts: None,
            opening_time: "07:00".to_string(),
            closing_time: "17:00".to_string(),
            night_start: "23:00".to_string(),
            escalation_config: None,
            linked_technician_id: None,
            created_at: now,
            updated_at: now,
        };
        Fixture {
            alert,
            cold_cell,
            location,
            customer,
        }
    }

    fn log_row(alarm_id: Uuid, layer: AlarmLayer, channel: escalation_log::EscalationChannel) -> escalation_log::Model {
        escalation_log::Model {
            id: Uuid::new_v4(),
            alarm_id,
            layer,
            action: "test".to_string(),
            recipient_type: escalation_log::RecipientType::Client,
            channel,
            sent_at: Utc::now().naive_utc(),
            response_at: None,
        }
    }

    #[tokio::test]
    async fn after_hours_alert_escalates_and_dispatches_layer2() {
        let f = fixture(base_alert(AlarmLayer::Layer1, TimeSlot::AfterHours, "2026-03-02T18:00:00"));
        let alarm_id = f.alert.id;

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![f.alert.clone()]])
            .append_query_results([vec![f.cold_cell.clone()]])
            .append_query_results([vec![f.location.clone()]])
            .append_query_results([vec![f.customer.clone()]])
            // no existing layer-2 log row: dispatch goes ahead
            .append_query_results([Vec::<escalation_log::Model>::new()])
            // client SMS + repeat email log inserts
            .append_query_results([vec![log_row(alarm_id, AlarmLayer::Layer2, escalation_log::EscalationChannel::Sms)]])
            .append_query_results([vec![log_row(alarm_id, AlarmLayer::Layer2, escalation_log::EscalationChannel::Email)]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();

        let engine = EscalationEngine::new(db, AlertNotifier::new());
        let stats = engine.run_tick(utc("2026-03-02T18:01:00")).await.unwrap();

        assert_eq!(stats.scanned, 1);
        assert_eq!(stats.escalated, 1);
        assert_eq!(stats.dispatched, 2);
        assert_eq!(stats.failed, 0);
    }

    #[tokio::test]
    async fn existing_log_row_suppresses_duplicate_dispatch() {
        let f = fixture(base_alert(AlarmLayer::Layer1, TimeSlot::AfterHours, "2026-03-02T18:00:00"));
        let alarm_id = f.alert.id;

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![f.alert.clone()]])
            .append_query_results([vec![f.cold_cell.clone()]])
            .append_query_results([vec![f.location.clone()]])
            .append_query_results([vec![f.customer.clone()]])
            // a concurrent tick already entered layer 2
            .append_query_results([vec![log_row(alarm_id, AlarmLayer::Layer2, escalation_log::EscalationChannel::Sms)]])
            // bookkeeping update still applied
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();

        let engine = EscalationEngine::new(db, AlertNotifier::new());
        let stats = engine.run_tick(utc("2026-03-02T18:01:00")).await.unwrap();

        assert_eq!(stats.scanned, 1);
        assert_eq!(stats.escalated, 0);
        assert_eq!(stats.dispatched, 0);
    }

    #[tokio::test]
    async fn night_alert_dispatches_layer3_on_first_tick() {
        let mut alert = base_alert(AlarmLayer::Layer3, TimeSlot::Night, "2026-03-02T03:00:00");
        alert.layer3_at = Some(alert.triggered_at);
        let f = fixture(alert);
        let alarm_id = f.alert.id;

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![f.alert.clone()]])
            .append_query_results([vec![f.cold_cell.clone()]])
            .append_query_results([vec![f.location.clone()]])
            .append_query_results([vec![f.customer.clone()]])
            // layer 3 never dispatched for this alert yet
            .append_query_results([Vec::<escalation_log::Model>::new()])
            // voice call to client logged
            .append_query_results([vec![log_row(alarm_id, AlarmLayer::Layer3, escalation_log::EscalationChannel::Phone)]])
            .into_connection();

        let engine = EscalationEngine::new(db, AlertNotifier::new());
        // first tick right after creation: no 20+15 minute wait
        let stats = engine.run_tick(utc("2026-03-02T03:01:00")).await.unwrap();

        assert_eq!(stats.escalated, 0);
        assert_eq!(stats.dispatched, 1);
    }

    #[tokio::test]
    async fn missing_time_slot_is_recomputed_from_customer_hours() {
        use chrono::TimeZone;

        // 18:00 wall clock in the deployment zone, whatever the host zone is
        let now = Local
            .with_ymd_and_hms(2026, 3, 2, 18, 0, 0)
            .unwrap()
            .with_timezone(&Utc);

        let mut alert = base_alert(AlarmLayer::Layer1, TimeSlot::AfterHours, "2026-03-02T18:00:00");
        alert.time_slot = None;
        // one minute old: only an AFTER_HOURS recompute escalates this fast
        alert.triggered_at = (now - Duration::minutes(1)).naive_utc();
        alert.last_triggered_at = alert.triggered_at;
        let f = fixture(alert);
        let alarm_id = f.alert.id;

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![f.alert.clone()]])
            .append_query_results([vec![f.cold_cell.clone()]])
            .append_query_results([vec![f.location.clone()]])
            .append_query_results([vec![f.customer.clone()]])
            .append_query_results([Vec::<escalation_log::Model>::new()])
            .append_query_results([vec![log_row(alarm_id, AlarmLayer::Layer2, escalation_log::EscalationChannel::Sms)]])
            .append_query_results([vec![log_row(alarm_id, AlarmLayer::Layer2, escalation_log::EscalationChannel::Email)]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();

        let engine = EscalationEngine::new(db, AlertNotifier::new());
        let stats = engine.run_tick(now).await.unwrap();

        assert_eq!(stats.escalated, 1);
        assert_eq!(stats.dispatched, 2);
        assert_eq!(stats.failed, 0);
    }

    #[tokio::test]
    async fn acknowledged_alert_gets_no_dispatch_on_tick() {
        let mut alert = base_alert(AlarmLayer::Layer1, TimeSlot::OpenHours, "2026-03-02T09:00:00");
        alert.acknowledged_at = Some(utc("2026-03-02T09:05:00").naive_utc());
        alert.acknowledged_by = Some("ops".to_string());
        let f = fixture(alert);

        // Only the context loads may hit the store: no log lookup, no log
        // inserts, no update. Any extra statement errors the mock and shows
        // up as a failed alert below.
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![f.alert.clone()]])
            .append_query_results([vec![f.cold_cell.clone()]])
            .append_query_results([vec![f.location.clone()]])
            .append_query_results([vec![f.customer.clone()]])
            .into_connection();

        let engine = EscalationEngine::new(db, AlertNotifier::new());
        let stats = engine.run_tick(utc("2026-03-02T10:00:00")).await.unwrap();

        assert_eq!(stats.scanned, 1);
        assert_eq!(stats.escalated, 0);
        assert_eq!(stats.dispatched, 0);
        assert_eq!(stats.failed, 0);
    }

    #[tokio::test]
    async fn open_hours_alert_under_timer_is_untouched() {
        let f = fixture(base_alert(AlarmLayer::Layer1, TimeSlot::OpenHours, "2026-03-02T09:00:00"));
        let alarm_id = f.alert.id;

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![f.alert.clone()]])
            .append_query_results([vec![f.cold_cell.clone()]])
            .append_query_results([vec![f.location.clone()]])
            .append_query_results([vec![f.customer.clone()]])
            // layer 1 was dispatched at creation
            .append_query_results([vec![log_row(alarm_id, AlarmLayer::Layer1, escalation_log::EscalationChannel::Email)]])
            .into_connection();

        let engine = EscalationEngine::new(db, AlertNotifier::new());
        let stats = engine.run_tick(utc("2026-03-02T09:19:00")).await.unwrap();

        assert_eq!(stats.scanned, 1);
        assert_eq!(stats.escalated, 0);
        assert_eq!(stats.dispatched, 0);
    }
}

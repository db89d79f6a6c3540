//! Background poller for expiring contracts and soon-due payments.
//!
//! An explicit service object owns the timer handle; `start`/`stop` are
//! idempotent lifecycle methods, so repeated registration from multiple
//! startup paths never produces a second timer.

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
};
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use db::{
    DBService,
    models::{contract::Contract, monthly_payment::MonthlyPayment},
};
use thiserror::Error;
use tokio::{task::JoinHandle, time::interval};
use tracing::{debug, error, info};
use uuid::Uuid;

use super::{
    config::Config,
    notification::{NotificationEvent, NotificationKind, NotificationService},
};

#[derive(Debug, Error)]
pub enum ContractExpiryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// What a poll cycle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleOutcome {
    /// Notifications are switched off; no store queries were issued.
    Disabled,
    Checked {
        expiring_contracts: usize,
        due_payments: usize,
    },
}

pub struct ContractExpiryService {
    db: DBService,
    notifier: NotificationService,
    poll_interval: Duration,
    contract_lookahead_days: i64,
    payment_lookahead_days: i64,
    /// Cached copy of the persisted notifications-enabled setting. Checked
    /// before any query so a disabled cycle touches the store zero times.
    enabled: AtomicBool,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl ContractExpiryService {
    pub fn new(db: DBService, notifier: NotificationService, config: &Config) -> Arc<Self> {
        Arc::new(Self {
            db,
            notifier,
            poll_interval: config.poll_interval,
            contract_lookahead_days: config.contract_lookahead_days,
            payment_lookahead_days: config.payment_lookahead_days,
            enabled: AtomicBool::new(true),
            handle: Mutex::new(None),
        })
    }

    /// Start the poll timer. Returns false when a timer is already running;
    /// the existing timer keeps going and no second one is spawned.
    pub fn start(self: &Arc<Self>) -> bool {
        let mut guard = self.handle.lock().unwrap_or_else(|e| e.into_inner());
        if guard.as_ref().is_some_and(|handle| !handle.is_finished()) {
            debug!("contract expiry poller already running");
            return false;
        }

        let service = Arc::clone(self);
        *guard = Some(tokio::spawn(async move {
            service.run().await;
        }));
        info!(
            poll_interval = ?self.poll_interval,
            contract_lookahead_days = self.contract_lookahead_days,
            payment_lookahead_days = self.payment_lookahead_days,
            "contract expiry poller started"
        );
        true
    }

    /// Cancel the timer. Safe to call when already stopped. An in-flight
    /// cycle is not interrupted mid-query; its results are discarded.
    pub fn stop(&self) {
        let mut guard = self.handle.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(handle) = guard.take() {
            handle.abort();
            info!("contract expiry poller stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        let guard = self.handle.lock().unwrap_or_else(|e| e.into_inner());
        guard.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    /// Toggle the cached enabled flag (mirrors the persisted setting).
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    async fn run(&self) {
        let mut ticker = interval(self.poll_interval);
        loop {
            // First tick fires immediately, so one check runs at startup.
            ticker.tick().await;
            match self.check_cycle(Utc::now().date_naive()).await {
                Ok(outcome) => debug!(?outcome, "expiry check complete"),
                Err(e) => error!("expiry check failed: {e}"),
            }
        }
    }

    /// One poll cycle. Every cycle re-evaluates from scratch; there is no
    /// acknowledgment state, and repeated alerts for the same contract are
    /// collapsed by the notification layer, keyed on the subject id.
    pub async fn check_cycle(&self, today: NaiveDate) -> Result<CycleOutcome, ContractExpiryError> {
        if !self.is_enabled() {
            return Ok(CycleOutcome::Disabled);
        }

        let contracts = Contract::find_active_expiring_within(
            &self.db.pool,
            today,
            self.contract_lookahead_days,
        )
        .await?;

        let payment_horizon = today + chrono::Duration::days(self.payment_lookahead_days);
        let payments =
            MonthlyPayment::find_pending_due_between(&self.db.pool, today, payment_horizon).await?;

        let mut events = Vec::with_capacity(contracts.len() + payments.len());
        for contract in &contracts {
            events.push(expiry_event(contract.id, (contract.end_date - today).num_days()));
        }
        for payment in &payments {
            events.push(payment_due_event(
                payment.id,
                &payment.reference_period,
                (payment.due_date - today).num_days(),
            ));
        }

        for event in events {
            self.notifier.notify(event).await;
        }

        Ok(CycleOutcome::Checked {
            expiring_contracts: contracts.len(),
            due_payments: payments.len(),
        })
    }
}

/// Classify a contract by days until its end date.
fn expiry_event(contract_id: Uuid, days: i64) -> NotificationEvent {
    let (body, urgent) = if days < 0 {
        let overdue = -days;
        (
            format!("Contract expired {overdue} {} ago", days_word(overdue)),
            true,
        )
    } else if days == 0 {
        ("Contract expires today".to_string(), true)
    } else {
        (
            format!("Contract expires in {days} {}", days_word(days)),
            days <= 3,
        )
    };

    NotificationEvent {
        kind: NotificationKind::ContractExpiry,
        subject_id: contract_id,
        title: "Contract expiring".to_string(),
        body,
        urgent,
    }
}

fn payment_due_event(payment_id: Uuid, period: &str, days: i64) -> NotificationEvent {
    let (body, urgent) = if days == 0 {
        (format!("Installment {period} is due today"), true)
    } else {
        (
            format!("Installment {period} is due in {days} {}", days_word(days)),
            days <= 2,
        )
    };

    NotificationEvent {
        kind: NotificationKind::PaymentDue,
        subject_id: payment_id,
        title: "Payment due".to_string(),
        body,
        urgent,
    }
}

fn days_word(days: i64) -> &'static str {
    if days == 1 { "day" } else { "days" }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use db::models::{
        client::{Client, CreateClient},
        contract::{ContractStatus, CreateContract},
    };

    use super::*;

    fn test_config() -> Config {
        Config {
            poll_interval: std::time::Duration::from_secs(3600),
            ..Config::default()
        }
    }

    async fn seed_active_contract(db: &DBService, end_date: NaiveDate) -> Uuid {
        let client = Client::create(
            &db.pool,
            &CreateClient {
                name: "Obra Sul".to_string(),
                document: None,
                email: None,
                phone: None,
                address: None,
            },
        )
        .await
        .unwrap();

        let contract = Contract::create(
            &db.pool,
            &CreateContract {
                client_id: client.id,
                start_date: end_date - Duration::days(90),
                end_date,
                total_value_cents: 100_000,
                status: Some(ContractStatus::Active),
                notes: None,
                equipment_ids: None,
            },
        )
        .await
        .unwrap();
        contract.id
    }

    #[test]
    fn classification_matches_days_until_expiry() {
        let id = Uuid::new_v4();

        let event = expiry_event(id, -2);
        assert!(event.urgent);
        assert_eq!(event.body, "Contract expired 2 days ago");

        let event = expiry_event(id, 0);
        assert!(event.urgent);
        assert_eq!(event.body, "Contract expires today");

        let event = expiry_event(id, 3);
        assert!(event.urgent);
        assert_eq!(event.body, "Contract expires in 3 days");

        let event = expiry_event(id, 6);
        assert!(!event.urgent);
        assert_eq!(event.body, "Contract expires in 6 days");
    }

    #[tokio::test]
    async fn start_twice_keeps_a_single_timer() {
        let db = DBService::new_in_memory().await.unwrap();
        let service = ContractExpiryService::new(
            db,
            NotificationService::without_os_notifications(),
            &test_config(),
        );

        assert!(service.start());
        assert!(service.is_running());
        // Second call is a no-op against the running timer.
        assert!(!service.start());
        assert!(service.is_running());

        service.stop();
        assert!(!service.is_running());
        // Stopping again is a no-op.
        service.stop();
    }

    #[tokio::test]
    async fn expired_contract_is_reported_as_urgent_overdue() {
        let db = DBService::new_in_memory().await.unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        let contract_id = seed_active_contract(&db, today - Duration::days(2)).await;

        let notifier = NotificationService::without_os_notifications();
        let mut events = notifier.subscribe();
        let service = ContractExpiryService::new(db, notifier, &test_config());

        let outcome = service.check_cycle(today).await.unwrap();
        assert_eq!(
            outcome,
            CycleOutcome::Checked {
                expiring_contracts: 1,
                due_payments: 0
            }
        );

        let event = events.recv().await.unwrap();
        assert_eq!(event.kind, NotificationKind::ContractExpiry);
        assert_eq!(event.subject_id, contract_id);
        assert!(event.urgent);
        assert_eq!(event.body, "Contract expired 2 days ago");
    }

    #[tokio::test]
    async fn contracts_outside_the_lookahead_are_ignored() {
        let db = DBService::new_in_memory().await.unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        seed_active_contract(&db, today + Duration::days(30)).await;

        let service = ContractExpiryService::new(
            db,
            NotificationService::without_os_notifications(),
            &test_config(),
        );

        let outcome = service.check_cycle(today).await.unwrap();
        assert_eq!(
            outcome,
            CycleOutcome::Checked {
                expiring_contracts: 0,
                due_payments: 0
            }
        );
    }

    #[tokio::test]
    async fn disabled_cycle_is_skipped_entirely() {
        let db = DBService::new_in_memory().await.unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        seed_active_contract(&db, today).await;

        let notifier = NotificationService::without_os_notifications();
        let mut events = notifier.subscribe();
        let service = ContractExpiryService::new(db, notifier, &test_config());
        service.set_enabled(false);

        let outcome = service.check_cycle(today).await.unwrap();
        assert_eq!(outcome, CycleOutcome::Disabled);
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn due_payments_are_flagged_within_their_window() {
        use crate::services::payment_schedule::PaymentScheduleService;

        let db = DBService::new_in_memory().await.unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let contract_id = seed_active_contract(&db, today + Duration::days(60)).await;

        let schedule = PaymentScheduleService::new(db.pool.clone());
        schedule
            .generate(
                contract_id,
                NaiveDate::from_ymd_opt(2024, 3, 12).unwrap(),
                NaiveDate::from_ymd_opt(2024, 5, 12).unwrap(),
                30_000,
            )
            .await
            .unwrap();

        let notifier = NotificationService::without_os_notifications();
        let mut events = notifier.subscribe();
        let service = ContractExpiryService::new(db, notifier, &test_config());

        let outcome = service.check_cycle(today).await.unwrap();
        // Only the March installment (due in 2 days) falls inside the 5-day
        // window; April and May do not.
        assert_eq!(
            outcome,
            CycleOutcome::Checked {
                expiring_contracts: 0,
                due_payments: 1
            }
        );

        let event = events.recv().await.unwrap();
        assert_eq!(event.kind, NotificationKind::PaymentDue);
        assert!(event.urgent);
        assert_eq!(event.body, "Installment 2024-03 is due in 2 days");
    }
}

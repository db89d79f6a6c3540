//! Generation and reconciliation of monthly payment schedules.
//!
//! A contract's inclusive date range is split into one installment per
//! calendar month it touches. The total is divided evenly in cents, with the
//! last installment absorbing the division remainder so the schedule always
//! sums to the contract total exactly.

use chrono::{Datelike, NaiveDate, Utc};
use db::models::{
    contract::Contract,
    monthly_payment::{MonthlyPayment, NewMonthlyPayment, PaymentStatus, UpdateMonthlyPayment},
};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("invalid period: {0}")]
    InvalidPeriod(String),
    #[error("total value must not be negative")]
    NegativeTotal,
    #[error("contract {0} already has a payment schedule")]
    ScheduleExists(Uuid),
    #[error("contract {0} not found")]
    ContractNotFound(Uuid),
    #[error("payment {0} not found")]
    PaymentNotFound(Uuid),
    #[error("overdue is derived from the due date and cannot be stored")]
    StoredOverdue,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub struct PaymentScheduleService {
    pool: SqlitePool,
}

/// Plan the installment rows for a contract without touching the store.
///
/// Bucketing rule: one row per calendar month touched by `[start, end]`, so
/// 2024-01-15..2024-04-15 yields four rows (Jan through Apr). Due day is the
/// start date's day-of-month, clamped to shorter months.
pub fn plan_schedule(
    contract_id: Uuid,
    start: NaiveDate,
    end: NaiveDate,
    total_cents: i64,
) -> Result<Vec<NewMonthlyPayment>, ScheduleError> {
    if start > end {
        return Err(ScheduleError::InvalidPeriod(
            "start date is after end date".to_string(),
        ));
    }
    if total_cents < 0 {
        return Err(ScheduleError::NegativeTotal);
    }

    let first_month = start.year() as i64 * 12 + start.month0() as i64;
    let last_month = end.year() as i64 * 12 + end.month0() as i64;
    // start <= end guarantees at least one touched month.
    let months = last_month - first_month + 1;

    let base_amount = total_cents / months;
    let mut rows = Vec::with_capacity(months as usize);
    for index in 0..months {
        let absolute = first_month + index;
        let year = (absolute.div_euclid(12)) as i32;
        let month = (absolute.rem_euclid(12)) as u32 + 1;

        let day = start.day().min(days_in_month(year, month));
        let due_date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
            ScheduleError::InvalidPeriod(format!("unrepresentable due date {year:04}-{month:02}"))
        })?;

        // Last installment absorbs the rounding remainder.
        let amount_cents = if index == months - 1 {
            total_cents - base_amount * (months - 1)
        } else {
            base_amount
        };

        rows.push(NewMonthlyPayment {
            id: Uuid::new_v4(),
            contract_id,
            reference_period: format!("{year:04}-{month:02}"),
            amount_cents,
            due_date,
        });
    }

    Ok(rows)
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .map(|d| d.day())
        .unwrap_or(28)
}

impl PaymentScheduleService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Generate the schedule for a contract and persist it in one batch.
    ///
    /// Refuses to run when the contract already has installments; callers
    /// that want a fresh schedule must delete the old rows first.
    pub async fn generate(
        &self,
        contract_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
        total_cents: i64,
    ) -> Result<Vec<MonthlyPayment>, ScheduleError> {
        let existing = MonthlyPayment::count_by_contract_id(&self.pool, contract_id).await?;
        if existing > 0 {
            return Err(ScheduleError::ScheduleExists(contract_id));
        }

        let rows = plan_schedule(contract_id, start, end, total_cents)?;

        let mut tx = self.pool.begin().await?;
        MonthlyPayment::insert_many(&mut tx, &rows).await?;
        tx.commit().await?;

        info!(
            contract_id = %contract_id,
            installments = rows.len(),
            total_cents,
            "generated payment schedule"
        );

        Ok(MonthlyPayment::find_by_contract_id(&self.pool, contract_id).await?)
    }

    /// Installments for a contract with overdue derived for display.
    pub async fn list_for_contract(
        &self,
        contract_id: Uuid,
        today: NaiveDate,
    ) -> Result<Vec<MonthlyPayment>, ScheduleError> {
        let mut payments = MonthlyPayment::find_by_contract_id(&self.pool, contract_id).await?;
        for payment in &mut payments {
            payment.status = payment.effective_status(today);
        }
        Ok(payments)
    }

    /// Apply a partial edit to one installment.
    ///
    /// Setting status to paid without a paid date defaults it to today.
    /// Moving status away from paid deliberately leaves the paid date in
    /// place; callers clear it explicitly when they mean to.
    pub async fn update(
        &self,
        payment_id: Uuid,
        data: UpdateMonthlyPayment,
    ) -> Result<MonthlyPayment, ScheduleError> {
        let Some(mut payment) = MonthlyPayment::find_by_id(&self.pool, payment_id).await? else {
            return Err(ScheduleError::PaymentNotFound(payment_id));
        };

        if let Some(amount_cents) = data.amount_cents {
            payment.amount_cents = amount_cents;
        }
        if let Some(due_date) = data.due_date {
            payment.due_date = due_date;
        }
        if let Some(paid_date) = data.paid_date {
            payment.paid_date = paid_date;
        }
        if let Some(status) = data.status {
            if status == PaymentStatus::Overdue {
                return Err(ScheduleError::StoredOverdue);
            }
            if status == PaymentStatus::Paid && payment.paid_date.is_none() {
                payment.paid_date = Some(Utc::now().date_naive());
            }
            payment.status = status;
        }

        MonthlyPayment::update(
            &self.pool,
            payment_id,
            payment.amount_cents,
            payment.due_date,
            payment.paid_date,
            payment.status,
        )
        .await?
        .ok_or(ScheduleError::PaymentNotFound(payment_id))
    }

    /// Convenience path: status=paid, paid date=today.
    pub async fn mark_paid(&self, payment_id: Uuid) -> Result<MonthlyPayment, ScheduleError> {
        self.update(
            payment_id,
            UpdateMonthlyPayment {
                status: Some(PaymentStatus::Paid),
                paid_date: Some(Some(Utc::now().date_naive())),
                ..Default::default()
            },
        )
        .await
    }

    /// Delete one installment. Siblings are left untouched.
    pub async fn delete(&self, payment_id: Uuid) -> Result<(), ScheduleError> {
        let deleted = MonthlyPayment::delete(&self.pool, payment_id).await?;
        if deleted == 0 {
            return Err(ScheduleError::PaymentNotFound(payment_id));
        }
        Ok(())
    }

    /// Recompute the contract total from its installments and write it back.
    pub async fn recompute_contract_total(&self, contract_id: Uuid) -> Result<i64, ScheduleError> {
        if Contract::find_by_id(&self.pool, contract_id).await?.is_none() {
            return Err(ScheduleError::ContractNotFound(contract_id));
        }
        let total = MonthlyPayment::sum_by_contract_id(&self.pool, contract_id).await?;
        Contract::update_total(&self.pool, contract_id, total).await?;
        info!(contract_id = %contract_id, total_cents = total, "recomputed contract total");
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use db::{
        DBService,
        models::{
            client::{Client, CreateClient},
            contract::{Contract, ContractStatus, CreateContract},
        },
    };

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn seed_contract(db: &DBService, start: NaiveDate, end: NaiveDate, total: i64) -> Uuid {
        let client = Client::create(
            &db.pool,
            &CreateClient {
                name: "Acme Construction".to_string(),
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
                start_date: start,
                end_date: end,
                total_value_cents: total,
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
    fn plan_covers_every_touched_month_and_sums_exactly() {
        let rows = plan_schedule(
            Uuid::new_v4(),
            date(2024, 1, 15),
            date(2024, 4, 15),
            1_200_000,
        )
        .unwrap();

        assert_eq!(rows.len(), 4);
        let periods: Vec<&str> = rows.iter().map(|r| r.reference_period.as_str()).collect();
        assert_eq!(periods, ["2024-01", "2024-02", "2024-03", "2024-04"]);
        assert!(rows.iter().all(|r| r.amount_cents == 300_000));
        assert_eq!(rows.iter().map(|r| r.amount_cents).sum::<i64>(), 1_200_000);
    }

    #[test]
    fn plan_last_installment_absorbs_remainder() {
        let rows =
            plan_schedule(Uuid::new_v4(), date(2024, 1, 1), date(2024, 3, 31), 10_000).unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].amount_cents, 3_333);
        assert_eq!(rows[1].amount_cents, 3_333);
        assert_eq!(rows[2].amount_cents, 3_334);
        assert_eq!(rows.iter().map(|r| r.amount_cents).sum::<i64>(), 10_000);
    }

    #[test]
    fn plan_clamps_due_day_to_short_months() {
        let rows =
            plan_schedule(Uuid::new_v4(), date(2024, 1, 31), date(2024, 3, 31), 9_000).unwrap();

        assert_eq!(rows[0].due_date, date(2024, 1, 31));
        // 2024 is a leap year.
        assert_eq!(rows[1].due_date, date(2024, 2, 29));
        assert_eq!(rows[2].due_date, date(2024, 3, 31));
    }

    #[test]
    fn plan_spans_year_boundaries() {
        let rows =
            plan_schedule(Uuid::new_v4(), date(2023, 11, 5), date(2024, 2, 5), 8_000).unwrap();

        let periods: Vec<&str> = rows.iter().map(|r| r.reference_period.as_str()).collect();
        assert_eq!(periods, ["2023-11", "2023-12", "2024-01", "2024-02"]);
    }

    #[test]
    fn plan_rejects_inverted_range() {
        let err = plan_schedule(Uuid::new_v4(), date(2024, 5, 1), date(2024, 4, 1), 1_000)
            .unwrap_err();
        assert!(matches!(err, ScheduleError::InvalidPeriod(_)));
    }

    #[test]
    fn plan_rejects_negative_total() {
        let err =
            plan_schedule(Uuid::new_v4(), date(2024, 1, 1), date(2024, 2, 1), -1).unwrap_err();
        assert!(matches!(err, ScheduleError::NegativeTotal));
    }

    #[tokio::test]
    async fn generate_persists_pending_rows_without_paid_dates() {
        let db = DBService::new_in_memory().await.unwrap();
        let contract_id =
            seed_contract(&db, date(2024, 1, 15), date(2024, 4, 15), 1_200_000).await;
        let service = PaymentScheduleService::new(db.pool.clone());

        let payments = service
            .generate(contract_id, date(2024, 1, 15), date(2024, 4, 15), 1_200_000)
            .await
            .unwrap();

        assert_eq!(payments.len(), 4);
        assert!(payments.iter().all(|p| p.status == PaymentStatus::Pending));
        assert!(payments.iter().all(|p| p.paid_date.is_none()));
        assert_eq!(
            payments.iter().map(|p| p.amount_cents).sum::<i64>(),
            1_200_000
        );
    }

    #[tokio::test]
    async fn generate_rejects_existing_schedule() {
        let db = DBService::new_in_memory().await.unwrap();
        let contract_id = seed_contract(&db, date(2024, 1, 1), date(2024, 3, 1), 30_000).await;
        let service = PaymentScheduleService::new(db.pool.clone());

        service
            .generate(contract_id, date(2024, 1, 1), date(2024, 3, 1), 30_000)
            .await
            .unwrap();

        let err = service
            .generate(contract_id, date(2024, 1, 1), date(2024, 3, 1), 30_000)
            .await
            .unwrap_err();
        assert!(matches!(err, ScheduleError::ScheduleExists(id) if id == contract_id));

        // The rejected call must not have added rows.
        let count = MonthlyPayment::count_by_contract_id(&db.pool, contract_id)
            .await
            .unwrap();
        assert_eq!(count, 3);
    }

    #[tokio::test]
    async fn update_to_paid_defaults_paid_date_and_keeps_other_fields() {
        let db = DBService::new_in_memory().await.unwrap();
        let contract_id = seed_contract(&db, date(2024, 1, 10), date(2024, 2, 10), 20_000).await;
        let service = PaymentScheduleService::new(db.pool.clone());

        let payments = service
            .generate(contract_id, date(2024, 1, 10), date(2024, 2, 10), 20_000)
            .await
            .unwrap();
        let target = &payments[0];

        let updated = service
            .update(
                target.id,
                UpdateMonthlyPayment {
                    status: Some(PaymentStatus::Paid),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.status, PaymentStatus::Paid);
        assert_eq!(updated.paid_date, Some(Utc::now().date_naive()));
        assert_eq!(updated.amount_cents, target.amount_cents);
        assert_eq!(updated.due_date, target.due_date);
        assert_eq!(updated.reference_period, target.reference_period);
    }

    #[tokio::test]
    async fn moving_status_away_from_paid_keeps_paid_date() {
        let db = DBService::new_in_memory().await.unwrap();
        let contract_id = seed_contract(&db, date(2024, 1, 10), date(2024, 1, 20), 5_000).await;
        let service = PaymentScheduleService::new(db.pool.clone());

        let payments = service
            .generate(contract_id, date(2024, 1, 10), date(2024, 1, 20), 5_000)
            .await
            .unwrap();
        let paid = service.mark_paid(payments[0].id).await.unwrap();
        assert!(paid.paid_date.is_some());

        let reverted = service
            .update(
                paid.id,
                UpdateMonthlyPayment {
                    status: Some(PaymentStatus::Pending),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(reverted.status, PaymentStatus::Pending);
        // Documented quirk: the paid date survives until cleared explicitly.
        assert!(reverted.paid_date.is_some());

        let cleared = service
            .update(
                paid.id,
                UpdateMonthlyPayment {
                    paid_date: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(cleared.paid_date.is_none());
    }

    #[tokio::test]
    async fn overdue_cannot_be_stored() {
        let db = DBService::new_in_memory().await.unwrap();
        let contract_id = seed_contract(&db, date(2024, 1, 1), date(2024, 1, 31), 4_000).await;
        let service = PaymentScheduleService::new(db.pool.clone());

        let payments = service
            .generate(contract_id, date(2024, 1, 1), date(2024, 1, 31), 4_000)
            .await
            .unwrap();

        let err = service
            .update(
                payments[0].id,
                UpdateMonthlyPayment {
                    status: Some(PaymentStatus::Overdue),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ScheduleError::StoredOverdue));
    }

    #[tokio::test]
    async fn overdue_is_derived_on_read() {
        let db = DBService::new_in_memory().await.unwrap();
        let contract_id = seed_contract(&db, date(2024, 1, 5), date(2024, 2, 5), 10_000).await;
        let service = PaymentScheduleService::new(db.pool.clone());

        service
            .generate(contract_id, date(2024, 1, 5), date(2024, 2, 5), 10_000)
            .await
            .unwrap();

        let listed = service
            .list_for_contract(contract_id, date(2024, 2, 1))
            .await
            .unwrap();
        assert_eq!(listed[0].status, PaymentStatus::Overdue);
        assert_eq!(listed[1].status, PaymentStatus::Pending);

        // The stored status is still pending.
        let raw = MonthlyPayment::find_by_contract_id(&db.pool, contract_id)
            .await
            .unwrap();
        assert!(raw.iter().all(|p| p.status == PaymentStatus::Pending));
    }

    #[tokio::test]
    async fn delete_removes_only_the_target_row() {
        let db = DBService::new_in_memory().await.unwrap();
        let contract_id = seed_contract(&db, date(2024, 1, 1), date(2024, 4, 30), 40_000).await;
        let service = PaymentScheduleService::new(db.pool.clone());

        let payments = service
            .generate(contract_id, date(2024, 1, 1), date(2024, 4, 30), 40_000)
            .await
            .unwrap();

        service.delete(payments[1].id).await.unwrap();

        let remaining = MonthlyPayment::find_by_contract_id(&db.pool, contract_id)
            .await
            .unwrap();
        assert_eq!(remaining.len(), 3);
        assert!(remaining.iter().all(|p| p.id != payments[1].id));
        for survivor in &remaining {
            let original = payments.iter().find(|p| p.id == survivor.id).unwrap();
            assert_eq!(survivor.amount_cents, original.amount_cents);
            assert_eq!(survivor.due_date, original.due_date);
        }
    }

    #[tokio::test]
    async fn recompute_total_reflects_manual_edits() {
        let db = DBService::new_in_memory().await.unwrap();
        let contract_id = seed_contract(&db, date(2024, 1, 1), date(2024, 2, 28), 20_000).await;
        let service = PaymentScheduleService::new(db.pool.clone());

        let payments = service
            .generate(contract_id, date(2024, 1, 1), date(2024, 2, 28), 20_000)
            .await
            .unwrap();

        service
            .update(
                payments[0].id,
                UpdateMonthlyPayment {
                    amount_cents: Some(15_000),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let total = service.recompute_contract_total(contract_id).await.unwrap();
        assert_eq!(total, 25_000);

        let contract = Contract::find_by_id(&db.pool, contract_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(contract.total_value_cents, 25_000);
    }
}

//! Light aggregation over contracts, payments, and equipment.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use sqlx::SqlitePool;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportsError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, Serialize)]
pub struct SummaryReport {
    pub active_contracts: i64,
    pub expected_this_month_cents: i64,
    pub received_this_month_cents: i64,
    pub overdue_payments: i64,
    pub available_equipment: i64,
    pub rented_equipment: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthlyRevenue {
    pub period: String,
    pub expected_cents: i64,
    pub received_cents: i64,
}

pub struct ReportsService {
    pool: SqlitePool,
}

impl ReportsService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn summary(&self, today: NaiveDate) -> Result<SummaryReport, ReportsError> {
        let period = format!("{:04}-{:02}", today.year(), today.month());

        let active_contracts = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM contracts WHERE status = 'active'",
        )
        .fetch_one(&self.pool)
        .await?;

        let expected_this_month_cents = sqlx::query_scalar::<_, i64>(
            "SELECT COALESCE(SUM(amount_cents), 0) FROM monthly_payments WHERE reference_period = $1",
        )
        .bind(&period)
        .fetch_one(&self.pool)
        .await?;

        let received_this_month_cents = sqlx::query_scalar::<_, i64>(
            r#"SELECT COALESCE(SUM(amount_cents), 0) FROM monthly_payments
               WHERE reference_period = $1 AND status = 'paid'"#,
        )
        .bind(&period)
        .fetch_one(&self.pool)
        .await?;

        // Overdue is derived, never stored: pending plus past-due.
        let overdue_payments = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM monthly_payments WHERE status = 'pending' AND due_date < $1",
        )
        .bind(today)
        .fetch_one(&self.pool)
        .await?;

        let available_equipment = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM equipment WHERE status = 'available'",
        )
        .fetch_one(&self.pool)
        .await?;

        let rented_equipment = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM equipment WHERE status = 'rented'",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(SummaryReport {
            active_contracts,
            expected_this_month_cents,
            received_this_month_cents,
            overdue_payments,
            available_equipment,
            rented_equipment,
        })
    }

    /// Expected vs received per reference period within one year.
    pub async fn monthly_revenue(&self, year: i32) -> Result<Vec<MonthlyRevenue>, ReportsError> {
        let rows: Vec<(String, i64, i64)> = sqlx::query_as(
            r#"SELECT
                   reference_period,
                   COALESCE(SUM(amount_cents), 0),
                   COALESCE(SUM(CASE WHEN status = 'paid' THEN amount_cents ELSE 0 END), 0)
               FROM monthly_payments
               WHERE reference_period LIKE $1
               GROUP BY reference_period
               ORDER BY reference_period ASC"#,
        )
        .bind(format!("{year:04}-%"))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(period, expected_cents, received_cents)| MonthlyRevenue {
                period,
                expected_cents,
                received_cents,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use db::{
        DBService,
        models::{
            client::{Client, CreateClient},
            contract::{Contract, ContractStatus, CreateContract},
        },
    };

    use super::*;
    use crate::services::payment_schedule::PaymentScheduleService;

    #[tokio::test]
    async fn summary_and_revenue_track_paid_installments() {
        let db = DBService::new_in_memory().await.unwrap();

        let client = Client::create(
            &db.pool,
            &CreateClient {
                name: "Canteiro Norte".to_string(),
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
                start_date: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
                end_date: NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
                total_value_cents: 30_000,
                status: Some(ContractStatus::Active),
                notes: None,
                equipment_ids: None,
            },
        )
        .await
        .unwrap();

        let schedule = PaymentScheduleService::new(db.pool.clone());
        let payments = schedule
            .generate(
                contract.id,
                contract.start_date,
                contract.end_date,
                contract.total_value_cents,
            )
            .await
            .unwrap();
        schedule.mark_paid(payments[0].id).await.unwrap();

        let reports = ReportsService::new(db.pool.clone());

        let summary = reports
            .summary(NaiveDate::from_ymd_opt(2024, 2, 15).unwrap())
            .await
            .unwrap();
        assert_eq!(summary.active_contracts, 1);
        assert_eq!(summary.expected_this_month_cents, 10_000);
        assert_eq!(summary.received_this_month_cents, 0);
        // The February installment (due 2024-02-10) is pending and past due.
        assert_eq!(summary.overdue_payments, 1);

        let revenue = reports.monthly_revenue(2024).await.unwrap();
        assert_eq!(revenue.len(), 3);
        assert_eq!(revenue[0].period, "2024-01");
        assert_eq!(revenue[0].received_cents, 10_000);
        assert_eq!(revenue[1].received_cents, 0);
    }
}

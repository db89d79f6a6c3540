use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Sqlite, SqlitePool, Transaction, Type};
use strum_macros::{Display, EnumString};
use uuid::Uuid;

#[derive(Debug, Clone, Type, Serialize, Deserialize, PartialEq, EnumString, Display, Default)]
#[sqlx(type_name = "payment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    /// Derived at read time from the due date; never persisted.
    Overdue,
}

/// One installment of a contract's total value.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct MonthlyPayment {
    pub id: Uuid,
    pub contract_id: Uuid,
    /// Calendar month the installment covers, as `YYYY-MM`.
    pub reference_period: String,
    pub amount_cents: i64,
    pub due_date: NaiveDate,
    pub paid_date: Option<NaiveDate>,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row to be inserted by schedule generation.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMonthlyPayment {
    pub id: Uuid,
    pub contract_id: Uuid,
    pub reference_period: String,
    pub amount_cents: i64,
    pub due_date: NaiveDate,
}

/// Partial update payload. Absent fields are left unchanged; `paid_date`
/// distinguishes "not supplied" from an explicit clear.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UpdateMonthlyPayment {
    pub amount_cents: Option<i64>,
    pub due_date: Option<NaiveDate>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "serde_with::rust::double_option"
    )]
    pub paid_date: Option<Option<NaiveDate>>,
    pub status: Option<PaymentStatus>,
}

impl MonthlyPayment {
    /// Status as it should be displayed: a pending installment past its due
    /// date reads as overdue. The stored value stays pending.
    pub fn effective_status(&self, today: NaiveDate) -> PaymentStatus {
        match self.status {
            PaymentStatus::Paid => PaymentStatus::Paid,
            _ if self.due_date < today && self.paid_date.is_none() => PaymentStatus::Overdue,
            _ => PaymentStatus::Pending,
        }
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, MonthlyPayment>("SELECT * FROM monthly_payments WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_contract_id(
        pool: &SqlitePool,
        contract_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, MonthlyPayment>(
            "SELECT * FROM monthly_payments WHERE contract_id = $1 ORDER BY due_date ASC",
        )
        .bind(contract_id)
        .fetch_all(pool)
        .await
    }

    pub async fn count_by_contract_id(
        pool: &SqlitePool,
        contract_id: Uuid,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM monthly_payments WHERE contract_id = $1",
        )
        .bind(contract_id)
        .fetch_one(pool)
        .await
    }

    pub async fn sum_by_contract_id(
        pool: &SqlitePool,
        contract_id: Uuid,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COALESCE(SUM(amount_cents), 0) FROM monthly_payments WHERE contract_id = $1",
        )
        .bind(contract_id)
        .fetch_one(pool)
        .await
    }

    /// Pending installments due in `[from, to]`, for the notification poller.
    pub async fn find_pending_due_between(
        pool: &SqlitePool,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, MonthlyPayment>(
            r#"SELECT * FROM monthly_payments
               WHERE status = 'pending' AND due_date >= $1 AND due_date <= $2
               ORDER BY due_date ASC"#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(pool)
        .await
    }

    /// Insert a whole schedule inside one transaction; a failure rolls the
    /// batch back as a unit.
    pub async fn insert_many(
        tx: &mut Transaction<'_, Sqlite>,
        rows: &[NewMonthlyPayment],
    ) -> Result<(), sqlx::Error> {
        for row in rows {
            sqlx::query(
                r#"INSERT INTO monthly_payments (id, contract_id, reference_period, amount_cents, due_date, status)
                   VALUES ($1, $2, $3, $4, $5, 'pending')"#,
            )
            .bind(row.id)
            .bind(row.contract_id)
            .bind(&row.reference_period)
            .bind(row.amount_cents)
            .bind(row.due_date)
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }

    /// Write the full mutable field set back to the row.
    pub async fn update(
        pool: &SqlitePool,
        id: Uuid,
        amount_cents: i64,
        due_date: NaiveDate,
        paid_date: Option<NaiveDate>,
        status: PaymentStatus,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, MonthlyPayment>(
            r#"UPDATE monthly_payments
               SET amount_cents = $2,
                   due_date = $3,
                   paid_date = $4,
                   status = $5,
                   updated_at = datetime('now', 'subsec')
               WHERE id = $1
               RETURNING *"#,
        )
        .bind(id)
        .bind(amount_cents)
        .bind(due_date)
        .bind(paid_date)
        .bind(status)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM monthly_payments WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}

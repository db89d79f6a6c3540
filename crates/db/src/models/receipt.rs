use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

/// Proof-of-payment document tied to a contract, optionally to one installment.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Receipt {
    pub id: Uuid,
    pub contract_id: Uuid,
    pub payment_id: Option<Uuid>,
    pub number: String,
    pub amount_cents: i64,
    pub issued_date: NaiveDate,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateReceipt {
    pub contract_id: Uuid,
    pub payment_id: Option<Uuid>,
    pub number: Option<String>,
    pub amount_cents: i64,
    pub issued_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

impl Receipt {
    pub async fn find_all(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Receipt>("SELECT * FROM receipts ORDER BY issued_date DESC")
            .fetch_all(pool)
            .await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Receipt>("SELECT * FROM receipts WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_contract_id(
        pool: &SqlitePool,
        contract_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Receipt>(
            "SELECT * FROM receipts WHERE contract_id = $1 ORDER BY issued_date DESC",
        )
        .bind(contract_id)
        .fetch_all(pool)
        .await
    }

    /// Next auto-generated receipt number. Derived from the highest existing
    /// suffix rather than the row count, so deleting a receipt never makes a
    /// later create collide with a number still in use.
    pub async fn next_number(pool: &SqlitePool) -> Result<String, sqlx::Error> {
        let max = sqlx::query_scalar::<_, i64>(
            r#"SELECT COALESCE(MAX(CAST(SUBSTR(number, 5) AS INTEGER)), 0)
               FROM receipts WHERE number LIKE 'REC-%'"#,
        )
        .fetch_one(pool)
        .await?;
        Ok(format!("REC-{:06}", max + 1))
    }

    pub async fn create(
        pool: &SqlitePool,
        number: String,
        issued_date: NaiveDate,
        data: &CreateReceipt,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Receipt>(
            r#"INSERT INTO receipts (id, contract_id, payment_id, number, amount_cents, issued_date, notes)
               VALUES ($1, $2, $3, $4, $5, $6, $7)
               RETURNING *"#,
        )
        .bind(Uuid::new_v4())
        .bind(data.contract_id)
        .bind(data.payment_id)
        .bind(number)
        .bind(data.amount_cents)
        .bind(issued_date)
        .bind(&data.notes)
        .fetch_one(pool)
        .await
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM receipts WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}

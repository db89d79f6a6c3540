use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool, Type};
use strum_macros::{Display, EnumString};
use uuid::Uuid;

use super::equipment::{Equipment, EquipmentStatus};

#[derive(Debug, Clone, Type, Serialize, Deserialize, PartialEq, EnumString, Display, Default)]
#[sqlx(type_name = "contract_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ContractStatus {
    #[default]
    Pending,
    Active,
    Finished,
    Canceled,
}

/// Rental agreement covering one or more equipment items over a date range.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Contract {
    pub id: Uuid,
    pub client_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_value_cents: i64,
    pub status: ContractStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateContract {
    pub client_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_value_cents: i64,
    pub status: Option<ContractStatus>,
    pub notes: Option<String>,
    pub equipment_ids: Option<Vec<Uuid>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateContract {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub total_value_cents: Option<i64>,
    pub status: Option<ContractStatus>,
    pub notes: Option<String>,
}

impl Contract {
    pub async fn find_all(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Contract>("SELECT * FROM contracts ORDER BY created_at DESC")
            .fetch_all(pool)
            .await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Contract>("SELECT * FROM contracts WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_client_id(
        pool: &SqlitePool,
        client_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Contract>(
            "SELECT * FROM contracts WHERE client_id = $1 ORDER BY created_at DESC",
        )
        .bind(client_id)
        .fetch_all(pool)
        .await
    }

    /// Active contracts whose end date is at or before `today + lookahead_days`.
    ///
    /// Includes contracts already past their end date so the caller can flag
    /// them as overdue.
    pub async fn find_active_expiring_within(
        pool: &SqlitePool,
        today: NaiveDate,
        lookahead_days: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let horizon = today + Duration::days(lookahead_days);
        sqlx::query_as::<_, Contract>(
            r#"SELECT * FROM contracts
               WHERE status = 'active' AND end_date <= $1
               ORDER BY end_date ASC"#,
        )
        .bind(horizon)
        .fetch_all(pool)
        .await
    }

    pub async fn create(pool: &SqlitePool, data: &CreateContract) -> Result<Self, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let contract = sqlx::query_as::<_, Contract>(
            r#"INSERT INTO contracts (id, client_id, start_date, end_date, total_value_cents, status, notes)
               VALUES ($1, $2, $3, $4, $5, $6, $7)
               RETURNING *"#,
        )
        .bind(Uuid::new_v4())
        .bind(data.client_id)
        .bind(data.start_date)
        .bind(data.end_date)
        .bind(data.total_value_cents)
        .bind(data.status.clone().unwrap_or_default())
        .bind(&data.notes)
        .fetch_one(&mut *tx)
        .await?;

        // Linking and the status flip share the contract's transaction, so a
        // failure part-way leaves no contract with half-rented equipment.
        if let Some(equipment_ids) = &data.equipment_ids {
            for equipment_id in equipment_ids {
                Self::link_equipment(&mut *tx, contract.id, *equipment_id).await?;
                Equipment::update_status(&mut *tx, *equipment_id, EquipmentStatus::Rented)
                    .await?;
            }
        }

        tx.commit().await?;
        Ok(contract)
    }

    pub async fn link_equipment<'e, E>(
        executor: E,
        contract_id: Uuid,
        equipment_id: Uuid,
    ) -> Result<(), sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query(
            "INSERT OR IGNORE INTO contract_equipment (contract_id, equipment_id) VALUES ($1, $2)",
        )
        .bind(contract_id)
        .bind(equipment_id)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn equipment(pool: &SqlitePool, contract_id: Uuid) -> Result<Vec<Equipment>, sqlx::Error> {
        sqlx::query_as::<_, Equipment>(
            r#"SELECT e.* FROM equipment e
               JOIN contract_equipment ce ON ce.equipment_id = e.id
               WHERE ce.contract_id = $1
               ORDER BY e.name ASC"#,
        )
        .bind(contract_id)
        .fetch_all(pool)
        .await
    }

    pub async fn update(
        pool: &SqlitePool,
        id: Uuid,
        data: &UpdateContract,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Contract>(
            r#"UPDATE contracts
               SET start_date = COALESCE($2, start_date),
                   end_date = COALESCE($3, end_date),
                   total_value_cents = COALESCE($4, total_value_cents),
                   status = COALESCE($5, status),
                   notes = COALESCE($6, notes),
                   updated_at = datetime('now', 'subsec')
               WHERE id = $1
               RETURNING *"#,
        )
        .bind(id)
        .bind(data.start_date)
        .bind(data.end_date)
        .bind(data.total_value_cents)
        .bind(data.status.clone())
        .bind(&data.notes)
        .fetch_optional(pool)
        .await
    }

    /// Write an aggregate total back onto the contract row.
    pub async fn update_total(
        pool: &SqlitePool,
        id: Uuid,
        total_value_cents: i64,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE contracts SET total_value_cents = $2, updated_at = datetime('now', 'subsec') WHERE id = $1",
        )
        .bind(id)
        .bind(total_value_cents)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM contracts WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        DBService,
        models::{
            client::{Client, CreateClient},
            equipment::CreateEquipment,
        },
    };

    async fn seed_client(db: &DBService) -> Uuid {
        Client::create(
            &db.pool,
            &CreateClient {
                name: "Pavimenta Leste".to_string(),
                document: None,
                email: None,
                phone: None,
                address: None,
            },
        )
        .await
        .unwrap()
        .id
    }

    async fn seed_equipment(db: &DBService) -> Uuid {
        Equipment::create(
            &db.pool,
            &CreateEquipment {
                name: "Betoneira 400L".to_string(),
                description: None,
                serial_number: None,
                daily_rate_cents: Some(8_000),
                status: None,
            },
        )
        .await
        .unwrap()
        .id
    }

    fn new_contract(client_id: Uuid, equipment_ids: Option<Vec<Uuid>>) -> CreateContract {
        CreateContract {
            client_id,
            start_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            total_value_cents: 90_000,
            status: Some(ContractStatus::Active),
            notes: None,
            equipment_ids,
        }
    }

    #[tokio::test]
    async fn create_links_equipment_and_marks_it_rented() {
        let db = DBService::new_in_memory().await.unwrap();
        let client_id = seed_client(&db).await;
        let equipment_id = seed_equipment(&db).await;

        let contract =
            Contract::create(&db.pool, &new_contract(client_id, Some(vec![equipment_id])))
                .await
                .unwrap();

        let linked = Contract::equipment(&db.pool, contract.id).await.unwrap();
        assert_eq!(linked.len(), 1);
        assert_eq!(linked[0].id, equipment_id);
        assert_eq!(linked[0].status, EquipmentStatus::Rented);
    }

    #[tokio::test]
    async fn create_rolls_back_when_an_equipment_link_fails() {
        let db = DBService::new_in_memory().await.unwrap();
        let client_id = seed_client(&db).await;
        let equipment_id = seed_equipment(&db).await;

        // The second id violates the foreign key after the first item was
        // already linked and flipped to rented inside the transaction.
        let result = Contract::create(
            &db.pool,
            &new_contract(client_id, Some(vec![equipment_id, Uuid::new_v4()])),
        )
        .await;
        assert!(result.is_err());

        // Nothing persisted: no contract row, first item back to available.
        assert!(Contract::find_all(&db.pool).await.unwrap().is_empty());
        let equipment = Equipment::find_by_id(&db.pool, equipment_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(equipment.status, EquipmentStatus::Available);
    }
}

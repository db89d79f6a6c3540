use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool, Type};
use strum_macros::{Display, EnumString};
use uuid::Uuid;

#[derive(Debug, Clone, Type, Serialize, Deserialize, PartialEq, EnumString, Display, Default)]
#[sqlx(type_name = "equipment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EquipmentStatus {
    #[default]
    Available,
    Rented,
    Maintenance,
    Retired,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Equipment {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub serial_number: Option<String>,
    pub daily_rate_cents: i64,
    pub status: EquipmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEquipment {
    pub name: String,
    pub description: Option<String>,
    pub serial_number: Option<String>,
    pub daily_rate_cents: Option<i64>,
    pub status: Option<EquipmentStatus>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateEquipment {
    pub name: Option<String>,
    pub description: Option<String>,
    pub serial_number: Option<String>,
    pub daily_rate_cents: Option<i64>,
    pub status: Option<EquipmentStatus>,
}

impl Equipment {
    pub async fn find_all(
        pool: &SqlitePool,
        status: Option<EquipmentStatus>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        match status {
            Some(status) => {
                sqlx::query_as::<_, Equipment>(
                    "SELECT * FROM equipment WHERE status = $1 ORDER BY name ASC",
                )
                .bind(status)
                .fetch_all(pool)
                .await
            }
            None => {
                sqlx::query_as::<_, Equipment>("SELECT * FROM equipment ORDER BY name ASC")
                    .fetch_all(pool)
                    .await
            }
        }
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Equipment>("SELECT * FROM equipment WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn create(pool: &SqlitePool, data: &CreateEquipment) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Equipment>(
            r#"INSERT INTO equipment (id, name, description, serial_number, daily_rate_cents, status)
               VALUES ($1, $2, $3, $4, $5, $6)
               RETURNING *"#,
        )
        .bind(Uuid::new_v4())
        .bind(&data.name)
        .bind(&data.description)
        .bind(&data.serial_number)
        .bind(data.daily_rate_cents.unwrap_or(0))
        .bind(data.status.clone().unwrap_or_default())
        .fetch_one(pool)
        .await
    }

    pub async fn update(
        pool: &SqlitePool,
        id: Uuid,
        data: &UpdateEquipment,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Equipment>(
            r#"UPDATE equipment
               SET name = COALESCE($2, name),
                   description = COALESCE($3, description),
                   serial_number = COALESCE($4, serial_number),
                   daily_rate_cents = COALESCE($5, daily_rate_cents),
                   status = COALESCE($6, status),
                   updated_at = datetime('now', 'subsec')
               WHERE id = $1
               RETURNING *"#,
        )
        .bind(id)
        .bind(&data.name)
        .bind(&data.description)
        .bind(&data.serial_number)
        .bind(data.daily_rate_cents)
        .bind(data.status.clone())
        .fetch_optional(pool)
        .await
    }

    pub async fn update_status<'e, E>(
        executor: E,
        id: Uuid,
        status: EquipmentStatus,
    ) -> Result<(), sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query(
            "UPDATE equipment SET status = $2, updated_at = datetime('now', 'subsec') WHERE id = $1",
        )
        .bind(id)
        .bind(status)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM equipment WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

/// Single-row application settings. The migration seeds row 1.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct AppSettings {
    pub id: i64,
    pub notifications_enabled: bool,
    pub updated_at: DateTime<Utc>,
}

impl AppSettings {
    pub async fn get(pool: &SqlitePool) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, AppSettings>("SELECT * FROM app_settings WHERE id = 1")
            .fetch_one(pool)
            .await
    }

    pub async fn set_notifications_enabled(
        pool: &SqlitePool,
        enabled: bool,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, AppSettings>(
            r#"UPDATE app_settings
               SET notifications_enabled = $1, updated_at = datetime('now', 'subsec')
               WHERE id = 1
               RETURNING *"#,
        )
        .bind(enabled)
        .fetch_one(pool)
        .await
    }
}

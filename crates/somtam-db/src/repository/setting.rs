//! # Setting Repository
//!
//! Free-form key/value store. Values are strings; typed interpretation
//! lives in `somtam_core::ShopSettings`.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::collections::HashMap;
use tracing::debug;

use super::ts;
use crate::error::DbResult;

#[derive(Debug, Clone)]
pub struct SettingRepository {
    pool: SqlitePool,
}

impl SettingRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SettingRepository { pool }
    }

    pub async fn get_all(&self) -> DbResult<HashMap<String, String>> {
        let rows: Vec<(String, String)> = sqlx::query_as("SELECT key, value FROM settings")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().collect())
    }

    pub async fn get(&self, key: &str) -> DbResult<Option<String>> {
        let value: Option<String> = sqlx::query_scalar("SELECT value FROM settings WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(value)
    }

    pub async fn upsert(&self, key: &str, value: &str, now: DateTime<Utc>) -> DbResult<()> {
        self.upsert_many(&[(key.to_string(), value.to_string())], now)
            .await
    }

    /// Writes several keys in one transaction: all land or none do.
    pub async fn upsert_many(&self, pairs: &[(String, String)], now: DateTime<Utc>) -> DbResult<()> {
        debug!(count = pairs.len(), "Upserting settings");

        let mut tx = self.pool.begin().await?;
        for (key, value) in pairs {
            sqlx::query(
                r#"
                INSERT INTO settings (key, value, updated_at) VALUES (?1, ?2, ?3)
                ON CONFLICT (key) DO UPDATE SET
                    value = excluded.value,
                    updated_at = excluded.updated_at
                "#,
            )
            .bind(key)
            .bind(value)
            .bind(ts(&now))
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        Ok(())
    }

    /// Returns whether the key existed.
    pub async fn delete(&self, key: &str) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM settings WHERE key = ?1")
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

//! SQLite-backed key/value store
//!
//! All queries are parameterized.

use async_trait::async_trait;
use sdk::errors::EngineError;
use sdk::services::KeyValueStore;
use sqlx::SqlitePool;
use tracing::debug;

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Remove a key; returns whether it existed
    pub async fn delete(&self, key: &str) -> Result<bool, EngineError> {
        let result = sqlx::query("DELETE FROM kv_store WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(|e| EngineError::Database(format!("Failed to delete {}: {}", key, e)))?;

        Ok(result.rows_affected() > 0)
    }

    /// All stored keys, sorted
    pub async fn keys(&self) -> Result<Vec<String>, EngineError> {
        sqlx::query_scalar::<_, String>("SELECT key FROM kv_store ORDER BY key")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| EngineError::Database(format!("Failed to list keys: {}", e)))
    }
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<String>, EngineError> {
        sqlx::query_scalar::<_, String>("SELECT value FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| EngineError::Database(format!("Failed to read {}: {}", key, e)))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), EngineError> {
        let now = chrono::Utc::now().timestamp();

        sqlx::query(
            r#"
            INSERT INTO kv_store (key, value, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| EngineError::Database(format!("Failed to write {}: {}", key, e)))?;

        debug!("Stored {} ({} bytes)", key, value.len());
        Ok(())
    }
}
